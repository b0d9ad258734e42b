// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Durable byte offsets for tailed files.
//!
//! The offset of `/var/log/app.log` lives in `/var/log/app.log.pos` as plain decimal ASCII.
//! Saves go through a temporary file that is renamed over the position file, so a crash
//! mid-save leaves the previous value in place.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::constants::POSITION_FILE_SUFFIX;
use crate::errors::Position as PositionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionFile {
    path: PathBuf,
}

impl PositionFile {
    /// Position file for the given source, `<source>.pos`.
    pub fn for_source(source: &Path) -> Self {
        Self {
            path: with_suffix(source, POSITION_FILE_SUFFIX),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored offset. A missing or empty file is a cold start at offset 0.
    pub async fn load(&self) -> Result<u64, PositionError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No position file at {}, starting at 0", self.path.display());
                return Ok(0);
            }
            Err(source) => {
                return Err(PositionError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value = contents.trim();
        if value.is_empty() {
            return Ok(0);
        }

        let offset = value
            .parse::<u64>()
            .map_err(|_| PositionError::Malformed {
                path: self.path.clone(),
                value: value.to_string(),
            })?;
        info!("Resume logfile pos: {offset}");
        Ok(offset)
    }

    /// Replaces the stored offset.
    pub async fn save(&self, offset: u64) -> Result<(), PositionError> {
        let tmp_path = with_suffix(&self.path, ".tmp");
        let write_err = |source: std::io::Error| PositionError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(&tmp_path).await.map_err(write_err)?;
        file.write_all(offset.to_string().as_bytes())
            .await
            .map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(write_err)?;
        debug!("Save pos {offset}");
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
