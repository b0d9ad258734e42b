// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tails a growing log file and forwards the records embedded in it.
//!
//! Every cycle reads the bytes appended since the stored position, persists the new position
//! and only then sends the extracted records. A crash between the two loses the records of that
//! chunk instead of sending them twice; a failed write is reported and never retried.
//!
//! A file that shrinks below the position is read again from the start. A file rewritten in
//! place at the same or a greater length, or rotated by rename, is not detected: the agent keeps
//! its open handle and only reads bytes past the position.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::RecordWriter;
use crate::config::AgentConfig;
use crate::errors::{report, AgentError, Creation, ErrorSender};
use crate::extractor::extract_from_chunk;
use crate::position::PositionFile;

/// What a single tailing cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The file has not grown since the last cycle.
    Idle,
    /// Reading the file failed, or it produced no bytes.
    NothingRead,
    /// A chunk was consumed and its records handed to the writer.
    Consumed {
        bytes: u64,
        records: usize,
        failed: usize,
    },
}

pub struct LogfileAgent {
    writer: Arc<dyn RecordWriter>,
    path: PathBuf,
    file: File,
    positions: PositionFile,
    offset: u64,
    interval: Duration,
}

impl LogfileAgent {
    /// Opens `path` and resumes from its position file. Fails when the file cannot be opened
    /// or the stored position is malformed.
    pub async fn new(
        writer: Arc<dyn RecordWriter>,
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Result<Self, Creation> {
        let path = path.into();
        let file = File::open(&path)
            .await
            .map_err(|source| Creation::OpenSource {
                path: path.clone(),
                source,
            })?;
        let positions = PositionFile::for_source(&path);
        let offset = positions.load().await?;

        info!("Tailing {} from offset {offset}", path.display());
        Ok(Self {
            writer,
            path,
            file,
            positions,
            offset,
            interval,
        })
    }

    /// Validates `config` and tails its `log_file` through an `InfluxDbClient`.
    pub async fn from_config(config: &AgentConfig) -> Result<Self, Creation> {
        config.validate()?;
        let Some(path) = config.log_file.clone() else {
            return Err(Creation::InvalidConfig(
                "a log file to tail is required".to_string(),
            ));
        };
        let client = config.client()?;
        Self::new(Arc::new(client), path, config.flush_interval).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Runs one read-extract-persist-send cycle.
    pub async fn poll(&mut self, errors: &ErrorSender) -> CycleOutcome {
        let len = match self.file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(source) => {
                self.report_read_error(errors, source);
                return CycleOutcome::NothingRead;
            }
        };

        if len < self.offset {
            warn!(
                "{} shrank to {len} bytes below offset {}, reading from the start",
                self.path.display(),
                self.offset
            );
            self.offset = 0;
            if let Err(e) = self.positions.save(0).await {
                report(errors, AgentError::Position(e));
            }
        }

        if len == self.offset {
            return CycleOutcome::Idle;
        }

        let chunk = match self.read_from_offset().await {
            Ok(chunk) => chunk,
            Err(source) => {
                self.report_read_error(errors, source);
                return CycleOutcome::NothingRead;
            }
        };
        if chunk.is_empty() {
            return CycleOutcome::NothingRead;
        }

        let bytes = chunk.len() as u64;
        self.offset += bytes;
        if let Err(e) = self.positions.save(self.offset).await {
            report(errors, AgentError::Position(e));
        }
        debug!("readsize:{bytes}, nextoffset: {}", self.offset);

        let records = extract_from_chunk(&String::from_utf8_lossy(&chunk));
        let mut failed = 0;
        for record in &records {
            if let Err(e) = self.writer.write_string(record).await {
                failed += 1;
                report(errors, AgentError::Write(e));
            }
        }

        CycleOutcome::Consumed {
            bytes,
            records: records.len(),
            failed,
        }
    }

    /// Polls every interval until `cancel` fires.
    pub async fn run(mut self, errors: ErrorSender, cancel: CancellationToken) {
        let mut poll_interval = interval(self.interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        poll_interval.tick().await; // discard first tick, which is instantaneous

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Logfile agent for {} shutting down", self.path.display());
                    break;
                }
                _ = poll_interval.tick() => {
                    self.poll(&errors).await;
                }
            }
        }
    }

    async fn read_from_offset(&mut self) -> std::io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(self.offset)).await?;
        let mut chunk = Vec::new();
        self.file.read_to_end(&mut chunk).await?;
        Ok(chunk)
    }

    fn report_read_error(&self, errors: &ErrorSender, source: std::io::Error) {
        report(
            errors,
            AgentError::Read {
                path: self.path.clone(),
                source,
            },
        );
    }
}
