// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use reqwest::StatusCode;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Errors raised while building a client, an agent or the configuration.
/// An agent is never created when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum Creation {
    #[error("Invalid config: host={host}, port={port}, database={database}")]
    InvalidTarget {
        host: String,
        port: u16,
        database: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to open source file {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Position(#[from] Position),
}

/// Errors from a single write to the database.
#[derive(Debug, thiserror::Error)]
pub enum Write {
    #[error("data is required")]
    EmptyRecord,

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Response error: {status}, {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
}

/// Errors from loading or saving a position file.
#[derive(Debug, thiserror::Error)]
pub enum Position {
    #[error("Failed to read position file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed position {value:?} in {path}")]
    Malformed { path: PathBuf, value: String },

    #[error("Failed to write position file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected push into a bounded pending buffer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Push {
    #[error("Pending buffer is full ({capacity} records), dropped the last {dropped} records")]
    BufferFull { capacity: usize, dropped: usize },
}

/// Failures an agent reports on its error channel while its loop keeps running.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Failed to read source file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Position(#[from] Position),

    #[error("Failed to write record: {0}")]
    Write(#[from] Write),
}

/// Caller-supplied channel on which agents report failures.
pub type ErrorSender = mpsc::UnboundedSender<AgentError>;

/// Logs `err` and forwards it to the caller. A dropped receiver only loses the report.
pub fn report(errors: &ErrorSender, err: AgentError) {
    error!("{err}");
    if errors.send(err).is_err() {
        debug!("Error channel closed, report dropped");
    }
}
