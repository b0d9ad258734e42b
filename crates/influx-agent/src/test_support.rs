// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Record writers for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::client::RecordWriter;
use crate::errors::Write;

/// Records every write; calls whose 1-based index is in `failing_calls` fail with a 500.
#[derive(Default)]
pub struct RecordingWriter {
    calls: Mutex<Vec<String>>,
    failing_calls: Vec<usize>,
}

impl RecordingWriter {
    pub fn failing_on(failing_calls: Vec<usize>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_calls,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordWriter for RecordingWriter {
    async fn write_string(&self, record: &str) -> Result<(), Write> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(record.to_string());
            calls.len()
        };
        if self.failing_calls.contains(&call) {
            return Err(Write::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "write failed".to_string(),
            });
        }
        Ok(())
    }
}
