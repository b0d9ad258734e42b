// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory record buffer flushed to InfluxDB on an interval.
//!
//! Producers push through cloneable [`MemAgentHandle`]s while the [`MemAgent`] loop drains the
//! buffer. Each flush snapshots the buffer length, sends that many records and then removes
//! exactly that prefix, so records pushed during the sends wait for the next cycle.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::RecordWriter;
use crate::config::AgentConfig;
use crate::errors::{report, AgentError, Creation, ErrorSender, Push};

struct PendingBuffer {
    records: Mutex<Vec<String>>,
    max_pending: Option<usize>,
}

impl PendingBuffer {
    /// Appends as many records as the cap allows. The overflowing tail is dropped and its
    /// length reported in the error.
    fn append(&self, records: impl IntoIterator<Item = String>) -> Result<(), Push> {
        #[allow(clippy::expect_used)]
        let mut buffer = self.records.lock().expect("lock poisoned");
        let mut dropped = 0usize;
        for record in records {
            match self.max_pending {
                Some(capacity) if buffer.len() >= capacity => dropped += 1,
                _ => buffer.push(record),
            }
        }

        match self.max_pending {
            Some(capacity) if dropped > 0 => {
                warn!("Pending buffer full ({capacity} records), dropped {dropped} records");
                Err(Push::BufferFull { capacity, dropped })
            }
            _ => Ok(()),
        }
    }

    /// Copy of the records currently buffered. Only the flush loop removes records, so this
    /// stays a prefix of the buffer until [`PendingBuffer::drain_prefix`] runs.
    fn snapshot(&self) -> Vec<String> {
        #[allow(clippy::expect_used)]
        let buffer = self.records.lock().expect("lock poisoned");
        buffer.clone()
    }

    fn drain_prefix(&self, n: usize) {
        #[allow(clippy::expect_used)]
        let mut buffer = self.records.lock().expect("lock poisoned");
        let n = n.min(buffer.len());
        buffer.drain(..n);
    }

    fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        let buffer = self.records.lock().expect("lock poisoned");
        buffer.len()
    }
}

/// Producer side of a [`MemAgent`]. Cheap to clone.
#[derive(Clone)]
pub struct MemAgentHandle {
    buffer: Arc<PendingBuffer>,
}

impl MemAgentHandle {
    pub fn push(&self, record: String) -> Result<(), Push> {
        self.buffer.append(std::iter::once(record))
    }

    pub fn push_many(&self, records: Vec<String>) -> Result<(), Push> {
        self.buffer.append(records)
    }

    /// Pushes `"{measurement},{tagset} value={value} {now_ns}"`.
    pub fn push_with(&self, measurement: &str, tagset: &str, value: f64) -> Result<(), Push> {
        let now_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.push(format!("{measurement},{tagset} value={value} {now_ns}"))
    }

    /// Number of records waiting for a flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

pub struct MemAgent {
    writer: Arc<dyn RecordWriter>,
    buffer: Arc<PendingBuffer>,
    interval: Duration,
}

impl MemAgent {
    pub fn new(
        writer: Arc<dyn RecordWriter>,
        interval: Duration,
        max_pending: Option<usize>,
    ) -> (Self, MemAgentHandle) {
        let buffer = Arc::new(PendingBuffer {
            records: Mutex::new(Vec::new()),
            max_pending,
        });
        let agent = Self {
            writer,
            buffer: Arc::clone(&buffer),
            interval,
        };
        (agent, MemAgentHandle { buffer })
    }

    /// Validates `config` and builds an agent writing through an `InfluxDbClient`.
    pub fn from_config(config: &AgentConfig) -> Result<(Self, MemAgentHandle), Creation> {
        config.validate()?;
        let client = config.client()?;
        Ok(Self::new(
            Arc::new(client),
            config.flush_interval,
            config.max_pending,
        ))
    }

    /// Runs one flush cycle and returns how many records were taken from the buffer.
    pub async fn flush(&self, errors: &ErrorSender) -> usize {
        let batch = self.buffer.snapshot();
        if batch.is_empty() {
            return 0;
        }

        let start = Instant::now();
        for record in &batch {
            if let Err(e) = self.writer.write_string(record).await {
                report(errors, AgentError::Write(e));
            }
        }

        self.buffer.drain_prefix(batch.len());
        debug!(
            "[agent] Finished write. time={:?}, len={}",
            start.elapsed(),
            batch.len()
        );
        batch.len()
    }

    /// Flushes every interval until `cancel` fires.
    pub async fn run(self, errors: ErrorSender, cancel: CancellationToken) {
        let mut flush_interval = interval(self.interval);
        flush_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        flush_interval.tick().await; // discard first tick, which is instantaneous

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Memory agent shutting down");
                    break;
                }
                _ = flush_interval.tick() => {
                    self.flush(&errors).await;
                }
            }
        }
    }
}
