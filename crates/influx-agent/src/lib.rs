// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwards metric records embedded in application logs to InfluxDB.
//!
//! Two agents feed the same [`client::InfluxDbClient`]:
//!
//! - [`logfile_agent::LogfileAgent`] tails a growing log file, extracts `INFLUX:` records and
//!   keeps a byte offset in a `<path>.pos` file so restarts resume where they stopped.
//! - [`mem_agent::MemAgent`] buffers records pushed in-process and flushes them on an interval.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod extractor;
pub mod logfile_agent;
pub mod mem_agent;
pub mod position;

#[cfg(test)]
mod test_support;
