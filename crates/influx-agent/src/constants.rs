// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Marker that flags a log line as carrying an embedded record.
pub const RECORD_MARKER: &str = "INFLUX:";

/// Escaped newline accepted inside a record payload.
pub const NEWLINE_ESCAPE: &str = "\\n";

/// Upper bound on escaped newlines decoded per line.
pub const MAX_NEWLINE_REPLACEMENTS: usize = 99;

/// Suffix appended to a source path to locate its position file.
pub const POSITION_FILE_SUFFIX: &str = ".pos";

pub const DEFAULT_INFLUX_HOST: &str = "localhost";
pub const DEFAULT_INFLUX_PORT: u16 = 8086;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
