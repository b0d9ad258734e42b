// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Extraction of line-protocol records embedded in log text.
//!
//! A log line carries a record when it contains [`RECORD_MARKER`]; the record is whatever
//! follows the first marker. Payloads may spell newlines as the two characters `\n` so that a
//! multi-line record fits on one log line.
//!
//! ```
//! use influx_agent::extractor::extract_records;
//!
//! let lines = ["noise", "x INFLUX:cpu,host=a value=1 100"];
//! assert_eq!(extract_records(lines), vec!["cpu,host=a value=1 100".to_string()]);
//! ```

use crate::constants::{MAX_NEWLINE_REPLACEMENTS, NEWLINE_ESCAPE, RECORD_MARKER};

/// Returns the records embedded in `lines`, in input order.
///
/// Lines without the marker are skipped. A marker with nothing after it yields an empty
/// record; content is not validated here.
pub fn extract_records<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(extract_record).collect()
}

/// Splits a raw chunk on `\n` and extracts its records.
pub fn extract_from_chunk(chunk: &str) -> Vec<String> {
    extract_records(chunk.split('\n'))
}

/// Extracts the record carried by a single line, if any.
pub fn extract_record(line: &str) -> Option<String> {
    let (_, payload) = line.split_once(RECORD_MARKER)?;
    if payload.contains(NEWLINE_ESCAPE) {
        Some(payload.replacen(NEWLINE_ESCAPE, "\n", MAX_NEWLINE_REPLACEMENTS))
    } else {
        Some(payload.to_string())
    }
}
