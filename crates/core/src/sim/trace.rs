//! Memory access trace reader.
//!
//! Traces are plain text, one reference per line:
//!
//! ```text
//! # op  addr        [bytes]
//! i     0x80000000  4
//! r     0x80001000  8
//! w     4096
//! ```
//!
//! `op` is `i`/`f`/`fetch`, `r`/`l`/`load` or `w`/`s`/`store` (any case).
//! `addr` is decimal, or hexadecimal with a `0x` prefix. `bytes` defaults to 8.
//! Blank lines and everything after a `#` are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::error::TraceError;
use crate::config::defaults;
use crate::tracer::AccessType;

/// One memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemAccess {
    /// Reference kind.
    pub kind: AccessType,
    /// Byte address.
    pub addr: u64,
    /// Reference size in bytes.
    pub bytes: u64,
}

impl MemAccess {
    /// Creates a reference.
    pub const fn new(kind: AccessType, addr: u64, bytes: u64) -> Self {
        Self { kind, addr, bytes }
    }
}

fn parse_number(field: &str) -> Option<u64> {
    match field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => field.replace('_', "").parse().ok(),
    }
}

fn parse_kind(field: &str) -> Option<AccessType> {
    match field.to_ascii_lowercase().as_str() {
        "i" | "f" | "fetch" => Some(AccessType::Fetch),
        "r" | "l" | "load" => Some(AccessType::Load),
        "w" | "s" | "store" => Some(AccessType::Store),
        _ => None,
    }
}

/// Parses one trace line.
///
/// Returns `Ok(None)` for blank and comment-only lines.
///
/// # Errors
///
/// Returns [`TraceError::Parse`] tagged with `line_no` if the line is malformed.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<MemAccess>, TraceError> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }
    let err = |message: String| TraceError::Parse {
        line: line_no,
        message,
    };

    let fields: Vec<&str> = content.split_whitespace().collect();
    let (op, addr, bytes) = match fields.as_slice() {
        &[op, addr] => (op, addr, None),
        &[op, addr, bytes] => (op, addr, Some(bytes)),
        _ => return Err(err(format!("expected `<op> <addr> [bytes]`, got `{content}`"))),
    };

    let kind = parse_kind(op).ok_or_else(|| err(format!("unknown access kind `{op}`")))?;
    let addr = parse_number(addr).ok_or_else(|| err(format!("invalid address `{addr}`")))?;
    let bytes = match bytes {
        Some(b) => parse_number(b).ok_or_else(|| err(format!("invalid size `{b}`")))?,
        None => defaults::ACCESS_BYTES,
    };
    Ok(Some(MemAccess::new(kind, addr, bytes)))
}

/// Parses a whole trace.
///
/// # Errors
///
/// Returns [`TraceError::Io`] on read failure and [`TraceError::Parse`] on the
/// first malformed line.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<MemAccess>, TraceError> {
    let mut accesses = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        if let Some(access) = parse_line(&line?, idx + 1)? {
            accesses.push(access);
        }
    }
    Ok(accesses)
}

/// Opens and parses a trace file.
///
/// # Errors
///
/// As [`parse_trace`], plus [`TraceError::Io`] if the file cannot be opened.
pub fn parse_trace_file(path: impl AsRef<Path>) -> Result<Vec<MemAccess>, TraceError> {
    let file = File::open(path)?;
    parse_trace(BufReader::new(file))
}
