//! Command-line encoding.
//!
//! Builds the exact byte sequence the server expects for each verb: an
//! ASCII line of space-separated arguments terminated by `\r\n`, and for
//! `put` additionally the raw job body followed by a second `\r\n`. The
//! body's *byte* length (not character length) is embedded in the line.
//!
//! Every encoder returns one contiguous buffer so a command is always a
//! single write on the socket; pipelined commands never interleave at the
//! byte level.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{BeanlineError, Result};

/// Frame delimiter, terminating both command lines and job bodies.
pub const DELIMITER: &[u8] = b"\r\n";

/// Delimiter length in bytes.
pub const DELIMITER_LEN: usize = DELIMITER.len();

/// Default job priority (0 = most urgent).
pub const DEFAULT_PRIORITY: u32 = 0;

/// Default job delay in seconds.
pub const DEFAULT_DELAY: u32 = 0;

/// Default time-to-run in seconds.
pub const DEFAULT_TTR: u32 = 60;

/// Maximum tube name length accepted by the server.
pub const MAX_TUBE_NAME_LEN: usize = 200;

/// Check a tube name before it is put on the wire.
///
/// Empty and over-long names are caller mistakes; anything subtler is left
/// for the server to answer with `BAD_FORMAT`.
pub fn validate_tube_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(BeanlineError::Usage("tube name must not be empty".into()));
    }
    if name.len() > MAX_TUBE_NAME_LEN {
        return Err(BeanlineError::Usage(format!(
            "tube name exceeds {} bytes",
            MAX_TUBE_NAME_LEN
        )));
    }
    Ok(())
}

/// Build a delimiter-terminated command line.
fn line(cmd: String) -> Bytes {
    let mut buf = BytesMut::with_capacity(cmd.len() + DELIMITER_LEN);
    buf.put_slice(cmd.as_bytes());
    buf.put_slice(DELIMITER);
    buf.freeze()
}

/// Encode `put`: command line plus raw body plus trailing delimiter.
pub fn put(priority: u32, delay: u32, ttr: u32, body: &[u8]) -> Bytes {
    let head = format!("put {} {} {} {}", priority, delay, ttr, body.len());
    let mut buf = BytesMut::with_capacity(head.len() + body.len() + 2 * DELIMITER_LEN);
    buf.put_slice(head.as_bytes());
    buf.put_slice(DELIMITER);
    buf.put_slice(body);
    buf.put_slice(DELIMITER);
    buf.freeze()
}

/// Encode `reserve` (blocks server-side until a job is ready).
pub fn reserve() -> Bytes {
    line("reserve".to_string())
}

/// Encode `reserve-with-timeout`.
pub fn reserve_with_timeout(seconds: u32) -> Bytes {
    line(format!("reserve-with-timeout {}", seconds))
}

/// Encode `reserve-job` (reserve a specific job by id).
pub fn reserve_job(id: u64) -> Bytes {
    line(format!("reserve-job {}", id))
}

/// Encode `delete`.
pub fn delete(id: u64) -> Bytes {
    line(format!("delete {}", id))
}

/// Encode `release`.
pub fn release(id: u64, priority: u32, delay: u32) -> Bytes {
    line(format!("release {} {} {}", id, priority, delay))
}

/// Encode `bury`.
pub fn bury(id: u64, priority: u32) -> Bytes {
    line(format!("bury {} {}", id, priority))
}

/// Encode `touch`.
pub fn touch(id: u64) -> Bytes {
    line(format!("touch {}", id))
}

/// Encode `use`.
pub fn use_tube(name: &str) -> Result<Bytes> {
    validate_tube_name(name)?;
    Ok(line(format!("use {}", name)))
}

/// Encode `watch`.
pub fn watch(name: &str) -> Result<Bytes> {
    validate_tube_name(name)?;
    Ok(line(format!("watch {}", name)))
}

/// Encode `ignore`.
pub fn ignore(name: &str) -> Result<Bytes> {
    validate_tube_name(name)?;
    Ok(line(format!("ignore {}", name)))
}

/// Encode `peek`.
pub fn peek(id: u64) -> Bytes {
    line(format!("peek {}", id))
}

/// Encode `peek-ready`.
pub fn peek_ready() -> Bytes {
    line("peek-ready".to_string())
}

/// Encode `peek-delayed`.
pub fn peek_delayed() -> Bytes {
    line("peek-delayed".to_string())
}

/// Encode `peek-buried`.
pub fn peek_buried() -> Bytes {
    line("peek-buried".to_string())
}

/// Encode `kick`.
pub fn kick(bound: u64) -> Bytes {
    line(format!("kick {}", bound))
}

/// Encode `kick-job`.
pub fn kick_job(id: u64) -> Bytes {
    line(format!("kick-job {}", id))
}

/// Encode `pause-tube`.
pub fn pause_tube(name: &str, delay: u32) -> Result<Bytes> {
    validate_tube_name(name)?;
    Ok(line(format!("pause-tube {} {}", name, delay)))
}

/// Encode `stats`.
pub fn stats() -> Bytes {
    line("stats".to_string())
}

/// Encode `stats-tube`.
pub fn stats_tube(name: &str) -> Result<Bytes> {
    validate_tube_name(name)?;
    Ok(line(format!("stats-tube {}", name)))
}

/// Encode `stats-job`.
pub fn stats_job(id: u64) -> Bytes {
    line(format!("stats-job {}", id))
}

/// Encode `list-tubes`.
pub fn list_tubes() -> Bytes {
    line("list-tubes".to_string())
}

/// Encode `list-tubes-watched`.
pub fn list_tubes_watched() -> Bytes {
    line("list-tubes-watched".to_string())
}

/// Encode `list-tube-used`.
pub fn list_tube_used() -> Bytes {
    line("list-tube-used".to_string())
}
