//! Per-verb step tables and status-line interpreters.
//!
//! Each verb is one constructor returning its ordered handler steps. The
//! table makes the shape of every command explicit: one status step for
//! line-only responses, status plus payload for body-bearing ones
//! (reserve, peek, stats, list-tubes).

use bytes::Bytes;

use crate::error::{BeanlineError, Result};
use crate::job::Job;
use crate::stats;

use super::pending::{Reply, Step, StepOutcome};

const PUT_ERRORS: &[&str] = &["BURIED", "EXPECTED_CRLF", "JOB_TOO_BIG", "DRAINING"];
const RESERVE_ERRORS: &[&str] = &["DEADLINE_SOON"];
const RESERVE_TIMEOUT_ERRORS: &[&str] = &["DEADLINE_SOON", "TIMED_OUT"];
const NOT_FOUND: &[&str] = &["NOT_FOUND"];
const RELEASE_ERRORS: &[&str] = &["BURIED", "NOT_FOUND"];
const IGNORE_ERRORS: &[&str] = &["NOT_IGNORED"];
const NONE: &[&str] = &[];

fn unexpected(line: &str) -> BeanlineError {
    BeanlineError::UnexpectedResponse(line.to_string())
}

fn parse_field<T: std::str::FromStr>(field: &str, line: &str) -> Result<T> {
    field.parse().map_err(|_| unexpected(line))
}

/// Parse `<TOKEN> <id> <bytes>` into a payload demand.
fn id_and_length(line: &str, token: &str) -> Result<StepOutcome> {
    let rest = line.strip_prefix(token).ok_or_else(|| unexpected(line))?;
    let mut fields = rest.split(' ');
    let id = parse_field(fields.next().unwrap_or(""), line)?;
    let len = parse_field(fields.next().unwrap_or(""), line)?;
    Ok(StepOutcome::Payload { id, len })
}

fn put_status(line: &str) -> Result<StepOutcome> {
    let rest = line.strip_prefix("INSERTED ").ok_or_else(|| unexpected(line))?;
    Ok(StepOutcome::Done(Reply::Inserted(parse_field(rest, line)?)))
}

fn reserved_status(line: &str) -> Result<StepOutcome> {
    id_and_length(line, "RESERVED ")
}

fn found_status(line: &str) -> Result<StepOutcome> {
    id_and_length(line, "FOUND ")
}

fn ok_status(line: &str) -> Result<StepOutcome> {
    let rest = line.strip_prefix("OK ").ok_or_else(|| unexpected(line))?;
    Ok(StepOutcome::Payload {
        id: 0,
        len: parse_field(rest, line)?,
    })
}

fn deleted_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "DELETED")
}

fn released_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "RELEASED")
}

fn buried_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "BURIED")
}

fn touched_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "TOUCHED")
}

fn paused_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "PAUSED")
}

fn kicked_job_status(line: &str) -> Result<StepOutcome> {
    expect_bare(line, "KICKED")
}

fn expect_bare(line: &str, token: &str) -> Result<StepOutcome> {
    if line == token {
        Ok(StepOutcome::Done(Reply::Done))
    } else {
        Err(unexpected(line))
    }
}

fn using_status(line: &str) -> Result<StepOutcome> {
    let name = line.strip_prefix("USING ").ok_or_else(|| unexpected(line))?;
    Ok(StepOutcome::Done(Reply::Using(name.to_string())))
}

fn watching_status(line: &str) -> Result<StepOutcome> {
    let rest = line.strip_prefix("WATCHING ").ok_or_else(|| unexpected(line))?;
    Ok(StepOutcome::Done(Reply::Watching(parse_field(rest, line)?)))
}

fn kicked_count_status(line: &str) -> Result<StepOutcome> {
    let rest = line.strip_prefix("KICKED ").ok_or_else(|| unexpected(line))?;
    Ok(StepOutcome::Done(Reply::Kicked(parse_field(rest, line)?)))
}

fn job_body(id: u64, body: Bytes) -> Result<Reply> {
    Ok(Reply::Job(Job::new(id, body)))
}

fn stats_body(_id: u64, body: Bytes) -> Result<Reply> {
    Ok(Reply::Stats(stats::parse_stats(&body)?))
}

fn tubes_body(_id: u64, body: Bytes) -> Result<Reply> {
    Ok(Reply::Tubes(stats::parse_tube_list(&body)?))
}

fn one(errors: &'static [&'static str], interpret: super::pending::StatusFn) -> Vec<Step> {
    vec![Step::Status { errors, interpret }]
}

fn two(
    errors: &'static [&'static str],
    interpret: super::pending::StatusFn,
    finish: super::pending::PayloadFn,
) -> Vec<Step> {
    vec![Step::Status { errors, interpret }, Step::Payload { finish }]
}

/// Steps for `put`.
pub fn put() -> Vec<Step> {
    one(PUT_ERRORS, put_status)
}

/// Steps for `reserve`.
pub fn reserve() -> Vec<Step> {
    two(RESERVE_ERRORS, reserved_status, job_body)
}

/// Steps for `reserve-with-timeout`.
pub fn reserve_with_timeout() -> Vec<Step> {
    two(RESERVE_TIMEOUT_ERRORS, reserved_status, job_body)
}

/// Steps for `reserve-job`.
pub fn reserve_job() -> Vec<Step> {
    two(NOT_FOUND, reserved_status, job_body)
}

/// Steps for `delete`.
pub fn delete() -> Vec<Step> {
    one(NOT_FOUND, deleted_status)
}

/// Steps for `release`.
pub fn release() -> Vec<Step> {
    one(RELEASE_ERRORS, released_status)
}

/// Steps for `bury`.
pub fn bury() -> Vec<Step> {
    one(NOT_FOUND, buried_status)
}

/// Steps for `touch`.
pub fn touch() -> Vec<Step> {
    one(NOT_FOUND, touched_status)
}

/// Steps for `use`.
pub fn use_tube() -> Vec<Step> {
    one(NONE, using_status)
}

/// Steps for `watch`.
pub fn watch() -> Vec<Step> {
    one(NONE, watching_status)
}

/// Steps for `ignore`.
pub fn ignore() -> Vec<Step> {
    one(IGNORE_ERRORS, watching_status)
}

/// Steps shared by `peek`, `peek-ready`, `peek-delayed` and `peek-buried`.
pub fn peek() -> Vec<Step> {
    two(NOT_FOUND, found_status, job_body)
}

/// Steps for `kick`.
pub fn kick() -> Vec<Step> {
    one(NONE, kicked_count_status)
}

/// Steps for `kick-job`.
pub fn kick_job() -> Vec<Step> {
    one(NOT_FOUND, kicked_job_status)
}

/// Steps for `pause-tube`.
pub fn pause_tube() -> Vec<Step> {
    one(NOT_FOUND, paused_status)
}

/// Steps for the server-wide `stats`.
pub fn server_stats() -> Vec<Step> {
    two(NONE, ok_status, stats_body)
}

/// Steps shared by `stats-tube` and `stats-job`.
pub fn scoped_stats() -> Vec<Step> {
    two(NOT_FOUND, ok_status, stats_body)
}

/// Steps shared by `list-tubes` and `list-tubes-watched`.
pub fn list_tubes() -> Vec<Step> {
    two(NONE, ok_status, tubes_body)
}

/// Steps for `list-tube-used`.
pub fn list_tube_used() -> Vec<Step> {
    one(NONE, using_status)
}
