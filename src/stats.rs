//! Statistics payload parsing.
//!
//! `stats`, `stats-tube` and `stats-job` answer with a YAML mapping;
//! `list-tubes` and `list-tubes-watched` with a YAML sequence of names.
//! Keys arrive dash-separated (`current-jobs-ready`) and are normalized to
//! camelCase (`currentJobsReady`) so callers see one consistent spelling.

use std::collections::BTreeMap;

use crate::error::{BeanlineError, Result};

/// A parsed statistics document with camelCase keys.
pub type Stats = BTreeMap<String, serde_yaml::Value>;

/// Normalize a dash-separated key to camelCase.
pub fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse a YAML statistics body into a map with camelCase keys.
pub fn parse_stats(body: &[u8]) -> Result<Stats> {
    let raw: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_slice(body)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (camelize(&k), v))
        .collect())
}

/// Parse a YAML tube-list body.
pub fn parse_tube_list(body: &[u8]) -> Result<Vec<String>> {
    let names: Vec<String> = serde_yaml::from_slice(body)?;
    Ok(names)
}

/// Convenience accessor for numeric statistics fields.
pub fn stat_u64(stats: &Stats, key: &str) -> Result<u64> {
    stats
        .get(key)
        .and_then(serde_yaml::Value::as_u64)
        .ok_or_else(|| BeanlineError::UnexpectedResponse(format!("missing stat field {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("current-jobs-ready"), "currentJobsReady");
        assert_eq!(camelize("pid"), "pid");
        assert_eq!(camelize("cmd-peek-buried"), "cmdPeekBuried");
        assert_eq!(camelize(""), "");
    }

    #[test]
    fn test_parse_stats_normalizes_keys() {
        let body = b"---\ncurrent-jobs-ready: 5\ntotal-jobs: 12\nname: default\n";
        let stats = parse_stats(body).unwrap();
        assert_eq!(stat_u64(&stats, "currentJobsReady").unwrap(), 5);
        assert_eq!(stat_u64(&stats, "totalJobs").unwrap(), 12);
        assert_eq!(
            stats.get("name").and_then(serde_yaml::Value::as_str),
            Some("default")
        );
    }

    #[test]
    fn test_parse_tube_list() {
        let body = b"---\n- default\n- emails\n- imports\n";
        let tubes = parse_tube_list(body).unwrap();
        assert_eq!(tubes, vec!["default", "emails", "imports"]);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(parse_stats(b"{ not yaml: [").is_err());
    }

    #[test]
    fn test_missing_stat_field() {
        let stats = parse_stats(b"---\npid: 1\n").unwrap();
        let err = stat_u64(&stats, "currentJobsReady").unwrap_err();
        assert!(matches!(err, BeanlineError::UnexpectedResponse(_)));
    }
}
