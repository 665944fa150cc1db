//! Normalization of raw provider log bodies into [`Record`] lists
//!
//! Providers answer with anything from nested JSON envelopes to plain text
//! lines. [`normalize`] never fails: it walks JSON when it can, falls back
//! to one record per line, and finally wraps the whole body.

use crate::models::Record;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

const TIME_KEYS: [&str; 4] = ["time", "timestamp", "created_at", "createdAt"];
const SNIPPET_KEYS: [&str; 7] = [
    "name", "domain", "subdomain", "url", "request", "hostname", "host",
];
const UNIQUE_KEYS: [&str; 6] = ["id", "ID", "uuid", "uid", "record_id", "recordId"];

/// Epoch values above this are taken as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Converts a poll body into zero or more records
pub fn normalize(body: &[u8]) -> Vec<Record> {
    let text = String::from_utf8_lossy(body);
    let s = text.trim();
    if s.is_empty() {
        return Vec::new();
    }

    let now = Utc::now();
    if s.starts_with('{') || s.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(s) {
            let records = from_json(&value, now);
            if !records.is_empty() {
                return records;
            }
        }
    }

    let lines: Vec<Record> = s
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| plain(line, now))
        .collect();
    if !lines.is_empty() {
        return lines;
    }

    vec![plain(s, now)]
}

fn plain(s: &str, timestamp: DateTime<Utc>) -> Record {
    Record {
        timestamp,
        raw: s.to_string(),
        snippet: s.to_string(),
        unique_key: String::new(),
    }
}

fn from_json(value: &Value, fallback: DateTime<Utc>) -> Vec<Record> {
    match value {
        Value::Object(map) => {
            if let Some(data) = map.get("data") {
                return from_json(data, fallback);
            }
            let raw = value.to_string();
            vec![Record {
                timestamp: guess_time(map).unwrap_or(fallback),
                snippet: guess_snippet(map).unwrap_or_else(|| raw.clone()),
                unique_key: guess_unique_key(map).unwrap_or_default(),
                raw,
            }]
        }
        Value::Array(items) => items
            .iter()
            .flat_map(|item| from_json(item, fallback))
            .collect(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Vec::new()
            } else {
                vec![plain(s, fallback)]
            }
        }
        other => vec![plain(&other.to_string(), fallback)],
    }
}

fn guess_snippet(map: &Map<String, Value>) -> Option<String> {
    SNIPPET_KEYS.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn guess_unique_key(map: &Map<String, Value>) -> Option<String> {
    UNIQUE_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => n
            .as_f64()
            .filter(|f| *f > 0.0)
            .map(|f| format!("{f:.0}")),
        _ => None,
    })
}

fn guess_time(map: &Map<String, Value>) -> Option<DateTime<Utc>> {
    TIME_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => parse_time_str(s.trim()),
        Value::Number(n) => n.as_f64().filter(|f| *f > 0.0).and_then(|f| from_epoch(f as i64)),
        _ => None,
    })
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value > MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(value).single()
    } else {
        Utc.timestamp_opt(value, 0).single()
    }
}
