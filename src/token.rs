//! Random tokens embedded in generated callback addresses

use rand::distr::Alphanumeric;
use rand::Rng;

/// Generates a lowercase alphanumeric token of the given length.
///
/// DNS names are case-insensitive, so tokens are lowercased to keep the
/// alphabet identical between what we hand out and what a resolver logs.
pub fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Cache-busting query value for endpoints that expect `t=0.<digits>`
pub fn cache_buster() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("0.{}", nanos.unsigned_abs())
}
