//! Local JWT expiry checks
//!
//! The payload segment is decoded without verifying the signature; the
//! result only decides whether a stored token is worth presenting to the
//! server. A token is valid iff its payload carries a numeric `exp` and
//! `exp * 1000 > now_millis`. Anything unparseable counts as expired.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn payload(token: &str) -> Option<Value> {
    let segment = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// `exp` claim as unix milliseconds, if the token has one.
pub fn expires_at_millis(token: &str) -> Option<u64> {
    let exp = payload(token)?.get("exp")?.as_f64()?;
    if exp.is_finite() && exp >= 0.0 {
        Some((exp * 1000.0) as u64)
    } else {
        None
    }
}

/// Whether `token` is unexpired at `now`.
pub fn is_unexpired(token: &str, now: u64) -> bool {
    expires_at_millis(token).is_some_and(|expires| expires > now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(claims: Value) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn valid_iff_exp_in_the_future() {
        let now = 1_700_000_000_000;
        let token = token_with(serde_json::json!({ "exp": 1_700_000_001u64 }));
        assert!(is_unexpired(&token, now));
        assert!(!is_unexpired(&token, 1_700_000_001_000), "exp*1000 == now is expired");
        assert!(!is_unexpired(&token, now + 5_000));
    }

    #[test]
    fn exp_is_reported_in_millis() {
        let token = token_with(serde_json::json!({ "exp": 42 }));
        assert_eq!(expires_at_millis(&token), Some(42_000));
    }

    #[test]
    fn fractional_exp_is_accepted() {
        let token = token_with(serde_json::json!({ "exp": 10.5 }));
        assert_eq!(expires_at_millis(&token), Some(10_500));
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        let token = token_with(serde_json::json!({ "sub": "u1" }));
        assert!(expires_at_millis(&token).is_none());
        assert!(!is_unexpired(&token, 0));
    }

    #[test]
    fn garbage_counts_as_expired() {
        assert!(!is_unexpired("not-a-jwt", 0));
        assert!(!is_unexpired("a.!!!.c", 0));
        assert!(!is_unexpired("", 0));
    }

    #[test]
    fn padded_payload_is_tolerated() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":12}"#);
        assert!(payload.ends_with("=="));
        let token = format!("h.{payload}.s");
        assert_eq!(expires_at_millis(&token), Some(12_000));
    }
}
