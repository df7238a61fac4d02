//! Session lifecycle counters
//!
//! - `auth_determinations_total` (counter): label `outcome`
//! - `auth_refresh_total` (counter): label `outcome`
//! - `auth_logout_total` (counter): label `remote` (`ok` or `failed`)
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

pub fn record_determination(outcome: &'static str) {
    metrics::counter!("auth_determinations_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("auth_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_logout(remote_ok: bool) {
    let remote = if remote_ok { "ok" } else { "failed" };
    metrics::counter!("auth_logout_total", "remote" => remote).increment(1);
}
