//! PKCE (RFC 7636) and CSRF state generation
//!
//! The verifier is persisted until the code exchange consumes it; the S256
//! challenge travels on the authorization URL so the server can bind the
//! code to the party that started the flow. The state value round-trips
//! through the redirect and is compared on the callback.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Random bytes behind a CSRF state value (256 bits).
const STATE_BYTES: usize = 32;

/// Random bytes behind a code verifier (512 bits, 86 characters encoded).
const VERIFIER_BYTES: usize = 64;

fn random_urlsafe<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an opaque CSRF state value, URL-safe base64 without padding.
pub fn generate_state() -> String {
    random_urlsafe::<STATE_BYTES>()
}

/// Generate a PKCE code verifier.
///
/// RFC 7636 allows 43-128 characters from the unreserved set; 64 bytes
/// encode to 86 base64url characters.
pub fn generate_code_verifier() -> String {
    random_urlsafe::<VERIFIER_BYTES>()
}

/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}
