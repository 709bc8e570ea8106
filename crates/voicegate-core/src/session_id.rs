use base64::Engine;
use rand::RngCore;

const PREFIX: &str = "session-";
const RANDOM_BYTES: usize = 16;
/// 64 chars max per the data model invariant; `session-` (8) + 22 base64
/// chars for 16 unpadded url-safe bytes comfortably fits.
pub const MAX_LEN: usize = 64;

/// Generate a new opaque session id: `session-<url-safe base64 of 16 random bytes>`.
pub fn generate() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);
    format!("{PREFIX}{encoded}")
}

/// Structural validation only — existence is a storage-layer concern.
pub fn is_well_formed(id: &str) -> bool {
    id.starts_with(PREFIX) && id.len() <= MAX_LEN && id.len() > PREFIX.len()
}
