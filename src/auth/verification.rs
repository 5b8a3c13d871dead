use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;

/// Number of random bytes behind each verify token.
pub const VERIFY_TOKEN_BYTES: usize = 32;

/// Generates a single-use token for email confirmation or password recovery.
///
/// The bytes come from the thread-local CSPRNG and are encoded as URL-safe base64 so the
/// token can travel in a query string.
pub fn generate_verify_token() -> String {
    let mut bytes = [0u8; VERIFY_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE.encode(bytes)
}
