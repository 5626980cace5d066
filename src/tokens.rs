use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Byte length of remember and reset tokens.
pub const REMEMBER_TOKEN_BYTES: usize = 32;

pub fn bytes(n: usize) -> anyhow::Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(buf)
}

/// `n` random bytes, URL-safe base64 encoded.
pub fn string(n: usize) -> anyhow::Result<String> {
    Ok(URL_SAFE.encode(bytes(n)?))
}

pub fn remember_token() -> anyhow::Result<String> {
    string(REMEMBER_TOKEN_BYTES)
}
