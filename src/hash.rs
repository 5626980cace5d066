use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use hmac::{Hmac as HmacImpl, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = HmacImpl<Sha256>;

/// Keyed SHA-256 used to store tokens by digest.
#[derive(Clone)]
pub struct Hmac {
    key: Vec<u8>,
}

impl Hmac {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
        }
    }

    /// Deterministic base64 digest of `input`.
    pub fn hash(&self, input: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("hmac accepts any key length");
        mac.update(input.as_bytes());
        URL_SAFE.encode(mac.finalize().into_bytes())
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
