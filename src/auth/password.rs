use tracing::error;

/// bcrypt over `plain + pepper`.
pub fn hash_password(plain: &str, pepper: &str, cost: u32) -> anyhow::Result<String> {
    let peppered = format!("{plain}{pepper}");
    bcrypt::hash(peppered, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, pepper: &str, hash: &str) -> anyhow::Result<bool> {
    let peppered = format!("{plain}{pepper}");
    bcrypt::verify(peppered, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COST: u32 = 4;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("Secur3P@ssw0rd!", "pepper", COST).expect("hashing should succeed");
        assert!(verify_password("Secur3P@ssw0rd!", "pepper", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_requires_the_pepper() {
        let hash = hash_password("correct-horse", "pepper", COST).unwrap();
        assert!(!verify_password("correct-horse", "", &hash).unwrap());
        assert!(!verify_password("correct-horse", "other", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple", "p", COST).unwrap();
        assert!(!verify_password("wrong-password", "p", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "p", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
