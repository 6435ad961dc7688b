//! Argon2id credential hashing.
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::Version;
use argon2::password_hash::SaltString;
use std::sync::Arc;
use std::sync::OnceLock;

/// Underlying hashing primitive failed. Carries no secret material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to hash password")]
pub struct HashingFailure;

/// One-way credential codec. Every hash carries its own random salt
/// and cost parameters, so verification never needs the codec's cost.
#[derive(Debug, Default, Clone)]
pub struct Codec {
    params: Params,
    decoy: Arc<OnceLock<String>>,
}

impl Codec {
    /// Overrides the time cost (iterations), keeping default memory and lanes.
    pub fn with_cost(t_cost: u32) -> Result<Self, HashingFailure> {
        Params::new(
            Params::DEFAULT_M_COST,
            t_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map(|params| Self {
            params,
            decoy: Arc::default(),
        })
        .map_err(|_| HashingFailure)
    }
    pub fn cost(&self) -> u32 {
        self.params.t_cost()
    }
    pub fn hash(&self, password: &str) -> Result<String, HashingFailure> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
            .hash_password(password.as_bytes(), &salt()?)
            .map(|h| h.to_string())
            .inspect_err(|e| log::error!("argon2 hashing failed: {}", e))
            .map_err(|_| HashingFailure)
    }
    /// Malformed hashes verify as false rather than erroring.
    pub fn verify(&self, password: &str, hashword: &str) -> bool {
        PasswordHash::new(hashword)
            .ok()
            .as_ref()
            .map(|hash| {
                Argon2::default()
                    .verify_password(password.as_bytes(), hash)
                    .is_ok()
            })
            .unwrap_or(false)
    }
    /// Verification against a fixed hash made with this codec's cost.
    /// Stands in for an account that does not exist; always false.
    pub fn decoy(&self, password: &str) -> bool {
        let hashword = self
            .decoy
            .get_or_init(|| self.hash("decoy").unwrap_or_default());
        let _ = self.verify(password, hashword);
        false
    }
}

fn salt() -> Result<SaltString, HashingFailure> {
    use rand::Rng;
    let ref mut bytes = [0u8; 16];
    rand::rng().fill(bytes);
    SaltString::encode_b64(bytes).map_err(|_| HashingFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn verifies_own_hash() {
        let codec = Codec::default();
        let hash = codec.hash("Password123").unwrap();
        assert!(codec.verify("Password123", &hash));
    }
    #[test]
    fn rejects_other_password() {
        let codec = Codec::default();
        let hash = codec.hash("Password123").unwrap();
        assert!(!codec.verify("Password124", &hash));
        assert!(!codec.verify("", &hash));
    }
    #[test]
    fn hash_is_salted() {
        let codec = Codec::default();
        let a = codec.hash("Secret12").unwrap();
        let b = codec.hash("Secret12").unwrap();
        assert_ne!(a, b);
        assert!(codec.verify("Secret12", &a));
        assert!(codec.verify("Secret12", &b));
    }
    #[test]
    fn hash_hides_plaintext() {
        let hash = Codec::default().hash("Secret12").unwrap();
        assert_ne!(hash, "Secret12");
        assert!(!hash.contains("Secret12"));
        assert!(hash.starts_with("$argon2id$"));
    }
    #[test]
    fn malformed_hash_is_false() {
        let codec = Codec::default();
        assert!(!codec.verify("Secret12", "not a hash"));
        assert!(!codec.verify("Secret12", ""));
    }
    #[test]
    fn cost_override_still_verifies() {
        let cheap = Codec::with_cost(1).unwrap();
        assert_eq!(cheap.cost(), 1);
        let hash = cheap.hash("Secret12").unwrap();
        assert!(Codec::default().verify("Secret12", &hash));
    }
    #[test]
    fn decoy_is_false_and_costs_a_verify() {
        let codec = Codec::default();
        assert!(!codec.decoy("decoy"));
        assert!(!codec.decoy("Secret12"));
        let hash = codec.hash("Secret12").unwrap();
        let clock = std::time::Instant::now();
        codec.verify("Wrong123", &hash);
        let real = clock.elapsed();
        let clock = std::time::Instant::now();
        codec.decoy("Wrong123");
        let fake = clock.elapsed();
        assert!(fake * 4 >= real, "decoy {:?} vs verify {:?}", fake, real);
    }
    #[test]
    fn decoy_hash_is_shared_across_clones() {
        let codec = Codec::with_cost(1).unwrap();
        let clone = codec.clone();
        codec.decoy("x");
        assert!(clone.decoy.get().is_some());
        assert_eq!(clone.decoy.get(), codec.decoy.get());
    }
    #[test]
    fn zero_cost_is_refused() {
        assert_eq!(Codec::with_cost(0).unwrap_err(), HashingFailure);
    }
}
