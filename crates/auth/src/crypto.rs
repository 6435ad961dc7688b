use super::*;
use base64::Engine;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use jsonwebtoken::errors::ErrorKind;
use march_core::ID;

/// Why a presented token was not accepted. Only ever logged;
/// callers of the authentication gate see a single rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("unexpected signing algorithm")]
    BadAlgorithm,
    #[error("token expired")]
    Expired,
    #[error("invalid token claims")]
    Invalid,
    #[error("failed to sign token")]
    Signing,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm => Self::BadAlgorithm,
            ErrorKind::InvalidAlgorithmName => Self::BadAlgorithm,
            ErrorKind::InvalidKeyFormat => Self::BadAlgorithm,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::MissingRequiredClaim(_) => Self::Invalid,
            ErrorKind::Json(_) => Self::Invalid,
            _ => Self::Malformed,
        }
    }
}

/// HS256 token service. The secret is fixed at construction.
pub struct Crypto {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Crypto {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
    pub fn issue(&self, user: ID<Member>, username: &str, role: Role) -> Result<String, TokenError> {
        self.encode(&Claims::new(user, username.to_string(), role))
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .inspect_err(|e| log::error!("token signing failed: {}", e))
            .map_err(|_| TokenError::Signing)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        Self::algorithm(token)?;
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
    pub const fn duration() -> std::time::Duration {
        march_core::TOKEN_DURATION
    }
    /// Reads the header's declared algorithm before any key is touched,
    /// so `none` and asymmetric substitutions are refused outright.
    fn algorithm(token: &str) -> Result<(), TokenError> {
        #[derive(serde::Deserialize)]
        struct Head {
            alg: String,
        }
        let mut parts = token.split('.');
        let head = parts.next().ok_or(TokenError::Malformed)?;
        if parts.count() != 2 {
            return Err(TokenError::Malformed);
        }
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(head)
            .map_err(|_| TokenError::Malformed)?;
        let head = serde_json::from_slice::<Head>(&bytes).map_err(|_| TokenError::Malformed)?;
        match head.alg.as_str() {
            "HS256" => Ok(()),
            _ => Err(TokenError::BadAlgorithm),
        }
    }
}
