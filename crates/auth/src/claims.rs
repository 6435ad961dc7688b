use super::*;
use march_core::ID;

/// Signed session payload. Decoding rejects any token whose fields are
/// missing or whose role is outside the closed [`Role`] set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub id: uuid::Uuid,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: ID<Member>, username: String, role: Role) -> Self {
        Self::at(user, username, role, march_core::now())
    }
    /// Claims as if issued at `now` (unix seconds).
    pub fn at(user: ID<Member>, username: String, role: Role, now: i64) -> Self {
        Self {
            id: user.inner(),
            username,
            role,
            iat: now,
            exp: now + Crypto::duration().as_secs() as i64,
        }
    }
    pub fn expired(&self) -> bool {
        self.exp < march_core::now()
    }
    pub fn user(&self) -> ID<Member> {
        ID::from(self.id)
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn role(&self) -> Role {
        self.role
    }
}
