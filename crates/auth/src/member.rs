use super::*;
use chrono::DateTime;
use chrono::Utc;
use march_core::ID;
use march_core::Unique;

/// Registered dashboard user. The credential hash lives beside the
/// member in each store and is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    id: ID<Self>,
    username: String,
    full_name: String,
    email: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Member {
    /// Fresh member; creation and update stamps are both now.
    pub fn new(username: String, full_name: String, email: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: ID::default(),
            username,
            full_name,
            email,
            role,
            created_at: now,
            updated_at: now,
        }
    }
    /// Rebuild a member read back from storage.
    pub fn hydrate(
        id: ID<Self>,
        username: String,
        full_name: String,
        email: String,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            full_name,
            email,
            role,
            created_at,
            updated_at,
        }
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
    pub fn email(&self) -> &str {
        &self.email
    }
    pub fn role(&self) -> Role {
        self.role
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    pub fn rename(&mut self, username: String) {
        self.username = username;
    }
    pub fn set_full_name(&mut self, full_name: String) {
        self.full_name = full_name;
    }
    pub fn set_email(&mut self, email: String) {
        self.email = email;
    }
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }
    /// Advance the update stamp. Call after any mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

impl Unique for Member {
    fn id(&self) -> ID<Self> {
        self.id
    }
}
