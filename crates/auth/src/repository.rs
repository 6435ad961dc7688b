use super::*;
use march_core::ID;

/// Failures of the member store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique field ("username" or "email") is already taken.
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("user not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Member persistence, with the credential hash carried alongside.
/// Stores enforce username and email uniqueness; empty emails are exempt.
#[allow(async_fn_in_trait)]
pub trait Directory {
    async fn find(&self, id: ID<Member>) -> Result<Option<(Member, String)>, StoreError>;
    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, StoreError>;
    async fn list(&self) -> Result<Vec<Member>, StoreError>;
    async fn create(&self, member: &Member, hashword: &str) -> Result<(), StoreError>;
    /// Replace a member's fields; the hash changes only when one is given.
    async fn update(&self, member: &Member, hashword: Option<&str>) -> Result<(), StoreError>;
    async fn delete(&self, id: ID<Member>) -> Result<(), StoreError>;
}
