//! Authentication, sessions, and role gating for the marching dashboard.
//!
//! JWT (HS256) session tokens with Argon2id credential hashing, and two
//! request gates that run before any dashboard handler.
//!
//! ## Credentials
//!
//! - [`policy`] — Password strength rules, checked before hashing
//! - [`Codec`] — Argon2id hashing and verification
//!
//! ## Sessions
//!
//! - [`Crypto`] — Token issuance and verification
//! - [`Claims`] — Typed token payload
//! - [`gate`] — Framework-free authentication and authorization checks
//!
//! ## Identity
//!
//! - [`Member`] — Registered user record
//! - [`Role`] — Closed role set
//! - [`Directory`] — Member persistence contract, with [`Memory`] as the default store
mod claims;
mod crypto;
mod dto;
pub mod gate;
mod member;
mod memory;
pub mod password;
pub mod policy;
mod repository;
mod role;

pub use claims::*;
pub use crypto::*;
pub use dto::*;
pub use gate::Rejection;
pub use member::*;
pub use memory::*;
pub use password::Codec;
pub use password::HashingFailure;
pub use policy::PolicyViolation;
pub use repository::*;
pub use role::*;

#[cfg(feature = "database")]
mod postgres;
#[cfg(feature = "database")]
pub use postgres::*;

#[cfg(feature = "server")]
mod error;
#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod middleware;
#[cfg(feature = "server")]
pub use error::*;
#[cfg(feature = "server")]
pub use handlers::*;
#[cfg(feature = "server")]
pub use middleware::*;
