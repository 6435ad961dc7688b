//! Marching dashboard backend.
//!
//! - [`auth`] — Credentials, sessions, and role gates
//! - [`server`] — Configuration and the HTTP route table
pub use march_auth as auth;
pub use march_core::*;
pub use march_server as server;
