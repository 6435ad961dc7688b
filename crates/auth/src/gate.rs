//! Request gates, independent of any HTTP framework.
//!
//! [`authenticate`] turns an `Authorization` header into verified
//! [`Claims`]; [`authorize`] checks those claims against a role set.
//! Both collapse every failure into a [`Rejection`], so callers can
//! never tell an expired token from a forged one.
use super::*;
use march_core::BEARER;

/// Terminal outcome of a gate that refused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("insufficient permissions")]
    Forbidden,
}

/// Verify a raw `Authorization` header value.
pub fn authenticate(header: Option<&str>, crypto: &Crypto) -> Result<Claims, Rejection> {
    let header = header.ok_or(Rejection::Unauthenticated)?;
    let token = bearer(header).ok_or(Rejection::Unauthenticated)?;
    crypto
        .decode(token)
        .inspect_err(|e| log::debug!("rejected bearer token: {}", e))
        .map_err(|_| Rejection::Unauthenticated)
}

/// Check previously authenticated claims against the required roles.
/// Absent claims fail closed; an empty role set admits no one.
pub fn authorize(claims: Option<&Claims>, roles: &[Role]) -> Result<(), Rejection> {
    let claims = claims.ok_or(Rejection::Unauthenticated)?;
    match roles.contains(&claims.role()) {
        true => Ok(()),
        false => {
            log::debug!("{} lacks any of {:?}", claims.username(), roles);
            Err(Rejection::Forbidden)
        }
    }
}

/// Exactly `Bearer <token>`: two single-space-separated parts, case-sensitive.
fn bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
