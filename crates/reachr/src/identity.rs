//! Caller identity.
//!
//! Token verification happens upstream. The server only maps whatever
//! credential reached it onto a [`UserId`].

use reachr_core::{Result, UserId};

/// Turns an inbound credential into a user.
pub trait IdentityResolver: Send + Sync {
    /// `None` means the request carried no credential.
    fn resolve(&self, credential: Option<&str>) -> Result<UserId>;

    /// Name of the request header the credential is read from.
    fn header(&self) -> &str;
}

/// Trusts an account id placed in a request header by a gateway that
/// already verified the caller. Missing or blank headers are anonymous.
#[derive(Debug, Clone)]
pub struct TrustedHeaderResolver {
    header: String,
}

impl TrustedHeaderResolver {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into().to_ascii_lowercase(),
        }
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, credential: Option<&str>) -> Result<UserId> {
        match credential.map(str::trim) {
            None | Some("") => Ok(UserId::Anonymous),
            Some(raw) => UserId::parse(raw),
        }
    }

    fn header(&self) -> &str {
        &self.header
    }
}
