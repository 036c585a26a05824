//! Caller identification.
//!
//! The registry trusts whatever identity the hosting environment hands it.
//! Over HTTP that identity arrives in a header set by an authenticating
//! proxy; [`CallerResolver`] is the seam where a different scheme plugs in.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

use areg_types::Principal;

use crate::error::{ServerError, ServerResult};

#[async_trait]
pub trait CallerResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> ServerResult<Principal>;
}

/// Reads the caller from a single header: a handle, a 64-hex principal, or
/// a `pr:`-prefixed hex principal.
pub struct HeaderCallerResolver {
    header: HeaderName,
}

impl HeaderCallerResolver {
    pub fn new(header: &str) -> ServerResult<Self> {
        let header = HeaderName::try_from(header.to_ascii_lowercase())
            .map_err(|e| ServerError::Config(format!("caller header '{header}': {e}")))?;
        Ok(Self { header })
    }
}

#[async_trait]
impl CallerResolver for HeaderCallerResolver {
    async fn resolve(&self, headers: &HeaderMap) -> ServerResult<Principal> {
        let value = headers
            .get(&self.header)
            .ok_or_else(|| ServerError::AuthFailed(format!("missing {} header", self.header)))?;
        let text = value
            .to_str()
            .map_err(|_| ServerError::AuthFailed(format!("{} is not valid text", self.header)))?;
        Principal::parse(text.trim()).map_err(|e| ServerError::AuthFailed(e.to_string()))
    }
}
