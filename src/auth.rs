//! Request-signing capability.
//!
//! The host owns credential acquisition and refresh; this crate only needs
//! "attach the right Authorization header". Both credential kinds CloudConvert
//! supports — a long-lived API key and a host-refreshed OAuth2 access token —
//! are sent as bearer tokens, so the distinction matters to the host's token
//! lifecycle, not to the wire format. The variant is selected once per
//! execution and applied read-only to every authenticated call.

use std::fmt;

/// Opaque credential material supplied by the host.
#[derive(Clone)]
pub enum Credentials {
    /// Long-lived API key.
    ApiKey(String),
    /// OAuth2 access token; refresh is the host's responsibility.
    OAuth2Token(String),
}

impl Credentials {
    /// Read an API key from the `CLOUDCONVERT_API_KEY` environment variable.
    pub fn from_env() -> Option<Self> {
        std::env::var("CLOUDCONVERT_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(Credentials::ApiKey)
    }

    /// Attach the Authorization header to an outgoing request.
    pub(crate) fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credentials::ApiKey(token) | Credentials::OAuth2Token(token) => {
                request.bearer_auth(token)
            }
        }
    }
}

impl fmt::Debug for Credentials {
    // Secrets must not leak into logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("Credentials::ApiKey(<redacted>)"),
            Credentials::OAuth2Token(_) => f.write_str("Credentials::OAuth2Token(<redacted>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::ApiKey("sk-very-secret".into());
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("sk-very-secret"), "got: {dbg}");
        assert!(dbg.contains("redacted"));
    }
}
