use crate::error::{AuthError, Result};
use std::fmt;

/// Default scope requested by the client-credentials grant.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Application credentials for the client-credentials grant.
///
/// Constructed once at client startup. The secret is never logged; the
/// `Debug` implementation redacts it.
///
/// # Examples
///
/// ```
/// use core_auth::ClientCredentials;
///
/// let creds = ClientCredentials::new("app-id", "app-secret", "contoso.onmicrosoft.com").unwrap();
/// assert!(creds.token_url().ends_with("/contoso.onmicrosoft.com/oauth2/v2.0/token"));
/// ```
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    token_url: String,
    scope: String,
}

impl ClientCredentials {
    /// Create credentials for a tenant using the public token endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfig` if any value is blank.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Result<Self> {
        let tenant_id = tenant_id.into();
        let token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            tenant_id.trim()
        );

        Self::with_endpoint(client_id, client_secret, tenant_id, token_url, DEFAULT_SCOPE)
    }

    /// Create credentials with an explicit token endpoint and scope.
    pub fn with_endpoint(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        token_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self> {
        let creds = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            token_url: token_url.into(),
            scope: scope.into(),
        };

        for (name, value) in [
            ("client_id", &creds.client_id),
            ("client_secret", &creds.client_secret),
            ("tenant_id", &creds.tenant_id),
            ("token_url", &creds.token_url),
            ("scope", &creds.scope),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        Ok(creds)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Bearer token issued by the token endpoint.
///
/// Tokens carry no expiry tracking: a stale token makes the next request
/// fail with an auth error and the caller decides whether to invalidate.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, for the `Authorization` header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_default_endpoint() {
        let creds = ClientCredentials::new("id", "secret", "tenant").unwrap();

        assert_eq!(
            creds.token_url(),
            "https://login.microsoftonline.com/tenant/oauth2/v2.0/token"
        );
        assert_eq!(creds.scope(), DEFAULT_SCOPE);
    }

    #[test]
    fn test_credentials_reject_blank_values() {
        let result = ClientCredentials::new("id", "", "tenant");
        assert!(matches!(result, Err(AuthError::InvalidConfig(msg)) if msg.contains("client_secret")));

        let result = ClientCredentials::new(" ", "secret", "tenant");
        assert!(matches!(result, Err(AuthError::InvalidConfig(msg)) if msg.contains("client_id")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ClientCredentials::new("id", "very-secret", "tenant").unwrap();
        assert!(!format!("{:?}", creds).contains("very-secret"));

        let token = AccessToken::new("eyJ0eXAi");
        assert_eq!(format!("{:?}", token), "AccessToken([REDACTED])");
        assert_eq!(token.secret(), "eyJ0eXAi");
    }
}
