//! Bearer token acquisition for Azure Resource Manager

use crate::arm::types::{CliToken, OAuthToken};
use crate::arm::build_http_client;
use crate::{CollectorError, Result};
use std::fmt;
use std::process::Command;
use tracing::{debug, info};

/// Microsoft Entra ID authority for the public cloud
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// An ARM bearer token
///
/// The secret never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Where the ARM token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Pre-issued token (e.g., `AZURE_ACCESS_TOKEN`)
    Static(AccessToken),

    /// Service principal with a client secret
    ClientCredentials {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },

    /// Signed-in Azure CLI session
    AzureCli,
}

impl TokenSource {
    /// Pick a source from whatever credentials are present
    ///
    /// A static token wins, then a complete set of client credentials, then
    /// the Azure CLI.
    pub fn resolve(
        access_token: Option<String>,
        tenant_id: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(access_token) {
            return TokenSource::Static(AccessToken::new(token));
        }

        match (non_empty(tenant_id), non_empty(client_id), non_empty(client_secret)) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                TokenSource::ClientCredentials {
                    tenant_id,
                    client_id,
                    client_secret,
                }
            }
            _ => TokenSource::AzureCli,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenSource::Static(_) => "access token",
            TokenSource::ClientCredentials { .. } => "service principal",
            TokenSource::AzureCli => "Azure CLI",
        }
    }

    /// Obtain a token for the given ARM endpoint
    pub fn acquire(&self, endpoint: &str, authority: &str) -> Result<AccessToken> {
        info!(source = self.describe(), "Acquiring ARM access token");

        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ClientCredentials {
                tenant_id,
                client_id,
                client_secret,
            } => client_credentials_token(authority, endpoint, tenant_id, client_id, client_secret),
            TokenSource::AzureCli => azure_cli_token(endpoint),
        }
    }
}

/// OAuth2 scope for an ARM endpoint
pub(crate) fn scope_for(endpoint: &str) -> String {
    format!("{}/.default", endpoint.trim_end_matches('/'))
}

fn client_credentials_token(
    authority: &str,
    endpoint: &str,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        authority.trim_end_matches('/'),
        tenant_id
    );
    let scope = scope_for(endpoint);
    debug!(%url, %scope, "Requesting client credentials token");

    let client = build_http_client()?;
    let response = client
        .post(&url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope.as_str()),
        ])
        .send()
        .map_err(|e| CollectorError::Authentication(format!("Token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|e| CollectorError::Authentication(format!("Token response unreadable: {}", e)))?;
    if !status.is_success() {
        return Err(CollectorError::Authentication(format!(
            "Token endpoint returned HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let token: OAuthToken = serde_json::from_str(&body)
        .map_err(|e| CollectorError::Authentication(format!("Invalid token response: {}", e)))?;
    Ok(AccessToken::new(token.access_token))
}

fn azure_cli_token(endpoint: &str) -> Result<AccessToken> {
    let program = if cfg!(windows) { "az.cmd" } else { "az" };
    let resource = format!("{}/", endpoint.trim_end_matches('/'));

    let output = Command::new(program)
        .args([
            "account",
            "get-access-token",
            "--resource",
            resource.as_str(),
            "--output",
            "json",
        ])
        .output()
        .map_err(|e| {
            CollectorError::Authentication(format!("Failed to run Azure CLI ({}): {}", program, e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollectorError::Authentication(format!(
            "Azure CLI could not issue a token (run `az login`): {}",
            stderr.trim()
        )));
    }

    parse_cli_token(&output.stdout)
}

fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken> {
    let token: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| CollectorError::Authentication(format!("Invalid Azure CLI output: {}", e)))?;
    Ok(AccessToken::new(token.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::DEFAULT_ENDPOINT;

    #[test]
    fn test_resolve_prefers_static_token() {
        let source = TokenSource::resolve(
            Some("token".to_string()),
            Some("tenant".to_string()),
            Some("client".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(source, TokenSource::Static(AccessToken::new("token")));
    }

    #[test]
    fn test_resolve_client_credentials() {
        let source = TokenSource::resolve(
            Some("  ".to_string()),
            Some("tenant".to_string()),
            Some("client".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(source.describe(), "service principal");
    }

    #[test]
    fn test_resolve_falls_back_to_cli() {
        let source = TokenSource::resolve(
            None,
            Some("tenant".to_string()),
            None,
            Some("secret".to_string()),
        );
        assert_eq!(source, TokenSource::AzureCli);
    }

    #[test]
    fn test_static_acquire() {
        let token = TokenSource::Static(AccessToken::new("abc"))
            .acquire(DEFAULT_ENDPOINT, DEFAULT_AUTHORITY)
            .unwrap();
        assert_eq!(token.secret(), "abc");
    }

    #[test]
    fn test_token_debug_redacted() {
        let token = AccessToken::new("super-secret");
        assert_eq!(format!("{:?}", token), "AccessToken(***)");
    }

    #[test]
    fn test_scope() {
        assert_eq!(
            scope_for(DEFAULT_ENDPOINT),
            "https://management.azure.com/.default"
        );
        assert_eq!(
            scope_for("https://management.usgovcloudapi.net/"),
            "https://management.usgovcloudapi.net/.default"
        );
    }

    #[test]
    fn test_parse_cli_token() {
        let token = parse_cli_token(
            br#"{"accessToken": "eyJ0", "expiresOn": "2026-10-17 12:00:00", "tokenType": "Bearer"}"#,
        )
        .unwrap();
        assert_eq!(token.secret(), "eyJ0");

        assert!(matches!(
            parse_cli_token(b"not json"),
            Err(CollectorError::Authentication(_))
        ));
    }
}
