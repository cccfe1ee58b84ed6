use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::error::{LoaderError, Result};

const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";

/// Source of the bearer token sent with every Graph request
pub trait CredentialProvider {
    fn token(&self) -> Result<String>;
}

/// A token obtained elsewhere (CLI flag, environment, tests)
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// OAuth2 client-credentials grant against the tenant's v2.0 token endpoint
pub struct ClientCredentials {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenError {
    error: Option<String>,
    error_description: Option<String>,
}

impl ClientCredentials {
    pub fn new(
        client: Client,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        resource: &str,
    ) -> Self {
        Self {
            client,
            token_url: format!("{}/{}/oauth2/v2.0/token", LOGIN_BASE_URL, tenant_id),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope_for(resource),
        }
    }

    /// Override the token endpoint (sovereign clouds, local mocks)
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

impl CredentialProvider for ClientCredentials {
    fn token(&self) -> Result<String> {
        tracing::debug!("[Credentials] Requesting token from {}", self.token_url);

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .map_err(|e| LoaderError::Auth(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| LoaderError::Auth(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenError>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or(body);
            return Err(LoaderError::Auth(format!("HTTP {}: {}", status.as_u16(), detail)));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| LoaderError::Auth(format!("invalid token response: {}", e)))?;
        parsed
            .access_token
            .ok_or_else(|| LoaderError::Auth("token response has no access_token".to_string()))
    }
}

/// Build the provider a config asks for
pub fn provider_from_config(
    auth: &AuthConfig,
    resource: &str,
    client: Client,
) -> Box<dyn CredentialProvider> {
    match auth {
        AuthConfig::Token(token) => Box::new(StaticToken::new(token.clone())),
        AuthConfig::ClientCredentials {
            tenant_id,
            client_id,
            client_secret,
        } => Box::new(ClientCredentials::new(
            client,
            tenant_id,
            client_id.clone(),
            client_secret.clone(),
            resource,
        )),
    }
}

/// `https://graph.microsoft.com/` -> `https://graph.microsoft.com/.default`
fn scope_for(resource: &str) -> String {
    format!("{}/.default", resource.trim_end_matches('/'))
}
