//! Environment configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. `GRAPH_TOKEN` short-circuits the client-credentials flow.

use crate::error::{LoaderError, Result};

pub const DEFAULT_RESOURCE: &str = "https://graph.microsoft.com/";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// How the client obtains its bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Pre-issued token, used as-is
    Token(String),
    /// OAuth2 client-credentials grant against the tenant's token endpoint
    ClientCredentials {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub auth: AuthConfig,
    /// Site path as accepted by `/sites/{site}`, e.g. `contoso.sharepoint.com:/sites/docs`
    pub site_url: String,
    /// Resource the token is scoped to (`<resource>.default`)
    pub resource: String,
    pub graph_base_url: String,
}

impl Config {
    /// Load `.env` (current directory, then parent) and read the environment
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_path("../.env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| LoaderError::Config(format!("{} is not set", key)))
        };

        let auth = match get("GRAPH_TOKEN") {
            Some(token) => AuthConfig::Token(token),
            None => AuthConfig::ClientCredentials {
                tenant_id: require("TENANT_ID")?,
                client_id: require("CLIENT_ID")?,
                client_secret: require("CLIENT_SECRET")?,
            },
        };

        Ok(Self {
            auth,
            site_url: require("SITE_URL")?,
            resource: get("RESOURCE").unwrap_or_else(|| DEFAULT_RESOURCE.to_string()),
            graph_base_url: get("GRAPH_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string()),
        })
    }
}
