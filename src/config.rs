use thiserror::Error;

pub const ENV_ENDPOINT: &str = "INPAINT_ENDPOINT";
pub const ENV_RESULTS_ENDPOINT: &str = "INPAINT_RESULTS_ENDPOINT";
pub const ENV_AUTH_TOKEN: &str = "INPAINT_AUTH_TOKEN";
pub const ENV_APP_CHECK_TOKEN: &str = "INPAINT_APP_CHECK_TOKEN";
pub const ENV_PRO_CLIENT: &str = "INPAINT_PRO_CLIENT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where the inpainting and result-upload services live and how to authenticate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// Result-upload endpoint; uploads are skipped when unset
    pub results_endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub app_check_token: Option<String>,
    pub pro_client: Option<String>,
}

impl ServiceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let endpoint = optional(ENV_ENDPOINT).ok_or(ConfigError::Missing(ENV_ENDPOINT))?;
        check_url(ENV_ENDPOINT, &endpoint)?;

        let results_endpoint = optional(ENV_RESULTS_ENDPOINT);
        if let Some(url) = &results_endpoint {
            check_url(ENV_RESULTS_ENDPOINT, url)?;
        }

        Ok(Self {
            endpoint,
            results_endpoint,
            auth_token: optional(ENV_AUTH_TOKEN),
            app_check_token: optional(ENV_APP_CHECK_TOKEN),
            pro_client: optional(ENV_PRO_CLIENT),
        })
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name,
            reason: format!("expected an http(s) URL, got {value:?}"),
        })
    }
}
