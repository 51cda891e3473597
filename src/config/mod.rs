use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::offers::FetchSettings;
use crate::core::retry::RetryPolicy;
use crate::core::token::TokenSettings;
use crate::utils::error::{GatewayError, Result};
use crate::utils::validation::{
    validate_currency_code, validate_non_empty_string, validate_positive_number, validate_url,
    Validate,
};

const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_MARGIN_SECS: u64 = 300;
const DEFAULT_OFFERS_TTL_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub amadeus: AmadeusConfig,
    pub retry: Option<RetryConfig>,
    pub cache: Option<CacheConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmadeusConfig {
    pub token_url: String,
    pub offers_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub currency: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub token_expiry_margin_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub initial_wait_ms: Option<u64>,
    pub max_wait_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub offers_ttl_seconds: Option<u64>,
}

impl GatewayConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GatewayError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GatewayError::InvalidConfigValue {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` placeholders with environment values so
    /// secrets stay out of the config file. Unknown variables are left
    /// untouched and caught by validation.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("amadeus.token_url", &self.amadeus.token_url)?;
        validate_url("amadeus.offers_url", &self.amadeus.offers_url)?;
        validate_non_empty_string("amadeus.client_id", &self.amadeus.client_id)?;
        validate_non_empty_string("amadeus.client_secret", &self.amadeus.client_secret)?;

        if let Some(currency) = &self.amadeus.currency {
            validate_currency_code("amadeus.currency", currency)?;
        }

        if let Some(retry) = &self.retry {
            if let Some(attempts) = retry.max_attempts {
                validate_positive_number("retry.max_attempts", attempts as u64, 1)?;
            }
            if let Some(wait) = retry.initial_wait_ms {
                validate_positive_number("retry.initial_wait_ms", wait, 1)?;
            }
        }

        if let Some(cache) = &self.cache {
            if let Some(ttl) = cache.offers_ttl_seconds {
                validate_positive_number("cache.offers_ttl_seconds", ttl, 1)?;
            }
        }

        Ok(())
    }

    pub fn currency(&self) -> &str {
        self.amadeus.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.amadeus
                .request_timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn token_expiry_margin(&self) -> Duration {
        Duration::from_secs(
            self.amadeus
                .token_expiry_margin_seconds
                .unwrap_or(DEFAULT_TOKEN_MARGIN_SECS),
        )
    }

    pub fn offers_ttl(&self) -> Duration {
        let secs = self
            .cache
            .as_ref()
            .and_then(|c| c.offers_ttl_seconds)
            .unwrap_or(DEFAULT_OFFERS_TTL_SECS);
        Duration::from_secs(secs)
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            token_url: self.amadeus.token_url.clone(),
            client_id: self.amadeus.client_id.clone(),
            client_secret: self.amadeus.client_secret.clone(),
            expiry_margin: self.token_expiry_margin(),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            offers_url: self.amadeus.offers_url.clone(),
            currency: self.currency().to_string(),
            cache_ttl: self.offers_ttl(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(retry) = &self.retry {
            if let Some(attempts) = retry.max_attempts {
                policy.max_attempts = attempts;
            }
            if let Some(wait) = retry.initial_wait_ms {
                policy.initial_wait = Duration::from_millis(wait);
            }
            if let Some(wait) = retry.max_wait_ms {
                policy.max_wait = Duration::from_millis(wait);
            }
        }
        policy
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
