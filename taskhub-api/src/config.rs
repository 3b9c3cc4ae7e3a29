/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file in the
/// working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated origins, `*` for any (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_KEY`: Service token the bot authenticates with (required)
/// - `ENCRYPTION_KEY`: Hex AES key for stored cards, 16/24/32 bytes (required)
/// - `IV`: Hex 16-byte IV for stored cards (required)
/// - `PLATFORM_COMMISSION`: Commission rate in `[0, 1)` (default: 0.10)
/// - `RESET_TOKEN_TTL_MINUTES`: Password reset token lifetime (default: 30)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskhub_shared::crypto::card::CardCipher;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseSettings,
    pub auth: AuthConfig,
    pub encryption: EncryptionConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed origins; a single `*` allows any
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Service token expected in the `token` header
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub key_hex: String,
    pub iv_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// Share of each transfer the platform keeps
    pub commission_rate: Decimal,

    pub reset_token_ttl_minutes: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", name))
        };

        let host = var_or("API_HOST", "0.0.0.0");
        let port = var_or("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a port number")?;

        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let url = required("DATABASE_URL")?;
        let max_connections = var_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let api_key = required("API_KEY")?;

        let key_hex = required("ENCRYPTION_KEY")?;
        let iv_hex = required("IV")?;
        CardCipher::from_hex(&key_hex, &iv_hex).context("Invalid ENCRYPTION_KEY or IV")?;

        let commission_rate = Decimal::from_str(&var_or("PLATFORM_COMMISSION", "0.10"))
            .context("PLATFORM_COMMISSION must be a decimal number")?;
        if commission_rate < Decimal::ZERO || commission_rate >= Decimal::ONE {
            anyhow::bail!("PLATFORM_COMMISSION must be in [0, 1), got {}", commission_rate);
        }

        let reset_token_ttl_minutes = var_or("RESET_TOKEN_TTL_MINUTES", "30")
            .parse::<i64>()
            .context("RESET_TOKEN_TTL_MINUTES must be an integer")?;
        if reset_token_ttl_minutes <= 0 {
            anyhow::bail!("RESET_TOKEN_TTL_MINUTES must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseSettings {
                url,
                max_connections,
            },
            auth: AuthConfig { api_key },
            encryption: EncryptionConfig { key_hex, iv_hex },
            payments: PaymentsConfig {
                commission_rate,
                reset_token_ttl_minutes,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Cipher for stored card numbers
    pub fn card_cipher(&self) -> anyhow::Result<CardCipher> {
        CardCipher::from_hex(&self.encryption.key_hex, &self.encryption.iv_hex)
            .context("Invalid ENCRYPTION_KEY or IV")
    }

    /// Whether any origin is allowed
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.is_empty() || self.api.cors_origins.iter().any(|o| o == "*")
    }
}
