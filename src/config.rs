use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub business: BusinessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: i64,
    /// Return the raw reset token in the API response (development only)
    #[serde(default)]
    pub expose_reset_token: bool,
}

fn default_reset_token_ttl() -> i64 {
    60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reset_token_ttl_minutes: default_reset_token_ttl(),
            expose_reset_token: false,
        }
    }
}

/// Shop details printed on invoices and receipts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Tailor Shop".to_string(),
            address: String::new(),
            phone: String::new(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // Without a config file everything comes from the environment
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("failed to parse config file {config_path}: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = get_env("DATABASE_URL").ok_or(
                    "DATABASE_URL is not set and no config.toml was found",
                )?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    auth: AuthConfig::default(),
                    business: BusinessConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("cannot read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("RESET_TOKEN_TTL_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.auth.reset_token_ttl_minutes = n;
        }
        if let Ok(v) = env::var("EXPOSE_RESET_TOKEN") {
            self.auth.expose_reset_token = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(v) = env::var("BUSINESS_NAME") {
            self.business.name = v;
        }
        if let Ok(v) = env::var("BUSINESS_ADDRESS") {
            self.business.address = v;
        }
        if let Ok(v) = env::var("BUSINESS_PHONE") {
            self.business.phone = v;
        }
        if let Ok(v) = env::var("CURRENCY_SYMBOL") {
            self.business.currency_symbol = v;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.jwt.access_token_expires_in <= 0 || self.jwt.refresh_token_expires_in <= 0 {
            return Err("JWT expiry values must be positive".to_string());
        }
        if self.auth.reset_token_ttl_minutes <= 0 {
            return Err("reset_token_ttl_minutes must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/tailor"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 3600
            refresh_token_expires_in = 86400
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.reset_token_ttl_minutes, 60);
        assert!(!config.auth.expose_reset_token);
        assert_eq!(config.business.currency_symbol, "$");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_business_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/tailor"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 3600
            refresh_token_expires_in = 86400

            [auth]
            reset_token_ttl_minutes = 0

            [business]
            name = "Needle & Thread"
            currency_symbol = "€"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.business.name, "Needle & Thread");
        assert_eq!(config.business.currency_symbol, "€");
        assert!(config.validate().is_err());
    }
}
