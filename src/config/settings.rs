//! Application settings loading from config.toml
//!
//! Every section is optional. Missing values fall back to the figures the shop uses
//! today, so a bare deployment only needs `SESSION_SECRET` and `DATABASE_URL`.

use crate::core::terminal::CardMethod;
use crate::errors::{Error, Result};
use rand::{Rng, distributions::Alphanumeric};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default location of the settings file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `[server]` section
    pub server: ServerConfig,
    /// `[session]` section
    pub session: SessionConfig,
    /// `[cash]` section
    pub cash: CashConfig,
    /// `[ledger]` section
    pub ledger: LedgerConfig,
    /// Acquirer fees used by the period report
    pub fees: FeeTable,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Login session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a login stays valid
    pub lifetime_minutes: i64,
    /// Signing key for session cookies, only ever read from `SESSION_SECRET`
    #[serde(skip)]
    pub secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_minutes: 12 * 60,
            secret: String::new(),
        }
    }
}

/// Cash drawer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CashConfig {
    /// Bills and coins counted when opening the drawer
    pub denominations: Vec<f64>,
    /// Share of iFood sales that reaches the shop after platform fees
    pub ifood_net_factor: f64,
}

impl Default for CashConfig {
    fn default() -> Self {
        Self {
            denominations: vec![0.05, 0.10, 0.25, 0.50, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0],
            ifood_net_factor: 0.8,
        }
    }
}

/// Choices offered by the ledger form
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Expense groups offered in the ledger form
    pub categories: Vec<String>,
    /// Payment methods offered in the ledger form
    pub payment_methods: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let categories = [
            "ANUNCIOS",
            "ATACADISTA",
            "BEBIDAS",
            "COMBUSTIVEL",
            "COMPRAS CARTÃO",
            "CONGELADOS",
            "CONTAS FIXAS",
            "EMBALAGENS",
            "EMPRESTIMO",
            "ENTREGADOR",
            "FRIOS",
            "FUNCIONARIO",
            "IFOOD",
            "IMPOSTO / TAXAS",
            "INDIRETOS",
            "LARANJA / HORTA",
            "MERCADO",
            "OUTROS",
            "PÃO",
            "SORVETERIA",
            "VALE",
        ];
        let payment_methods = [
            "Banco Inter",
            "C6",
            "Cartão Credito",
            "Dinheiro",
            "IFOOD",
            "InfinitePay",
            "Itau",
            "Mercado Pago Alex",
            "Mercado Pago Danuze",
            "PagBank",
            "Valori",
        ];
        Self {
            categories: categories.iter().map(ToString::to_string).collect(),
            payment_methods: payment_methods.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Fee charged by one acquirer for one payment method
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeeRate {
    /// Acquirer name as shown in reports, e.g. `"Mercado Pago"`
    pub brand: String,
    /// Payment method the fee applies to
    pub method: CardMethod,
    /// Fraction of the gross amount, e.g. `0.0199` for 1.99%
    pub percent: f64,
}

/// All configured acquirer fees
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct FeeTable(pub Vec<FeeRate>);

impl FeeTable {
    /// Fee for a brand and method; unknown combinations are free.
    #[must_use]
    pub fn percent(&self, brand: &str, method: CardMethod) -> f64 {
        self.0
            .iter()
            .find(|rate| rate.brand == brand && rate.method == method)
            .map_or(0.0, |rate| rate.percent)
    }
}

impl Default for FeeTable {
    fn default() -> Self {
        use CardMethod::{Credit, Debit, Pix};
        let rates = [
            ("Mercado Pago", Debit, 0.0199),
            ("Mercado Pago", Credit, 0.0498),
            ("Mercado Pago", Pix, 0.0049),
            ("Itaú", Debit, 0.0097),
            ("Itaú", Credit, 0.0270),
            ("Itaú", Pix, 0.0),
            ("Valori", Debit, 0.0097),
            ("Valori", Credit, 0.0270),
            ("Valori", Pix, 0.0),
            ("InfinitePay", Debit, 0.0144),
            ("InfinitePay", Credit, 0.0289),
            ("InfinitePay", Pix, 0.0),
            ("C6 (PIX CNPJ)", Pix, 0.0),
        ];
        Self(
            rates
                .into_iter()
                .map(|(brand, method, percent)| FeeRate {
                    brand: brand.to_string(),
                    method,
                    percent,
                })
                .collect(),
        )
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses settings from TOML text and normalizes list ordering.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.ledger.categories.sort();
    config.ledger.payment_methods.sort();
    Ok(config)
}

/// Loads the full application configuration.
///
/// Reads `CONFIG_PATH` (default `config.toml`) when present, then applies the
/// `BIND_ADDR` and `SESSION_SECRET` environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if Path::new(&path).exists() {
        info!("Loading configuration from {}", path);
        load_config(&path)?
    } else {
        info!("No configuration file at {}, using defaults", path);
        AppConfig::default()
    };

    if let Ok(bind_addr) = std::env::var("BIND_ADDR") {
        config.server.bind_addr = bind_addr;
    }

    config.session.secret = match std::env::var("SESSION_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => {
            return Err(Error::Config {
                message: "SESSION_SECRET must be at least 32 characters long".to_string(),
            });
        }
        Err(_) => {
            warn!("SESSION_SECRET not set; sessions will not survive a restart");
            rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(64)
                .map(char::from)
                .collect()
        }
    };

    if !(0.0..=1.0).contains(&config.cash.ifood_net_factor) {
        return Err(Error::Config {
            message: format!(
                "cash.ifood_net_factor must be between 0 and 1, got {}",
                config.cash.ifood_net_factor
            ),
        });
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_defaults_match_shop_figures() {
        let config = AppConfig::default();
        assert_eq!(config.cash.denominations.len(), 11);
        assert_eq!(config.cash.ifood_net_factor, 0.8);
        assert_eq!(config.server.bind_addr, "127.0.0.1:5000");
        assert!(config.ledger.categories.contains(&"MERCADO".to_string()));
        assert_eq!(config.fees.percent("Mercado Pago", CardMethod::Credit), 0.0498);
        assert_eq!(config.fees.percent("Itaú", CardMethod::Pix), 0.0);
    }

    #[test]
    fn test_unknown_fee_is_zero() {
        let config = AppConfig::default();
        assert_eq!(config.fees.percent("C6 (PIX CNPJ)", CardMethod::Debit), 0.0);
        assert_eq!(config.fees.percent("Stone", CardMethod::Credit), 0.0);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [server]
            bind_addr = "0.0.0.0:8080"

            [ledger]
            categories = ["GÁS", "BEBIDAS"]

            [[fees]]
            brand = "Stone"
            method = "credit"
            percent = 0.031
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.ledger.categories, vec!["BEBIDAS", "GÁS"]);
        // Untouched sections keep their defaults
        assert_eq!(config.cash.ifood_net_factor, 0.8);
        assert_eq!(config.session.lifetime_minutes, 720);
        assert_eq!(config.fees.percent("Stone", CardMethod::Credit), 0.031);
        assert_eq!(config.fees.percent("Mercado Pago", CardMethod::Debit), 0.0);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = parse_config("[server\nbind_addr = 1");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
