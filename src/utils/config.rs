use crate::runner::state::RunContext;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the report destination
pub const URL_ENV: &str = "LUMI_REPORTER_URL";

/// Reporter configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReporterConfig {
    /// Report destination URL
    #[serde(alias = "powerbiURL", alias = "powerbiUrl")]
    pub url: Option<String>,

    /// Name of the project/product
    pub product: String,

    /// Name of the repository/component under test
    pub component: String,

    /// Environment the run targets (QA, PROD, DEV)
    pub environment: String,

    /// Name of the collection being executed
    pub collection: String,
}

/// Per-field overrides, typically from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub product: Option<String>,
    pub component: Option<String>,
    pub environment: Option<String>,
    pub collection: Option<String>,
}

impl ReporterConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid reporter config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Resolve config from an optional file, the environment and overrides (highest wins last)
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config
            .with_env_url(std::env::var(URL_ENV).ok())
            .merge(overrides))
    }

    pub fn with_env_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.url = Some(url);
        }
        self
    }

    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = Some(url);
        }
        if let Some(product) = overrides.product {
            self.product = product;
        }
        if let Some(component) = overrides.component {
            self.component = component;
        }
        if let Some(environment) = overrides.environment {
            self.environment = environment;
        }
        if let Some(collection) = overrides.collection {
            self.collection = collection;
        }
        self
    }

    /// Destination URL, if one is set and non-blank
    pub fn destination(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn into_context(self) -> RunContext {
        RunContext::new(
            &self.product,
            &self.component,
            &self.environment,
            &self.collection,
            self.destination(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
url: https://dashboard.example.com/rows
product: Shop
component: checkout-api
environment: QA
collection: Shop API
"#;
        let config = ReporterConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.destination(), Some("https://dashboard.example.com/rows"));
        assert_eq!(config.product, "Shop");
        assert_eq!(config.collection, "Shop API");
    }

    #[test]
    fn test_parse_yaml_alias_and_defaults() {
        let config = ReporterConfig::from_yaml_str("powerbiUrl: http://bi.local/push\n").unwrap();
        assert_eq!(config.destination(), Some("http://bi.local/push"));
        assert_eq!(config.product, "");

        let config = ReporterConfig::from_yaml_str("powerbiURL: http://bi.local/rows\n").unwrap();
        assert_eq!(config.destination(), Some("http://bi.local/rows"));

        assert_eq!(ReporterConfig::from_yaml_str("").unwrap(), ReporterConfig::default());
        assert!(ReporterConfig::from_yaml_str("product: [unclosed").is_err());
    }

    #[test]
    fn test_precedence() {
        let file = ReporterConfig::from_yaml_str("url: http://file.local\nproduct: FromFile\n").unwrap();

        let config = file
            .clone()
            .with_env_url(Some("http://env.local".to_string()))
            .merge(ConfigOverrides {
                product: Some("FromCli".to_string()),
                ..Default::default()
            });
        assert_eq!(config.destination(), Some("http://env.local"));
        assert_eq!(config.product, "FromCli");

        let config = file.with_env_url(Some("  ".to_string())).merge(ConfigOverrides {
            url: Some("http://cli.local".to_string()),
            ..Default::default()
        });
        assert_eq!(config.destination(), Some("http://cli.local"));
    }

    #[test]
    fn test_blank_url_is_absent() {
        let config = ReporterConfig {
            url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.destination(), None);
        assert_eq!(config.into_context().report_endpoint, None);
    }
}
