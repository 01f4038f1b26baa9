//! Configuration document formats
//!
//! The format tag is fixed when the first version of a key is created and
//! never changes afterwards. The store treats the value as opaque text; the
//! tag exists so consumers know how to parse what they receive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::StoreError;

/// Supported configuration document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
    Properties,
}

impl ConfigFormat {
    /// Returns the lowercase wire name of the format
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Properties => "properties",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "properties" => Ok(ConfigFormat::Properties),
            other => Err(StoreError::InvalidArgument(format!(
                "unsupported format: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_wire_names() {
        for format in [
            ConfigFormat::Yaml,
            ConfigFormat::Json,
            ConfigFormat::Toml,
            ConfigFormat::Properties,
        ] {
            assert_eq!(format.as_str().parse::<ConfigFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = "xml".parse::<ConfigFormat>().unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_serde_uses_lowercase() {
        let json = serde_json::to_string(&ConfigFormat::Yaml).unwrap();
        assert_eq!(json, "\"yaml\"");
        let parsed: ConfigFormat = serde_json::from_str("\"properties\"").unwrap();
        assert_eq!(parsed, ConfigFormat::Properties);
    }
}
