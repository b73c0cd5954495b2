//! Query layer configuration, loadable from YAML

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OrmResult;
use crate::sql::PlaceholderStyle;

/// Query compilation and logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Token emitted for each binding
    pub placeholder_style: PlaceholderStyle,
    /// Log compiled statements at debug level
    pub log_queries: bool,
    pub tables: TablePrefixConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::default(),
            log_queries: true,
            tables: TablePrefixConfig::default(),
        }
    }
}

impl QueryConfig {
    pub fn from_yaml_str(yaml: &str) -> OrmResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> OrmResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> OrmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

/// Table prefixes applied by [`PrefixTableResolver`](crate::backends::PrefixTableResolver)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablePrefixConfig {
    /// Prefix for scoped tables
    pub prefix: String,
    /// Prefix for every other table
    pub base_prefix: String,
    pub scoped_tables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = QueryConfig::from_yaml_str("placeholder_style: numbered\n").unwrap();
        assert_eq!(config.placeholder_style, PlaceholderStyle::Numbered);
        assert!(config.log_queries);
        assert_eq!(config.tables, TablePrefixConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "placeholder_style: typed\nlog_queries: false\ntables:\n  prefix: wp_2_\n  base_prefix: wp_\n  scoped_tables: [posts, postmeta]"
        )
        .unwrap();

        let config = QueryConfig::load(file.path()).unwrap();
        assert_eq!(config.placeholder_style, PlaceholderStyle::Typed);
        assert!(!config.log_queries);
        assert_eq!(config.tables.prefix, "wp_2_");
        assert_eq!(config.tables.scoped_tables, vec!["posts", "postmeta"]);
    }

    #[test]
    fn test_invalid_yaml_is_a_configuration_error() {
        let err = QueryConfig::from_yaml_str("placeholder_style: [").unwrap_err();
        assert!(matches!(err, crate::error::OrmError::Configuration(_)));

        let err = QueryConfig::load("/nonexistent/query.yaml").unwrap_err();
        assert!(matches!(err, crate::error::OrmError::Configuration(_)));
    }
}
