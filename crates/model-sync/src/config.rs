//! Sync configuration parsed from TOML
//!
//! Every key is optional:
//!
//! ```toml
//! host = "primary"
//! local-indexed-add = true
//! local-types = ["host"]
//! includes-types = ["profile", "socket-binding-group"]
//!
//! [ignored.profile]
//! names = ["legacy"]
//!
//! [ignored.extension]
//! wildcard = true
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use model_controller::domain::{PROFILE, SOCKET_BINDING_GROUP};
use model_tree::{HOST, IgnoredResources, PathElement};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Host name used when none is configured
pub const DEFAULT_HOST: &str = "primary";

/// Options controlling how a secondary reconciles its model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SyncOptions {
    /// Name of the local host, whose servers receive reload/restart signals
    pub host: String,
    /// Whether the local model supports adds at an index within ordered
    /// collections
    pub local_indexed_add: bool,
    /// Top-level types owned by this process and never reconciled
    pub local_types: BTreeSet<String>,
    /// Top-level resources this process does not hold
    pub ignored: IgnoredResources,
    /// Top-level types whose `includes` are validated
    pub includes_types: BTreeSet<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            local_indexed_add: true,
            local_types: BTreeSet::from([HOST.to_string()]),
            ignored: IgnoredResources::new(),
            includes_types: BTreeSet::from([PROFILE.to_string(), SOCKET_BINDING_GROUP.to_string()]),
        }
    }
}

impl SyncOptions {
    /// Parse options from TOML content.
    ///
    /// # Example
    ///
    /// ```
    /// use model_sync::SyncOptions;
    ///
    /// let options = SyncOptions::parse("local-indexed-add = false").unwrap();
    /// assert!(!options.local_indexed_add);
    /// assert!(options.local_types.contains("host"));
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `ConfigParse` if it is not
    /// valid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let options = Self::parse(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded sync options");
        Ok(options)
    }

    /// Whether a top-level element is left alone by reconciliation.
    pub fn is_skipped(&self, element: &PathElement) -> bool {
        self.local_types.contains(&element.key) || self.ignored.is_ignored(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let options = SyncOptions::parse("").unwrap();
        assert_eq!(options, SyncOptions::default());
        assert_eq!(options.host, "primary");
        assert!(options.local_indexed_add);
    }

    #[test]
    fn ignored_table_is_parsed() {
        let options = SyncOptions::parse(
            r#"
host = "secondary"

[ignored.profile]
names = ["legacy"]

[ignored.extension]
wildcard = true
"#,
        )
        .unwrap();

        assert_eq!(options.host, "secondary");
        assert!(options.is_skipped(&PathElement::new("profile", "legacy")));
        assert!(!options.is_skipped(&PathElement::new("profile", "full")));
        assert!(options.is_skipped(&PathElement::new("extension", "anything")));
        assert!(options.is_skipped(&PathElement::new("host", "primary")));
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(matches!(
            SyncOptions::parse("local-indexed-add = \"yes\""),
            Err(Error::Toml(_))
        ));
    }
}
