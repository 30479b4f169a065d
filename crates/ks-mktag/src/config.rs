use std::path::Path;

use ks_fsck::SeverityPolicy;
use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::mktag_policy;

/// Store-level configuration read from `<store>/config.toml`.
///
/// ```toml
/// [core]
/// use_replace_refs = false
///
/// [fsck]
/// extraHeaderEntry = "ignore"
/// badTagName = "error"
/// ```
///
/// Every field is optional; a missing file is the same as an empty one.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MktagConfig {
    pub core: CoreConfig,
    /// Message id to action, applied in file order.
    pub fsck: toml::Table,
}

/// The `[core]` table.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Follow replacement records when verifying the tagged object.
    pub use_replace_refs: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            use_replace_refs: true,
        }
    }
}

impl MktagConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loading config");
                Self::from_toml_str(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The `[fsck]` entries as `(id, action)` pairs, in file order.
    pub fn fsck_overrides(&self) -> Result<Vec<(&str, &str)>, ConfigError> {
        self.fsck
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(action) => Ok((key.as_str(), action)),
                None => Err(ConfigError::NonStringValue { key: key.clone() }),
            })
            .collect()
    }

    /// Build the effective policy: [`mktag_policy`], then the `[fsck]`
    /// table, then `cli_overrides`. Later settings win.
    pub fn severity_policy(
        &self,
        cli_overrides: &[(String, String)],
    ) -> Result<SeverityPolicy, ConfigError> {
        let mut policy = mktag_policy();
        policy.apply(self.fsck_overrides()?)?;
        policy.apply(cli_overrides.iter().map(|(id, action)| (id, action)))?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_fsck::{FsckMsgId, PolicyError, Severity};

    fn pair(id: &str, action: &str) -> (String, String) {
        (id.to_string(), action.to_string())
    }

    #[test]
    fn empty_config_is_default() {
        let config = MktagConfig::from_toml_str("").unwrap();
        assert!(config.core.use_replace_refs);
        assert!(config.fsck.is_empty());

        let policy = config.severity_policy(&[]).unwrap();
        assert!(policy.is_strict());
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Error);
    }

    #[test]
    fn parses_core_and_fsck_tables() {
        let config = MktagConfig::from_toml_str(
            "[core]\nuse_replace_refs = false\n\n[fsck]\nextraHeaderEntry = \"ignore\"\n",
        )
        .unwrap();
        assert!(!config.core.use_replace_refs);
        assert_eq!(
            config.fsck_overrides().unwrap(),
            vec![("extraHeaderEntry", "ignore")]
        );
        let policy = config.severity_policy(&[]).unwrap();
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Ignore);
    }

    #[test]
    fn file_order_is_preserved() {
        let config = MktagConfig::from_toml_str(
            "[fsck]\nmissingTaggerEntry = \"ignore\"\nbadTagName = \"ignore\"\nbadDate = \"warn\"\n",
        )
        .unwrap();
        let keys: Vec<&str> = config
            .fsck_overrides()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["missingTaggerEntry", "badTagName", "badDate"]);
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let config =
            MktagConfig::from_toml_str("[fsck]\nextraHeaderEntry = \"ignore\"\n").unwrap();
        let policy = config
            .severity_policy(&[pair("extraHeaderEntry", "error")])
            .unwrap();
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Error);
    }

    #[test]
    fn non_string_value_rejected() {
        let config = MktagConfig::from_toml_str("[fsck]\nbadDate = 1\n").unwrap();
        assert!(matches!(
            config.severity_policy(&[]),
            Err(ConfigError::NonStringValue { key }) if key == "badDate"
        ));
    }

    #[test]
    fn unknown_id_and_bad_action_rejected() {
        let config = MktagConfig::default();
        assert!(matches!(
            config.severity_policy(&[pair("noSuchCheck", "ignore")]),
            Err(ConfigError::Policy(PolicyError::UnknownMessageId(_)))
        ));
        assert!(matches!(
            config.severity_policy(&[pair("badDate", "info")]),
            Err(ConfigError::Policy(PolicyError::UnknownSeverity { .. }))
        ));
    }

    #[test]
    fn essential_checks_cannot_be_ignored() {
        let config = MktagConfig::from_toml_str("[fsck]\nmissingObject = \"ignore\"\n").unwrap();
        assert!(matches!(
            config.severity_policy(&[]),
            Err(ConfigError::Policy(PolicyError::CannotDemote { .. }))
        ));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            MktagConfig::from_toml_str("[core\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = MktagConfig::load(&dir.path().join("config.toml")).unwrap();
        assert!(config.core.use_replace_refs);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[core]\nuse_replace_refs = false\n").unwrap();
        let config = MktagConfig::load(&path).unwrap();
        assert!(!config.core.use_replace_refs);
    }

    #[test]
    fn load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MktagConfig::load(dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }
}
