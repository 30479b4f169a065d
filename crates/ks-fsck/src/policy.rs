use std::collections::BTreeMap;

use crate::error::PolicyError;
use crate::msg::{FsckMsgId, Severity};

/// Mapping from message id to the action taken when that check trips.
///
/// Resolution order for a message id:
///
/// 1. the built-in default ([`FsckMsgId::default_severity`]);
/// 2. the most recent override set on this policy;
/// 3. `fatal` reports as `error` and `info` reports as `warn`;
/// 4. in strict mode `warn` becomes `error`.
///
/// Each invocation owns its policy; nothing here is global.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityPolicy {
    overrides: BTreeMap<FsckMsgId, Severity>,
    strict: bool,
}

impl SeverityPolicy {
    /// Built-in defaults, warnings left as warnings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in defaults with warnings escalated to errors.
    pub fn strict() -> Self {
        Self {
            overrides: BTreeMap::new(),
            strict: true,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Override the action for one message id.
    ///
    /// Fatal checks cannot be set to anything but `error`; checks needed to
    /// identify the tagged object cannot be ignored.
    pub fn set(&mut self, id: FsckMsgId, severity: Severity) -> Result<(), PolicyError> {
        if id.default_severity() == Severity::Fatal && severity != Severity::Error {
            return Err(PolicyError::CannotDemote { id, to: severity });
        }
        if id.is_essential() && severity == Severity::Ignore {
            return Err(PolicyError::CannotDemote { id, to: severity });
        }
        self.overrides.insert(id, severity);
        Ok(())
    }

    /// Override by configuration key and value, e.g.
    /// `("extraHeaderEntry", "ignore")`.
    pub fn set_by_name(&mut self, name: &str, value: &str) -> Result<(), PolicyError> {
        let id: FsckMsgId = name.parse()?;
        let severity = Severity::parse_action(value).ok_or_else(|| PolicyError::UnknownSeverity {
            id,
            value: value.to_string(),
        })?;
        self.set(id, severity)
    }

    /// Apply an ordered list of overrides; later entries win.
    pub fn apply<I, K, V>(&mut self, overrides: I) -> Result<(), PolicyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in overrides {
            self.set_by_name(name.as_ref(), value.as_ref())?;
        }
        Ok(())
    }

    /// The configured action before reporting adjustments.
    pub fn configured(&self, id: FsckMsgId) -> Severity {
        self.overrides
            .get(&id)
            .copied()
            .unwrap_or_else(|| id.default_severity())
    }

    /// The effective action: one of `Ignore`, `Warn` or `Error`.
    pub fn resolve(&self, id: FsckMsgId) -> Severity {
        match self.configured(id) {
            Severity::Fatal => Severity::Error,
            Severity::Info | Severity::Warn if self.strict => Severity::Error,
            Severity::Info => Severity::Warn,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_strict() {
        let policy = SeverityPolicy::new();
        assert_eq!(policy.resolve(FsckMsgId::MissingTaggerEntry), Severity::Warn);
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Ignore);
        assert_eq!(policy.resolve(FsckMsgId::NulInHeader), Severity::Error);
        assert_eq!(policy.resolve(FsckMsgId::BadDate), Severity::Error);
    }

    #[test]
    fn strict_escalates_info_and_warn() {
        let mut policy = SeverityPolicy::strict();
        assert_eq!(policy.resolve(FsckMsgId::MissingTaggerEntry), Severity::Error);
        policy.set(FsckMsgId::ExtraHeaderEntry, Severity::Warn).unwrap();
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Error);
    }

    #[test]
    fn later_override_wins() {
        let mut policy = SeverityPolicy::strict();
        policy
            .apply([
                ("extraHeaderEntry", "warn"),
                ("extraheaderentry", "ignore"),
            ])
            .unwrap();
        assert_eq!(policy.resolve(FsckMsgId::ExtraHeaderEntry), Severity::Ignore);
    }

    #[test]
    fn fatal_cannot_be_demoted() {
        let mut policy = SeverityPolicy::strict();
        let err = policy.set(FsckMsgId::NulInHeader, Severity::Warn).unwrap_err();
        assert_eq!(
            err,
            PolicyError::CannotDemote {
                id: FsckMsgId::NulInHeader,
                to: Severity::Warn
            }
        );
        assert!(policy.set(FsckMsgId::NulInHeader, Severity::Error).is_ok());
    }

    #[test]
    fn essential_cannot_be_ignored() {
        let mut policy = SeverityPolicy::new();
        assert!(policy.set(FsckMsgId::MissingObject, Severity::Ignore).is_err());
        assert!(policy.set(FsckMsgId::MissingObject, Severity::Warn).is_ok());
    }

    #[test]
    fn bad_value_is_rejected() {
        let mut policy = SeverityPolicy::new();
        let err = policy.set_by_name("badDate", "sometimes").unwrap_err();
        assert!(matches!(err, PolicyError::UnknownSeverity { id: FsckMsgId::BadDate, .. }));
    }

    #[test]
    fn failed_apply_keeps_earlier_entries() {
        let mut policy = SeverityPolicy::new();
        let result = policy.apply([("badDate", "ignore"), ("bogus", "ignore")]);
        assert!(result.is_err());
        assert_eq!(policy.configured(FsckMsgId::BadDate), Severity::Ignore);
    }
}
