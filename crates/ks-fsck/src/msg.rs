use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// How a reported problem is treated.
///
/// `Info` and `Fatal` exist only as built-in defaults; configuration may set
/// `ignore`, `warn` or `error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ignore,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Parse a configured action. Only `ignore`, `warn` and `error` are
    /// accepted, case-insensitively.
    pub fn parse_action(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ignore" => Some(Self::Ignore),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named structural checks applied to a tag payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FsckMsgId {
    NulInHeader,
    UnterminatedHeader,
    MissingObject,
    BadObjectSha1,
    MissingTypeEntry,
    MissingType,
    BadType,
    MissingTagEntry,
    MissingTag,
    BadTagName,
    MissingTaggerEntry,
    MissingNameBeforeEmail,
    BadName,
    MissingEmail,
    MissingSpaceBeforeEmail,
    BadEmail,
    MissingSpaceBeforeDate,
    ZeroPaddedDate,
    BadDateOverflow,
    BadDate,
    BadTimezone,
    ExtraHeaderEntry,
    DuplicateEntry,
}

impl FsckMsgId {
    pub const ALL: [FsckMsgId; 23] = [
        Self::NulInHeader,
        Self::UnterminatedHeader,
        Self::MissingObject,
        Self::BadObjectSha1,
        Self::MissingTypeEntry,
        Self::MissingType,
        Self::BadType,
        Self::MissingTagEntry,
        Self::MissingTag,
        Self::BadTagName,
        Self::MissingTaggerEntry,
        Self::MissingNameBeforeEmail,
        Self::BadName,
        Self::MissingEmail,
        Self::MissingSpaceBeforeEmail,
        Self::BadEmail,
        Self::MissingSpaceBeforeDate,
        Self::ZeroPaddedDate,
        Self::BadDateOverflow,
        Self::BadDate,
        Self::BadTimezone,
        Self::ExtraHeaderEntry,
        Self::DuplicateEntry,
    ];

    /// The camelCase name used in diagnostics and configuration keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NulInHeader => "nulInHeader",
            Self::UnterminatedHeader => "unterminatedHeader",
            Self::MissingObject => "missingObject",
            Self::BadObjectSha1 => "badObjectSha1",
            Self::MissingTypeEntry => "missingTypeEntry",
            Self::MissingType => "missingType",
            Self::BadType => "badType",
            Self::MissingTagEntry => "missingTagEntry",
            Self::MissingTag => "missingTag",
            Self::BadTagName => "badTagName",
            Self::MissingTaggerEntry => "missingTaggerEntry",
            Self::MissingNameBeforeEmail => "missingNameBeforeEmail",
            Self::BadName => "badName",
            Self::MissingEmail => "missingEmail",
            Self::MissingSpaceBeforeEmail => "missingSpaceBeforeEmail",
            Self::BadEmail => "badEmail",
            Self::MissingSpaceBeforeDate => "missingSpaceBeforeDate",
            Self::ZeroPaddedDate => "zeroPaddedDate",
            Self::BadDateOverflow => "badDateOverflow",
            Self::BadDate => "badDate",
            Self::BadTimezone => "badTimezone",
            Self::ExtraHeaderEntry => "extraHeaderEntry",
            Self::DuplicateEntry => "duplicateEntry",
        }
    }

    /// Built-in severity before any override.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NulInHeader => Severity::Fatal,
            Self::BadTagName | Self::MissingTaggerEntry => Severity::Info,
            Self::ExtraHeaderEntry => Severity::Ignore,
            _ => Severity::Error,
        }
    }

    /// Checks without which no reference can be extracted from the payload.
    ///
    /// These may be configured as `warn` or `error` but never `ignore`.
    pub fn is_essential(&self) -> bool {
        matches!(
            self,
            Self::MissingObject
                | Self::BadObjectSha1
                | Self::MissingTypeEntry
                | Self::MissingType
                | Self::BadType
                | Self::MissingTagEntry
                | Self::MissingTag
        )
    }
}

impl fmt::Display for FsckMsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FsckMsgId {
    type Err = PolicyError;

    /// Case-insensitive; underscores are accepted in place of camelCase
    /// word boundaries (`missing_tagger_entry`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|id| id.name().to_ascii_lowercase() == wanted)
            .ok_or_else(|| PolicyError::UnknownMessageId(s.to_string()))
    }
}
