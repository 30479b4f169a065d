use std::borrow::Cow;

use ks_types::{ObjectId, ObjectKind};
use tracing::debug;

use crate::error::{FsckError, FsckResult};
use crate::ident::check_ident;
use crate::msg::{FsckMsgId, Severity};
use crate::policy::SeverityPolicy;
use crate::refname::check_refname_format;

/// Header keys that may appear at most once.
static SINGLE_KEYS: [&[u8]; 4] = [b"object ", b"type ", b"tag ", b"tagger "];

const EMPTY: &[u8] = &[];

/// Marker opening an inline signature block in the message.
const SIGNATURE_MARKER: &[u8] = b"-----BEGIN ";

/// A structurally valid tag, borrowing from the payload it was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTag<'a> {
    /// Address of the tagged object.
    pub object: ObjectId,
    /// Declared type of the tagged object.
    pub kind: ObjectKind,
    /// Tag name as written (without `refs/tags/`).
    pub name: &'a [u8],
    /// The tagger identity line, if present.
    pub tagger: Option<&'a [u8]>,
    /// Header lines after `tagger`, not interpreted.
    pub extra_headers: &'a [u8],
    /// Everything after the blank line separating header and message.
    pub message: &'a [u8],
}

impl<'a> ParsedTag<'a> {
    pub fn name_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    /// The trailing signature block of the message, if any.
    ///
    /// The signature is carried opaquely; it is never verified here.
    pub fn signature(&self) -> Option<&'a [u8]> {
        let msg = self.message;
        let mut start = 0;
        let mut found = None;
        while start < msg.len() {
            if msg[start..].starts_with(SIGNATURE_MARKER) {
                found = Some(start);
                break;
            }
            match msg[start..].iter().position(|&b| b == b'\n') {
                Some(nl) => start += nl + 1,
                None => break,
            }
        }
        found.map(|at| &msg[at..])
    }
}

/// Validate a tag payload under `policy`.
///
/// The payload is never modified. Any report the policy does not ignore fails
/// validation with that report; there is no partial acceptance.
pub fn validate<'a>(payload: &'a [u8], policy: &SeverityPolicy) -> FsckResult<ParsedTag<'a>> {
    let checker = Checker { policy };
    let (header, message) = checker.split_header(payload)?;

    let Some(rest) = header.strip_prefix(b"object ") else {
        return Err(checker.fail(
            FsckMsgId::MissingObject,
            "invalid format - expected 'object' line",
        ));
    };
    let (object, rest) = match ObjectId::parse_hex_prefix(rest) {
        Some((id, tail)) if tail.first() == Some(&b'\n') => (id, &tail[1..]),
        _ => {
            return Err(checker.fail(
                FsckMsgId::BadObjectSha1,
                "invalid 'object' line format - bad digest",
            ))
        }
    };

    let rest = checker.skip_duplicates(rest, 1)?;
    let Some(rest) = rest.strip_prefix(b"type ") else {
        return Err(checker.fail(
            FsckMsgId::MissingTypeEntry,
            "invalid format - expected 'type' line",
        ));
    };
    let Some((type_name, rest)) = split_line(rest) else {
        return Err(checker.fail(
            FsckMsgId::MissingType,
            "invalid format - unexpected end after 'type' line",
        ));
    };
    let Some(kind) = ObjectKind::from_name_bytes(type_name) else {
        return Err(checker.fail(FsckMsgId::BadType, "invalid 'type' value"));
    };

    let rest = checker.skip_duplicates(rest, 2)?;
    let Some(rest) = rest.strip_prefix(b"tag ") else {
        return Err(checker.fail(
            FsckMsgId::MissingTagEntry,
            "invalid format - expected 'tag' line",
        ));
    };
    let Some((name, rest)) = split_line(rest) else {
        return Err(checker.fail(
            FsckMsgId::MissingTag,
            "invalid format - unexpected end after 'tag' line",
        ));
    };
    let mut refname = b"refs/tags/".to_vec();
    refname.extend_from_slice(name);
    if check_refname_format(&refname).is_err() {
        checker.report(
            FsckMsgId::BadTagName,
            format!("invalid 'tag' name: {}", String::from_utf8_lossy(name)),
        )?;
    }

    let rest = checker.skip_duplicates(rest, 3)?;
    let (tagger, rest) = match rest.strip_prefix(b"tagger ") {
        Some(after) => {
            let (line, tail) = split_line(after).unwrap_or((after, EMPTY));
            if let Err((id, message)) = check_ident(line) {
                checker.report(id, message)?;
            }
            (Some(line), tail)
        }
        None => {
            checker.report(
                FsckMsgId::MissingTaggerEntry,
                "invalid format - expected 'tagger' line",
            )?;
            (None, rest)
        }
    };

    checker.check_trailing_headers(rest)?;

    Ok(ParsedTag {
        object,
        kind,
        name,
        tagger,
        extra_headers: rest,
        message,
    })
}

/// Split at the first newline, returning the line and what follows it.
fn split_line(input: &[u8]) -> Option<(&[u8], &[u8])> {
    let nl = input.iter().position(|&b| b == b'\n')?;
    Some((&input[..nl], &input[nl + 1..]))
}

struct Checker<'p> {
    policy: &'p SeverityPolicy,
}

impl Checker<'_> {
    /// Report a problem; `Ok` only when the policy ignores it.
    fn report(&self, id: FsckMsgId, message: impl Into<String>) -> FsckResult<()> {
        let message = message.into();
        match self.policy.resolve(id) {
            Severity::Ignore => {
                debug!(%id, %message, "ignoring fsck message");
                Ok(())
            }
            severity => Err(FsckError {
                id,
                severity,
                message,
            }),
        }
    }

    /// Report a problem after which parsing cannot continue.
    fn fail(&self, id: FsckMsgId, message: &str) -> FsckError {
        let severity = match self.policy.resolve(id) {
            Severity::Ignore => Severity::Error,
            other => other,
        };
        FsckError {
            id,
            severity,
            message: message.to_string(),
        }
    }

    /// Separate the header from the message.
    ///
    /// The header ends at the first empty line. A payload with no empty line
    /// is all header and must end with a newline.
    fn split_header<'a>(&self, payload: &'a [u8]) -> FsckResult<(&'a [u8], &'a [u8])> {
        for (i, &b) in payload.iter().enumerate() {
            match b {
                0 => {
                    self.report(
                        FsckMsgId::NulInHeader,
                        format!("unterminated header: NUL at offset {i}"),
                    )?;
                }
                b'\n' if payload.get(i + 1) == Some(&b'\n') => {
                    return Ok((&payload[..=i], &payload[i + 2..]));
                }
                _ => {}
            }
        }
        if payload.last() != Some(&b'\n') {
            self.report(FsckMsgId::UnterminatedHeader, "unterminated header")?;
        }
        Ok((payload, EMPTY))
    }

    /// Drop repeats of the first `seen` single-occurrence keys at the start
    /// of `input`, reporting each one.
    fn skip_duplicates<'a>(&self, mut input: &'a [u8], seen: usize) -> FsckResult<&'a [u8]> {
        while let Some(key) = SINGLE_KEYS[..seen]
            .iter()
            .copied()
            .find(|key| input.starts_with(key))
        {
            self.report(FsckMsgId::DuplicateEntry, duplicate_message(key))?;
            input = split_line(input).map_or(EMPTY, |(_, tail)| tail);
        }
        Ok(input)
    }

    /// Header lines after `tagger`: repeats of known keys are duplicates,
    /// anything else is an extra header (reported once).
    fn check_trailing_headers(&self, mut input: &[u8]) -> FsckResult<()> {
        let mut extra_reported = false;
        while !input.is_empty() {
            let (line, tail) = split_line(input).unwrap_or((input, EMPTY));
            if let Some(key) = SINGLE_KEYS.iter().copied().find(|key| line.starts_with(key)) {
                self.report(FsckMsgId::DuplicateEntry, duplicate_message(key))?;
            } else if !extra_reported {
                self.report(
                    FsckMsgId::ExtraHeaderEntry,
                    "invalid format - extra header(s) after 'tagger'",
                )?;
                extra_reported = true;
            }
            input = tail;
        }
        Ok(())
    }
}

fn duplicate_message(key: &[u8]) -> String {
    format!(
        "invalid format - duplicate '{}' line",
        String::from_utf8_lossy(key).trim_end()
    )
}
