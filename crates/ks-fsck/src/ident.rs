//! Checks for `tagger` identity lines: `Name <email> <seconds> <+|-hhmm>`.

use crate::msg::FsckMsgId;

/// Check one identity line (without its trailing newline).
///
/// On failure returns the message id and diagnostic for the first problem,
/// in the order the fields appear on the line.
pub fn check_ident(line: &[u8]) -> Result<(), (FsckMsgId, &'static str)> {
    if line.first() == Some(&b'<') {
        return Err((
            FsckMsgId::MissingNameBeforeEmail,
            "invalid tagger line - missing name before email",
        ));
    }

    let open = match line.iter().position(|&b| b == b'<' || b == b'>') {
        Some(i) if line[i] == b'>' => {
            return Err((FsckMsgId::BadName, "invalid tagger line - bad name"));
        }
        Some(i) => i,
        None => {
            return Err((FsckMsgId::MissingEmail, "invalid tagger line - missing email"));
        }
    };
    if line[open - 1] != b' ' {
        return Err((
            FsckMsgId::MissingSpaceBeforeEmail,
            "invalid tagger line - missing space before email",
        ));
    }

    let email = &line[open + 1..];
    let close = match email.iter().position(|&b| b == b'<' || b == b'>') {
        Some(i) if email[i] == b'>' => i,
        _ => return Err((FsckMsgId::BadEmail, "invalid tagger line - bad email")),
    };

    let rest = &email[close + 1..];
    let Some(date) = rest.strip_prefix(b" ") else {
        return Err((
            FsckMsgId::MissingSpaceBeforeDate,
            "invalid tagger line - missing space before date",
        ));
    };

    if date.first() == Some(&b'0') && date.get(1) != Some(&b' ') {
        return Err((
            FsckMsgId::ZeroPaddedDate,
            "invalid tagger line - zero-padded date",
        ));
    }
    let digits = date.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 && !fits_timestamp(&date[..digits]) {
        return Err((
            FsckMsgId::BadDateOverflow,
            "invalid tagger line - date causes integer overflow",
        ));
    }
    if digits == 0 || date.get(digits) != Some(&b' ') {
        return Err((FsckMsgId::BadDate, "invalid tagger line - bad date"));
    }

    let zone = &date[digits + 1..];
    let well_formed = zone.len() == 5
        && (zone[0] == b'+' || zone[0] == b'-')
        && zone[1..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err((FsckMsgId::BadTimezone, "invalid tagger line - bad time zone"));
    }
    Ok(())
}

fn fits_timestamp(digits: &[u8]) -> bool {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .is_some()
}
