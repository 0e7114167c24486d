use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity and timestamp attached to a commit as author or committer.
///
/// Rendered exactly as git renders it: `Name <email> <unix-seconds> <+hhmm>`.
/// The offset is part of the identity: two signatures for the same instant in
/// different timezones are not equal, because they encode differently.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "SignatureFields")]
pub struct Signature {
    name: String,
    email: String,
    when: DateTime<FixedOffset>,
}

#[derive(Deserialize)]
struct SignatureFields {
    name: String,
    email: String,
    when: DateTime<FixedOffset>,
}

impl From<SignatureFields> for Signature {
    fn from(f: SignatureFields) -> Self {
        Self::new(f.name, f.email, f.when)
    }
}

impl Signature {
    /// Create a signature. Characters that would break the line format
    /// (`<`, `>`, newlines) are dropped from the name and email, and the
    /// offset is rounded to whole minutes since `+hhmm` cannot carry seconds.
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: DateTime<FixedOffset>) -> Self {
        Self {
            name: sanitize(&name.into()),
            email: sanitize(&email.into()),
            when: whole_minute_offset(when),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn when(&self) -> DateTime<FixedOffset> {
        self.when
    }

    /// Seconds since the UNIX epoch.
    pub fn timestamp(&self) -> i64 {
        self.when.timestamp()
    }

    /// Offset from UTC in seconds (east positive).
    pub fn offset_seconds(&self) -> i32 {
        self.when.offset().fix().local_minus_utc()
    }

    /// Parse the `Name <email> <seconds> <+hhmm>` form.
    pub fn parse(line: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidSignature(line.to_string());

        let (ident, rest) = line
            .rsplit_once('>')
            .ok_or_else(invalid)?;
        let (name, email) = ident.split_once('<').ok_or_else(invalid)?;

        let mut fields = rest.split_whitespace();
        let seconds: i64 = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        let offset = fields.next().and_then(parse_offset).ok_or_else(invalid)?;
        if fields.next().is_some() {
            return Err(invalid());
        }

        let when = offset
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(invalid)?;

        Ok(Self {
            name: name.trim_end().to_string(),
            email: email.to_string(),
            when,
        })
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.timestamp() == other.timestamp()
            && self.offset_seconds() == other.offset_seconds()
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp(),
            self.when.format("%z")
        )
    }
}

impl FromStr for Signature {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '<' | '>' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn whole_minute_offset(when: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let secs = when.offset().local_minus_utc();
    let rounded = (secs + 30 * secs.signum()) / 60 * 60;
    match FixedOffset::east_opt(rounded) {
        Some(offset) if rounded != secs => when.with_timezone(&offset),
        _ => when,
    }
}

/// Parse a `+hhmm` / `-hhmm` timezone offset.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
