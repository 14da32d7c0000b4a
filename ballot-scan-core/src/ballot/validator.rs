use std::fmt;

use thiserror::Error;

use crate::models::messages;

/// Why a piece of text is not a ballot identifier.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierError {
    /// Empty, or only a prefix with no serial digits.
    #[error("identifier is empty or too short")]
    TooShort,

    /// The prefix is a digit, or the serial contains a non-digit.
    #[error("identifier is not a prefix character followed by digits")]
    Malformed,
}

impl IdentifierError {
    /// Operator-facing phrase for this rejection.
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => messages::IDENTIFIER_TOO_SHORT,
            Self::Malformed => messages::IDENTIFIER_MALFORMED,
        }
    }
}

/// A validated ballot identifier: one non-digit prefix character followed by
/// one or more ASCII digits, e.g. `A0000001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BallotId {
    prefix: char,
    serial: String,
}

impl BallotId {
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        validate(input)
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// The serial digits exactly as printed, leading zeros included.
    pub fn serial(&self) -> &str {
        &self.serial
    }
}

impl fmt::Display for BallotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.serial)
    }
}

/// Validate operator or decoder text as a ballot identifier.
///
/// Surrounding whitespace is ignored. Text shorter than two characters is
/// `TooShort`; anything else that is not `<non-digit><digits>` is `Malformed`.
pub fn validate(input: &str) -> Result<BallotId, IdentifierError> {
    let trimmed = input.trim();

    let mut chars = trimmed.chars();
    let Some(prefix) = chars.next() else {
        return Err(IdentifierError::TooShort);
    };
    let serial = chars.as_str();
    if serial.is_empty() {
        return Err(IdentifierError::TooShort);
    }

    if prefix.is_ascii_digit() || !serial.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::Malformed);
    }

    Ok(BallotId {
        prefix,
        serial: serial.to_string(),
    })
}
