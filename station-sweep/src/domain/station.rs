//! Station code and line identifier types.

use std::fmt;
use std::sync::Arc;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// Error returned when parsing an invalid line identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line id: {reason}")]
pub struct InvalidLineId {
    reason: &'static str,
}

const MAX_CODE_LEN: usize = 8;

/// A short station code as it appears in the timetable, e.g. `R28` or `O54`.
///
/// Codes are 1 to 8 ASCII alphanumeric characters starting with a letter.
/// This type guarantees that any `StationCode` value is valid by
/// construction, and is `Copy` so it can be embedded in graph nodes freely.
///
/// # Examples
///
/// ```
/// use station_sweep::domain::StationCode;
///
/// let code = StationCode::parse("R28").unwrap();
/// assert_eq!(code.as_str(), "R28");
/// assert_eq!(code.prefix_and_number(), Some(("R", 28)));
///
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("28R").is_err());
/// assert!(StationCode::parse("TOOLONGCODE").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationCode {
    bytes: [u8; MAX_CODE_LEN],
    len: u8,
}

impl StationCode {
    /// Parse a station code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let input = s.as_bytes();

        if input.is_empty() {
            return Err(InvalidStationCode {
                reason: "must not be empty",
            });
        }
        if input.len() > MAX_CODE_LEN {
            return Err(InvalidStationCode {
                reason: "must be at most 8 characters",
            });
        }
        if !input[0].is_ascii_alphabetic() {
            return Err(InvalidStationCode {
                reason: "must start with a letter",
            });
        }
        for &b in input {
            if !b.is_ascii_alphanumeric() {
                return Err(InvalidStationCode {
                    reason: "must be ASCII letters and digits",
                });
            }
        }

        let mut bytes = [0u8; MAX_CODE_LEN];
        bytes[..input.len()].copy_from_slice(input);
        Ok(Self {
            bytes,
            len: input.len() as u8,
        })
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only valid ASCII is ever stored.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or("")
    }

    /// Split the code into its letter prefix and trailing number.
    ///
    /// Returns `None` if the code has no digits, or if letters follow the
    /// first digit.
    ///
    /// # Examples
    ///
    /// ```
    /// use station_sweep::domain::StationCode;
    ///
    /// assert_eq!(StationCode::parse("O54").unwrap().prefix_and_number(), Some(("O", 54)));
    /// assert_eq!(StationCode::parse("BL12").unwrap().prefix_and_number(), Some(("BL", 12)));
    /// assert_eq!(StationCode::parse("depot").unwrap().prefix_and_number(), None);
    /// ```
    pub fn prefix_and_number(&self) -> Option<(&str, u32)> {
        let s = self.as_str();
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (prefix, digits) = s.split_at(split);
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            let number = digits.parse().ok()?;
            Some((prefix, number))
        } else {
            None
        }
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line identifier, e.g. `R_a` for physical line R running in direction a.
///
/// Identifiers are non-empty ASCII strings of letters, digits and
/// underscores, starting with a letter. Cloning is cheap (shared
/// allocation), so a `LineId` can be stored on every graph node.
///
/// # Examples
///
/// ```
/// use station_sweep::domain::LineId;
///
/// let outbound = LineId::parse("R_a").unwrap();
/// let inbound = outbound.reciprocal().unwrap();
/// assert_eq!(inbound.as_str(), "R_b");
/// assert_eq!(inbound.reciprocal().unwrap(), outbound);
///
/// // No direction suffix: no reciprocal.
/// assert!(LineId::parse("shuttle").unwrap().reciprocal().is_none());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(Arc<str>);

impl LineId {
    /// Parse a line identifier from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidLineId> {
        let bytes = s.as_bytes();

        if bytes.is_empty() {
            return Err(InvalidLineId {
                reason: "must not be empty",
            });
        }
        if !bytes[0].is_ascii_alphabetic() {
            return Err(InvalidLineId {
                reason: "must start with a letter",
            });
        }
        for &b in bytes {
            if !b.is_ascii_alphanumeric() && b != b'_' {
                return Err(InvalidLineId {
                    reason: "must be ASCII letters, digits and underscores",
                });
            }
        }

        Ok(Self(Arc::from(s)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The same physical line in the opposite direction, if this id carries
    /// a `_a`/`_b` direction suffix.
    pub fn reciprocal(&self) -> Option<LineId> {
        let s = self.as_str();
        if let Some(base) = s.strip_suffix("_a") {
            Some(Self(Arc::from(format!("{base}_b").as_str())))
        } else if let Some(base) = s.strip_suffix("_b") {
            Some(Self(Arc::from(format!("{base}_a").as_str())))
        } else {
            None
        }
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.as_str())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
