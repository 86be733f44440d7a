//! Payment card input helpers.
//!
//! Card numbers are checked with the Luhn checksum before checkout so an
//! obvious typo never reaches the payment endpoint.

use core::fmt;

use thiserror::Error;

/// Why a card number was rejected locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CardNumberError {
    /// Not 13 to 19 digits after removing whitespace.
    #[error("card number must be 13 to 19 digits")]
    InvalidLength,
    /// Contains something other than digits and whitespace.
    #[error("card number may only contain digits")]
    NonDigit,
    /// Fails the Luhn checksum.
    #[error("Invalid card number. Please check and try again.")]
    Checksum,
}

/// Remove all whitespace.
fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether `number` is 13-19 digits (whitespace ignored) with a valid Luhn
/// checksum.
#[must_use]
pub fn luhn_valid(number: &str) -> bool {
    CardNumber::parse(number).is_ok()
}

fn luhn_checksum_ok(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

/// Group digits in fours for display while typing: `4242 4242 4242 4242`.
#[must_use]
pub fn format_card_number(value: &str) -> String {
    let cleaned = strip_whitespace(value);
    cleaned
        .chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize expiry input to `MM/YYYY`, keeping at most six digits.
#[must_use]
pub fn format_expiry(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 2 {
        let (month, rest) = digits.split_at(2);
        let year: String = rest.chars().take(4).collect();
        format!("{month}/{year}")
    } else {
        digits
    }
}

/// A card number that passed local validation.
#[derive(Clone, PartialEq, Eq)]
pub struct CardNumber(String);

impl CardNumber {
    /// Validate and normalize (whitespace removed) a card number.
    ///
    /// # Errors
    ///
    /// Returns [`CardNumberError`] if the number has the wrong length,
    /// contains non-digits, or fails the Luhn checksum.
    pub fn parse(value: &str) -> Result<Self, CardNumberError> {
        let cleaned = strip_whitespace(value);
        if !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardNumberError::NonDigit);
        }
        if !(13..=19).contains(&cleaned.len()) {
            return Err(CardNumberError::InvalidLength);
        }
        if !luhn_checksum_ok(&cleaned) {
            return Err(CardNumberError::Checksum);
        }
        Ok(Self(cleaned))
    }

    /// Digits only, as sent to the API.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last four digits.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.0.len().saturating_sub(4);
        self.0.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber(**** {})", self.last_four())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_luhn_known_numbers() {
        assert!(luhn_valid("4242424242424242"));
        assert!(luhn_valid("4242 4242 4242 4242"));
        assert!(luhn_valid("378282246310005"));
        assert!(!luhn_valid("4242424242424241"));
    }

    #[test]
    fn test_luhn_rejects_bad_shapes() {
        assert_eq!(
            CardNumber::parse("4242"),
            Err(CardNumberError::InvalidLength)
        );
        assert_eq!(
            CardNumber::parse("4242-4242-4242-4242"),
            Err(CardNumberError::NonDigit)
        );
        assert!(!luhn_valid(""));
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("42 424"), "4242 4");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12/");
        assert_eq!(format_expiry("12/2030"), "12/2030");
        assert_eq!(format_expiry("1220301"), "12/2030");
    }

    #[test]
    fn test_debug_masks_number() {
        let card = CardNumber::parse("4242424242424242").unwrap();
        assert_eq!(format!("{card:?}"), "CardNumber(**** 4242)");
        assert_eq!(card.last_four(), "4242");
    }
}
