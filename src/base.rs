//! Numeral bases for the programmer variant and the pure conversion
//! utilities between them.

use crate::error::CalcError;
use rug::Integer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Base {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hexadecimal,
}

impl Base {
    pub const ALL: [Base; 4] = [
        Base::Binary,
        Base::Octal,
        Base::Decimal,
        Base::Hexadecimal,
    ];

    pub fn radix(self) -> u32 {
        match self {
            Base::Binary => 2,
            Base::Octal => 8,
            Base::Decimal => 10,
            Base::Hexadecimal => 16,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Base::Binary => "BIN",
            Base::Octal => "OCT",
            Base::Decimal => "DEC",
            Base::Hexadecimal => "HEX",
        }
    }

    /// Parse a base selector token. Accepts the panel labels and the
    /// radix itself.
    pub fn parse(token: &str) -> Result<Base, CalcError> {
        match token.to_ascii_uppercase().as_str() {
            "BIN" | "2" => Ok(Base::Binary),
            "OCT" | "8" => Ok(Base::Octal),
            "DEC" | "10" => Ok(Base::Decimal),
            "HEX" | "16" => Ok(Base::Hexadecimal),
            _ => Err(CalcError::InvalidBase(token.to_owned())),
        }
    }

    /// Per-base character class used to validate digit entry before it
    /// ever reaches the buffer.
    pub fn is_valid_digit(self, c: char) -> bool {
        match self {
            Base::Binary => matches!(c, '0' | '1'),
            Base::Octal => matches!(c, '0'..='7'),
            Base::Decimal => c.is_ascii_digit(),
            Base::Hexadecimal => c.is_ascii_hexdigit(),
        }
    }

    /// Digits per display group: nibbles for binary and hex, triplets
    /// otherwise.
    pub fn group_size(self) -> usize {
        match self {
            Base::Binary | Base::Hexadecimal => 4,
            Base::Octal | Base::Decimal => 3,
        }
    }
}

/// Convert a numeral string between bases, preserving the sign and
/// upper-casing hex digits.
///
/// Conversion is best-effort formatting: unparsable input yields `"0"`
/// rather than an error, since validation happens earlier through the
/// per-base character classes.
pub fn convert_to_base(value: &str, from: Base, to: Base) -> String {
    let trimmed: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let (negative, magnitude) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.as_str()),
    };
    let parsed = match Integer::from_str_radix(magnitude, from.radix() as i32) {
        Ok(i) => i,
        Err(_) => return "0".to_owned(),
    };
    if parsed.is_zero() {
        return "0".to_owned();
    }
    let rendered = parsed.to_string_radix(to.radix() as i32).to_uppercase();
    if negative {
        format!("-{}", rendered)
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_all_bases() {
        let cases = [
            ("FF", Base::Hexadecimal, Base::Binary, "11111111"),
            ("11111111", Base::Binary, Base::Hexadecimal, "FF"),
            ("20", Base::Decimal, Base::Binary, "10100"),
            ("777", Base::Octal, Base::Decimal, "511"),
            ("-FF", Base::Hexadecimal, Base::Decimal, "-255"),
            ("0", Base::Binary, Base::Hexadecimal, "0"),
        ];
        for (value, from, to, expected) in cases {
            assert_eq!(convert_to_base(value, from, to), expected, "{value}");
        }
    }

    #[test]
    fn round_trips_within_the_signed_bound() {
        let magnitudes = ["1", "255", "4096", "9223372036854775807", "-42"];
        for m in magnitudes {
            for from in Base::ALL {
                for to in Base::ALL {
                    let there = convert_to_base(m, Base::Decimal, from);
                    let across = convert_to_base(&there, from, to);
                    let back = convert_to_base(&across, to, Base::Decimal);
                    assert_eq!(back, *m, "{m} via {from:?}->{to:?}");
                }
            }
        }
    }

    #[test]
    fn unparsable_input_formats_as_zero() {
        assert_eq!(convert_to_base("GG", Base::Hexadecimal, Base::Decimal), "0");
        assert_eq!(convert_to_base("", Base::Decimal, Base::Binary), "0");
        assert_eq!(convert_to_base("12", Base::Binary, Base::Decimal), "0");
    }

    #[test]
    fn digit_classes_match_radix() {
        assert!(Base::Hexadecimal.is_valid_digit('f'));
        assert!(!Base::Decimal.is_valid_digit('A'));
        assert!(!Base::Octal.is_valid_digit('8'));
        assert!(Base::Binary.is_valid_digit('1'));
    }

    #[test]
    fn unknown_selector_is_invalid_base() {
        assert!(matches!(Base::parse("QUAT"), Err(CalcError::InvalidBase(_))));
        assert_eq!(Base::parse("hex").unwrap(), Base::Hexadecimal);
    }
}
