//! Result formatting.
//!
//! Satisfies the `format(value, base, mode) -> string` contract: a raw
//! evaluated value becomes a grouped, human-readable string. Decimal
//! rendering extracts digits at the configured significant precision with
//! half-ulp rounding; non-decimal bases render the truncated integer with
//! nibble or triplet grouping.

use crate::base::Base;
use crate::settings::{NotationMode, Settings};
use az::CheckedCast;
use rug::ops::Pow;
use rug::Float;

/// Format an evaluated value for display.
pub fn format_result(
    value: &Float,
    base: Base,
    settings: &Settings,
    notation: NotationMode,
) -> String {
    if !value.is_finite() {
        return "Error".to_owned();
    }
    if base != Base::Decimal {
        return integer_display(value, base);
    }
    if settings.use_fractions {
        if let Some(fraction) = try_fraction(value) {
            return fraction;
        }
    }
    let raw = decimal_string(value, settings.precision, notation);
    if settings.use_thousands_separator {
        separate_thousands(&raw)
    } else {
        raw
    }
}

/// Unformatted decimal rendering used for the authoritative input buffer:
/// no grouping, no fractions, auto notation.
pub fn plain_decimal(value: &Float, precision: usize) -> String {
    decimal_string(value, precision, NotationMode::Auto)
}

fn integer_display(value: &Float, base: Base) -> String {
    let int = match value.clone().trunc().to_integer() {
        Some(i) => i,
        None => return "Error".to_owned(),
    };
    if int.is_zero() {
        return "0".to_owned();
    }
    let negative = int < 0;
    let digits = int.abs().to_string_radix(base.radix() as i32).to_uppercase();
    let grouped = group_digits(&digits, base.group_size(), ' ');
    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Decimal digit extraction with half-ulp rounding at `precision`
/// significant digits.
fn decimal_string(value: &Float, precision: usize, notation: NotationMode) -> String {
    if value.is_zero() {
        return "0".to_owned();
    }
    let digits = precision.max(1);
    let prec = value.prec();
    let negative = value.is_sign_negative();
    let a = value.clone().abs();

    let ten = Float::with_val(prec, 10);
    let mut exponent = Float::with_val(prec, a.clone().log2() / ten.clone().log2())
        .floor()
        .to_f64() as i64;
    // the decimal exponent can exceed i32, so scale through exp10
    let scale = Float::with_val(prec, exponent).exp10();
    let mut scaled = a / scale;
    scaled += ten.pow(-(digits as i32)) / 2;
    while scaled >= 10 {
        scaled /= 10;
        exponent += 1;
    }
    while scaled < 1 {
        scaled *= 10;
        exponent -= 1;
    }

    let mut extracted = String::with_capacity(digits);
    for _ in 0..digits {
        let digit: u8 = match scaled.clone().floor().checked_cast() {
            Some(digit) => digit,
            None => return "Error".to_owned(),
        };
        extracted.push((b'0' + digit) as char);
        scaled = (scaled - digit) * 10;
    }

    let exp_form =
        notation == NotationMode::Scientific || exponent < -4 || exponent >= digits as i64;
    let body = if exp_form {
        let mantissa = trim_zeros(&extracted[1..]);
        if mantissa.is_empty() {
            format!("{}e{}", &extracted[..1], exponent)
        } else {
            format!("{}.{}e{}", &extracted[..1], mantissa, exponent)
        }
    } else if exponent >= 0 {
        let split = exponent as usize + 1;
        let int_part = &extracted[..split];
        let frac_part = trim_zeros(&extracted[split..]);
        if frac_part.is_empty() {
            int_part.to_owned()
        } else {
            format!("{}.{}", int_part, frac_part)
        }
    } else {
        let frac_part = trim_zeros(&extracted);
        let leading_zeros = "0".repeat((-exponent - 1) as usize);
        format!("0.{}{}", leading_zeros, frac_part)
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

fn trim_zeros(digits: &str) -> String {
    digits.trim_end_matches('0').to_owned()
}

/// Group the integer part of a fixed decimal rendering with commas.
fn separate_thousands(raw: &str) -> String {
    if raw.contains('e') {
        return raw.to_owned();
    }
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(dot) => rest.split_at(dot),
        None => (rest, ""),
    };
    format!("{}{}{}", sign, group_digits(int_part, 3, ','), frac_part)
}

fn group_digits(digits: &str, size: usize, sep: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / size);
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % size == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Render a near-rational value as `n/d` with a small denominator.
/// Bounded search; denominator 1 defers to the integer rendering.
fn try_fraction(value: &Float) -> Option<String> {
    let v = value.to_f64();
    if !v.is_finite() || v.abs() >= 1e15 {
        return None;
    }
    for d in 1..=9999u32 {
        let scaled = v * d as f64;
        let n = scaled.round();
        if (scaled - n).abs() < 1e-9 {
            if d == 1 {
                return None;
            }
            return Some(format!("{}/{}", n as i64, d));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn dec(text: &str) -> Float {
        Float::with_val(128, Float::parse(text).unwrap())
    }

    fn plain_settings() -> Settings {
        Settings {
            use_thousands_separator: false,
            ..Settings::default()
        }
    }

    #[test]
    fn near_one_rounds_to_one() {
        let v = dec("0.999999999999999999999999999");
        assert_eq!(plain_decimal(&v, 12), "1");
    }

    #[test]
    fn integers_render_without_fraction_tail() {
        assert_eq!(plain_decimal(&dec("28"), 12), "28");
        assert_eq!(plain_decimal(&dec("-20"), 12), "-20");
        assert_eq!(plain_decimal(&dec("0"), 12), "0");
    }

    #[test]
    fn fractions_trim_trailing_zeros() {
        assert_eq!(plain_decimal(&dec("2.5000"), 12), "2.5");
        assert_eq!(plain_decimal(&dec("0.125"), 12), "0.125");
        assert_eq!(plain_decimal(&dec("0.0001"), 12), "0.0001");
    }

    #[test]
    fn large_and_small_magnitudes_use_exponent_form() {
        assert_eq!(plain_decimal(&dec("2.5e20"), 12), "2.5e20");
        assert_eq!(plain_decimal(&dec("0.0000001"), 12), "1e-7");
    }

    #[test]
    fn astronomical_exponents_render_without_panicking() {
        use rug::ops::Pow;
        // decimal exponent far beyond i32
        let huge = Float::with_val(128, 10).pow(2585827972u32);
        assert_eq!(plain_decimal(&huge, 12), "1e2585827972");
        let tiny = huge.recip();
        assert_eq!(plain_decimal(&tiny, 12), "1e-2585827972");
    }

    #[test]
    fn forced_scientific_notation() {
        let v = dec("1234");
        assert_eq!(
            format_result(&v, Base::Decimal, &plain_settings(), NotationMode::Scientific),
            "1.234e3"
        );
    }

    #[test]
    fn thousands_separator_groups_integer_part() {
        let settings = Settings::default();
        assert_eq!(
            format_result(&dec("1000000"), Base::Decimal, &settings, NotationMode::Auto),
            "1,000,000"
        );
        assert_eq!(
            format_result(&dec("-1234.5"), Base::Decimal, &settings, NotationMode::Auto),
            "-1,234.5"
        );
    }

    #[test]
    fn non_decimal_bases_group_digits() {
        let settings = plain_settings();
        assert_eq!(
            format_result(&dec("255"), Base::Binary, &settings, NotationMode::Auto),
            "1111 1111"
        );
        assert_eq!(
            format_result(&dec("65535"), Base::Hexadecimal, &settings, NotationMode::Auto),
            "FFFF"
        );
        assert_eq!(
            format_result(&dec("-255"), Base::Hexadecimal, &settings, NotationMode::Auto),
            "-FF"
        );
        assert_eq!(
            format_result(&dec("511"), Base::Octal, &settings, NotationMode::Auto),
            "777"
        );
    }

    #[test]
    fn fraction_preference_renders_small_rationals() {
        let settings = Settings {
            use_fractions: true,
            use_thousands_separator: false,
            ..Settings::default()
        };
        let third = dec("0.333333333333333333333333333333");
        assert_eq!(
            format_result(&third, Base::Decimal, &settings, NotationMode::Auto),
            "1/3"
        );
        // integers do not become n/1
        assert_eq!(
            format_result(&dec("4"), Base::Decimal, &settings, NotationMode::Auto),
            "4"
        );
    }
}
