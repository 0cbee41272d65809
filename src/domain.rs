//! Pre-evaluation domain validation for scientific functions.
//!
//! Runs on the original expression, before evaluation: every risky call is
//! located, its argument evaluated in isolation, and an out-of-range
//! argument raises a domain error whose message echoes the call. When the
//! argument cannot be evaluated standalone, validation defers to the main
//! evaluation.

use crate::error::CalcError;
use crate::eval::{evaluate_uncached, EvalOptions};
use lazy_static::lazy_static;
use regex::Regex;
use rug::Float;

lazy_static! {
    static ref RISKY_CALL: Regex =
        Regex::new(r"(acosh|atanh|acoth|acos|asin|log|ln|sqrt|√)\(").unwrap();
}

/// Check every risky call in `expr` against its mathematical domain.
pub fn validate(expr: &str, opts: &EvalOptions) -> Result<(), CalcError> {
    for captures in RISKY_CALL.captures_iter(expr) {
        let whole = captures.get(0).expect("whole match");
        let name = captures.get(1).expect("function name").as_str();
        if expr[..whole.start()]
            .chars()
            .next_back()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
        {
            // part of a longer identifier
            continue;
        }
        let arg = argument_span(expr, whole.end() - 1);
        if arg.trim().is_empty() {
            continue;
        }
        let value = match evaluate_uncached(arg, opts) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let canonical = if name == "√" { "sqrt" } else { name };
        if out_of_domain(canonical, &value) {
            return Err(CalcError::domain(name, arg.trim()));
        }
    }
    Ok(())
}

/// The argument text between `open` and its matching close paren, or the
/// rest of the string for a group the auto-close leniency will terminate.
fn argument_span(expr: &str, open: usize) -> &str {
    let start = open + '('.len_utf8();
    let mut depth = 1usize;
    for (offset, c) in expr[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &expr[start..start + offset];
                }
            }
            _ => {}
        }
    }
    &expr[start..]
}

fn out_of_domain(name: &str, v: &Float) -> bool {
    match name {
        "log" | "ln" => *v <= 0,
        "asin" | "acos" => v.clone().abs() > 1,
        "acosh" => *v < 1,
        "atanh" => v.clone().abs() >= 1,
        "acoth" => v.clone().abs() <= 1,
        "sqrt" => *v < 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AngleUnit;

    fn opts() -> EvalOptions {
        EvalOptions::scientific(AngleUnit::Radians, 128)
    }

    #[test]
    fn log_of_negative_is_rejected_before_evaluation() {
        let err = validate("log(-5)", &opts()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input for log(-5)");
    }

    #[test]
    fn rejections_cover_the_catalogue() {
        let cases = [
            "ln(0)",
            "asin(2)",
            "acos(-1.5)",
            "acosh(0.5)",
            "atanh(1)",
            "acoth(0.5)",
            "sqrt(-4)",
            "√(-4)",
        ];
        for expr in cases {
            assert!(validate(expr, &opts()).is_err(), "{expr}");
        }
    }

    #[test]
    fn in_domain_arguments_pass() {
        let cases = [
            "log(5 × 2)",
            "asin(0.5)",
            "acosh(2)",
            "atanh(0.5)",
            "acoth(2)",
            "sqrt(16)",
            "sin(-1)",
        ];
        for expr in cases {
            assert!(validate(expr, &opts()).is_ok(), "{expr}");
        }
    }

    #[test]
    fn nested_risky_calls_are_each_checked() {
        assert!(validate("log(sin(0))", &opts()).is_err());
        assert!(validate("sqrt(log(10))", &opts()).is_ok());
    }

    #[test]
    fn unterminated_group_uses_the_rest_of_the_expression() {
        let err = validate("log(-5", &opts()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input for log(-5)");
    }

    #[test]
    fn empty_or_unevaluable_arguments_defer_to_main_evaluation() {
        assert!(validate("log()", &opts()).is_ok());
        assert!(validate("log(2(3))", &opts()).is_ok());
    }

    #[test]
    fn longer_identifiers_are_not_mistaken_for_risky_calls() {
        assert!(validate("asinh(-5)", &opts()).is_ok());
    }
}
