//! Shared buffer mutations.
//!
//! Free functions over the pieces of engine state they touch, so each
//! variant composes them without inheriting a base class. Operators are
//! stored space-padded (`" + "`, `" × "`) which lets trailing-operator
//! detection, backspace units, and operand splitting all work on plain
//! string scans.

use super::{CalculatorState, Phase};
use crate::base::Base;
use crate::error::CalcError;
use crate::format::plain_decimal;
use crate::parens::ParenTracker;
use rug::Float;

/// Binary operator spellings as they appear in the buffer, longest first
/// so `<<` is never read as two `<`.
const OPERATORS: [&str; 9] = ["yroot", "<<", ">>", "×", "÷", "+", "-", "%", "^"];

/// Function spellings that backspace removes together with their open
/// paren, longest first.
const FUNCTION_UNITS: [&str; 35] = [
    "acosh", "acoth", "acsch", "asech", "asinh", "atanh", "recip", "acos", "acot", "acsc",
    "asec", "asin", "atan", "cosh", "coth", "csch", "cube", "sech", "sinh", "sqrt", "tanh",
    "abs", "cos", "cot", "csc", "deg", "dms", "exp", "log", "sec", "sin", "sqr", "tan",
    "ln", "√",
];

/// The trailing pending operator, if the buffer ends with one. Returns the
/// byte index to truncate at (before any padding space) and the spelling.
pub fn trailing_operator(input: &str) -> Option<(usize, &'static str)> {
    let trimmed = input.trim_end();
    for op in OPERATORS {
        if let Some(head) = trimmed.strip_suffix(op) {
            // require the operator to stand alone, not end an identifier
            if op.chars().next().map(|c| c.is_ascii_alphabetic()) == Some(true)
                && head.chars().next_back().map(|c| c.is_ascii_alphanumeric()) == Some(true)
            {
                continue;
            }
            // a minus attached to an operand is a sign, not a pending operator
            if op == "-" && (head.is_empty() || !head.ends_with(' ')) {
                continue;
            }
            let cut = head.trim_end().len();
            return Some((cut, op));
        }
    }
    None
}

/// Byte index where the last operand starts: after the last space or open
/// paren. Sign-toggled operands like `-4` stay whole because the minus is
/// attached directly to the digits.
pub fn last_operand_start(input: &str) -> usize {
    match input.rfind([' ', '(']) {
        Some(i) => i + 1,
        None => 0,
    }
}

/// Start of the trailing unit for sign toggling and operand wrapping: a
/// whole closed group (with any attached function name) when the buffer
/// ends with `)`, the last operand otherwise.
pub fn trailing_unit_start(input: &str) -> usize {
    if !input.ends_with(')') {
        return last_operand_start(input);
    }
    let mut depth = 0usize;
    let mut start = 0;
    for (pos, c) in input.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    start = pos;
                    break;
                }
            }
            _ => {}
        }
    }
    // pull in a function name attached to the group
    while let Some(c) = input[..start].chars().next_back() {
        if c.is_ascii_lowercase() || c == '√' {
            start -= c.len_utf8();
        } else {
            break;
        }
    }
    start
}

/// Pad the buffer after a backspace-truncated operator so the next operand
/// does not fuse with it.
fn pad_pending_operator(input: &mut String) {
    if !input.ends_with(' ') && trailing_operator(input).is_some() {
        input.push(' ');
    }
}

pub fn press_digit(
    state: &mut CalculatorState,
    phase: &mut Phase,
    c: char,
    base: Base,
) -> Result<(), CalcError> {
    if !base.is_valid_digit(c) {
        return Err(CalcError::InvalidExpression);
    }
    if *phase == Phase::Evaluated {
        state.input = "0".to_owned();
    }
    if state.input == "0" {
        state.input = c.to_string();
    } else {
        if state.input.ends_with(')') {
            state.input.push_str(" × ");
        }
        pad_pending_operator(&mut state.input);
        state.input.push(c);
    }
    *phase = Phase::Entering;
    Ok(())
}

pub fn press_dot(state: &mut CalculatorState, phase: &mut Phase) {
    if *phase == Phase::Evaluated {
        state.input = "0".to_owned();
    }
    if state.input == "0" {
        state.input = "0.".to_owned();
    } else {
        let operand = &state.input[last_operand_start(&state.input)..];
        if operand.contains('.') {
            return;
        }
        if state
            .input
            .chars()
            .next_back()
            .map(|c| c.is_ascii_alphanumeric())
            == Some(true)
        {
            state.input.push('.');
        } else {
            if state.input.ends_with(')') {
                state.input.push_str(" × ");
            }
            pad_pending_operator(&mut state.input);
            state.input.push_str("0.");
        }
    }
    *phase = Phase::Entering;
}

/// Append a binary operator, replacing a pending one in place.
pub fn press_operator(state: &mut CalculatorState, phase: &mut Phase, symbol: &str) {
    if let Some((cut, _)) = trailing_operator(&state.input) {
        state.input.truncate(cut);
    } else if state.input.ends_with('(') {
        return;
    }
    state.input.push(' ');
    state.input.push_str(symbol);
    state.input.push(' ');
    *phase = Phase::OperatorPending;
}

pub fn press_open(state: &mut CalculatorState, parens: &mut ParenTracker, phase: &mut Phase) {
    if *phase == Phase::Evaluated {
        state.input = "0".to_owned();
        parens.reset();
    }
    if state.input == "0" {
        state.input = "(".to_owned();
        parens.open(0);
    } else {
        if state
            .input
            .chars()
            .next_back()
            .map(|c| c.is_ascii_alphanumeric() || c == ')' || c == 'π')
            == Some(true)
        {
            state.input.push_str(" × ");
        }
        pad_pending_operator(&mut state.input);
        let pos = state.input.len();
        state.input.push('(');
        parens.open(pos);
    }
    *phase = Phase::Entering;
}

/// Append a close paren when legal. Illegal closes are silently ignored.
pub fn press_close(state: &mut CalculatorState, parens: &mut ParenTracker, phase: &mut Phase) {
    if !parens.can_close(&state.input) {
        return;
    }
    let pos = state.input.len();
    state.input.push(')');
    parens.close(pos);
    *phase = Phase::Entering;
}

/// Remove the last logical unit: a pending space-padded operator, a
/// function name together with its open paren, or a single character.
pub fn backspace(state: &mut CalculatorState, parens: &mut ParenTracker, phase: &mut Phase) {
    if let Some((cut, _)) = trailing_operator(&state.input) {
        state.input.truncate(cut);
    } else if let Some(cut) = trailing_function_unit(&state.input) {
        parens.handle_backspace(state.input.len() - 1, '(');
        state.input.truncate(cut);
    } else if let Some(c) = state.input.chars().next_back() {
        let pos = state.input.len() - c.len_utf8();
        state.input.truncate(pos);
        if c == '(' || c == ')' {
            parens.handle_backspace(pos, c);
        }
        while state.input.ends_with(' ') {
            state.input.pop();
        }
    }
    if state.input.is_empty() {
        state.input = "0".to_owned();
        *phase = Phase::Empty;
    } else if trailing_operator(&state.input).is_some() {
        *phase = Phase::OperatorPending;
    } else {
        *phase = Phase::Entering;
    }
}

fn trailing_function_unit(input: &str) -> Option<usize> {
    let head = input.strip_suffix('(')?;
    for name in FUNCTION_UNITS {
        if head.ends_with(name) {
            let cut = head.len() - name.len();
            // the name must not continue a longer identifier
            if input[..cut]
                .chars()
                .next_back()
                .map(|c| c.is_ascii_alphanumeric())
                != Some(true)
            {
                return Some(cut);
            }
        }
    }
    None
}

/// Toggle the sign of the trailing unit. A lone `0` and an error buffer
/// are left alone.
pub fn toggle_sign(state: &mut CalculatorState) {
    if state.input == "0" || state.input == "Error" {
        return;
    }
    let start = trailing_unit_start(&state.input);
    let operand = &state.input[start..];
    if operand.is_empty() || operand == "0" {
        return;
    }
    if operand.starts_with('-') {
        state.input.replace_range(start..start + 1, "");
    } else if state.input[..start].ends_with('-') {
        state.input.replace_range(start - 1..start, "");
    } else {
        state.input.insert(start, '-');
    }
}

/// Divide the trailing numeral operand by one hundred in place.
pub fn percent_operand(state: &mut CalculatorState, prec: u32, precision: usize) {
    let start = last_operand_start(&state.input);
    let operand = &state.input[start..];
    if operand.is_empty()
        || !operand
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return;
    }
    let parsed = match Float::parse(operand) {
        Ok(p) => p,
        Err(_) => return,
    };
    let value = Float::with_val(prec, parsed) / 100;
    let text = plain_decimal(&value, precision);
    state.input.replace_range(start.., &text);
}

/// Strip the trailing numeral run only, leaving earlier terms intact.
pub fn clear_entry(state: &mut CalculatorState, phase: &mut Phase) {
    while state
        .input
        .chars()
        .next_back()
        .map(|c| c.is_ascii_alphanumeric() || c == '.' || c == 'π')
        == Some(true)
    {
        state.input.pop();
    }
    // a sign attached to the removed operand goes with it
    if state.input.ends_with('-')
        && state.input[..state.input.len() - 1]
            .chars()
            .next_back()
            .map(|c| c == ' ' || c == '(')
            != Some(false)
    {
        state.input.pop();
    }
    if state.input.is_empty() {
        state.input = "0".to_owned();
        *phase = Phase::Empty;
    } else if trailing_operator(&state.input).is_some() {
        *phase = Phase::OperatorPending;
    } else {
        *phase = Phase::Entering;
    }
}

pub fn reset(state: &mut CalculatorState, parens: &mut ParenTracker, phase: &mut Phase) {
    state.input = "0".to_owned();
    state.display = "0".to_owned();
    parens.reset();
    *phase = Phase::Empty;
}

/// The buffer with every open group closed, for lenient evaluation.
pub fn auto_close(input: &str, parens: &ParenTracker) -> String {
    let mut expr = input.to_owned();
    for _ in 0..parens.open_count() {
        expr.push(')');
    }
    expr
}

/// Insert a recalled or constant value: it replaces a fresh buffer or the
/// trailing operand, and multiplies a closed group.
pub fn insert_value(state: &mut CalculatorState, phase: &mut Phase, text: &str) {
    if *phase == Phase::Evaluated || state.input == "0" {
        state.input = text.to_owned();
    } else {
        clear_entry(state, phase);
        if state.input == "0" {
            state.input = text.to_owned();
        } else {
            if state.input.ends_with(')') {
                state.input.push_str(" × ");
            }
            pad_pending_operator(&mut state.input);
            state.input.push_str(text);
        }
    }
    *phase = Phase::Entering;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(input: &str) -> CalculatorState {
        CalculatorState {
            input: input.to_owned(),
            display: "0".to_owned(),
        }
    }

    #[test]
    fn trailing_operator_detection() {
        assert_eq!(trailing_operator("12 + "), Some((2, "+")));
        assert_eq!(trailing_operator("12 +"), Some((2, "+")));
        assert_eq!(trailing_operator("5 yroot "), Some((1, "yroot")));
        assert_eq!(trailing_operator("5 << "), Some((1, "<<")));
        assert_eq!(trailing_operator("12 + 3"), None);
        // a minus attached to an operand is a sign, not a pending operator
        assert_eq!(trailing_operator("-4"), None);
        assert_eq!(trailing_operator("-"), None);
        assert_eq!(trailing_operator("3 + -"), Some((3, "-")));
    }

    #[test]
    fn digits_replace_the_zero_seed() {
        let mut state = buffer("0");
        let mut phase = Phase::Empty;
        press_digit(&mut state, &mut phase, '7', Base::Decimal).unwrap();
        assert_eq!(state.input, "7");
        press_digit(&mut state, &mut phase, '2', Base::Decimal).unwrap();
        assert_eq!(state.input, "72");
        assert_eq!(phase, Phase::Entering);
    }

    #[test]
    fn digits_out_of_base_class_are_rejected() {
        let mut state = buffer("0");
        let mut phase = Phase::Empty;
        let err = press_digit(&mut state, &mut phase, '2', Base::Binary).unwrap_err();
        assert_eq!(err, CalcError::InvalidExpression);
        assert_eq!(state.input, "0");
    }

    #[test]
    fn digit_after_close_paren_gets_implicit_multiplication() {
        let mut state = buffer("(2 + 3)");
        let mut phase = Phase::Entering;
        press_digit(&mut state, &mut phase, '4', Base::Decimal).unwrap();
        assert_eq!(state.input, "(2 + 3) × 4");
    }

    #[test]
    fn operator_replaces_a_pending_operator() {
        let mut state = buffer("5 + ");
        let mut phase = Phase::OperatorPending;
        press_operator(&mut state, &mut phase, "×");
        assert_eq!(state.input, "5 × ");
        assert_eq!(phase, Phase::OperatorPending);
    }

    #[test]
    fn backspace_removes_a_pending_operator_as_one_unit() {
        let mut state = buffer("12 + ");
        let mut parens = ParenTracker::new();
        let mut phase = Phase::OperatorPending;
        backspace(&mut state, &mut parens, &mut phase);
        assert_eq!(state.input, "12");
        assert_eq!(phase, Phase::Entering);
    }

    #[test]
    fn backspace_removes_a_function_name_with_its_paren() {
        let mut state = buffer("2 × sin(");
        let mut parens = ParenTracker::new();
        parens.rebuild("2 × sin(");
        let mut phase = Phase::Entering;
        backspace(&mut state, &mut parens, &mut phase);
        assert_eq!(state.input, "2 × ");
        assert_eq!(parens.open_count(), 0);
        assert_eq!(phase, Phase::OperatorPending);
    }

    #[test]
    fn backspace_to_empty_restores_the_zero_seed() {
        let mut state = buffer("7");
        let mut parens = ParenTracker::new();
        let mut phase = Phase::Entering;
        backspace(&mut state, &mut parens, &mut phase);
        assert_eq!(state.input, "0");
        assert_eq!(phase, Phase::Empty);
    }

    #[test]
    fn backspace_reopens_a_closed_group() {
        let mut state = buffer("(5)");
        let mut parens = ParenTracker::new();
        parens.open(0);
        parens.close(2);
        let mut phase = Phase::Entering;
        backspace(&mut state, &mut parens, &mut phase);
        assert_eq!(state.input, "(5");
        assert_eq!(parens.open_count(), 1);
    }

    #[test]
    fn sign_toggle_targets_the_last_operand() {
        let mut state = buffer("3 + 4");
        toggle_sign(&mut state);
        assert_eq!(state.input, "3 + -4");
        toggle_sign(&mut state);
        assert_eq!(state.input, "3 + 4");
    }

    #[test]
    fn sign_toggle_wraps_a_trailing_group() {
        let mut state = buffer("(2 + 3)");
        toggle_sign(&mut state);
        assert_eq!(state.input, "-(2 + 3)");
        toggle_sign(&mut state);
        assert_eq!(state.input, "(2 + 3)");
    }

    #[test]
    fn sign_toggle_leaves_a_bare_zero() {
        let mut state = buffer("0");
        toggle_sign(&mut state);
        assert_eq!(state.input, "0");
    }

    #[test]
    fn percent_scales_the_trailing_operand() {
        let mut state = buffer("200 + 50");
        percent_operand(&mut state, 128, 12);
        assert_eq!(state.input, "200 + 0.5");
    }

    #[test]
    fn clear_entry_strips_only_the_trailing_operand() {
        let mut state = buffer("12 + 34");
        let mut phase = Phase::Entering;
        clear_entry(&mut state, &mut phase);
        assert_eq!(state.input, "12 + ");
        assert_eq!(phase, Phase::OperatorPending);
    }

    #[test]
    fn clear_entry_takes_an_attached_sign() {
        let mut state = buffer("3 + -4");
        let mut phase = Phase::Entering;
        clear_entry(&mut state, &mut phase);
        assert_eq!(state.input, "3 + ");
    }

    #[test]
    fn dot_starts_a_fraction_once_per_operand() {
        let mut state = buffer("0");
        let mut phase = Phase::Empty;
        press_dot(&mut state, &mut phase);
        assert_eq!(state.input, "0.");
        press_dot(&mut state, &mut phase);
        assert_eq!(state.input, "0.");
        let mut state = buffer("3 + ");
        press_dot(&mut state, &mut phase);
        assert_eq!(state.input, "3 + 0.");
    }

    #[test]
    fn auto_close_appends_missing_parens() {
        let mut parens = ParenTracker::new();
        parens.rebuild("((2 + 3");
        assert_eq!(auto_close("((2 + 3", &parens), "((2 + 3))");
    }

    #[test]
    fn insert_value_replaces_the_trailing_operand() {
        let mut state = buffer("7 + 2");
        let mut phase = Phase::Entering;
        insert_value(&mut state, &mut phase, "42");
        assert_eq!(state.input, "7 + 42");
        let mut state = buffer("0");
        insert_value(&mut state, &mut phase, "42");
        assert_eq!(state.input, "42");
    }
}
