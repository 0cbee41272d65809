//! The programmer calculator: one buffer per numeral base, integer
//! semantics, shifts and modulo, and fan-out synchronization.
//!
//! Only the active buffer is ever edited. Evaluation produces one i64
//! which is re-rendered into all four buffers, so the bases can never
//! drift apart.

use super::{
    classify, exceeds_limit, ops, Button, CalculatorState, DisplayValues, MemoryOp, Phase,
    Response, MAX_INPUT_PROGRAMMER,
};
use crate::base::{convert_to_base, Base};
use crate::error::CalcError;
use crate::eval::{integer_value, Evaluator, EvalOptions};
use crate::format::format_result;
use crate::parens::ParenTracker;
use crate::settings::{NotationMode, Settings};
use rug::Float;

const INTEGER_PREC: u32 = 192;

#[derive(Debug)]
pub struct ProgrammerCalculator {
    states: [CalculatorState; 4],
    active: Base,
    parens: ParenTracker,
    phase: Phase,
    memory: i64,
    evaluator: Evaluator,
    settings: Settings,
}

fn index(base: Base) -> usize {
    match base {
        Base::Binary => 0,
        Base::Octal => 1,
        Base::Decimal => 2,
        Base::Hexadecimal => 3,
    }
}

impl ProgrammerCalculator {
    pub fn new(settings: Settings) -> Self {
        ProgrammerCalculator {
            states: Default::default(),
            active: Base::Decimal,
            parens: ParenTracker::new(),
            phase: Phase::default(),
            memory: 0,
            evaluator: Evaluator::new(),
            settings,
        }
    }

    pub fn active_base(&self) -> Base {
        self.active
    }

    pub fn active_state(&self) -> &CalculatorState {
        &self.states[index(self.active)]
    }

    pub fn state_for(&self, base: Base) -> &CalculatorState {
        &self.states[index(base)]
    }

    fn active_mut(&mut self) -> &mut CalculatorState {
        &mut self.states[index(self.active)]
    }

    fn opts(&self) -> EvalOptions {
        EvalOptions::programmer(self.active)
    }

    pub fn handle_button_click(&mut self, token: &str) -> Response {
        if Base::ALL.iter().any(|b| b.label().eq_ignore_ascii_case(token)) {
            return self.handle_base_change(token);
        }
        let button = classify(token);
        if self.active_state().input == "Error" && button != Button::Clear {
            self.reset_buffers();
        }
        if exceeds_limit(&self.active_state().input, &button, MAX_INPUT_PROGRAMMER) {
            return Response::rejection(&self.active_state().input, &CalcError::MaxInputLength);
        }
        match self.dispatch(button) {
            Ok(response) => response,
            Err(error) => Response::rejection(&self.active_state().input, &error),
        }
    }

    fn dispatch(&mut self, button: Button) -> Result<Response, CalcError> {
        let base = self.active;
        match button {
            Button::Equals => Ok(self.equals()),
            Button::Clear => {
                self.reset_buffers();
                Ok(Response::state(&self.active_state().input))
            }
            Button::ClearEntry => {
                let state = &mut self.states[index(base)];
                ops::clear_entry(state, &mut self.phase);
                Ok(self.edited())
            }
            Button::Backspace => {
                let state = &mut self.states[index(base)];
                ops::backspace(state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::Digit(c) => {
                let state = &mut self.states[index(base)];
                ops::press_digit(state, &mut self.phase, c, base)?;
                Ok(self.edited())
            }
            // integers only
            Button::Dot => Err(CalcError::InvalidExpression),
            Button::Percent => {
                let state = &mut self.states[index(base)];
                ops::press_operator(state, &mut self.phase, "%");
                Ok(self.edited())
            }
            Button::Operator(op @ ("+" | "-" | "×" | "÷" | "<<" | ">>")) => {
                let state = &mut self.states[index(base)];
                ops::press_operator(state, &mut self.phase, op);
                Ok(self.edited())
            }
            Button::Operator(_) => Err(CalcError::InvalidExpression),
            Button::SignToggle => {
                ops::toggle_sign(self.active_mut());
                Ok(self.edited())
            }
            Button::OpenParen => {
                let state = &mut self.states[index(base)];
                ops::press_open(state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::CloseParen => {
                let state = &mut self.states[index(base)];
                ops::press_close(state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::Memory(op) => self.memory_op(op),
            Button::Other(_) => Err(CalcError::InvalidExpression),
        }
    }

    /// Evaluate the active buffer and fan the integer result out to every
    /// base buffer.
    fn equals(&mut self) -> Response {
        let expr = ops::auto_close(&self.active_state().input, &self.parens);
        match self.evaluate_integer(&expr) {
            Ok(value) => {
                self.fan_out(value);
                self.parens.reset();
                self.phase = Phase::Evaluated;
                Response {
                    input: self.active_state().input.clone(),
                    expression: Some(expr),
                    result: Some(self.active_state().display.clone()),
                    display_values: Some(self.display_values()),
                    ..Response::default()
                }
            }
            Err(error) => self.evaluation_failure(error),
        }
    }

    /// Switch the active base, evaluating the current buffer first so the
    /// value carries over. An unknown selector leaves everything as is.
    pub fn handle_base_change(&mut self, token: &str) -> Response {
        let base = match Base::parse(token) {
            Ok(base) => base,
            Err(error) => {
                return Response::rejection(&self.active_state().input, &error);
            }
        };
        if base == self.active {
            return Response::state(&self.active_state().input);
        }
        let expr = ops::auto_close(&self.active_state().input, &self.parens);
        match self.evaluate_integer(&expr) {
            Ok(value) => {
                self.fan_out(value);
                self.parens.reset();
                self.phase = Phase::Evaluated;
                self.active = base;
                Response {
                    input: self.active_state().input.clone(),
                    result: Some(self.active_state().display.clone()),
                    display_values: Some(self.display_values()),
                    ..Response::default()
                }
            }
            Err(error) => self.evaluation_failure(error),
        }
    }

    /// Evaluate an expression under integer semantics, reading numerals in
    /// `base` (the active base when `None`), bypassing the button
    /// machinery.
    pub fn evaluate_expression(
        &mut self,
        expr: &str,
        base: Option<Base>,
    ) -> Result<i64, CalcError> {
        let base = base.unwrap_or(self.active);
        let value = self.evaluator.evaluate(expr, &EvalOptions::programmer(base))?;
        integer_value(&value)
    }

    /// Format a value for display in `base` (the active base when `None`).
    pub fn format_value(&self, value: i64, base: Option<Base>) -> String {
        let base = base.unwrap_or(self.active);
        format_result(
            &Float::with_val(INTEGER_PREC, value),
            base,
            &self.settings,
            NotationMode::Auto,
        )
    }

    fn evaluate_integer(&mut self, expr: &str) -> Result<i64, CalcError> {
        let opts = self.opts();
        let value = self.evaluator.evaluate(expr, &opts)?;
        integer_value(&value)
    }

    /// Rewrite every base buffer from one decimal value.
    fn fan_out(&mut self, value: i64) {
        let decimal = value.to_string();
        let float = Float::with_val(INTEGER_PREC, value);
        for base in Base::ALL {
            let state = &mut self.states[index(base)];
            state.input = convert_to_base(&decimal, Base::Decimal, base);
            state.display = format_result(&float, base, &self.settings, NotationMode::Auto);
        }
    }

    pub fn display_values(&self) -> DisplayValues {
        DisplayValues {
            bin: self.states[index(Base::Binary)].display.clone(),
            oct: self.states[index(Base::Octal)].display.clone(),
            dec: self.states[index(Base::Decimal)].display.clone(),
            hex: self.states[index(Base::Hexadecimal)].display.clone(),
        }
    }

    fn memory_op(&mut self, op: MemoryOp) -> Result<Response, CalcError> {
        match op {
            MemoryOp::Clear => {
                self.memory = 0;
                Ok(Response::state(&self.active_state().input))
            }
            MemoryOp::Recall => {
                let text =
                    convert_to_base(&self.memory.to_string(), Base::Decimal, self.active);
                let base = self.active;
                let state = &mut self.states[index(base)];
                ops::insert_value(state, &mut self.phase, &text);
                Ok(self.edited())
            }
            MemoryOp::Store | MemoryOp::Add | MemoryOp::Subtract => {
                let expr = ops::auto_close(&self.active_state().input, &self.parens);
                match self.evaluate_integer(&expr) {
                    Ok(value) => {
                        let next = match op {
                            MemoryOp::Store => Some(value),
                            MemoryOp::Add => self.memory.checked_add(value),
                            _ => self.memory.checked_sub(value),
                        };
                        match next {
                            Some(next) => {
                                self.memory = next;
                                Ok(Response::state(&self.active_state().input))
                            }
                            None => Err(CalcError::Overflow),
                        }
                    }
                    Err(error) => Ok(self.evaluation_failure(error)),
                }
            }
        }
    }

    /// Recompute the active preview after an edit. The other buffers stay
    /// at their last synchronized value.
    fn edited(&mut self) -> Response {
        let opts = self.opts();
        let input = self.active_state().input.clone();
        if let Ok(value) = self.evaluator.evaluate(&input, &opts) {
            let base = self.active;
            self.states[index(base)].display =
                format_result(&value, base, &self.settings, NotationMode::Auto);
        }
        Response::state(&self.active_state().input)
    }

    /// Reset every base buffer, not just the active one, so the panels
    /// stay synchronized straight after a clear.
    fn reset_buffers(&mut self) {
        for state in &mut self.states {
            state.input = "0".to_owned();
            state.display = "0".to_owned();
        }
        self.parens.reset();
        self.phase = Phase::Empty;
    }

    fn evaluation_failure(&mut self, error: CalcError) -> Response {
        let state = self.active_mut();
        state.input = "Error".to_owned();
        state.display = "Error".to_owned();
        self.parens.reset();
        self.phase = Phase::Empty;
        Response::rejection("Error", &error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::MAX_VALUE;

    fn calc() -> ProgrammerCalculator {
        ProgrammerCalculator::new(Settings::default())
    }

    fn press(calc: &mut ProgrammerCalculator, tokens: &[&str]) -> Response {
        let mut last = Response::default();
        for token in tokens {
            last = calc.handle_button_click(token);
        }
        last
    }

    #[test]
    fn hex_value_survives_a_round_trip_through_binary() {
        let mut c = calc();
        press(&mut c, &["HEX", "F", "F"]);
        let response = c.handle_button_click("BIN");
        assert_eq!(response.input, "11111111");
        let back = c.handle_button_click("HEX");
        assert_eq!(back.input, "FF");
    }

    #[test]
    fn shifts_fan_out_to_every_base() {
        let mut c = calc();
        let response = press(&mut c, &["5", "<<", "2", "="]);
        let values = response.display_values.as_ref().unwrap();
        assert_eq!(response.result.as_deref(), Some("20"));
        assert_eq!(values.bin, "1 0100");
        assert_eq!(values.oct, "24");
        assert_eq!(values.hex, "14");
    }

    #[test]
    fn division_truncates_toward_zero() {
        let mut c = calc();
        let response = press(&mut c, &["7", "÷", "2", "="]);
        assert_eq!(response.result.as_deref(), Some("3"));
    }

    #[test]
    fn modulo_is_a_binary_operator_here() {
        let mut c = calc();
        let response = press(&mut c, &["7", "%", "3", "="]);
        assert_eq!(response.result.as_deref(), Some("1"));
    }

    #[test]
    fn digits_outside_the_active_base_are_rejected() {
        let mut c = calc();
        press(&mut c, &["BIN", "1"]);
        let response = c.handle_button_click("2");
        assert_eq!(response.error.as_deref(), Some("Invalid expression"));
        assert_eq!(response.input, "1");
    }

    #[test]
    fn hex_digits_only_exist_in_hex() {
        let mut c = calc();
        let response = c.handle_button_click("F");
        assert_eq!(response.error.as_deref(), Some("Invalid expression"));
        press(&mut c, &["HEX"]);
        let accepted = c.handle_button_click("F");
        assert!(accepted.error.is_none());
        assert_eq!(accepted.input, "F");
    }

    #[test]
    fn unknown_base_selector_reports_without_clobbering() {
        let mut c = calc();
        press(&mut c, &["4", "2"]);
        let response = c.handle_base_change("TERNARY");
        assert_eq!(
            response.error.as_deref(),
            Some("Unrecognized base: TERNARY")
        );
        assert_eq!(c.active_state().input, "42");
        assert_eq!(c.active_base(), Base::Decimal);
    }

    #[test]
    fn overflow_past_the_integer_ceiling() {
        let mut c = calc();
        for digit in MAX_VALUE.to_string().chars() {
            c.handle_button_click(&digit.to_string());
        }
        let at_max = c.handle_button_click("=");
        assert!(at_max.error.is_none());
        press(&mut c, &["+", "1"]);
        let over = c.handle_button_click("=");
        assert_eq!(over.error.as_deref(), Some("Overflow"));
        assert_eq!(c.active_state().input, "Error");
    }

    #[test]
    fn shift_count_past_the_word_size_overflows() {
        let mut c = calc();
        let response = press(&mut c, &["1", "<<", "6", "4", "="]);
        assert_eq!(response.error.as_deref(), Some("Overflow"));
    }

    #[test]
    fn negative_values_fan_out_with_their_sign() {
        let mut c = calc();
        let response = press(&mut c, &["0", "-", "5", "="]);
        let values = response.display_values.as_ref().unwrap();
        assert_eq!(values.dec, "-5");
        assert_eq!(values.bin, "-101");
        assert_eq!(values.hex, "-5");
    }

    #[test]
    fn memory_recall_renders_in_the_active_base() {
        let mut c = calc();
        press(&mut c, &["2", "5", "5", "MS", "AC", "HEX"]);
        let response = c.handle_button_click("MR");
        assert_eq!(response.input, "FF");
    }

    #[test]
    fn programmer_ceiling_is_shorter() {
        let mut c = calc();
        press(&mut c, &["BIN"]);
        for _ in 0..MAX_INPUT_PROGRAMMER {
            c.handle_button_click("1");
        }
        let response = c.handle_button_click("1");
        assert_eq!(
            response.error.as_deref(),
            Some("Maximum input length reached")
        );
    }

    #[test]
    fn clear_resets_every_base_buffer() {
        let mut c = calc();
        press(&mut c, &["1", "2", "="]);
        assert_eq!(c.state_for(Base::Binary).input, "1100");
        c.handle_button_click("AC");
        for base in Base::ALL {
            assert_eq!(c.state_for(base).input, "0", "{base:?}");
            assert_eq!(c.state_for(base).display, "0", "{base:?}");
        }
    }

    #[test]
    fn read_accessors_take_an_optional_base() {
        let mut c = calc();
        assert_eq!(
            c.evaluate_expression("FF + 1", Some(Base::Hexadecimal)).unwrap(),
            256
        );
        // None means the active base
        assert_eq!(c.evaluate_expression("12 + 4", None).unwrap(), 16);
        assert_eq!(c.format_value(256, Some(Base::Binary)), "1 0000 0000");
        assert_eq!(c.format_value(16, None), "16");
    }

    #[test]
    fn base_switch_evaluates_pending_arithmetic() {
        let mut c = calc();
        press(&mut c, &["1", "2", "+", "4"]);
        let response = c.handle_button_click("HEX");
        assert_eq!(response.input, "10");
        assert_eq!(c.state_for(Base::Decimal).input, "16");
    }
}
