//! The scientific calculator: the standard surface plus trigonometric,
//! logarithmic and power functions, angle units, constants, and forced
//! exponent notation.
//!
//! Function tokens become buffer spellings directly (`sin` appends
//! `sin(`); the hyperbolic toggle rewrites the next trig token rather than
//! the buffer. Angle conversion happens during evaluation, never by
//! editing the expression.

use super::{
    classify, exceeds_limit, ops, Button, CalculatorState, MemoryOp, Phase, Response,
    MAX_INPUT_STANDARD,
};
use crate::base::Base;
use crate::domain;
use crate::error::CalcError;
use crate::eval::{Evaluator, EvalOptions};
use crate::format::{format_result, plain_decimal};
use crate::parens::ParenTracker;
use crate::settings::{AngleUnit, NotationMode, Settings};
use rug::Float;

/// Trig families the hyperbolic toggle applies to.
const TRIG: [&str; 12] = [
    "sin", "cos", "tan", "sec", "csc", "cot", "asin", "acos", "atan", "asec", "acsc", "acot",
];

/// Remaining prefix functions, spelled as they land in the buffer.
const PREFIX: [&str; 18] = [
    "sinh", "cosh", "tanh", "sech", "csch", "coth", "asinh", "acosh", "atanh", "asech",
    "acsch", "acoth", "ln", "log", "exp", "abs", "dms", "deg",
];

#[derive(Debug)]
pub struct ScientificCalculator {
    state: CalculatorState,
    parens: ParenTracker,
    phase: Phase,
    memory: Float,
    evaluator: Evaluator,
    settings: Settings,
    hyperbolic: bool,
    notation: NotationMode,
}

impl ScientificCalculator {
    pub fn new(settings: Settings) -> Self {
        let memory = Float::with_val(settings.float_prec(), 0);
        ScientificCalculator {
            state: CalculatorState::default(),
            parens: ParenTracker::new(),
            phase: Phase::default(),
            memory,
            evaluator: Evaluator::new(),
            settings,
            hyperbolic: false,
            notation: NotationMode::Auto,
        }
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    pub fn angle_unit(&self) -> AngleUnit {
        self.settings.angle_unit
    }

    pub fn set_angle_unit(&mut self, unit: AngleUnit) {
        self.settings.angle_unit = unit;
    }

    pub fn hyperbolic(&self) -> bool {
        self.hyperbolic
    }

    pub fn notation(&self) -> NotationMode {
        self.notation
    }

    fn opts(&self) -> EvalOptions {
        EvalOptions::scientific(self.settings.angle_unit, self.settings.float_prec())
    }

    pub fn handle_button_click(&mut self, token: &str) -> Response {
        match token {
            "DEG" => {
                self.settings.angle_unit = self.settings.angle_unit.next();
                return self.edited();
            }
            "HYP" => {
                self.hyperbolic = !self.hyperbolic;
                return Response::state(&self.state.input);
            }
            "F-E" => {
                self.notation = self.notation.toggle();
                return self.edited();
            }
            _ => {}
        }
        if self.state.input == "Error" && token != "AC" && token != "C" {
            ops::reset(&mut self.state, &mut self.parens, &mut self.phase);
        }
        if let Some(response) = self.mode_token(token) {
            return response;
        }
        let button = classify(token);
        if exceeds_limit(&self.state.input, &button, MAX_INPUT_STANDARD) {
            return Response::rejection(&self.state.input, &CalcError::MaxInputLength);
        }
        match self.dispatch(button) {
            Ok(response) => response,
            Err(error) => Response::rejection(&self.state.input, &error),
        }
    }

    /// Tokens that only exist on the scientific panel. `None` falls
    /// through to the shared vocabulary; note this runs before `classify`
    /// so `e` is Euler's number here, never a hex digit.
    fn mode_token(&mut self, token: &str) -> Option<Response> {
        let over = |len: usize, this: &Self| {
            this.state.input.chars().count() + len + 1 > MAX_INPUT_STANDARD
        };
        if TRIG.contains(&token) {
            let name = if self.hyperbolic {
                format!("{token}h")
            } else {
                token.to_owned()
            };
            if over(name.chars().count(), self) {
                return Some(Response::rejection(
                    &self.state.input,
                    &CalcError::MaxInputLength,
                ));
            }
            self.push_function(&name);
            return Some(self.edited());
        }
        let wrap = match token {
            "x²" | "sqr" => Some("sqr"),
            "x³" | "cube" => Some("cube"),
            "1/x" | "recip" => Some("recip"),
            _ => None,
        };
        if let Some(name) = wrap {
            if over(name.len() + 1, self) {
                return Some(Response::rejection(
                    &self.state.input,
                    &CalcError::MaxInputLength,
                ));
            }
            self.wrap_trailing_unit(name);
            return Some(self.edited());
        }
        match token {
            name if PREFIX.contains(&name) || name == "sqrt" || name == "√" => {
                let spelling = if name == "sqrt" { "√" } else { name };
                if over(spelling.chars().count(), self) {
                    return Some(Response::rejection(
                        &self.state.input,
                        &CalcError::MaxInputLength,
                    ));
                }
                self.push_function(spelling);
                Some(self.edited())
            }
            "π" | "pi" => {
                if over(3, self) {
                    return Some(Response::rejection(
                        &self.state.input,
                        &CalcError::MaxInputLength,
                    ));
                }
                self.push_constant('π');
                Some(self.edited())
            }
            "e" => {
                if over(3, self) {
                    return Some(Response::rejection(
                        &self.state.input,
                        &CalcError::MaxInputLength,
                    ));
                }
                self.push_constant('e');
                Some(self.edited())
            }
            "xʸ" => {
                if over(2, self) {
                    return Some(Response::rejection(
                        &self.state.input,
                        &CalcError::MaxInputLength,
                    ));
                }
                ops::press_operator(&mut self.state, &mut self.phase, "^");
                Some(self.edited())
            }
            _ => None,
        }
    }

    fn dispatch(&mut self, button: Button) -> Result<Response, CalcError> {
        match button {
            Button::Equals => Ok(self.equals()),
            Button::Clear => {
                ops::reset(&mut self.state, &mut self.parens, &mut self.phase);
                Ok(Response::state(&self.state.input))
            }
            Button::ClearEntry => {
                ops::clear_entry(&mut self.state, &mut self.phase);
                Ok(self.edited())
            }
            Button::Backspace => {
                ops::backspace(&mut self.state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::Digit(c) => {
                ops::press_digit(&mut self.state, &mut self.phase, c, Base::Decimal)?;
                Ok(self.edited())
            }
            Button::Dot => {
                ops::press_dot(&mut self.state, &mut self.phase);
                Ok(self.edited())
            }
            Button::Operator(op @ ("+" | "-" | "×" | "÷" | "^" | "yroot")) => {
                ops::press_operator(&mut self.state, &mut self.phase, op);
                Ok(self.edited())
            }
            Button::Operator(_) => Err(CalcError::InvalidExpression),
            Button::SignToggle => {
                ops::toggle_sign(&mut self.state);
                Ok(self.edited())
            }
            Button::Percent => {
                ops::percent_operand(
                    &mut self.state,
                    self.settings.float_prec(),
                    self.settings.precision,
                );
                Ok(self.edited())
            }
            Button::OpenParen => {
                ops::press_open(&mut self.state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::CloseParen => {
                ops::press_close(&mut self.state, &mut self.parens, &mut self.phase);
                Ok(self.edited())
            }
            Button::Memory(op) => self.memory_op(op),
            Button::Other(_) => Err(CalcError::InvalidExpression),
        }
    }

    /// Append `name(`, multiplying implicitly after a value. A freshly
    /// evaluated result is wrapped instead, so `sin` after `=` applies to
    /// the result.
    fn push_function(&mut self, name: &str) {
        if self.phase == Phase::Evaluated && self.state.input != "0" {
            self.state.input = format!("{name}({})", self.state.input);
            self.parens.rebuild(&self.state.input);
            self.phase = Phase::Entering;
            return;
        }
        if self.state.input == "0" {
            self.state.input = format!("{name}(");
        } else {
            if self
                .state
                .input
                .chars()
                .next_back()
                .map(|c| c.is_ascii_alphanumeric() || c == ')' || c == 'π')
                == Some(true)
            {
                self.state.input.push_str(" × ");
            }
            self.state.input.push_str(name);
            self.state.input.push('(');
        }
        self.parens.open(self.state.input.len() - 1);
        self.phase = Phase::Entering;
    }

    /// Wrap the trailing unit in `name(...)`, covering the x², x³ and 1/x
    /// postfix keys.
    fn wrap_trailing_unit(&mut self, name: &str) {
        if self.state.input == "0" {
            return;
        }
        let start = ops::trailing_unit_start(&self.state.input);
        if start == self.state.input.len() {
            return;
        }
        self.state.input.insert_str(start, name);
        self.state.input.insert(start + name.len(), '(');
        self.state.input.push(')');
        self.parens.rebuild(&self.state.input);
        self.phase = Phase::Entering;
    }

    fn push_constant(&mut self, c: char) {
        if self.phase == Phase::Evaluated {
            self.state.input = "0".to_owned();
        }
        if self.state.input == "0" {
            self.state.input = c.to_string();
        } else {
            if self
                .state
                .input
                .chars()
                .next_back()
                .map(|ch| ch.is_ascii_alphanumeric() || ch == ')' || ch == 'π')
                == Some(true)
            {
                self.state.input.push_str(" × ");
            }
            self.state.input.push(c);
        }
        self.phase = Phase::Entering;
    }

    /// Evaluate with domain validation first, so `log(-5)` reports a
    /// domain error rather than a numeric one.
    fn equals(&mut self) -> Response {
        let expr = ops::auto_close(&self.state.input, &self.parens);
        let opts = self.opts();
        let outcome = domain::validate(&expr, &opts)
            .and_then(|()| self.evaluator.evaluate(&expr, &opts));
        match outcome {
            Ok(value) => {
                let formatted = self.render(&value);
                self.state.input = plain_decimal(&value, self.settings.precision);
                self.state.display = formatted.clone();
                self.parens.reset();
                self.phase = Phase::Evaluated;
                Response {
                    input: self.state.input.clone(),
                    expression: Some(expr),
                    result: Some(formatted),
                    ..Response::default()
                }
            }
            Err(error) => self.evaluation_failure(error),
        }
    }

    /// Evaluate an expression with the current angle unit and precision,
    /// bypassing the button machinery.
    pub fn evaluate_expression(&mut self, expr: &str) -> Result<Float, CalcError> {
        let opts = self.opts();
        domain::validate(expr, &opts)?;
        self.evaluator.evaluate(expr, &opts)
    }

    /// Format a value the way this engine would display it.
    pub fn format_value(&self, value: &Float) -> String {
        self.render(value)
    }

    fn memory_op(&mut self, op: MemoryOp) -> Result<Response, CalcError> {
        match op {
            MemoryOp::Clear => {
                self.memory = Float::with_val(self.settings.float_prec(), 0);
                Ok(Response::state(&self.state.input))
            }
            MemoryOp::Recall => {
                let text = plain_decimal(&self.memory, self.settings.precision);
                ops::insert_value(&mut self.state, &mut self.phase, &text);
                Ok(self.edited())
            }
            MemoryOp::Store | MemoryOp::Add | MemoryOp::Subtract => {
                let expr = ops::auto_close(&self.state.input, &self.parens);
                let opts = self.opts();
                match self.evaluator.evaluate(&expr, &opts) {
                    Ok(value) => {
                        match op {
                            MemoryOp::Store => self.memory = value,
                            MemoryOp::Add => self.memory += value,
                            _ => self.memory -= value,
                        }
                        Ok(Response::state(&self.state.input))
                    }
                    Err(error) => Ok(self.evaluation_failure(error)),
                }
            }
        }
    }

    fn edited(&mut self) -> Response {
        let opts = self.opts();
        if let Ok(value) = self.evaluator.evaluate(&self.state.input, &opts) {
            self.state.display = self.render(&value);
        }
        Response::state(&self.state.input)
    }

    fn render(&self, value: &Float) -> String {
        format_result(value, Base::Decimal, &self.settings, self.notation)
    }

    fn evaluation_failure(&mut self, error: CalcError) -> Response {
        self.state.input = "Error".to_owned();
        self.state.display = "Error".to_owned();
        self.parens.reset();
        self.phase = Phase::Empty;
        Response::rejection("Error", &error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> ScientificCalculator {
        ScientificCalculator::new(Settings::default())
    }

    fn press(calc: &mut ScientificCalculator, tokens: &[&str]) -> Response {
        let mut last = Response::default();
        for token in tokens {
            last = calc.handle_button_click(token);
        }
        last
    }

    #[test]
    fn sine_of_ninety_degrees_is_one() {
        let mut c = calc();
        let response = press(&mut c, &["sin", "9", "0", "="]);
        assert_eq!(response.expression.as_deref(), Some("sin(90)"));
        assert_eq!(response.result.as_deref(), Some("1"));
    }

    #[test]
    fn angle_unit_cycles_degrees_radians_gradians() {
        let mut c = calc();
        assert_eq!(c.angle_unit(), AngleUnit::Degrees);
        c.handle_button_click("DEG");
        assert_eq!(c.angle_unit(), AngleUnit::Radians);
        c.handle_button_click("DEG");
        assert_eq!(c.angle_unit(), AngleUnit::Gradians);
        c.handle_button_click("DEG");
        assert_eq!(c.angle_unit(), AngleUnit::Degrees);
    }

    #[test]
    fn gradians_scale_the_right_angle_to_one_hundred() {
        let mut c = calc();
        press(&mut c, &["DEG", "DEG"]);
        let response = press(&mut c, &["sin", "1", "0", "0", "="]);
        assert_eq!(response.result.as_deref(), Some("1"));
    }

    #[test]
    fn hyperbolic_toggle_rewrites_the_next_trig_token() {
        let mut c = calc();
        press(&mut c, &["HYP", "sin"]);
        assert_eq!(c.state().input, "sinh(");
        let mut c = calc();
        press(&mut c, &["HYP", "asin"]);
        assert_eq!(c.state().input, "asinh(");
    }

    #[test]
    fn square_key_wraps_the_trailing_operand() {
        let mut c = calc();
        let response = press(&mut c, &["5", "x²", "="]);
        assert_eq!(response.expression.as_deref(), Some("sqr(5)"));
        assert_eq!(response.result.as_deref(), Some("25"));
    }

    #[test]
    fn cube_and_reciprocal_keys() {
        let mut c = calc();
        let response = press(&mut c, &["3", "x³", "="]);
        assert_eq!(response.result.as_deref(), Some("27"));
        let mut c = calc();
        let response = press(&mut c, &["4", "1/x", "="]);
        assert_eq!(response.result.as_deref(), Some("0.25"));
    }

    #[test]
    fn square_key_wraps_a_whole_group() {
        let mut c = calc();
        let response = press(&mut c, &["(", "1", "+", "2", ")", "x²", "="]);
        assert_eq!(response.expression.as_deref(), Some("sqr((1 + 2))"));
        assert_eq!(response.result.as_deref(), Some("9"));
    }

    #[test]
    fn pi_multiplies_implicitly_after_a_digit() {
        let mut c = calc();
        let response = press(&mut c, &["2", "π", "="]);
        assert_eq!(response.expression.as_deref(), Some("2 × π"));
        assert_eq!(response.result.as_deref(), Some("6.28318530718"));
    }

    #[test]
    fn eulers_number_is_a_constant_not_a_digit() {
        let mut c = calc();
        let response = press(&mut c, &["e", "="]);
        assert_eq!(response.result.as_deref(), Some("2.71828182846"));
    }

    #[test]
    fn out_of_domain_argument_poisons_the_buffer() {
        let mut c = calc();
        let response = press(&mut c, &["log", "5", "±", "="]);
        assert_eq!(response.error.as_deref(), Some("Invalid input for log(-5)"));
        assert_eq!(c.state().input, "Error");
    }

    #[test]
    fn power_and_root_operators() {
        let mut c = calc();
        let response = press(&mut c, &["2", "xʸ", "1", "0", "="]);
        assert_eq!(response.result.as_deref(), Some("1,024"));
        let mut c = calc();
        let response = press(&mut c, &["8", "yroot", "3", "="]);
        assert_eq!(response.result.as_deref(), Some("2"));
    }

    #[test]
    fn forced_exponent_notation_rerenders_the_result() {
        let mut c = calc();
        press(&mut c, &["1", "2", "3", "4", "="]);
        c.handle_button_click("F-E");
        assert_eq!(c.state().display, "1.234e3");
        c.handle_button_click("F-E");
        assert_eq!(c.state().display, "1,234");
    }

    #[test]
    fn function_after_equals_wraps_the_result() {
        let mut c = calc();
        press(&mut c, &["9", "="]);
        press(&mut c, &["sqrt"]);
        assert_eq!(c.state().input, "√(9)");
        let response = c.handle_button_click("=");
        assert_eq!(response.result.as_deref(), Some("3"));
    }

    #[test]
    fn nested_functions_evaluate_inside_out() {
        let mut c = calc();
        press(&mut c, &["DEG"]);
        let response = press(&mut c, &["ln", "exp", "1", "="]);
        assert_eq!(response.expression.as_deref(), Some("ln(exp(1))"));
        assert_eq!(response.result.as_deref(), Some("1"));
    }

    #[test]
    fn square_root_accepts_both_spellings() {
        let mut c = calc();
        press(&mut c, &["sqrt", "1", "6", "="]);
        assert_eq!(c.state().input, "4");
    }
}
