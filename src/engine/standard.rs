//! The standard calculator: one decimal buffer, four arithmetic
//! operators, percent, parentheses, and a float memory register.

use super::{
    classify, exceeds_limit, ops, Button, CalculatorState, MemoryOp, Phase, Response,
    MAX_INPUT_STANDARD,
};
use crate::base::Base;
use crate::error::CalcError;
use crate::eval::{Evaluator, EvalOptions};
use crate::format::{format_result, plain_decimal};
use crate::parens::ParenTracker;
use crate::settings::{NotationMode, Settings};
use rug::Float;

#[derive(Debug)]
pub struct StandardCalculator {
    state: CalculatorState,
    parens: ParenTracker,
    phase: Phase,
    memory: Float,
    evaluator: Evaluator,
    settings: Settings,
}

impl StandardCalculator {
    pub fn new(settings: Settings) -> Self {
        let memory = Float::with_val(settings.float_prec(), 0);
        StandardCalculator {
            state: CalculatorState::default(),
            parens: ParenTracker::new(),
            phase: Phase::default(),
            memory,
            evaluator: Evaluator::new(),
            settings,
        }
    }

    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    fn opts(&self) -> EvalOptions {
        EvalOptions::standard(self.settings.float_prec())
    }

    pub fn handle_button_click(&mut self, token: &str) -> Response {
        let button = classify(token);
        if self.state.input == "Error" && button != Button::Clear {
            ops::reset(&mut self.state, &mut self.parens, &mut self.phase);
        }
        if exceeds_limit(&self.state.input, &button, MAX_INPUT_STANDARD) {
            return Response::rejection(&self.state.input, &CalcError::MaxInputLength);
        }
        match self.dispatch(button) {
            Ok(response) => response,
            Err(error) => Response::rejection(&self.state.input, &error),
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
            Button::Operator(op @ ("+" | "-" | "×" | "÷")) => {
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

    /// Evaluate the buffer with auto-closed groups. Success replaces the
    /// buffer with the unformatted result; failure poisons it.
    fn equals(&mut self) -> Response {
        let expr = ops::auto_close(&self.state.input, &self.parens);
        match self.evaluator.evaluate(&expr, &self.opts()) {
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
                match self.evaluator.evaluate(&expr, &self.opts()) {
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

    /// Recompute the preview after an edit. An unevaluable buffer keeps
    /// the previous display.
    fn edited(&mut self) -> Response {
        let opts = self.opts();
        if let Ok(value) = self.evaluator.evaluate(&self.state.input, &opts) {
            self.state.display = self.render(&value);
        }
        Response::state(&self.state.input)
    }

    /// Evaluate an expression with this engine's precision, bypassing the
    /// button machinery.
    pub fn evaluate_expression(&mut self, expr: &str) -> Result<Float, CalcError> {
        let opts = self.opts();
        self.evaluator.evaluate(expr, &opts)
    }

    /// Format a value the way this engine would display it.
    pub fn format_value(&self, value: &Float) -> String {
        self.render(value)
    }

    fn render(&self, value: &Float) -> String {
        format_result(value, Base::Decimal, &self.settings, NotationMode::Auto)
    }

    fn evaluation_failure(&mut self, error: CalcError) -> Response {
        self.state.input = "Error".to_owned();
        self.state.display = "Error".to_owned();
        self.parens.reset();
        self.phase = Phase::Empty;
        Response::rejection("Error", &error)
    }
}
