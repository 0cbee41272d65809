//! Calculator engine variants and their shared vocabulary.
//!
//! Every variant exposes one behavioral contract:
//! `handle_button_click(token) -> Response`. Tokens are free-form strings
//! from a known vocabulary; classification routes them to buffer mutation
//! or evaluation. Variants form a closed set behind [`Calculator`] with
//! capability checks instead of inheritance, since their state shapes
//! diverge (one buffer versus four).

mod ops;
mod programmer;
mod scientific;
mod standard;

pub use programmer::ProgrammerCalculator;
pub use scientific::ScientificCalculator;
pub use standard::StandardCalculator;

use crate::base::Base;
use crate::error::CalcError;
use crate::settings::Settings;

/// Length ceiling for the standard and scientific buffers.
pub const MAX_INPUT_STANDARD: usize = 100;
/// Length ceiling for programmer buffers.
pub const MAX_INPUT_PROGRAMMER: usize = 69;

/// One editable buffer: `input` is the authoritative unformatted
/// expression, `display` a derived preview that is recomputed and never
/// hand-edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorState {
    pub input: String,
    pub display: String,
}

impl Default for CalculatorState {
    fn default() -> Self {
        CalculatorState {
            input: "0".to_owned(),
            display: "0".to_owned(),
        }
    }
}

/// Entry phase of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Empty,
    Entering,
    OperatorPending,
    Evaluated,
}

/// Formatted renderings of one value in all four programmer bases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayValues {
    pub bin: String,
    pub oct: String,
    pub dec: String,
    pub hex: String,
}

impl DisplayValues {
    pub fn get(&self, base: Base) -> &str {
        match base {
            Base::Binary => &self.bin,
            Base::Octal => &self.oct,
            Base::Decimal => &self.dec,
            Base::Hexadecimal => &self.hex,
        }
    }
}

/// What the caller re-renders from after every dispatch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    pub input: String,
    pub error: Option<String>,
    pub expression: Option<String>,
    pub result: Option<String>,
    pub display_values: Option<DisplayValues>,
}

impl Response {
    fn state(input: &str) -> Self {
        Response {
            input: input.to_owned(),
            ..Response::default()
        }
    }

    fn rejection(input: &str, error: &CalcError) -> Self {
        Response {
            input: input.to_owned(),
            error: Some(error.to_string()),
            ..Response::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOp {
    Clear,
    Recall,
    Add,
    Subtract,
    Store,
}

/// Classification of the shared token vocabulary. Mode-specific tokens
/// (scientific functions, base selectors) are intercepted by the variants
/// before this runs and surface here as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Digit(char),
    Dot,
    Operator(&'static str),
    Equals,
    Clear,
    ClearEntry,
    Backspace,
    SignToggle,
    Percent,
    OpenParen,
    CloseParen,
    Memory(MemoryOp),
    Other(String),
}

pub fn classify(token: &str) -> Button {
    match token {
        "=" => Button::Equals,
        "AC" | "C" => Button::Clear,
        "CE" => Button::ClearEntry,
        "backspace" | "⌫" => Button::Backspace,
        "±" | "+/-" => Button::SignToggle,
        "%" => Button::Percent,
        "(" => Button::OpenParen,
        ")" => Button::CloseParen,
        "." => Button::Dot,
        "+" => Button::Operator("+"),
        "-" | "−" => Button::Operator("-"),
        "×" | "*" => Button::Operator("×"),
        "÷" | "/" => Button::Operator("÷"),
        "<<" => Button::Operator("<<"),
        ">>" => Button::Operator(">>"),
        "^" => Button::Operator("^"),
        "yroot" => Button::Operator("yroot"),
        "MC" => Button::Memory(MemoryOp::Clear),
        "MR" => Button::Memory(MemoryOp::Recall),
        "M+" => Button::Memory(MemoryOp::Add),
        "M-" => Button::Memory(MemoryOp::Subtract),
        "MS" => Button::Memory(MemoryOp::Store),
        _ => {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_hexdigit() => {
                    Button::Digit(c.to_ascii_uppercase())
                }
                _ => Button::Other(token.to_owned()),
            }
        }
    }
}

/// Tokens exempt from the length ceiling: control commands, memory ops,
/// shift operators, and the sign toggle.
fn length_exempt(button: &Button) -> bool {
    matches!(
        button,
        Button::Equals
            | Button::Clear
            | Button::ClearEntry
            | Button::Backspace
            | Button::SignToggle
            | Button::Memory(_)
            | Button::Operator("<<")
            | Button::Operator(">>")
    )
}

/// Upper estimate of the characters a button would append.
fn appended_len(button: &Button) -> usize {
    match button {
        Button::Digit(_) | Button::Dot | Button::OpenParen | Button::CloseParen => 1,
        Button::Operator(op) => op.chars().count() + 2,
        // modulo in programmer mode appends a padded operator
        Button::Percent => 3,
        Button::SignToggle => 1,
        Button::Other(name) => name.chars().count() + 1,
        _ => 0,
    }
}

/// Pre-mutation length check shared by the variants.
fn exceeds_limit(input: &str, button: &Button, limit: usize) -> bool {
    !length_exempt(button) && input.chars().count() + appended_len(button) > limit
}

/// The closed set of calculator personalities.
#[derive(Debug)]
pub enum Calculator {
    Standard(StandardCalculator),
    Programmer(ProgrammerCalculator),
    Scientific(ScientificCalculator),
}

impl Calculator {
    pub fn standard(settings: Settings) -> Self {
        Calculator::Standard(StandardCalculator::new(settings))
    }

    pub fn programmer(settings: Settings) -> Self {
        Calculator::Programmer(ProgrammerCalculator::new(settings))
    }

    pub fn scientific(settings: Settings) -> Self {
        Calculator::Scientific(ScientificCalculator::new(settings))
    }

    pub fn handle_button_click(&mut self, token: &str) -> Response {
        match self {
            Calculator::Standard(c) => c.handle_button_click(token),
            Calculator::Programmer(c) => c.handle_button_click(token),
            Calculator::Scientific(c) => c.handle_button_click(token),
        }
    }

    pub fn is_programmer_variant(&self) -> bool {
        matches!(self, Calculator::Programmer(_))
    }

    pub fn is_scientific_variant(&self) -> bool {
        matches!(self, Calculator::Scientific(_))
    }

    /// The active buffer's authoritative input.
    pub fn input(&self) -> &str {
        match self {
            Calculator::Standard(c) => &c.state().input,
            Calculator::Programmer(c) => &c.active_state().input,
            Calculator::Scientific(c) => &c.state().input,
        }
    }

    /// The active buffer's derived display.
    pub fn display(&self) -> &str {
        match self {
            Calculator::Standard(c) => &c.state().display,
            Calculator::Programmer(c) => &c.active_state().display,
            Calculator::Scientific(c) => &c.state().display,
        }
    }
}
