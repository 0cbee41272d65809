//! Multi-mode calculator engine.
//!
//! Three personalities share one incremental input model: a standard
//! four-function calculator, a programmer calculator with synchronized
//! binary, octal, decimal and hexadecimal buffers over 64-bit integer
//! semantics, and a scientific calculator with trigonometric,
//! logarithmic and power functions over arbitrary-precision floats.
//!
//! The engine is driven one button token at a time:
//!
//! ```
//! use modecalc::{Calculator, Settings};
//!
//! let mut calc = Calculator::standard(Settings::default());
//! for token in ["1", "2", "+", "8", "×", "2", "="] {
//!     calc.handle_button_click(token);
//! }
//! assert_eq!(calc.input(), "28");
//! ```

pub mod base;
pub mod domain;
pub mod engine;
pub mod error;
pub mod eval;
pub mod format;
pub mod parens;
pub mod settings;

pub use base::{convert_to_base, Base};
pub use engine::{
    Calculator, CalculatorState, DisplayValues, ProgrammerCalculator, Response,
    ScientificCalculator, StandardCalculator,
};
pub use error::CalcError;
pub use eval::{EvalOptions, Evaluator, MAX_VALUE, MIN_VALUE};
pub use format::{format_result, plain_decimal};
pub use parens::ParenTracker;
pub use settings::{AngleUnit, NotationMode, Settings};
