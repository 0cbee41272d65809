//! Error taxonomy for the calculator engines.
//!
//! Every failure is a short human-readable string because the caller shows
//! it verbatim on the display. Nothing here escapes the
//! `handle_button_click` boundary as a panic; engines convert errors into
//! the `error` field of a [`Response`](crate::engine::Response).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Result magnitude exceeds the 63-bit signed bound.
    #[error("Overflow")]
    Overflow,

    /// Literal or computed division by zero.
    #[error("Cannot divide by zero")]
    DivisionByZero,

    /// A scientific function was given an argument outside its domain.
    /// `call` echoes the offending call, e.g. `log(-5)`.
    #[error("Invalid input for {call}")]
    Domain { call: String },

    /// Malformed buffer that the auto-close leniency could not repair,
    /// or an invalid token sequence.
    #[error("Invalid expression")]
    InvalidExpression,

    /// The buffer would exceed the mode's length ceiling.
    /// Rejected before mutation; the prior buffer stays valid.
    #[error("Maximum input length reached")]
    MaxInputLength,

    /// A base conversion or switch named an unrecognized base.
    #[error("Unrecognized base: {0}")]
    InvalidBase(String),
}

impl CalcError {
    pub fn domain(name: &str, arg: &str) -> Self {
        CalcError::Domain {
            call: format!("{}({})", name, arg),
        }
    }
}
