//! Caller-supplied configuration shared by all engine variants.

/// How trigonometric arguments are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
    Gradians,
}

impl AngleUnit {
    /// Cycle order of the DEG key: degrees, radians, gradians.
    pub fn next(self) -> Self {
        match self {
            AngleUnit::Degrees => AngleUnit::Radians,
            AngleUnit::Radians => AngleUnit::Gradians,
            AngleUnit::Gradians => AngleUnit::Degrees,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AngleUnit::Degrees => "DEG",
            AngleUnit::Radians => "RAD",
            AngleUnit::Gradians => "GRAD",
        }
    }
}

/// Result rendering style, toggled by the scientific F-E key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotationMode {
    /// Fixed notation for moderate magnitudes, exponent form otherwise.
    #[default]
    Auto,
    /// Always exponent form.
    Scientific,
}

impl NotationMode {
    pub fn toggle(self) -> Self {
        match self {
            NotationMode::Auto => NotationMode::Scientific,
            NotationMode::Scientific => NotationMode::Auto,
        }
    }
}

/// Settings object consumed at engine construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Significant decimal digits shown in results.
    pub precision: usize,
    /// Render near-rational results as `n/d`.
    pub use_fractions: bool,
    /// Group decimal integer parts with `,` every three digits.
    pub use_thousands_separator: bool,
    pub angle_unit: AngleUnit,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            precision: 12,
            use_fractions: false,
            use_thousands_separator: true,
            angle_unit: AngleUnit::default(),
        }
    }
}

impl Settings {
    /// Working precision in bits: enough for `precision` decimal digits
    /// plus padding, never below 128.
    pub fn float_prec(&self) -> u32 {
        let bits = (self.precision as f64 * 10f64.log2()).ceil() as u32 + 32;
        bits.max(128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_unit_cycles_through_all_three() {
        let start = AngleUnit::Degrees;
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn float_prec_has_padding_floor() {
        assert!(Settings::default().float_prec() >= 128);
        let wide = Settings {
            precision: 100,
            ..Settings::default()
        };
        assert!(wide.float_prec() > 128);
    }
}
