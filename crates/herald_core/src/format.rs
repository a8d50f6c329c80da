//! Argument formatting
//!
//! Guest values never cross into this crate. The embedding passes a
//! [`GuestArgs`] capability for each call, which renders arguments through the
//! guest's own conversion routine so user-defined overrides are honored.

use std::borrow::Cow;
use thiserror::Error;

/// Significant digits used for numbers written by the `write` primitive (`%.14g`).
pub const NUMBER_PRECISION: usize = 14;

/// Errors raised while turning a guest argument into text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("'{hook}' must return a string to print")]
    NotText { hook: String },

    #[error("conversion hook '{hook}' is not a function")]
    HookUnavailable { hook: String },

    #[error("argument #{index} has no text representation")]
    NoText { index: usize },

    #[error("argument #{index} is out of range")]
    MissingArgument { index: usize },

    /// The guest threw while converting. The exception stays pending on the
    /// guest side and is rethrown by the binding.
    #[error("guest conversion raised an exception")]
    Raised,
}

/// Raw view of one argument, as the `write` primitive sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArg<'a> {
    Number(f64),
    Text(Cow<'a, str>),
}

/// The argument list of one emission call.
pub trait GuestArgs {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of argument `index` produced by the guest's conversion hook.
    fn render(&self, index: usize) -> Result<String, FormatError>;

    /// Argument `index` without going through the conversion hook.
    fn raw(&self, index: usize) -> Result<RawArg<'_>, FormatError>;
}

/// Text of argument `index` for the `write` primitive: numbers use the fixed
/// numeric format, everything else its raw text.
pub fn raw_text(args: &dyn GuestArgs, index: usize) -> Result<Cow<'_, str>, FormatError> {
    Ok(match args.raw(index)? {
        RawArg::Number(value) => Cow::Owned(format_number(value)),
        RawArg::Text(text) => text,
    })
}

/// Format a number like C's `%.14g`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Exponent after rounding to the target precision decides the notation.
    let scientific = format!("{:.*e}", NUMBER_PRECISION - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= NUMBER_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (NUMBER_PRECISION as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Host-side argument, for emitting from Rust without a guest engine.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Text(String),
    Number(f64),
}

impl From<&str> for HostValue {
    fn from(text: &str) -> Self {
        HostValue::Text(text.to_string())
    }
}

impl From<String> for HostValue {
    fn from(text: String) -> Self {
        HostValue::Text(text)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl GuestArgs for [HostValue] {
    fn len(&self) -> usize {
        <[HostValue]>::len(self)
    }

    fn render(&self, index: usize) -> Result<String, FormatError> {
        match self.get(index) {
            Some(HostValue::Text(text)) => Ok(text.clone()),
            Some(HostValue::Number(value)) => Ok(format_number(*value)),
            None => Err(FormatError::MissingArgument { index }),
        }
    }

    fn raw(&self, index: usize) -> Result<RawArg<'_>, FormatError> {
        match self.get(index) {
            Some(HostValue::Text(text)) => Ok(RawArg::Text(Cow::Borrowed(text.as_str()))),
            Some(HostValue::Number(value)) => Ok(RawArg::Number(*value)),
            None => Err(FormatError::MissingArgument { index }),
        }
    }
}

impl GuestArgs for Vec<HostValue> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn render(&self, index: usize) -> Result<String, FormatError> {
        self.as_slice().render(index)
    }

    fn raw(&self, index: usize) -> Result<RawArg<'_>, FormatError> {
        self.as_slice().raw(index)
    }
}
