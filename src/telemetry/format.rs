//! # Value Formatting
//!
//! Every float on the wire carries exactly three decimals in fixed-point
//! notation; arrays and vectors join their elements with `~`.

use super::units::Conversion;
use crate::wire::{ARRAY_SEPARATOR, FIELD_TERMINATOR, KEY_VALUE_SEPARATOR};

/// Digits after the decimal point for every float field
pub const FLOAT_PRECISION: usize = 3;

/// Format a float with [`FLOAT_PRECISION`] decimals
///
/// Non-finite input formats as zero so the field keeps its numeric shape.
///
/// # Examples
///
/// ```
/// use telem_bridge::telemetry::format::format_float;
///
/// assert_eq!(format_float(1.0), "1.000");
/// assert_eq!(format_float(-0.12345), "-0.123");
/// assert_eq!(format_float(f32::NAN), "0.000");
/// ```
#[must_use]
pub fn format_float(value: f32) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}", FLOAT_PRECISION, value)
}

/// Apply a conversion, then format
#[must_use]
pub fn format_converted(value: f32, conversion: Conversion) -> String {
    format_float(conversion.apply(value))
}

/// Format integer and boolean fields
#[must_use]
pub fn format_int(value: i32) -> String {
    value.to_string()
}

/// Join converted, formatted elements with `~`, preserving order
///
/// # Examples
///
/// ```
/// use telem_bridge::telemetry::format::format_array;
/// use telem_bridge::telemetry::units::Conversion;
///
/// assert_eq!(format_array(&[1.0, 2.5, 0.0], Conversion::Identity), "1.000~2.500~0.000");
/// ```
#[must_use]
pub fn format_array(values: &[f32], conversion: Conversion) -> String {
    let mut out = String::with_capacity(values.len() * 8);

    for (i, &value) in values.iter().enumerate() {
        if i > 0 {
            out.push(ARRAY_SEPARATOR);
        }
        out.push_str(&format_converted(value, conversion));
    }

    out
}

/// Strip the trailing extension (text after the last `.`) from a file name
///
/// # Examples
///
/// ```
/// use telem_bridge::telemetry::format::strip_extension;
///
/// assert_eq!(strip_extension("Cessna172.acf"), "Cessna172");
/// assert_eq!(strip_extension("NoExtensionName"), "NoExtensionName");
/// ```
#[must_use]
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) => &file_name[..dot],
        None => file_name,
    }
}

/// Replace wire delimiters in free text so the line grammar holds
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(|c| if c == FIELD_TERMINATOR || c == KEY_VALUE_SEPARATOR { '_' } else { c })
        .collect()
}
