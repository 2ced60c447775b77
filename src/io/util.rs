//! Run-length notation for per-site arrays.
//!
//! A flattened array is written as space-separated `<count>*<value>` groups,
//! one per run of consecutive equal values in site order.

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RunLengthError {
    #[error("invalid repeat count in token '{0}'")]
    InvalidCount(String),
    #[error("invalid value in token '{0}'")]
    InvalidValue(String),
}

/// Encodes a flat array as run-length groups.
///
/// ```
/// use incar_forge::io::encode_run_length;
///
/// assert_eq!(encode_run_length(&[0.0, 2.0, 0.0, 0.0, 0.0]), "1*0.0 1*2.0 3*0.0");
/// ```
pub fn encode_run_length(values: &[f64]) -> String {
    let mut groups: Vec<(usize, f64)> = Vec::new();
    for &value in values {
        match groups.last_mut() {
            Some((count, last)) if *last == value => *count += 1,
            _ => groups.push((1, value)),
        }
    }
    groups
        .iter()
        .map(|(count, value)| format!("{count}*{}", format_real(*value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expands run-length tokens back into a flat array.
///
/// Tokens without a `*` contribute a single value. Fortran `d` exponents
/// are accepted.
pub fn expand_run_length(tokens: &str) -> Result<Vec<f64>, RunLengthError> {
    let mut values = Vec::new();
    for token in tokens.split_whitespace() {
        let (count, value) = match token.split_once('*') {
            Some((count, value)) => {
                let count = count
                    .parse::<usize>()
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or_else(|| RunLengthError::InvalidCount(token.to_string()))?;
                (count, value)
            }
            None => (1, token),
        };
        let value =
            parse_real(value).ok_or_else(|| RunLengthError::InvalidValue(token.to_string()))?;
        values.extend(std::iter::repeat(value).take(count));
    }
    Ok(values)
}

/// Renders a real the way the INCAR writer expects: integral values keep
/// one decimal place so they still read as reals.
pub fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Parses a real, accepting Fortran `d`/`D` exponents.
pub fn parse_real(token: &str) -> Option<f64> {
    let token = token.trim();
    token
        .parse::<f64>()
        .ok()
        .or_else(|| token.replace(['d', 'D'], "e").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
