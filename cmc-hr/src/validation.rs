//! Form validation helpers
//!
//! Handlers collect problems into [`FieldErrors`] and turn them into a
//! single 400 response listing every bad field.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulator for field-level validation failures
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    /// Record the error of a `Result`, passing the value through
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.0))
        }
    }
}

/// Philippine government identifiers carried on employee records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernmentId {
    Sss,
    PhilHealth,
    PagIbig,
    Tin,
}

impl GovernmentId {
    /// Accepted digit counts once separators are removed
    fn digit_counts(&self) -> &'static [usize] {
        match self {
            GovernmentId::Sss => &[10],
            GovernmentId::PhilHealth => &[12],
            GovernmentId::PagIbig => &[12],
            GovernmentId::Tin => &[9, 12],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GovernmentId::Sss => "SSS number",
            GovernmentId::PhilHealth => "PhilHealth number",
            GovernmentId::PagIbig => "Pag-IBIG MID number",
            GovernmentId::Tin => "TIN",
        }
    }

    /// Strip `-` and spaces and check the digit count
    ///
    /// ```
    /// use cmc_hr::validation::GovernmentId;
    ///
    /// assert_eq!(GovernmentId::Sss.normalize("34-1234567-8").unwrap(), "3412345678");
    /// assert!(GovernmentId::Tin.normalize("123-456-789").is_ok());
    /// assert!(GovernmentId::PhilHealth.normalize("12-3456").is_err());
    /// ```
    pub fn normalize(&self, raw: &str) -> Result<String, String> {
        let digits: String = raw.chars().filter(|c| *c != '-' && *c != ' ').collect();

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("{} may only contain digits, dashes and spaces", self.label()));
        }

        let counts = self.digit_counts();
        if !counts.contains(&digits.len()) {
            let expected = counts
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(format!("{} must have {} digits", self.label(), expected));
        }

        Ok(digits)
    }
}

/// Normalize an optional government ID; blank means "not provided"
pub fn optional_government_id(
    errors: &mut FieldErrors,
    field: &str,
    kind: GovernmentId,
    raw: Option<&str>,
) -> Option<String> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    errors.check(field, kind.normalize(raw))
}

/// `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD form", raw))
}

/// Trimmed value, or an error when blank
pub fn required(raw: &str, what: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        Err(format!("{} is required", what))
    } else {
        Ok(value.to_string())
    }
}

/// Trimmed value, `None` when blank
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Department codes: 2-10 chars of `A-Z`, `0-9`, `-`; input is uppercased
pub fn department_code(raw: &str) -> Result<String, String> {
    let code = raw.trim().to_ascii_uppercase();
    if !(2..=10).contains(&code.len()) {
        return Err("Department code must be 2 to 10 characters".to_string());
    }
    if !code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-') {
        return Err("Department code may only contain letters, digits and dashes".to_string());
    }
    Ok(code)
}

/// Usernames: 3-32 chars of `a-z`, `0-9`, `.`, `_`, `-`; input is lowercased
pub fn username(raw: &str) -> Result<String, String> {
    let name = raw.trim().to_ascii_lowercase();
    if !(3..=32).contains(&name.len()) {
        return Err("Username must be 3 to 32 characters".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
    {
        return Err("Username may only contain letters, digits, '.', '_' and '-'".to_string());
    }
    Ok(name)
}
