//! Phone number validation for smsguard.
//!
//! Numbering-plan correctness is delegated to the `phonenumber` crate. This
//! crate only adds a cheap shape check before the library runs and refuses
//! numbers that contain emergency-service sequences.

use phonenumber::{country, Mode, PhoneNumber};
use serde::{Deserialize, Serialize};
use sms_core::{strip_separators, ValidationError};
use tracing::debug;

/// Sequences that must never appear in a national significant number.
pub const EMERGENCY_SEQUENCES: [&str; 4] = ["911", "112", "999", "000"];

/// Digits allowed after the leading non-zero digit.
const MIN_TRAILING_DIGITS: usize = 7;
const MAX_TRAILING_DIGITS: usize = 14;

/// Structured verdict. Serializes as `{isValid, formatted, ...}` or `{isValid, error}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneValidation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub number_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhoneValidation {
    fn invalid(error: &ValidationError) -> Self {
        Self {
            is_valid: false,
            formatted: None,
            national: None,
            country: None,
            number_type: None,
            carrier: None,
            error: Some(error.to_string()),
        }
    }

    fn valid(number: &PhoneNumber) -> Self {
        Self {
            is_valid: true,
            formatted: Some(number.format().mode(Mode::E164).to_string()),
            national: Some(number.national().to_string()),
            country: number.country().id().map(|id| format!("{:?}", id)),
            number_type: Some(format!(
                "{:?}",
                number.number_type(&phonenumber::metadata::DATABASE)
            )),
            carrier: number.carrier().map(|c| c.to_string()),
            error: None,
        }
    }
}

/// Validates raw recipient strings against a default region.
#[derive(Clone, Debug)]
pub struct PhoneValidator {
    region: country::Id,
}

impl PhoneValidator {
    pub fn new(region: country::Id) -> Self {
        Self { region }
    }

    /// Build from an ISO 3166 region code such as `"US"`.
    pub fn from_region_code(code: &str) -> Result<Self, ValidationError> {
        let region = code
            .trim()
            .to_ascii_uppercase()
            .parse::<country::Id>()
            .map_err(|_| ValidationError::InvalidInput(format!("unknown region code: {}", code)))?;
        Ok(Self::new(region))
    }

    pub fn region(&self) -> country::Id {
        self.region
    }

    /// Validate one number. Never fails outward; inspect `is_valid`.
    pub fn validate(&self, raw: &str) -> PhoneValidation {
        match self.parse(raw) {
            Ok(number) => PhoneValidation::valid(&number),
            Err(err) => {
                debug!("Rejected phone {:?}: {}", raw, err);
                PhoneValidation::invalid(&err)
            }
        }
    }

    /// Strict variant of [`validate`](Self::validate) for callers that want the taxonomy.
    pub fn parse(&self, raw: &str) -> Result<PhoneNumber, ValidationError> {
        let cleaned = strip_separators(raw);
        if cleaned.is_empty() {
            return Err(ValidationError::InvalidInput("phone number is missing".into()));
        }
        if !has_plausible_shape(&cleaned) {
            return Err(ValidationError::InvalidPhoneFormat(raw.trim().to_string()));
        }

        let number = phonenumber::parse(Some(self.region), &cleaned)
            .map_err(|e| ValidationError::DelegateLibrary(e.to_string()))?;

        if !phonenumber::is_valid(&number) {
            return Err(ValidationError::InvalidPhoneFormat(format!(
                "{} is not a valid number",
                cleaned
            )));
        }

        let national = number.national().to_string();
        if contains_emergency_sequence(&national) {
            return Err(ValidationError::EmergencyNumberRejected(national));
        }

        Ok(number)
    }
}

/// Loose `+?[1-9]\d{7,14}` check run before the heavier library parse.
fn has_plausible_shape(cleaned: &str) -> bool {
    let digits = cleaned.strip_prefix('+').unwrap_or(cleaned);
    let mut chars = digits.chars();
    match chars.next() {
        Some('1'..='9') => {}
        _ => return false,
    }
    let rest = chars.as_str();
    rest.chars().all(|c| c.is_ascii_digit())
        && (MIN_TRAILING_DIGITS..=MAX_TRAILING_DIGITS).contains(&rest.len())
}

pub fn contains_emergency_sequence(national: &str) -> bool {
    EMERGENCY_SEQUENCES.iter().any(|seq| national.contains(seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us() -> PhoneValidator {
        PhoneValidator::from_region_code("US").unwrap()
    }

    #[test]
    fn shape_check_matches_loose_pattern() {
        assert!(has_plausible_shape("+12015550123"));
        assert!(has_plausible_shape("41555526"));
        assert!(!has_plausible_shape("+02015550123"));
        assert!(!has_plausible_shape("4155552"));
        assert!(!has_plausible_shape("1234567890123456"));
        assert!(!has_plausible_shape("+1201555012a"));
        assert!(!has_plausible_shape("+"));
    }

    #[test]
    fn valid_us_number_is_formatted_as_e164() {
        let result = us().validate("(201) 555-0123");
        assert!(result.is_valid, "{:?}", result.error);
        assert_eq!(result.formatted.as_deref(), Some("+12015550123"));
        assert_eq!(result.national.as_deref(), Some("2015550123"));
        assert_eq!(result.country.as_deref(), Some("US"));
        assert!(result.number_type.is_some());
        assert!(result.error.is_none());
    }

    #[test]
    fn international_prefix_overrides_default_region() {
        let result = us().validate("+44 7400 123456");
        assert!(result.is_valid, "{:?}", result.error);
        assert_eq!(result.formatted.as_deref(), Some("+447400123456"));
        assert_eq!(result.country.as_deref(), Some("GB"));
    }

    #[test]
    fn malformed_input_fails_before_library() {
        let err = us().parse("call me maybe").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhoneFormat(_)));

        let err = us().parse("   ").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInput(_)));
    }

    #[test]
    fn region_code_is_trimmed_and_uppercased() {
        let validator = PhoneValidator::from_region_code(" gb ").unwrap();
        assert_eq!(validator.region(), country::Id::GB);
    }

    #[test]
    fn library_rejection_is_invalid_format() {
        let err = us().parse("+1 123 456 7890").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhoneFormat(_)));
    }

    #[test]
    fn unknown_country_code_is_a_library_error() {
        let err = us().parse("+999123456789").unwrap_err();
        assert!(matches!(err, ValidationError::DelegateLibrary(_)));
    }

    #[test]
    fn emergency_sequences_are_rejected() {
        let err = us().parse("+1 201 555 9990").unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmergencyNumberRejected("2015559990".into())
        );

        let result = us().validate("+1 201 555 1120");
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("emergency"));
    }

    #[test]
    fn invalid_result_serializes_with_error_only() {
        let result = us().validate("nope");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isValid"], false);
        assert!(json["error"].is_string());
        assert!(json.get("formatted").is_none());
    }

    #[test]
    fn unknown_region_code_is_invalid_input() {
        let err = PhoneValidator::from_region_code("ZZZ").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidInput(_)));
    }

    #[test]
    fn emergency_helper_checks_substrings() {
        assert!(contains_emergency_sequence("5559110"));
        assert!(contains_emergency_sequence("20000"));
        assert!(!contains_emergency_sequence("2015550123"));
    }
}
