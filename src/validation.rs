use regex::Regex;

use crate::error::{Result, SourcingError};

/// Input validation for user- and client-supplied values
pub struct InputValidator {
    mobile_re: Regex,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputValidator {
    pub fn new() -> Self {
        Self {
            // Indian mobile numbers: 10 digits, leading 6-9
            mobile_re: Regex::new(r"^[6-9]\d{9}$").expect("mobile pattern is valid"),
        }
    }

    /// Script names must carry the expected extension and must not traverse
    /// out of the scripts directory.
    pub fn validate_script_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || !name.ends_with(".py") {
            return Err(SourcingError::Validation(
                "Invalid script name".to_string(),
            ));
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(SourcingError::Validation(
                "Invalid script name".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_user_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SourcingError::Validation(
                "Please enter your name".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_mobile(&self, mobile: &str) -> Result<()> {
        if !self.mobile_re.is_match(mobile) {
            return Err(SourcingError::Validation(
                "Please enter a valid 10-digit mobile number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Strip free text down to alphanumerics and spaces before it reaches the
/// scraper subprocess argv.
pub fn sanitize_query(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect()
}
