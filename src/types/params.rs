//! Generation controls sent to the inference endpoint.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

/// Parameter set for one generation request.
///
/// Every field is required: the whole set is hashed into the cache key, so there
/// are no optional gaps that could make two equivalent requests hash differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub repetition_penalty: f64,
    pub do_sample: bool,
    pub return_full_text: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 1024,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.1,
            do_sample: true,
            return_full_text: false,
        }
    }
}

impl GenerationParams {
    pub const MAX_NEW_TOKENS_LIMIT: u32 = 4096;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_new_tokens(mut self, n: u32) -> Self {
        self.max_new_tokens = n;
        self
    }

    pub fn with_temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_top_p(mut self, p: f64) -> Self {
        self.top_p = p;
        self
    }

    pub fn with_repetition_penalty(mut self, p: f64) -> Self {
        self.repetition_penalty = p;
        self
    }

    pub fn with_do_sample(mut self, enabled: bool) -> Self {
        self.do_sample = enabled;
        self
    }

    pub fn with_return_full_text(mut self, enabled: bool) -> Self {
        self.return_full_text = enabled;
        self
    }

    /// Check every control against the range the endpoint accepts.
    pub fn validate(&self) -> Result<()> {
        check_range("params.temperature", self.temperature, 0.0, 1.0)?;
        check_range("params.top_p", self.top_p, 0.0, 1.0)?;
        check_range("params.repetition_penalty", self.repetition_penalty, 1.0, 2.0)?;
        if self.max_new_tokens == 0 || self.max_new_tokens > Self::MAX_NEW_TOKENS_LIMIT {
            return Err(Error::validation_with_context(
                "max_new_tokens out of range",
                ErrorContext::new()
                    .with_field_path("params.max_new_tokens")
                    .with_details(format!(
                        "expected 1..={}, got {}",
                        Self::MAX_NEW_TOKENS_LIMIT,
                        self.max_new_tokens
                    )),
            ));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        return Ok(());
    }
    Err(Error::validation_with_context(
        format!("{} out of range", field.trim_start_matches("params.")),
        ErrorContext::new()
            .with_field_path(field)
            .with_details(format!("expected {min:.1}..={max:.1}, got {value}")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GenerationParams::default().validate().is_ok());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let v = serde_json::to_value(GenerationParams::default()).unwrap();
        assert_eq!(v["max_new_tokens"], 1024);
        assert_eq!(v["repetition_penalty"], 1.1);
        assert_eq!(v["do_sample"], true);
        assert_eq!(v["return_full_text"], false);
    }

    #[test]
    fn rejects_out_of_range_controls() {
        let err = GenerationParams::default()
            .with_temperature(1.5)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("params.temperature")
        );

        assert!(GenerationParams::default().with_top_p(-0.1).validate().is_err());
        assert!(GenerationParams::default()
            .with_repetition_penalty(0.5)
            .validate()
            .is_err());
        assert!(GenerationParams::default()
            .with_max_new_tokens(0)
            .validate()
            .is_err());
        assert!(GenerationParams::default()
            .with_temperature(f64::NAN)
            .validate()
            .is_err());
    }
}
