//! Required-field checks shared by the request payloads.
//!
//! Payload fields are deserialized with `#[serde(default)]` so that an absent field and an
//! empty one are treated alike and every missing name can be reported in a single response.

use crate::error::AppError;

/// Fails with `400 Missing: a, b` naming every field whose value is empty.
pub fn require(fields: &[(&str, &str)]) -> Result<(), AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Missing: {}", missing.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_present() {
        assert!(require(&[("email", "a@b.ch"), ("token", "abc")]).is_ok());
    }

    #[test]
    fn test_names_each_missing_field_in_order() {
        match require(&[("email", ""), ("password", "pw"), ("firstname", "  "), ("lastname", "")]) {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Missing: email, firstname, lastname")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
