//! Sample entity and its request bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{check_length, Validate, ValidationError};

/// Name length bounds, in characters
pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 100;

/// Maximum description length, in characters
pub const DESCRIPTION_MAX_LEN: usize = 500;

/// A demonstration resource kept in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// UUID v4, as text
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every update
    pub updated_at: DateTime<Utc>,
}

/// POST /sample body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSample {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to true
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// PATCH /sample/{id} body; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSample {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    check_length("name", name, NAME_MIN_LEN, NAME_MAX_LEN)
}

fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description {
        Some(d) => check_length("description", d, 0, DESCRIPTION_MAX_LEN),
        None => Ok(()),
    }
}

impl Validate for CreateSample {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_name(&self.name)?;
        validate_description(self.description.as_deref())
    }
}

impl Validate for UpdateSample {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        validate_description(self.description.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name() {
        let err = serde_json::from_str::<CreateSample>(r#"{"description": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn create_rejects_unknown_fields() {
        let err = serde_json::from_str::<CreateSample>(r#"{"name": "abc", "color": "red"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("color"));
    }

    #[test]
    fn create_reads_camel_case() {
        let body: CreateSample =
            serde_json::from_str(r#"{"name": "abc", "isActive": false}"#).unwrap();
        assert_eq!(body.is_active, Some(false));
    }

    #[test]
    fn create_validation() {
        let ok = CreateSample {
            name: "Mi primer sample".into(),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let short = CreateSample {
            name: "ab".into(),
            ..Default::default()
        };
        assert!(matches!(
            short.validate(),
            Err(ValidationError::TooShort { field: "name", .. })
        ));

        let long_description = CreateSample {
            name: "abc".into(),
            description: Some("d".repeat(501)),
            ..Default::default()
        };
        assert!(matches!(
            long_description.validate(),
            Err(ValidationError::TooLong { field: "description", max: 500 })
        ));
    }

    #[test]
    fn update_validates_present_fields_only() {
        assert!(UpdateSample::default().validate().is_ok());

        let empty_name = UpdateSample {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            empty_name.validate(),
            Err(ValidationError::Empty { field: "name" })
        ));
    }

    #[test]
    fn sample_serializes_camel_case() {
        let now = Utc::now();
        let sample = Sample {
            id: "id-1".into(),
            name: "abc".into(),
            description: String::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&sample).unwrap();
        assert_eq!(value["isActive"], true);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }
}
