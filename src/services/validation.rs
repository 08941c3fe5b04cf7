use serde_json::Value;

use crate::database::entities::{EntityType, RelationshipType};
use crate::errors::{AuthError, AuthResult, CatalogError, CatalogResult};

const MAX_ENTITY_NAME_CHARS: usize = 255;
const MAX_TAG_NAME_CHARS: usize = 50;
const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 50;
const MIN_PASSWORD_CHARS: usize = 8;

/// Input validation and normalisation for catalog and admin operations
pub struct ValidationService;

impl ValidationService {
    pub fn validate_entity_name(name: &str) -> CatalogResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(CatalogError::validation("Entity name is required"));
        }

        if trimmed.chars().count() > MAX_ENTITY_NAME_CHARS {
            return Err(CatalogError::validation(format!(
                "Entity name is too long (max {} characters)",
                MAX_ENTITY_NAME_CHARS
            )));
        }

        Ok(trimmed.to_string())
    }

    pub fn parse_entity_type(value: &str) -> CatalogResult<EntityType> {
        EntityType::from_str(value).ok_or_else(|| {
            CatalogError::validation(format!(
                "Invalid entity type '{}': expected one of capability, use case, tool, product",
                value
            ))
        })
    }

    pub fn parse_relationship_type(value: &str) -> CatalogResult<RelationshipType> {
        RelationshipType::from_str(value).ok_or_else(|| {
            let allowed = RelationshipType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            CatalogError::validation(format!(
                "Invalid relationship type '{}': expected one of {}",
                value, allowed
            ))
        })
    }

    /// Blank descriptions are stored as NULL.
    pub fn normalize_description(description: Option<&str>) -> Option<String> {
        description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }

    pub fn validate_metadata(metadata: &Value) -> CatalogResult<()> {
        match metadata {
            Value::Object(_) | Value::Null => Ok(()),
            _ => Err(CatalogError::validation("Metadata must be a JSON object")),
        }
    }

    pub fn validate_tag_name(name: &str) -> CatalogResult<String> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(CatalogError::validation("Tag name cannot be empty"));
        }

        if trimmed.chars().count() > MAX_TAG_NAME_CHARS {
            return Err(CatalogError::validation(format!(
                "Tag name '{}' is too long (max {} characters)",
                trimmed, MAX_TAG_NAME_CHARS
            )));
        }

        Ok(trimmed.to_string())
    }

    /// Trim, drop blanks and de-duplicate, keeping first-seen order.
    pub fn normalize_tags(tags: &[String]) -> CatalogResult<Vec<String>> {
        let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if tag.trim().is_empty() {
                continue;
            }
            let name = Self::validate_tag_name(tag)?;
            if !normalized.contains(&name) {
                normalized.push(name);
            }
        }
        Ok(normalized)
    }

    pub fn validate_username(username: &str) -> AuthResult<()> {
        let length = username.chars().count();
        if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&length) {
            return Err(AuthError::InvalidUsername(format!(
                "must be between {} and {} characters",
                MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
            )));
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AuthError::InvalidUsername(
                "may only contain letters, numbers, underscores and hyphens".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_password(password: &str) -> AuthResult<()> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword(format!(
                "must be at least {} characters long",
                MIN_PASSWORD_CHARS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_name_is_trimmed_and_required() {
        assert_eq!(
            ValidationService::validate_entity_name("  Cloud Migration ").unwrap(),
            "Cloud Migration"
        );
        assert!(ValidationService::validate_entity_name("   ").is_err());
        assert!(ValidationService::validate_entity_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn invalid_entity_type_is_a_validation_error() {
        let err = ValidationService::parse_entity_type("platform").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            ValidationService::parse_entity_type("Use Case").unwrap(),
            EntityType::UseCase
        );
    }

    #[test]
    fn tags_are_deduplicated() {
        let tags = vec![
            " cloud ".to_string(),
            "cloud".to_string(),
            "".to_string(),
            "devops".to_string(),
        ];
        assert_eq!(
            ValidationService::normalize_tags(&tags).unwrap(),
            vec!["cloud".to_string(), "devops".to_string()]
        );
    }

    #[test]
    fn metadata_must_be_an_object() {
        assert!(ValidationService::validate_metadata(&json!({"domain": "Security"})).is_ok());
        assert!(ValidationService::validate_metadata(&json!([1, 2])).is_err());
    }

    #[test]
    fn username_rules() {
        assert!(ValidationService::validate_username("alice_admin").is_ok());
        assert!(ValidationService::validate_username("ab").is_err());
        assert!(ValidationService::validate_username("bad name").is_err());
        assert!(ValidationService::validate_username(&"a".repeat(51)).is_err());
    }

    #[test]
    fn password_rules() {
        assert!(ValidationService::validate_password("longenough").is_ok());
        assert_eq!(
            ValidationService::validate_password("short"),
            Err(AuthError::WeakPassword(
                "must be at least 8 characters long".to_string()
            ))
        );
    }
}
