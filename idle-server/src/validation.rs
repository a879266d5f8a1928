//! Request body validation.
//!
//! [`Validated<T>`] parses a JSON body and runs [`Validate`] on it before
//! the handler sees it. Failures become a 400 with one entry per rejected
//! field.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use idle_core::api::{
    CreateCharacterRequest, FieldError, LoginRequest, RegisterRequest, UpdateCharacterRequest,
    UpdateProfileRequest,
};
use idle_core::{Action, ActionRequest, CharacterClass};
use serde::de::DeserializeOwned;
use serde_json::Value;

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

pub trait Validate {
    /// Every field that fails, in declaration order. Empty means valid.
    fn validate(&self) -> Vec<FieldError>;
}

/// A JSON body that passed [`Validate`].
#[derive(Debug, Clone)]
pub struct Validated<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Validated<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![FieldError::new("body", rejection.body_text())])
            })?;
        let errors = body.validate();
        if errors.is_empty() {
            Ok(Validated(body))
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

// ============================================================================
// Field rules
// ============================================================================

/// Messages for an alphanumeric, length-bounded field.
struct NameRule {
    field: &'static str,
    label: &'static str,
    min: usize,
    max: usize,
}

const USERNAME: NameRule = NameRule {
    field: "username",
    label: "Username",
    min: 3,
    max: 30,
};

const CHARACTER_NAME: NameRule = NameRule {
    field: "name",
    label: "Character name",
    min: 2,
    max: 20,
};

impl NameRule {
    fn check(&self, value: &str) -> Option<FieldError> {
        let message = if value.is_empty() {
            format!("{} is required", self.label)
        } else if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            format!("{} must contain only alphanumeric characters", self.label)
        } else if value.chars().count() < self.min {
            format!("{} must be at least {} characters long", self.label, self.min)
        } else if value.chars().count() > self.max {
            format!("{} must be at most {} characters long", self.label, self.max)
        } else {
            return None;
        };
        Some(FieldError::new(self.field, message))
    }
}

fn check_email(value: &str) -> Option<FieldError> {
    if value.is_empty() {
        Some(FieldError::new("email", "Email is required"))
    } else if !is_email(value) {
        Some(FieldError::new("email", "Please provide a valid email address"))
    } else {
        None
    }
}

/// A pragmatic address check: `local@domain.tld`, no whitespace.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
        && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
}

fn check_password(value: &str) -> Option<FieldError> {
    let message = if value.is_empty() {
        "Password is required"
    } else if value.chars().count() < 8 {
        "Password must be at least 8 characters long"
    } else if !is_strong_password(value) {
        "Password must contain at least one lowercase letter, one uppercase letter, one number, and one special character"
    } else {
        return None;
    };
    Some(FieldError::new("password", message))
}

pub fn is_strong_password(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

// ============================================================================
// Request schemas
// ============================================================================

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldError> {
        [
            USERNAME.check(&self.username),
            check_email(&self.email),
            check_password(&self.password),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let password = self
            .password
            .is_empty()
            .then(|| FieldError::new("password", "Password is required"));
        [check_email(&self.email), password]
            .into_iter()
            .flatten()
            .collect()
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Vec<FieldError> {
        [
            self.username.as_deref().and_then(|u| USERNAME.check(u)),
            self.email.as_deref().and_then(check_email),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Validate for CreateCharacterRequest {
    fn validate(&self) -> Vec<FieldError> {
        let class = if self.class.is_empty() {
            Some(FieldError::new("class", "Character class is required"))
        } else if self.class.parse::<CharacterClass>().is_err() {
            let names: Vec<&str> = CharacterClass::all().iter().map(|c| c.name()).collect();
            Some(FieldError::new(
                "class",
                format!("Character class must be one of: {}", names.join(", ")),
            ))
        } else {
            None
        };
        [CHARACTER_NAME.check(&self.name), class]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Negative or fractional stats are rejected while parsing the body.
impl Validate for UpdateCharacterRequest {
    fn validate(&self) -> Vec<FieldError> {
        self.name
            .as_deref()
            .and_then(|name| CHARACTER_NAME.check(name))
            .into_iter()
            .collect()
    }
}

impl Validate for ActionRequest {
    fn validate(&self) -> Vec<FieldError> {
        let action = if self.action.is_empty() {
            Some(FieldError::new("action", "Action is required"))
        } else if !Action::NAMES.contains(&self.action.as_str()) {
            Some(FieldError::new(
                "action",
                format!("Action must be one of: {}", Action::NAMES.join(", ")),
            ))
        } else {
            None
        };
        let data = match &self.data {
            None | Some(Value::Object(_)) => None,
            Some(_) => Some(FieldError::new("data", "\"data\" must be of type object")),
        };
        [action, data].into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_valid_registration() {
        let request = RegisterRequest {
            username: "hero42".into(),
            email: "hero@example.com".into(),
            password: "Secret1!".into(),
        };
        assert!(request.validate().is_empty());
    }

    #[test]
    fn test_registration_messages() {
        let request = RegisterRequest {
            username: "a_b".into(),
            email: "nope".into(),
            password: "secret11".into(),
        };
        let errors = request.validate();
        assert_eq!(fields(&errors), ["username", "email", "password"]);
        assert_eq!(
            errors[0].message,
            "Username must contain only alphanumeric characters"
        );
        assert_eq!(errors[1].message, "Please provide a valid email address");
        assert!(errors[2].message.starts_with("Password must contain"));

        let missing = RegisterRequest::default().validate();
        assert_eq!(missing[0].message, "Username is required");
        assert_eq!(missing[1].message, "Email is required");
        assert_eq!(missing[2].message, "Password is required");
    }

    #[test]
    fn test_name_lengths() {
        assert_eq!(
            USERNAME.check("ab").unwrap().message,
            "Username must be at least 3 characters long"
        );
        assert_eq!(
            CHARACTER_NAME.check(&"x".repeat(21)).unwrap().message,
            "Character name must be at most 20 characters long"
        );
        assert!(CHARACTER_NAME.check("Al").is_none());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_email("a@b.co"));
        assert!(is_email("first.last+tag@sub.example.org"));
        assert!(!is_email("a@b"));
        assert!(!is_email("@b.com"));
        assert!(!is_email("a@@b.com"));
        assert!(!is_email("a b@c.com"));
        assert!(!is_email("a@b.c"));
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("Abcdef1!"));
        assert!(!is_strong_password("abcdef1!"));
        assert!(!is_strong_password("ABCDEF1!"));
        assert!(!is_strong_password("Abcdefg!"));
        assert!(!is_strong_password("Abcdefg1"));
        assert_eq!(
            check_password("Ab1!").unwrap().message,
            "Password must be at least 8 characters long"
        );
    }

    #[test]
    fn test_character_class() {
        let request = CreateCharacterRequest {
            name: "Merlin".into(),
            class: "bard".into(),
        };
        let errors = request.validate();
        assert_eq!(
            errors[0].message,
            "Character class must be one of: warrior, mage, rogue, paladin, necromancer"
        );
    }

    #[test]
    fn test_profile_update_fields_are_optional() {
        assert!(UpdateProfileRequest::default().validate().is_empty());
        let request = UpdateProfileRequest {
            username: None,
            email: Some("broken".into()),
        };
        assert_eq!(fields(&request.validate()), ["email"]);
    }

    #[test]
    fn test_action_request() {
        let ok = ActionRequest {
            action: "levelUp".into(),
            data: Some(json!({"stat": "strength"})),
        };
        assert!(ok.validate().is_empty());

        let bad = ActionRequest {
            action: "dance".into(),
            data: Some(json!([1, 2])),
        };
        assert_eq!(fields(&bad.validate()), ["action", "data"]);

        let missing = ActionRequest {
            action: String::new(),
            data: None,
        };
        assert_eq!(missing.validate()[0].message, "Action is required");
    }
}
