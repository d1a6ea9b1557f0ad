//! Reader feedback forwarded to a third-party form relay

mod relay;

pub use relay::{FeedbackConfig, FeedbackRelay};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sender name used when the form leaves it blank
const ANONYMOUS: &str = "Аноним";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("invalid feedback: {0}")]
    Validation(&'static str),
    #[error("feedback relay unreachable: {0}")]
    Transport(String),
    #[error("feedback relay rejected the submission with HTTP {0}")]
    Rejected(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    #[default]
    Bug,
    Suggestion,
    Creature,
    Other,
}

impl FeedbackCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => "bug",
            FeedbackCategory::Suggestion => "suggestion",
            FeedbackCategory::Creature => "creature",
            FeedbackCategory::Other => "other",
        }
    }

    /// Human-readable name used in the mail subject
    pub fn display_name(self) -> &'static str {
        match self {
            FeedbackCategory::Bug => "Сообщение об ошибке",
            FeedbackCategory::Suggestion => "Предложение",
            FeedbackCategory::Creature => "Новое существо",
            FeedbackCategory::Other => "Другое",
        }
    }
}

/// A submitted feedback form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub category: FeedbackCategory,
    pub message: String,
    /// Hidden field real users leave empty; the relay discards filled ones
    #[serde(default, rename = "_gotcha")]
    pub honeypot: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if self.message.trim().is_empty() {
            return Err(FeedbackError::Validation("message must not be empty"));
        }
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(FeedbackError::Validation("email address is malformed"));
        }
        Ok(())
    }

    pub fn subject(&self) -> String {
        format!("Witcher Bestiary: {}", self.category.display_name())
    }

    /// Fields posted to the relay, in submission order
    pub fn relay_fields(&self, recipient: Option<&str>) -> Vec<(&'static str, String)> {
        let name = self.name.trim();
        let email = self.email.trim();

        let mut fields = vec![
            (
                "name",
                if name.is_empty() { ANONYMOUS } else { name }.to_string(),
            ),
            ("email", email.to_string()),
            ("message", self.message.clone()),
            ("category", self.category.as_str().to_string()),
        ];
        if !email.is_empty() {
            fields.push(("_replyto", email.to_string()));
        }
        fields.push(("_subject", self.subject()));
        fields.push(("_format", "plain".to_string()));
        fields.push(("_language", "ru".to_string()));
        fields.push(("_gotcha", self.honeypot.clone()));
        if let Some(recipient) = recipient {
            fields.push(("_cc", recipient.to_string()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(message: &str) -> FeedbackForm {
        FeedbackForm {
            message: message.to_string(),
            ..FeedbackForm::default()
        }
    }

    fn field<'a>(fields: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_validate() {
        assert!(form("Гуль выглядит странно").validate().is_ok());
        assert!(matches!(
            form("   ").validate(),
            Err(FeedbackError::Validation(_))
        ));

        let bad_email = FeedbackForm {
            email: "geralt".to_string(),
            ..form("текст")
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_anonymous_without_reply_to() {
        let fields = form("текст").relay_fields(None);
        assert_eq!(field(&fields, "name"), Some("Аноним"));
        assert_eq!(field(&fields, "category"), Some("bug"));
        assert_eq!(field(&fields, "_replyto"), None);
        assert_eq!(field(&fields, "_cc"), None);
        assert_eq!(
            field(&fields, "_subject"),
            Some("Witcher Bestiary: Сообщение об ошибке")
        );
        assert_eq!(field(&fields, "_gotcha"), Some(""));
    }

    #[test]
    fn test_reply_to_and_recipient() {
        let f = FeedbackForm {
            name: "Лютик".to_string(),
            email: "dandelion@oxenfurt.edu".to_string(),
            category: FeedbackCategory::Creature,
            ..form("Добавьте бруксу")
        };
        let fields = f.relay_fields(Some("owner@example.com"));
        assert_eq!(field(&fields, "name"), Some("Лютик"));
        assert_eq!(field(&fields, "_replyto"), Some("dandelion@oxenfurt.edu"));
        assert_eq!(field(&fields, "_cc"), Some("owner@example.com"));
        assert_eq!(
            field(&fields, "_subject"),
            Some("Witcher Bestiary: Новое существо")
        );
    }

    #[test]
    fn test_form_wire_format() {
        let f: FeedbackForm = serde_json::from_str(
            r#"{"message":"hi","category":"suggestion","_gotcha":"bot"}"#,
        )
        .unwrap();
        assert_eq!(f.category, FeedbackCategory::Suggestion);
        assert_eq!(f.honeypot, "bot");
        assert!(f.name.is_empty());
    }
}
