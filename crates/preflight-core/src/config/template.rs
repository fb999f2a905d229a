//! Caller-authored failure messages with a single path slot

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Placeholders accepted for the path
const SLOTS: [&str; 2] = ["{0}", "{}"];

/// Errors raised when a template does not have exactly one path slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("message template has no path slot ({{0}} or {{}}): '{0}'")]
    MissingSlot(String),

    #[error("message template has {count} path slots, expected exactly one: '{template}'")]
    TooManySlots { template: String, count: usize },
}

/// A message with exactly one substitution slot for a configuration path
///
/// ```
/// use preflight_core::MessageTemplate;
///
/// let template = MessageTemplate::new("No table name was defined for config option: {0}").unwrap();
/// assert_eq!(
///     template.render("infra:aws:dynamodb:table_name"),
///     "No table name was defined for config option: infra:aws:dynamodb:table_name"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: Cow<'static, str>,
}

impl MessageTemplate {
    /// Parse a template, rejecting zero or several slots
    pub fn new(text: impl Into<Cow<'static, str>>) -> Result<Self, TemplateError> {
        let text = text.into();
        match count_slots(&text) {
            1 => Ok(Self { text }),
            0 => Err(TemplateError::MissingSlot(text.into_owned())),
            count => Err(TemplateError::TooManySlots {
                template: text.into_owned(),
                count,
            }),
        }
    }

    /// Substitute the path into the slot
    pub fn render(&self, path: &str) -> String {
        for slot in SLOTS {
            if self.text.contains(slot) {
                return self.text.replacen(slot, path, 1);
            }
        }
        self.text.to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<&'static str> for MessageTemplate {
    type Error = TemplateError;

    fn try_from(text: &'static str) -> Result<Self, Self::Error> {
        MessageTemplate::new(text)
    }
}

impl TryFrom<String> for MessageTemplate {
    type Error = TemplateError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        MessageTemplate::new(text)
    }
}

fn count_slots(text: &str) -> usize {
    SLOTS.iter().map(|slot| text.matches(slot).count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_slot() {
        let t = MessageTemplate::new("No table name was provided for config option: {0}").unwrap();
        assert_eq!(
            t.render("infra.aws.dynamodb.table_name"),
            "No table name was provided for config option: infra.aws.dynamodb.table_name"
        );
    }

    #[test]
    fn test_anonymous_slot() {
        let t = MessageTemplate::new(String::from("{} is not set")).unwrap();
        assert_eq!(t.render("a.b"), "a.b is not set");
    }

    #[test]
    fn test_missing_slot_rejected() {
        let err = MessageTemplate::new("nothing to substitute").unwrap_err();
        assert!(matches!(err, TemplateError::MissingSlot(_)));
    }

    #[test]
    fn test_too_many_slots_rejected() {
        let err = MessageTemplate::new("{0} and again {0}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::TooManySlots {
                template: "{0} and again {0}".to_string(),
                count: 2
            }
        );

        assert!(MessageTemplate::new("{0} and {}").is_err());
    }

    #[test]
    fn test_try_from() {
        let t: MessageTemplate = "missing {0}".try_into().unwrap();
        assert_eq!(t.as_str(), "missing {0}");
    }
}
