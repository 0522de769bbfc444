//! Property validations for attachments
//!
//! ```rust,ignore
//! let validation = PropertyValidation::new(
//!     "format",
//!     ["cover_image"],
//!     AllowedValues::one_of(["jpeg", "png", "gif"]),
//! )?;
//! validation.validate(&album)?;
//! // cover_image: "format is incorrect. It needs to be one of 'jpeg', 'png', 'gif', but was 'tiff'"
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use attache_core::error::ValidationErrors;
use thiserror::Error;
use tracing::trace;

use crate::base::{Contract, ValidationResult};

/// Value of an attachment property
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl PropertyValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering between comparable values: numbers with numbers, text with text
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Text(a), PropertyValue::Text(b)) => Some(a.cmp(b)),
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value.into())
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        PropertyValue::Integer(value.into())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

/// Something exposing named read-only properties, such as an image attachment
pub trait PropertyBearing {
    fn property(&self, name: &str) -> Option<PropertyValue>;
}

/// A record holding attachments under attribute names
pub trait AttachmentRecord {
    fn attachment(&self, attribute: &str) -> Option<&dyn PropertyBearing>;
}

/// Values a property is allowed to take
#[derive(Debug, Clone, PartialEq)]
pub enum AllowedValues {
    OneOf(Vec<PropertyValue>),
    /// Inclusive range
    Between(PropertyValue, PropertyValue),
}

impl AllowedValues {
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PropertyValue>,
    {
        AllowedValues::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn exactly(value: impl Into<PropertyValue>) -> Self {
        AllowedValues::OneOf(vec![value.into()])
    }

    pub fn between(low: impl Into<PropertyValue>, high: impl Into<PropertyValue>) -> Self {
        AllowedValues::Between(low.into(), high.into())
    }

    /// A missing value is never allowed
    pub fn includes(&self, value: Option<&PropertyValue>) -> bool {
        let Some(value) = value else {
            return false;
        };

        match self {
            AllowedValues::OneOf(values) => values.contains(value),
            AllowedValues::Between(low, high) => {
                matches!(
                    low.compare(value),
                    Some(Ordering::Less | Ordering::Equal)
                ) && matches!(
                    value.compare(high),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
        }
    }

    /// Human readable description, e.g. `one of 'png', 'gif'`
    pub fn describe(&self) -> String {
        match self {
            AllowedValues::Between(low, high) => format!("between {} and {}", low, high),
            AllowedValues::OneOf(values) if values.len() > 1 => {
                let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
                format!("one of {}", quoted.join(", "))
            }
            AllowedValues::OneOf(values) => values
                .first()
                .map(|v| format!("'{}'", v))
                .unwrap_or_default(),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, AllowedValues::OneOf(values) if values.is_empty())
    }
}

type MessageFn = dyn Fn(Option<&PropertyValue>) -> String + Send + Sync;

/// Error message for a failed property check
#[derive(Clone)]
pub enum Message {
    Static(String),
    /// Built from the offending value when the check fails
    Computed(Arc<MessageFn>),
}

impl Message {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&PropertyValue>) -> String + Send + Sync + 'static,
    {
        Message::Computed(Arc::new(f))
    }

    pub fn resolve(&self, value: Option<&PropertyValue>) -> String {
        match self {
            Message::Static(message) => message.clone(),
            Message::Computed(f) => f(value),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Static(message) => f.debug_tuple("Static").field(message).finish(),
            Message::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for Message {
    fn from(message: &str) -> Self {
        Message::Static(message.to_string())
    }
}

impl From<String> for Message {
    fn from(message: String) -> Self {
        Message::Static(message)
    }
}

/// Misconfigured property validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationSetupError {
    #[error("you need to provide at least one attribute which has the property")]
    MissingAttributes,
    #[error("you must provide at least one allowed value")]
    MissingAllowedValues,
}

/// `width_in_px` -> `width in px`, `format_id` -> `format`
fn humanize(name: &str) -> String {
    let name = name.trim_start_matches('_');
    let name = name.strip_suffix("_id").unwrap_or(name);
    name.replace('_', " ").to_lowercase()
}

/// Checks one property of the attachments under the given attributes
#[derive(Debug, Clone)]
pub struct PropertyValidation {
    property: String,
    attributes: Vec<String>,
    allowed: AllowedValues,
    message: Option<Message>,
}

impl PropertyValidation {
    pub fn new<I, S>(
        property: impl Into<String>,
        of: I,
        allowed: AllowedValues,
    ) -> Result<Self, ValidationSetupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attributes: Vec<String> = of.into_iter().map(Into::into).collect();
        if attributes.is_empty() {
            return Err(ValidationSetupError::MissingAttributes);
        }
        if allowed.is_empty() {
            return Err(ValidationSetupError::MissingAllowedValues);
        }

        Ok(Self {
            property: property.into(),
            attributes,
            allowed,
            message: None,
        })
    }

    /// Replace the default error message
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Error message reported when `value` is not allowed
    pub fn message_for(&self, value: Option<&PropertyValue>) -> String {
        if let Some(message) = &self.message {
            return message.resolve(value);
        }

        let mut message = format!(
            "{} is incorrect. It needs to be {}",
            humanize(&self.property),
            self.allowed.describe()
        );
        if let Some(value) = value {
            message.push_str(&format!(", but was '{}'", value));
        }
        message
    }
}

impl<R: AttachmentRecord + ?Sized> Contract<R> for PropertyValidation {
    fn validate(&self, record: &R) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        for attribute in &self.attributes {
            let Some(attachment) = record.attachment(attribute) else {
                continue;
            };

            let value = attachment.property(&self.property);
            if !self.allowed.includes(value.as_ref()) {
                trace!(attribute = %attribute, property = %self.property, "Property not allowed");
                errors.add(attribute.clone(), self.message_for(value.as_ref()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
