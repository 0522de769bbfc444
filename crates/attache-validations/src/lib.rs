//! # attache-validations
//!
//! Validations for records that carry attachments.
//!
//! Attachments expose named, read-only properties (width, format, ...). A
//! [`PropertyValidation`] checks one property of one or more attachment
//! attributes against the allowed values and reports readable errors.

pub mod base;
pub mod property;

pub use base::*;
pub use property::{
    AllowedValues, AttachmentRecord, Message, PropertyBearing, PropertyValidation, PropertyValue,
    ValidationSetupError,
};
