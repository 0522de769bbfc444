//! Base contract system

use attache_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Base contract trait
pub trait Contract<T: ?Sized>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Run several contracts, collecting every error
pub fn validate_all<T: ?Sized>(entity: &T, contracts: &[&dyn Contract<T>]) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    for contract in contracts {
        if let Err(e) = contract.validate(entity) {
            errors.merge(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
