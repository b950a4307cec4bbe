//! Route-level error taxonomy.

use hermes_core::BindError;
use thiserror::Error;

/// A request-level routing failure.
///
/// Binding failures distinguish an unsatisfied argument from a conversion
/// failure (see [`BindError`]); handler failures carry whatever the handler
/// raised. Programming-contract violations (applying binders twice,
/// executing before the binder phase) are panics, not values of this type.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Argument binding failed.
    #[error(transparent)]
    Binding(#[from] BindError),

    /// The handler itself failed.
    #[error("handler invocation failed: {0}")]
    Handler(#[source] anyhow::Error),
}

impl RouteError {
    /// Returns true if this is an unsatisfied-argument failure.
    #[must_use]
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Binding(BindError::Unsatisfied { .. }))
    }

    /// Returns true if this is a conversion failure.
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Binding(BindError::Conversion { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Argument, ConversionError, TypeSpec};

    #[test]
    fn test_classification_helpers() {
        let arg = Argument::new("id", TypeSpec::Int);

        let unsatisfied = RouteError::from(BindError::unsatisfied(&arg));
        assert!(unsatisfied.is_unsatisfied());
        assert!(!unsatisfied.is_conversion());

        let conversion =
            RouteError::from(BindError::conversion(&arg, ConversionError::new("bad")));
        assert!(conversion.is_conversion());
    }
}
