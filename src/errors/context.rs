use thiserror::Error;

use crate::properties::PropertyError;

/// Crate-level error type covering definition building, bean creation,
/// dependency resolution, and context lookups.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Bean definition error: {message}")]
    Definition { message: String },

    #[error("Error creating bean '{bean}' of type {type_name}: {message}")]
    Creation {
        bean: String,
        type_name: String,
        message: String,
    },

    #[error("Error creating bean '{bean}' of type {type_name}: {source}")]
    CreationFailed {
        bean: String,
        type_name: String,
        #[source]
        source: Box<ContextError>,
    },

    #[error("Unsatisfied dependency: {message}")]
    UnsatisfiedDependency { message: String },

    #[error("Circular dependency detected: {path} (cycle at: '{bean}')")]
    CircularDependency { path: String, bean: String },

    #[error("No such bean: {what}")]
    BeanNotFound { what: String },

    #[error("No unique bean of type {type_name}: {message}")]
    NoUniqueBean { type_name: String, message: String },

    #[error("Bean '{name}' is not of required type {required} (actual type: {actual})")]
    NotOfRequiredType {
        name: String,
        required: String,
        actual: String,
    },

    #[error("Property resolution error: {0}")]
    Property(#[from] PropertyError),

    #[error("Lock error on resource: {resource}")]
    Lock { resource: String },

    #[error("No current application context is registered")]
    ContextUnset,
}

impl ContextError {
    /// Create a new definition error
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Create a new creation error
    pub fn creation(
        bean: impl Into<String>,
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Creation {
            bean: bean.into(),
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure raised while invoking a bean's constructor or factory
    pub fn creation_failed(
        bean: impl Into<String>,
        type_name: impl Into<String>,
        source: ContextError,
    ) -> Self {
        Self::CreationFailed {
            bean: bean.into(),
            type_name: type_name.into(),
            source: Box::new(source),
        }
    }

    /// Create a new unsatisfied dependency error
    pub fn unsatisfied(message: impl Into<String>) -> Self {
        Self::UnsatisfiedDependency {
            message: message.into(),
        }
    }

    /// Create a new circular dependency error
    pub fn circular(bean: impl Into<String>, path: impl Into<String>) -> Self {
        Self::CircularDependency {
            path: path.into(),
            bean: bean.into(),
        }
    }

    /// Create a not-found error for a bean name
    pub fn name_not_found(name: impl Into<String>) -> Self {
        Self::BeanNotFound {
            what: format!("no bean defined with name '{}'", name.into()),
        }
    }

    /// Create a not-found error for a bean type
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        Self::BeanNotFound {
            what: format!("no bean defined with type {}", type_name.into()),
        }
    }

    /// Create a new ambiguous lookup error
    pub fn no_unique(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NoUniqueBean {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Create a new required-type mismatch error
    pub fn not_of_required_type(
        name: impl Into<String>,
        required: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::NotOfRequiredType {
            name: name.into(),
            required: required.into(),
            actual: actual.into(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::Lock {
            resource: resource.into(),
        }
    }

    /// Check if the error is a definition error
    pub fn is_definition(&self) -> bool {
        matches!(self, Self::Definition { .. })
    }

    /// Check if the error is a creation error
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Creation { .. } | Self::CreationFailed { .. })
    }

    /// Check if the error is an unsatisfied dependency (including cycles)
    pub fn is_unsatisfied(&self) -> bool {
        matches!(
            self,
            Self::UnsatisfiedDependency { .. } | Self::CircularDependency { .. }
        )
    }

    /// Check if the error is a not-found lookup error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BeanNotFound { .. })
    }

    /// Check if the error is an ambiguous lookup error
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::NoUniqueBean { .. })
    }

    /// Check if the error is a property error
    pub fn is_property(&self) -> bool {
        matches!(self, Self::Property(_))
    }
}
