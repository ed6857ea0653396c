pub mod container;
pub mod errors;
pub mod metadata;
pub mod properties;

pub use container::{
    current_context, require_current_context, ApplicationContext, BeanDefinition, BeanReport,
    BeanState, ContextReport, CreationStrategy,
};
pub use errors::ContextError;
pub use metadata::{
    ArgList, AutowiredBinding, ComponentMetadata, ComponentMetadataBuilder, ConstructorSpec,
    FactoryMethodSpec, InjectPoint, InjectTarget, MemberModifiers, ProvidedType, ScanResult,
    TypeKey, TypeKind, ValueBinding,
};
pub use properties::{ConverterRegistry, PropertyError, PropertyResolver, PropertySource};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the current version
pub fn version() -> &'static str {
    VERSION
}
