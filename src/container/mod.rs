mod bootstrap;
mod builder;
mod inject;

pub mod context;
pub mod current;
pub mod definition;
pub mod report;

pub use context::ApplicationContext;
pub use current::{current_context, require_current_context};
pub use definition::{BeanDefinition, BeanState, CreationStrategy};
pub use report::{BeanReport, ContextReport};
