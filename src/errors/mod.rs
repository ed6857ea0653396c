pub mod context;

pub use context::ContextError;
