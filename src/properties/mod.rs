pub mod convert;
pub mod error;
pub mod resolver;
pub mod source;

pub use convert::{parse_duration, parse_std_duration, ConverterRegistry};
pub use error::PropertyError;
pub use resolver::PropertyResolver;
pub use source::PropertySource;
