pub mod component;
pub mod key;
pub mod scan;

pub use component::{
    ArgList, AutowiredBinding, BoxedValue, ComponentMetadata, ComponentMetadataBuilder,
    ConstructorSpec, FactoryMethodSpec, HookSpec, InjectPoint, InjectTarget, ParamSpec,
    ProvidedType, ResolvedArg, SharedInstance, ValueBinding,
};
pub use key::{MemberModifiers, TypeKey, TypeKind};
pub use scan::ScanResult;
