use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::errors::ContextError;
use crate::metadata::key::{MemberModifiers, TypeKey, TypeKind};

/// Shared handle to a managed instance.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Type-erased value passed across descriptor closures.
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// Zero-argument lifecycle callback bound to an instance.
pub type HookFn = Arc<dyn Fn(&SharedInstance) -> Result<(), ContextError> + Send + Sync>;

/// Stores a resolved value into one member of an instance.
pub type ApplyFn =
    Arc<dyn Fn(&SharedInstance, BoxedValue) -> Result<(), ContextError> + Send + Sync>;

/// Constructor invocation over a resolved argument list.
pub type ConstructFn = Arc<dyn Fn(ArgList) -> Result<SharedInstance, ContextError> + Send + Sync>;

/// Factory-method invocation over the owner instance and a resolved argument list.
pub type ProduceFn =
    Arc<dyn Fn(&SharedInstance, ArgList) -> Result<SharedInstance, ContextError> + Send + Sync>;

type CastFn = Arc<dyn Fn(&SharedInstance) -> Option<BoxedValue> + Send + Sync>;

/// One type a produced instance can be handed out as, with the checked
/// cast that yields an `Arc` of that type boxed as `BoxedValue`.
///
/// The self type is always one entry; trait objects the instance
/// satisfies are added by the registrant with a coercion function.
#[derive(Clone)]
pub struct ProvidedType {
    pub key: TypeKey,
    cast: CastFn,
}

impl ProvidedType {
    /// Entry for the instance's own type
    pub fn of<T: Send + Sync + 'static>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            cast: Arc::new(|shared: &SharedInstance| {
                shared
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|arc| Box::new(arc) as BoxedValue)
            }),
        }
    }

    /// Entry for a supertype `S` (typically a trait object) reached
    /// through an unsizing coercion from the concrete type `T`
    pub fn cast_to<T, S>(coerce: fn(Arc<T>) -> Arc<S>) -> Self
    where
        T: Send + Sync + 'static,
        S: ?Sized + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<S>(),
            cast: Arc::new(move |shared: &SharedInstance| {
                shared
                    .clone()
                    .downcast::<T>()
                    .ok()
                    .map(|arc| Box::new(coerce(arc)) as BoxedValue)
            }),
        }
    }

    pub(crate) fn cast(&self, instance: &SharedInstance) -> Option<BoxedValue> {
        (self.cast)(instance)
    }
}

impl std::fmt::Debug for ProvidedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProvidedType({})", self.key.type_name)
    }
}

/// Property binding on a parameter or member: a literal key or a
/// `${...}` placeholder expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBinding {
    pub expression: String,
}

impl ValueBinding {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// Bean binding on a parameter or member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutowiredBinding {
    pub required: bool,
    pub qualifier: Option<String>,
}

impl AutowiredBinding {
    pub fn required() -> Self {
        Self {
            required: true,
            qualifier: None,
        }
    }

    pub fn optional() -> Self {
        Self {
            required: false,
            qualifier: None,
        }
    }

    pub fn qualified(qualifier: impl Into<String>) -> Self {
        Self {
            required: true,
            qualifier: Some(qualifier.into()),
        }
    }

    pub fn optional_qualified(qualifier: impl Into<String>) -> Self {
        Self {
            required: false,
            qualifier: Some(qualifier.into()),
        }
    }
}

/// One constructor or factory-method parameter. Exactly one of the two
/// bindings must be present; the engine rejects the other combinations.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub type_key: TypeKey,
    pub value: Option<ValueBinding>,
    pub autowired: Option<AutowiredBinding>,
}

/// A resolved constructor/factory argument.
pub enum ResolvedArg {
    /// Converted property value of the parameter's declared type.
    Value(BoxedValue),
    /// Shared bean handle, pre-cast to the parameter's declared type.
    Bean(BoxedValue),
    /// Optional bean-bound argument that could not be resolved.
    Absent,
}

impl std::fmt::Debug for ResolvedArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedArg::Value(_) => write!(f, "Value(<boxed>)"),
            ResolvedArg::Bean(_) => write!(f, "Bean(<shared>)"),
            ResolvedArg::Absent => write!(f, "Absent"),
        }
    }
}

/// Positional argument list handed to a construct/produce closure.
/// Arguments are consumed front to back in declaration order.
pub struct ArgList {
    args: std::collections::VecDeque<ResolvedArg>,
}

impl ArgList {
    pub(crate) fn new(args: Vec<ResolvedArg>) -> Self {
        Self { args: args.into() }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Take the next argument as a converted property value
    pub fn take_value<T: Any + Send + Sync>(&mut self) -> Result<T, ContextError> {
        match self.args.pop_front() {
            Some(ResolvedArg::Value(boxed)) => boxed.downcast::<T>().map(|v| *v).map_err(|_| {
                ContextError::definition(format!(
                    "argument type mismatch: expected a property value of type {}",
                    std::any::type_name::<T>()
                ))
            }),
            Some(other) => Err(ContextError::definition(format!(
                "expected a property-bound argument, found {:?}",
                other
            ))),
            None => Err(ContextError::definition(
                "argument list exhausted: more arguments consumed than declared",
            )),
        }
    }

    /// Take the next argument as a required bean handle
    pub fn take_bean<T: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<T>, ContextError> {
        match self.args.pop_front() {
            Some(ResolvedArg::Bean(boxed)) => boxed.downcast::<Arc<T>>().map(|v| *v).map_err(|_| {
                ContextError::definition(format!(
                    "argument type mismatch: expected a bean of type {}",
                    std::any::type_name::<T>()
                ))
            }),
            Some(ResolvedArg::Absent) => Err(ContextError::definition(
                "required bean argument was resolved as absent; declare it optional or take it with take_bean_opt",
            )),
            Some(other) => Err(ContextError::definition(format!(
                "expected a bean-bound argument, found {:?}",
                other
            ))),
            None => Err(ContextError::definition(
                "argument list exhausted: more arguments consumed than declared",
            )),
        }
    }

    /// Take the next argument as an optional bean handle
    pub fn take_bean_opt<T: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> Result<Option<Arc<T>>, ContextError> {
        match self.args.pop_front() {
            Some(ResolvedArg::Bean(boxed)) => boxed
                .downcast::<Arc<T>>()
                .map(|v| Some(*v))
                .map_err(|_| {
                    ContextError::definition(format!(
                        "argument type mismatch: expected a bean of type {}",
                        std::any::type_name::<T>()
                    ))
                }),
            Some(ResolvedArg::Absent) => Ok(None),
            Some(other) => Err(ContextError::definition(format!(
                "expected a bean-bound argument, found {:?}",
                other
            ))),
            None => Err(ContextError::definition(
                "argument list exhausted: more arguments consumed than declared",
            )),
        }
    }
}

impl std::fmt::Debug for ArgList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArgList(len={})", self.args.len())
    }
}

/// Constructor descriptor: parameter list plus the invoke closure.
#[derive(Clone)]
pub struct ConstructorSpec {
    pub params: Vec<ParamSpec>,
    construct: ConstructFn,
}

impl ConstructorSpec {
    pub fn builder() -> ConstructorSpecBuilder {
        ConstructorSpecBuilder { params: Vec::new() }
    }

    pub fn invoke(&self, args: ArgList) -> Result<SharedInstance, ContextError> {
        (self.construct)(args)
    }
}

impl std::fmt::Debug for ConstructorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorSpec")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder for constructor descriptors
pub struct ConstructorSpecBuilder {
    params: Vec<ParamSpec>,
}

impl ConstructorSpecBuilder {
    /// Declare a property-bound parameter of semantic type `T`
    pub fn value_param<T: Any + Send + Sync>(
        mut self,
        name: &'static str,
        expression: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            type_key: TypeKey::of::<T>(),
            value: Some(ValueBinding::new(expression)),
            autowired: None,
        });
        self
    }

    /// Declare a bean-bound parameter of declared type `T`
    pub fn autowired_param<T: ?Sized + Send + Sync + 'static>(
        mut self,
        name: &'static str,
        binding: AutowiredBinding,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            type_key: TypeKey::of::<T>(),
            value: None,
            autowired: Some(binding),
        });
        self
    }

    /// Declare a parameter carrying both or neither binding, as captured
    /// from malformed source metadata. The engine rejects it at creation.
    pub fn raw_param(
        mut self,
        name: &'static str,
        type_key: TypeKey,
        value: Option<ValueBinding>,
        autowired: Option<AutowiredBinding>,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            type_key,
            value,
            autowired,
        });
        self
    }

    /// Finish with the invoke closure producing the component value
    pub fn build<C, F>(self, construct: F) -> ConstructorSpec
    where
        C: Send + Sync + 'static,
        F: Fn(ArgList) -> Result<C, ContextError> + Send + Sync + 'static,
    {
        let construct: ConstructFn = Arc::new(move |args: ArgList| {
            construct(args).map(|instance| Arc::new(instance) as SharedInstance)
        });
        ConstructorSpec {
            params: self.params,
            construct,
        }
    }
}

/// Factory-method descriptor declared on a configuration holder.
#[derive(Clone)]
pub struct FactoryMethodSpec {
    pub method_name: &'static str,
    pub return_key: TypeKey,
    pub params: Vec<ParamSpec>,
    pub modifiers: MemberModifiers,
    pub bean_name: Option<String>,
    pub primary: bool,
    pub order: Option<i32>,
    pub init_method: Option<&'static str>,
    pub destroy_method: Option<&'static str>,
    pub provides: Vec<ProvidedType>,
    pub methods: HashMap<&'static str, HookFn>,
    pub inject_points: Vec<InjectPoint>,
    produce: ProduceFn,
}

impl FactoryMethodSpec {
    /// Start a descriptor for a method on owner type `O` returning `R`
    pub fn builder<O, R>(method_name: &'static str) -> FactoryMethodSpecBuilder<O, R>
    where
        O: Send + Sync + 'static,
        R: Send + Sync + 'static,
    {
        FactoryMethodSpecBuilder {
            method_name,
            params: Vec::new(),
            modifiers: MemberModifiers::default(),
            bean_name: None,
            primary: false,
            order: None,
            init_method: None,
            destroy_method: None,
            provides: vec![ProvidedType::of::<R>()],
            methods: HashMap::new(),
            inject_points: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn invoke(
        &self,
        owner: &SharedInstance,
        args: ArgList,
    ) -> Result<SharedInstance, ContextError> {
        (self.produce)(owner, args)
    }
}

impl std::fmt::Debug for FactoryMethodSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryMethodSpec")
            .field("method_name", &self.method_name)
            .field("return_key", &self.return_key)
            .field("params", &self.params)
            .field("bean_name", &self.bean_name)
            .field("primary", &self.primary)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

/// Builder for factory-method descriptors
pub struct FactoryMethodSpecBuilder<O, R> {
    method_name: &'static str,
    params: Vec<ParamSpec>,
    modifiers: MemberModifiers,
    bean_name: Option<String>,
    primary: bool,
    order: Option<i32>,
    init_method: Option<&'static str>,
    destroy_method: Option<&'static str>,
    provides: Vec<ProvidedType>,
    methods: HashMap<&'static str, HookFn>,
    inject_points: Vec<InjectPoint>,
    _marker: PhantomData<(*const O, *const R)>,
}

impl<O, R> FactoryMethodSpecBuilder<O, R>
where
    O: Send + Sync + 'static,
    R: Send + Sync + 'static,
{
    /// Override the definition name (defaults to the method name)
    pub fn bean_name(mut self, name: impl Into<String>) -> Self {
        self.bean_name = Some(name.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Explicit init method name, resolved on the produced type at call time
    pub fn init_method(mut self, name: &'static str) -> Self {
        self.init_method = Some(name);
        self
    }

    /// Explicit destroy method name, resolved on the produced type at call time
    pub fn destroy_method(mut self, name: &'static str) -> Self {
        self.destroy_method = Some(name);
        self
    }

    pub fn modifiers(mut self, modifiers: MemberModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn value_param<T: Any + Send + Sync>(
        mut self,
        name: &'static str,
        expression: impl Into<String>,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            type_key: TypeKey::of::<T>(),
            value: Some(ValueBinding::new(expression)),
            autowired: None,
        });
        self
    }

    pub fn autowired_param<T: ?Sized + Send + Sync + 'static>(
        mut self,
        name: &'static str,
        binding: AutowiredBinding,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            type_key: TypeKey::of::<T>(),
            value: None,
            autowired: Some(binding),
        });
        self
    }

    /// Add a supertype the produced instance can be looked up as
    pub fn provides<S>(mut self, coerce: fn(Arc<R>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.provides.push(ProvidedType::cast_to::<R, S>(coerce));
        self
    }

    /// Register a named method of the produced type for hook-by-name resolution
    pub fn method(mut self, name: &'static str, hook: impl Fn(&R) + Send + Sync + 'static) -> Self {
        self.methods.insert(name, wrap_hook::<R>(hook));
        self
    }

    /// Add an injection point declared on the produced type
    pub fn inject(mut self, point: InjectPoint) -> Self {
        self.inject_points.push(point);
        self
    }

    /// Finish with the invoke closure producing the bean from its owner
    pub fn build<F>(self, produce: F) -> FactoryMethodSpec
    where
        F: Fn(&O, ArgList) -> Result<R, ContextError> + Send + Sync + 'static,
    {
        let method_name = self.method_name;
        let produce: ProduceFn = Arc::new(move |owner: &SharedInstance, args: ArgList| {
            let typed = owner.as_ref().downcast_ref::<O>().ok_or_else(|| {
                ContextError::definition(format!(
                    "factory method '{}' received an owner of unexpected type (expected {})",
                    method_name,
                    std::any::type_name::<O>()
                ))
            })?;
            produce(typed, args).map(|instance| Arc::new(instance) as SharedInstance)
        });
        FactoryMethodSpec {
            method_name: self.method_name,
            return_key: TypeKey::of::<R>(),
            params: self.params,
            modifiers: self.modifiers,
            bean_name: self.bean_name,
            primary: self.primary,
            order: self.order,
            init_method: self.init_method,
            destroy_method: self.destroy_method,
            provides: self.provides,
            methods: self.methods,
            inject_points: self.inject_points,
            produce,
        }
    }
}

/// Kind of member an injection point targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectTarget {
    Field,
    Setter { arity: usize },
}

/// Post-construction injection point: one field or setter carrying a
/// property or bean binding. Ancestor-declared members are flattened
/// into the owning type's point list by the descriptor generator.
#[derive(Clone)]
pub struct InjectPoint {
    pub member: &'static str,
    pub target: InjectTarget,
    pub type_key: TypeKey,
    pub modifiers: MemberModifiers,
    pub value: Option<ValueBinding>,
    pub autowired: Option<AutowiredBinding>,
    apply: ApplyFn,
}

impl InjectPoint {
    /// Start a field-target point
    pub fn field(member: &'static str) -> InjectPointBuilder {
        InjectPointBuilder::new(member, InjectTarget::Field)
    }

    /// Start a setter-target point with its declared parameter count
    pub fn setter(member: &'static str, arity: usize) -> InjectPointBuilder {
        InjectPointBuilder::new(member, InjectTarget::Setter { arity })
    }

    pub(crate) fn apply(
        &self,
        instance: &SharedInstance,
        value: BoxedValue,
    ) -> Result<(), ContextError> {
        (self.apply)(instance, value)
    }
}

impl std::fmt::Debug for InjectPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectPoint")
            .field("member", &self.member)
            .field("target", &self.target)
            .field("type_key", &self.type_key)
            .field("value", &self.value)
            .field("autowired", &self.autowired)
            .finish_non_exhaustive()
    }
}

/// Builder for injection points
pub struct InjectPointBuilder {
    member: &'static str,
    target: InjectTarget,
    type_key: TypeKey,
    modifiers: MemberModifiers,
    value: Option<ValueBinding>,
    autowired: Option<AutowiredBinding>,
}

impl InjectPointBuilder {
    fn new(member: &'static str, target: InjectTarget) -> Self {
        Self {
            member,
            target,
            type_key: TypeKey::of::<()>(),
            modifiers: MemberModifiers::default(),
            value: None,
            autowired: None,
        }
    }

    /// Bind the member to a property of semantic type `T`
    pub fn value<T: Any + Send + Sync>(mut self, expression: impl Into<String>) -> Self {
        self.type_key = TypeKey::of::<T>();
        self.value = Some(ValueBinding::new(expression));
        self
    }

    /// Bind the member to a bean of declared type `S`
    pub fn autowired<S: ?Sized + Send + Sync + 'static>(mut self, binding: AutowiredBinding) -> Self {
        self.type_key = TypeKey::of::<S>();
        self.autowired = Some(binding);
        self
    }

    pub fn modifiers(mut self, modifiers: MemberModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Finish with a write-once field accessor on the component type
    pub fn apply_field<C, V>(self, accessor: fn(&C) -> &OnceLock<V>) -> InjectPoint
    where
        C: Send + Sync + 'static,
        V: Any + Send + Sync,
    {
        let member = self.member;
        let apply: ApplyFn = Arc::new(move |instance: &SharedInstance, boxed: BoxedValue| {
            let component = downcast_receiver::<C>(instance)?;
            let value = boxed.downcast::<V>().map_err(|_| {
                ContextError::definition(format!(
                    "injected value type mismatch on member '{}': expected {}",
                    member,
                    std::any::type_name::<V>()
                ))
            })?;
            if accessor(component).set(*value).is_err() {
                return Err(ContextError::definition(format!(
                    "member '{}' was already initialized",
                    member
                )));
            }
            Ok(())
        });
        self.finish(apply)
    }

    /// Finish with an arbitrary setter-style application closure
    pub fn apply_with<C, V>(self, set: impl Fn(&C, V) + Send + Sync + 'static) -> InjectPoint
    where
        C: Send + Sync + 'static,
        V: Any + Send + Sync,
    {
        let member = self.member;
        let apply: ApplyFn = Arc::new(move |instance: &SharedInstance, boxed: BoxedValue| {
            let component = downcast_receiver::<C>(instance)?;
            let value = boxed.downcast::<V>().map_err(|_| {
                ContextError::definition(format!(
                    "injected value type mismatch on member '{}': expected {}",
                    member,
                    std::any::type_name::<V>()
                ))
            })?;
            set(component, *value);
            Ok(())
        });
        self.finish(apply)
    }

    fn finish(self, apply: ApplyFn) -> InjectPoint {
        InjectPoint {
            member: self.member,
            target: self.target,
            type_key: self.type_key,
            modifiers: self.modifiers,
            value: self.value,
            autowired: self.autowired,
            apply,
        }
    }
}

/// A lifecycle hook bound at descriptor-build time.
#[derive(Clone)]
pub struct HookSpec {
    pub method: &'static str,
    pub run: HookFn,
}

impl std::fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HookSpec({})", self.method)
    }
}

fn downcast_receiver<T: Send + Sync + 'static>(
    instance: &SharedInstance,
) -> Result<&T, ContextError> {
    instance.as_ref().downcast_ref::<T>().ok_or_else(|| {
        ContextError::definition(format!(
            "receiver type mismatch: expected {}",
            std::any::type_name::<T>()
        ))
    })
}

fn wrap_hook<T: Send + Sync + 'static>(hook: impl Fn(&T) + Send + Sync + 'static) -> HookFn {
    Arc::new(move |instance: &SharedInstance| {
        let typed = downcast_receiver::<T>(instance)?;
        hook(typed);
        Ok(())
    })
}

/// Read-only descriptor for one candidate type, produced by generated
/// or hand-written registration calls in place of runtime reflection.
pub struct ComponentMetadata {
    pub type_key: TypeKey,
    pub kind: TypeKind,
    pub component: bool,
    pub configuration: bool,
    pub primary: bool,
    pub order: Option<i32>,
    pub name: Option<String>,
    pub constructors: Vec<ConstructorSpec>,
    pub factory_methods: Vec<FactoryMethodSpec>,
    pub post_construct: Vec<HookSpec>,
    pub pre_destroy: Vec<HookSpec>,
    pub methods: HashMap<&'static str, HookFn>,
    pub inject_points: Vec<InjectPoint>,
    pub provides: Vec<ProvidedType>,
}

impl ComponentMetadata {
    /// Start a descriptor for a component-marked struct
    pub fn component<T: Send + Sync + 'static>() -> ComponentMetadataBuilder<T> {
        ComponentMetadataBuilder::new(false)
    }

    /// Start a descriptor for a configuration holder (also a component)
    pub fn configuration<T: Send + Sync + 'static>() -> ComponentMetadataBuilder<T> {
        ComponentMetadataBuilder::new(true)
    }

    /// Descriptor for a scanned candidate that carries no markers, kept
    /// so the definition builder can observe and skip it
    pub fn candidate<T: ?Sized + 'static>(kind: TypeKind) -> ComponentMetadata {
        ComponentMetadata {
            type_key: TypeKey::of::<T>(),
            kind,
            component: false,
            configuration: false,
            primary: false,
            order: None,
            name: None,
            constructors: Vec::new(),
            factory_methods: Vec::new(),
            post_construct: Vec::new(),
            pre_destroy: Vec::new(),
            methods: HashMap::new(),
            inject_points: Vec::new(),
            provides: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("type_key", &self.type_key)
            .field("kind", &self.kind)
            .field("component", &self.component)
            .field("configuration", &self.configuration)
            .field("primary", &self.primary)
            .field("order", &self.order)
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("factory_methods", &self.factory_methods.len())
            .field("inject_points", &self.inject_points.len())
            .finish()
    }
}

/// Builder for component descriptors
pub struct ComponentMetadataBuilder<T: ?Sized> {
    meta: ComponentMetadata,
    _marker: PhantomData<*const T>,
}

impl<T: Send + Sync + 'static> ComponentMetadataBuilder<T> {
    fn new(configuration: bool) -> Self {
        Self {
            meta: ComponentMetadata {
                type_key: TypeKey::of::<T>(),
                kind: TypeKind::Struct,
                component: true,
                configuration,
                primary: false,
                order: None,
                name: None,
                constructors: Vec::new(),
                factory_methods: Vec::new(),
                post_construct: Vec::new(),
                pre_destroy: Vec::new(),
                methods: HashMap::new(),
                inject_points: Vec::new(),
                provides: vec![ProvidedType::of::<T>()],
            },
            _marker: PhantomData,
        }
    }

    /// Marker-supplied name override
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.meta.name = Some(name.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.meta.primary = true;
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.meta.order = Some(order);
        self
    }

    /// Add a candidate constructor (exactly one must end up declared)
    pub fn constructor(mut self, spec: ConstructorSpec) -> Self {
        self.meta.constructors.push(spec);
        self
    }

    /// Add a factory-method descriptor (configuration holders only)
    pub fn factory_method(mut self, spec: FactoryMethodSpec) -> Self {
        self.meta.factory_methods.push(spec);
        self
    }

    /// Add a supertype this component can be looked up as
    pub fn provides<S>(mut self, coerce: fn(Arc<T>) -> Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.meta.provides.push(ProvidedType::cast_to::<T, S>(coerce));
        self
    }

    /// Add a post-construct hook bound to a method of this type
    pub fn post_construct(
        mut self,
        method: &'static str,
        hook: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        self.meta.post_construct.push(HookSpec {
            method,
            run: wrap_hook::<T>(hook),
        });
        self
    }

    /// Add a pre-destroy hook bound to a method of this type
    pub fn pre_destroy(
        mut self,
        method: &'static str,
        hook: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        self.meta.pre_destroy.push(HookSpec {
            method,
            run: wrap_hook::<T>(hook),
        });
        self
    }

    /// Register a named method for hook-by-name resolution
    pub fn method(mut self, name: &'static str, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.meta.methods.insert(name, wrap_hook::<T>(hook));
        self
    }

    /// Add an injection point declared on this type or an ancestor
    pub fn inject(mut self, point: InjectPoint) -> Self {
        self.meta.inject_points.push(point);
        self
    }

    pub fn build(self) -> ComponentMetadata {
        self.meta
    }
}
