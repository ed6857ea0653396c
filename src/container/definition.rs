use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::ContextError;
use crate::metadata::component::{
    BoxedValue, ConstructorSpec, FactoryMethodSpec, HookFn, HookSpec, InjectPoint, ProvidedType,
    SharedInstance,
};
use crate::metadata::key::TypeKey;

/// How a bean instance comes into being.
#[derive(Clone)]
pub enum CreationStrategy {
    /// Invoke the component's declared constructor.
    Constructor(ConstructorSpec),
    /// Invoke a factory method on a configuration holder bean.
    Factory {
        owner: String,
        method: FactoryMethodSpec,
    },
}

impl std::fmt::Debug for CreationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationStrategy::Constructor(spec) => {
                write!(f, "Constructor({} params)", spec.params.len())
            }
            CreationStrategy::Factory { owner, method } => {
                write!(f, "Factory({}::{})", owner, method.method_name)
            }
        }
    }
}

/// Lifecycle stage of a definition. Stages only move forward; `close`
/// is the only transition into `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanState {
    Registered,
    Created,
    Injected,
    Initialized,
    Destroyed,
}

/// One named singleton: creation recipe, wiring metadata, and the
/// instance slot filled during bootstrap.
pub struct BeanDefinition {
    pub name: String,
    pub bean_type: TypeKey,
    pub strategy: CreationStrategy,
    /// Instantiation rank; unordered definitions sort last.
    pub order: i32,
    pub primary: bool,
    pub configuration: bool,
    pub init_hook: Option<HookSpec>,
    pub destroy_hook: Option<HookSpec>,
    pub init_hook_name: Option<String>,
    pub destroy_hook_name: Option<String>,
    pub methods: HashMap<&'static str, HookFn>,
    pub provides: Vec<ProvidedType>,
    pub inject_points: Vec<InjectPoint>,
    instance: Option<SharedInstance>,
    state: BeanState,
}

impl BeanDefinition {
    pub fn new(name: impl Into<String>, bean_type: TypeKey, strategy: CreationStrategy) -> Self {
        Self {
            name: name.into(),
            bean_type,
            strategy,
            order: i32::MAX,
            primary: false,
            configuration: false,
            init_hook: None,
            destroy_hook: None,
            init_hook_name: None,
            destroy_hook_name: None,
            methods: HashMap::new(),
            provides: Vec::new(),
            inject_points: Vec::new(),
            instance: None,
            state: BeanState::Registered,
        }
    }

    pub fn state(&self) -> BeanState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: BeanState) {
        self.state = state;
    }

    /// Instantiation sort key: ascending order, then name.
    pub fn sort_key(&self) -> (i32, &str) {
        (self.order, &self.name)
    }

    /// Whether this definition can satisfy a lookup for the given type.
    pub fn provides_type(&self, target: TypeKey) -> bool {
        self.provides.iter().any(|p| p.key == target)
    }

    /// Cast a held instance to one of the provided types.
    pub(crate) fn cast_instance(
        &self,
        instance: &SharedInstance,
        target: TypeKey,
    ) -> Option<BoxedValue> {
        self.provides
            .iter()
            .find(|p| p.key == target)
            .and_then(|p| p.cast(instance))
    }

    pub fn instance(&self) -> Option<SharedInstance> {
        self.instance.clone()
    }

    pub fn required_instance(&self) -> Result<SharedInstance, ContextError> {
        self.instance.clone().ok_or_else(|| {
            ContextError::creation(
                &self.name,
                self.bean_type.type_name,
                "instance not yet created during current stage",
            )
        })
    }

    /// Store the created instance after checking it really is of the
    /// declared bean type.
    pub(crate) fn set_instance(&mut self, instance: SharedInstance) -> Result<(), ContextError> {
        let matches_declared_type = self
            .provides
            .iter()
            .find(|p| p.key == self.bean_type)
            .map(|p| p.cast(&instance).is_some())
            .unwrap_or(false);
        if !matches_declared_type {
            return Err(ContextError::creation(
                &self.name,
                self.bean_type.type_name,
                "produced instance does not match the declared bean type",
            ));
        }
        self.instance = Some(instance);
        self.state = BeanState::Created;
        Ok(())
    }

    pub(crate) fn run_init(&self, instance: &SharedInstance) -> Result<(), ContextError> {
        if let Some(hook) = &self.init_hook {
            return (hook.run)(instance);
        }
        if let Some(name) = &self.init_hook_name {
            return self.run_named(name, instance, "init");
        }
        Ok(())
    }

    pub(crate) fn run_destroy(&self, instance: &SharedInstance) -> Result<(), ContextError> {
        if let Some(hook) = &self.destroy_hook {
            return (hook.run)(instance);
        }
        if let Some(name) = &self.destroy_hook_name {
            return self.run_named(name, instance, "destroy");
        }
        Ok(())
    }

    fn run_named(
        &self,
        name: &str,
        instance: &SharedInstance,
        role: &str,
    ) -> Result<(), ContextError> {
        let hook = self.methods.get(name).ok_or_else(|| {
            ContextError::definition(format!(
                "bean '{}' declares {role} method '{name}' but no such method is registered on {}",
                self.name, self.bean_type.type_name
            ))
        })?;
        hook(instance)
    }
}

impl std::fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("bean_type", &self.bean_type)
            .field("strategy", &self.strategy)
            .field("order", &self.order)
            .field("primary", &self.primary)
            .field("configuration", &self.configuration)
            .field("state", &self.state)
            .field("created", &self.instance.is_some())
            .finish()
    }
}

/// Pick the single definition satisfying a type lookup. Two or more
/// candidates narrow to the one primary; zero or several primaries is
/// an ambiguity error.
pub(crate) fn find_unique(
    definitions: &BTreeMap<String, BeanDefinition>,
    target: TypeKey,
) -> Result<Option<&BeanDefinition>, ContextError> {
    let candidates: Vec<&BeanDefinition> = definitions
        .values()
        .filter(|d| d.provides_type(target))
        .collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(single)),
        many => {
            let primaries: Vec<&&BeanDefinition> =
                many.iter().filter(|d| d.primary).collect();
            match primaries.as_slice() {
                [single] => Ok(Some(**single)),
                [] => Err(ContextError::no_unique(
                    target.type_name,
                    format!(
                        "no primary definition among candidates [{}]",
                        candidate_names(many)
                    ),
                )),
                _ => Err(ContextError::no_unique(
                    target.type_name,
                    format!(
                        "more than one primary definition among candidates [{}]",
                        candidate_names(many)
                    ),
                )),
            }
        }
    }
}

fn candidate_names(definitions: &[&BeanDefinition]) -> String {
    definitions
        .iter()
        .map(|d| d.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Widget;

    trait Marker: Send + Sync {}
    impl Marker for Widget {}

    fn widget_definition(name: &str) -> BeanDefinition {
        let strategy = CreationStrategy::Constructor(
            ConstructorSpec::builder().build(|_args| Ok(Widget)),
        );
        let mut def = BeanDefinition::new(name, TypeKey::of::<Widget>(), strategy);
        def.provides.push(ProvidedType::of::<Widget>());
        def
    }

    #[test]
    fn test_sort_key_orders_by_rank_then_name() {
        let mut a = widget_definition("b");
        a.order = 1;
        let mut b = widget_definition("a");
        b.order = 2;
        let c = widget_definition("a");
        assert!(a.sort_key() < b.sort_key());
        assert!(b.sort_key() < c.sort_key());
    }

    #[test]
    fn test_set_instance_checks_declared_type() {
        let mut def = widget_definition("widget");
        assert!(def.required_instance().is_err());

        let err = def.set_instance(Arc::new(17_u32)).unwrap_err();
        assert!(err.is_creation());
        assert_eq!(def.state(), BeanState::Registered);

        def.set_instance(Arc::new(Widget)).unwrap();
        assert_eq!(def.state(), BeanState::Created);
        assert!(def.instance().is_some());
    }

    #[test]
    fn test_named_hook_must_be_registered() {
        let mut def = widget_definition("widget");
        def.init_hook_name = Some("warm_up".to_string());
        def.set_instance(Arc::new(Widget)).unwrap();
        let instance = def.instance().unwrap();
        let err = def.run_init(&instance).unwrap_err();
        assert!(err.is_definition());
        assert!(err.to_string().contains("warm_up"));
    }

    #[test]
    fn test_find_unique_primary_rules() {
        let mut defs = BTreeMap::new();
        defs.insert("one".to_string(), widget_definition("one"));
        let found = find_unique(&defs, TypeKey::of::<Widget>()).unwrap();
        assert_eq!(found.map(|d| d.name.as_str()), Some("one"));

        defs.insert("two".to_string(), widget_definition("two"));
        let err = find_unique(&defs, TypeKey::of::<Widget>()).unwrap_err();
        assert!(err.is_ambiguous());
        assert!(err.to_string().contains("one, two"));

        defs.get_mut("two").unwrap().primary = true;
        let found = find_unique(&defs, TypeKey::of::<Widget>()).unwrap();
        assert_eq!(found.map(|d| d.name.as_str()), Some("two"));

        defs.get_mut("one").unwrap().primary = true;
        let err = find_unique(&defs, TypeKey::of::<Widget>()).unwrap_err();
        assert!(err.to_string().contains("more than one primary"));
    }

    #[test]
    fn test_find_unique_misses_are_not_errors() {
        let defs = BTreeMap::new();
        assert!(find_unique(&defs, TypeKey::of::<Widget>()).unwrap().is_none());
    }
}
