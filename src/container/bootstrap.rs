use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::container::definition::{find_unique, BeanDefinition, BeanState, CreationStrategy};
use crate::container::inject;
use crate::errors::ContextError;
use crate::metadata::component::{
    ArgList, AutowiredBinding, ParamSpec, ResolvedArg, SharedInstance,
};
use crate::metadata::key::TypeKey;
use crate::properties::resolver::PropertyResolver;

/// Names currently being created, in recursion order. A re-entry is a
/// constructor or factory cycle.
pub(crate) struct CreationPath {
    names: Vec<String>,
}

impl CreationPath {
    pub(crate) fn new() -> Self {
        Self { names: Vec::new() }
    }

    pub(crate) fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub(crate) fn pop(&mut self) {
        self.names.pop();
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub(crate) fn path_string(&self) -> String {
        self.names.join(" -> ")
    }
}

/// One-shot startup engine: instantiates every definition, runs member
/// injection, then fires init hooks. Consumes itself so a failed
/// bootstrap leaves nothing half-built behind.
pub(crate) struct Bootstrap {
    definitions: BTreeMap<String, BeanDefinition>,
    resolver: PropertyResolver,
    creating: CreationPath,
}

impl Bootstrap {
    pub(crate) fn new(
        definitions: BTreeMap<String, BeanDefinition>,
        resolver: PropertyResolver,
    ) -> Self {
        Self {
            definitions,
            resolver,
            creating: CreationPath::new(),
        }
    }

    pub(crate) fn run(
        mut self,
    ) -> Result<(BTreeMap<String, BeanDefinition>, PropertyResolver), ContextError> {
        // configuration holders first so factory owners exist before
        // any factory bean is requested
        let holders = self.sorted_names(|d| d.configuration);
        debug!(count = holders.len(), "creating configuration holders");
        for name in &holders {
            if self.needs_creation(name) {
                self.create_bean(name)?;
            }
        }

        let remaining = self.sorted_names(|d| d.instance().is_none());
        for name in &remaining {
            // a dependency pull may have created it already
            if self.needs_creation(name) {
                self.create_bean(name)?;
            }
        }

        inject::inject_all(&mut self.definitions, &self.resolver)?;
        self.run_init_hooks()?;
        info!(count = self.definitions.len(), "all beans created and initialized");
        Ok((self.definitions, self.resolver))
    }

    /// Names matching the filter in ascending (order, name).
    fn sorted_names(&self, keep: impl Fn(&BeanDefinition) -> bool) -> Vec<String> {
        let mut keyed: Vec<(i32, String)> = self
            .definitions
            .values()
            .filter(|d| keep(d))
            .map(|d| (d.order, d.name.clone()))
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, name)| name).collect()
    }

    fn needs_creation(&self, name: &str) -> bool {
        self.definitions
            .get(name)
            .map(|d| d.instance().is_none())
            .unwrap_or(false)
    }

    fn create_bean(&mut self, name: &str) -> Result<SharedInstance, ContextError> {
        if self.creating.contains(name) {
            let mut path = self.creating.path_string();
            path.push_str(" -> ");
            path.push_str(name);
            return Err(ContextError::circular(name, path));
        }
        self.creating.push(name);
        let result = self.create_bean_inner(name);
        self.creating.pop();
        result
    }

    fn create_bean_inner(&mut self, name: &str) -> Result<SharedInstance, ContextError> {
        let (bean_type, is_configuration, strategy) = {
            let def = self
                .definitions
                .get(name)
                .ok_or_else(|| ContextError::name_not_found(name))?;
            if let Some(existing) = def.instance() {
                return Ok(existing);
            }
            (def.bean_type, def.configuration, def.strategy.clone())
        };
        debug!(name, bean_type = bean_type.type_name, "creating bean");

        let instance = match strategy {
            CreationStrategy::Constructor(spec) => {
                let args = self.resolve_args(name, bean_type, &spec.params, is_configuration)?;
                spec.invoke(ArgList::new(args)).map_err(|source| {
                    ContextError::creation_failed(name, bean_type.type_name, source)
                })?
            }
            CreationStrategy::Factory { owner, method } => {
                let owner_instance = self.owner_instance(&owner)?;
                let args = self.resolve_args(name, bean_type, &method.params, false)?;
                method
                    .invoke(&owner_instance, ArgList::new(args))
                    .map_err(|source| {
                        ContextError::creation_failed(name, bean_type.type_name, source)
                    })?
            }
        };

        let def = self
            .definitions
            .get_mut(name)
            .ok_or_else(|| ContextError::name_not_found(name))?;
        def.set_instance(instance.clone())?;
        Ok(instance)
    }

    fn owner_instance(&mut self, owner: &str) -> Result<SharedInstance, ContextError> {
        let existing = self
            .definitions
            .get(owner)
            .map(|d| d.instance())
            .ok_or_else(|| {
                ContextError::definition(format!(
                    "factory owner '{owner}' has no registered definition"
                ))
            })?;
        match existing {
            Some(instance) => Ok(instance),
            None => self.create_bean(owner),
        }
    }

    fn resolve_args(
        &mut self,
        bean_name: &str,
        bean_type: TypeKey,
        params: &[ParamSpec],
        configuration_ctor: bool,
    ) -> Result<Vec<ResolvedArg>, ContextError> {
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            args.push(self.resolve_arg(bean_name, bean_type, param, configuration_ctor)?);
        }
        Ok(args)
    }

    fn resolve_arg(
        &mut self,
        bean_name: &str,
        bean_type: TypeKey,
        param: &ParamSpec,
        configuration_ctor: bool,
    ) -> Result<ResolvedArg, ContextError> {
        match (&param.value, &param.autowired) {
            (Some(_), Some(_)) => Err(ContextError::creation(
                bean_name,
                bean_type.type_name,
                format!(
                    "parameter '{}' cannot bind to both a property and a bean",
                    param.name
                ),
            )),
            (None, None) => Err(ContextError::creation(
                bean_name,
                bean_type.type_name,
                format!(
                    "parameter '{}' must bind to either a property or a bean",
                    param.name
                ),
            )),
            (Some(value), None) => {
                let boxed = self
                    .resolver
                    .get_required_any(&value.expression, param.type_key)?;
                Ok(ResolvedArg::Value(boxed))
            }
            (None, Some(autowired)) => {
                if configuration_ctor {
                    return Err(ContextError::creation(
                        bean_name,
                        bean_type.type_name,
                        format!(
                            "parameter '{}' cannot depend on a bean; configuration holders are created before other beans",
                            param.name
                        ),
                    ));
                }
                self.resolve_bean_arg(bean_name, param, autowired)
            }
        }
    }

    fn resolve_bean_arg(
        &mut self,
        bean_name: &str,
        param: &ParamSpec,
        autowired: &AutowiredBinding,
    ) -> Result<ResolvedArg, ContextError> {
        let dependency = match &autowired.qualifier {
            Some(qualifier) => match self.definitions.get(qualifier) {
                None => None,
                Some(def) if !def.provides_type(param.type_key) => {
                    return Err(ContextError::not_of_required_type(
                        qualifier,
                        param.type_key.type_name,
                        def.bean_type.type_name,
                    ));
                }
                Some(def) => Some(def.name.clone()),
            },
            None => find_unique(&self.definitions, param.type_key)?.map(|d| d.name.clone()),
        };

        let Some(dependency) = dependency else {
            if autowired.required {
                let wanted = match &autowired.qualifier {
                    Some(qualifier) => format!("name '{qualifier}'"),
                    None => format!("type '{}'", param.type_key.type_name),
                };
                return Err(ContextError::unsatisfied(format!(
                    "Missing autowired bean with {wanted} when creating bean '{bean_name}'"
                )));
            }
            debug!(
                bean = bean_name,
                param = param.name,
                "optional dependency absent"
            );
            return Ok(ResolvedArg::Absent);
        };

        let existing = self
            .definitions
            .get(&dependency)
            .ok_or_else(|| ContextError::name_not_found(&dependency))?
            .instance();
        let instance = match existing {
            Some(instance) => instance,
            None => self.create_bean(&dependency)?,
        };

        let def = self
            .definitions
            .get(&dependency)
            .ok_or_else(|| ContextError::name_not_found(&dependency))?;
        let boxed = def.cast_instance(&instance, param.type_key).ok_or_else(|| {
            ContextError::not_of_required_type(
                &dependency,
                param.type_key.type_name,
                def.bean_type.type_name,
            )
        })?;
        Ok(ResolvedArg::Bean(boxed))
    }

    /// Init hooks run in registry iteration order, after every bean has
    /// been created and injected.
    fn run_init_hooks(&mut self) -> Result<(), ContextError> {
        for (name, def) in self.definitions.iter_mut() {
            let instance = def.required_instance()?;
            def.run_init(&instance).map_err(|source| {
                ContextError::creation_failed(name, def.bean_type.type_name, source)
            })?;
            def.set_state(BeanState::Initialized);
            debug!(name, "bean initialized");
        }
        Ok(())
    }
}
