use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::container::bootstrap::Bootstrap;
use crate::container::builder::build_definitions;
use crate::container::current;
use crate::container::definition::{find_unique, BeanDefinition, BeanState};
use crate::container::report::{BeanReport, ContextReport};
use crate::errors::ContextError;
use crate::metadata::key::TypeKey;
use crate::metadata::scan::ScanResult;
use crate::properties::resolver::PropertyResolver;

/// Singleton container over one bootstrapped registry. Every bean is
/// created, injected, and initialized before the constructor returns;
/// afterwards the registry only changes again at `close`.
pub struct ApplicationContext {
    id: Uuid,
    registry: RwLock<BTreeMap<String, BeanDefinition>>,
    resolver: PropertyResolver,
}

impl ApplicationContext {
    /// Build the whole container from scanned descriptors. On success
    /// the new context also becomes the process-wide current context;
    /// on failure nothing is registered and nothing survives.
    pub fn bootstrap(
        scan: ScanResult,
        resolver: PropertyResolver,
    ) -> Result<Arc<Self>, ContextError> {
        let id = Uuid::new_v4();
        info!(%id, candidates = scan.len(), "bootstrapping application context");

        let definitions = build_definitions(scan)?;
        let (definitions, resolver) = Bootstrap::new(definitions, resolver).run()?;
        let bean_count = definitions.len();

        let context = Arc::new(Self {
            id,
            registry: RwLock::new(definitions),
            resolver,
        });
        current::set_current(Arc::clone(&context))?;
        info!(%id, beans = bean_count, "application context ready");
        Ok(context)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn property_resolver(&self) -> &PropertyResolver {
        &self.resolver
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.registry
            .read()
            .map(|registry| registry.contains_key(name))
            .unwrap_or(false)
    }

    /// All registered names, in registry order.
    pub fn definition_names(&self) -> Result<Vec<String>, ContextError> {
        Ok(self.read_registry()?.keys().cloned().collect())
    }

    /// Look up a bean by name, cast to `T`. `T` may be the bean's own
    /// type or any type its definition provides.
    pub fn get_bean_by_name<T>(&self, name: &str) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let registry = self.read_registry()?;
        let definition = registry
            .get(name)
            .ok_or_else(|| ContextError::name_not_found(name))?;
        cast_definition_instance(definition, name)
    }

    /// Look up the unique bean providing `T`.
    pub fn get_bean<T>(&self) -> Result<Arc<T>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let target = TypeKey::of::<T>();
        let registry = self.read_registry()?;
        let definition = find_unique(&registry, target)?
            .ok_or_else(|| ContextError::type_not_found(target.type_name))?;
        cast_definition_instance(definition, &definition.name)
    }

    /// Like [`get_bean`](Self::get_bean), but absence is `None` rather
    /// than an error. Ambiguity still fails.
    pub fn find_bean<T>(&self) -> Result<Option<Arc<T>>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let target = TypeKey::of::<T>();
        let registry = self.read_registry()?;
        match find_unique(&registry, target)? {
            Some(definition) => cast_definition_instance(definition, &definition.name).map(Some),
            None => Ok(None),
        }
    }

    /// All beans providing `T`, in ascending (order, name). An empty
    /// result is not an error.
    pub fn get_beans<T>(&self) -> Result<Vec<Arc<T>>, ContextError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let target = TypeKey::of::<T>();
        let registry = self.read_registry()?;
        let mut matching: Vec<&BeanDefinition> = registry
            .values()
            .filter(|d| d.provides_type(target))
            .collect();
        matching.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut beans = Vec::with_capacity(matching.len());
        for definition in matching {
            beans.push(cast_definition_instance(definition, &definition.name)?);
        }
        Ok(beans)
    }

    /// Snapshot the registry for diagnostics.
    pub fn report(&self) -> Result<ContextReport, ContextError> {
        let registry = self.read_registry()?;
        let beans: Vec<BeanReport> = registry.values().map(BeanReport::from_definition).collect();
        Ok(ContextReport {
            context_id: self.id.to_string(),
            bean_count: beans.len(),
            beans,
        })
    }

    /// Run destroy hooks in registry order, then drop every definition
    /// and unset the current-context handle. A hook failure is logged
    /// and does not stop the remaining hooks. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), ContextError> {
        info!(id = %self.id, "closing application context");
        let mut registry = self.write_registry()?;
        for (name, definition) in registry.iter_mut() {
            if let Some(instance) = definition.instance() {
                if let Err(error) = definition.run_destroy(&instance) {
                    warn!(bean = name.as_str(), %error, "destroy hook failed");
                }
            }
            definition.set_state(BeanState::Destroyed);
            debug!(bean = name.as_str(), "bean destroyed");
        }
        registry.clear();
        drop(registry);
        current::clear_current(self.id);
        info!(id = %self.id, "application context closed");
        Ok(())
    }

    fn read_registry(
        &self,
    ) -> Result<RwLockReadGuard<'_, BTreeMap<String, BeanDefinition>>, ContextError> {
        self.registry
            .read()
            .map_err(|_| ContextError::lock("bean registry"))
    }

    fn write_registry(
        &self,
    ) -> Result<RwLockWriteGuard<'_, BTreeMap<String, BeanDefinition>>, ContextError> {
        self.registry
            .write()
            .map_err(|_| ContextError::lock("bean registry"))
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let beans = self
            .registry
            .read()
            .map(|registry| registry.len())
            .unwrap_or(0);
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("beans", &beans)
            .finish()
    }
}

fn cast_definition_instance<T>(
    definition: &BeanDefinition,
    name: &str,
) -> Result<Arc<T>, ContextError>
where
    T: ?Sized + Send + Sync + 'static,
{
    let target = TypeKey::of::<T>();
    let instance = definition.required_instance()?;
    let boxed = definition.cast_instance(&instance, target).ok_or_else(|| {
        ContextError::not_of_required_type(name, target.type_name, definition.bean_type.type_name)
    })?;
    boxed.downcast::<Arc<T>>().map(|arc| *arc).map_err(|_| {
        ContextError::not_of_required_type(name, target.type_name, definition.bean_type.type_name)
    })
}
