use std::collections::BTreeMap;

use tracing::debug;

use crate::container::definition::{find_unique, BeanDefinition, BeanState};
use crate::errors::ContextError;
use crate::metadata::component::{InjectPoint, InjectTarget, SharedInstance};
use crate::properties::resolver::PropertyResolver;

/// Fill every declared member of every bean. Runs after all instances
/// exist, so bean-bound members never trigger creation and reference
/// cycles between members are fine.
pub(crate) fn inject_all(
    definitions: &mut BTreeMap<String, BeanDefinition>,
    resolver: &PropertyResolver,
) -> Result<(), ContextError> {
    let names: Vec<String> = definitions.keys().cloned().collect();
    for name in names {
        let (owner_type, instance, points) = {
            let def = definitions
                .get(&name)
                .ok_or_else(|| ContextError::name_not_found(&name))?;
            (
                def.bean_type.type_name,
                def.required_instance()?,
                def.inject_points.clone(),
            )
        };
        for point in &points {
            inject_point(definitions, resolver, &name, owner_type, &instance, point)?;
        }
        if let Some(def) = definitions.get_mut(&name) {
            def.set_state(BeanState::Injected);
        }
    }
    Ok(())
}

fn inject_point(
    definitions: &BTreeMap<String, BeanDefinition>,
    resolver: &PropertyResolver,
    owner: &str,
    owner_type: &'static str,
    instance: &SharedInstance,
    point: &InjectPoint,
) -> Result<(), ContextError> {
    if point.value.is_some() && point.autowired.is_some() {
        return Err(ContextError::creation(
            owner,
            owner_type,
            format!(
                "member '{}' cannot bind to both a property and a bean",
                point.member
            ),
        ));
    }
    if point.value.is_none() && point.autowired.is_none() {
        return Err(ContextError::definition(format!(
            "member '{}' of bean '{}' has neither a property nor a bean binding",
            point.member, owner
        )));
    }
    if point.modifiers.is_static {
        return Err(ContextError::definition(format!(
            "cannot inject static member '{}' of {}",
            point.member, owner_type
        )));
    }
    if point.modifiers.is_final && point.target == InjectTarget::Field {
        return Err(ContextError::definition(format!(
            "cannot inject final field '{}' of {}",
            point.member, owner_type
        )));
    }
    if let InjectTarget::Setter { arity } = point.target {
        if arity != 1 {
            return Err(ContextError::definition(format!(
                "setter '{}' of {} must take exactly one parameter, not {}",
                point.member, owner_type, arity
            )));
        }
    }

    if let Some(value) = &point.value {
        match resolver.get_any(&value.expression, point.type_key)? {
            Some(boxed) => {
                point.apply(instance, boxed)?;
                debug!(bean = owner, member = point.member, "injected property value");
            }
            None => {
                // property members are optional; an unresolved key
                // leaves the member untouched
                debug!(
                    bean = owner,
                    member = point.member,
                    expression = value.expression.as_str(),
                    "property absent, leaving member unset"
                );
            }
        }
        return Ok(());
    }

    if let Some(autowired) = &point.autowired {
        let dependency = match &autowired.qualifier {
            Some(qualifier) => match definitions.get(qualifier) {
                None => None,
                Some(def) if !def.provides_type(point.type_key) => {
                    return Err(ContextError::not_of_required_type(
                        qualifier,
                        point.type_key.type_name,
                        def.bean_type.type_name,
                    ));
                }
                Some(def) => Some(def),
            },
            None => find_unique(definitions, point.type_key)?,
        };

        let Some(dependency) = dependency else {
            if autowired.required {
                let wanted = match &autowired.qualifier {
                    Some(qualifier) => format!("name '{qualifier}'"),
                    None => format!("type '{}'", point.type_key.type_name),
                };
                return Err(ContextError::unsatisfied(format!(
                    "Missing autowired bean with {wanted} when injecting member '{}' of bean '{}'",
                    point.member, owner
                )));
            }
            debug!(
                bean = owner,
                member = point.member,
                "optional dependency absent, leaving member unset"
            );
            return Ok(());
        };

        let dependency_instance = dependency.required_instance()?;
        let boxed = dependency
            .cast_instance(&dependency_instance, point.type_key)
            .ok_or_else(|| {
                ContextError::not_of_required_type(
                    &dependency.name,
                    point.type_key.type_name,
                    dependency.bean_type.type_name,
                )
            })?;
        point.apply(instance, boxed)?;
        debug!(
            bean = owner,
            member = point.member,
            dependency = dependency.name.as_str(),
            "injected bean"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::definition::CreationStrategy;
    use crate::metadata::component::{
        AutowiredBinding, ConstructorSpec, ProvidedType,
    };
    use crate::metadata::key::{MemberModifiers, TypeKey};
    use crate::properties::source::PropertySource;
    use std::sync::{Arc, OnceLock};

    struct Settings {
        greeting: OnceLock<String>,
        retries: OnceLock<u32>,
    }

    struct Clock;

    struct Dial {
        clock: OnceLock<Arc<Clock>>,
    }

    fn definition_of<T: Send + Sync + 'static>(
        name: &str,
        instance: T,
        points: Vec<InjectPoint>,
    ) -> BeanDefinition {
        let strategy = CreationStrategy::Constructor(
            ConstructorSpec::builder()
                .build(|_args| Err::<u8, _>(ContextError::definition("not constructed in test"))),
        );
        let mut def = BeanDefinition::new(name, TypeKey::of::<T>(), strategy);
        def.provides.push(ProvidedType::of::<T>());
        def.inject_points = points;
        def.set_instance(Arc::new(instance)).unwrap();
        def
    }

    fn resolver_of(pairs: &[(&str, &str)]) -> PropertyResolver {
        PropertyResolver::new(PropertySource::of(pairs.iter().copied()))
    }

    #[test]
    fn test_property_member_present_and_absent() {
        let points = vec![
            InjectPoint::field("greeting")
                .value::<String>("${app.greeting}")
                .apply_field(|s: &Settings| &s.greeting),
            InjectPoint::field("retries")
                .value::<u32>("${app.retries}")
                .apply_field(|s: &Settings| &s.retries),
        ];
        let settings = Settings {
            greeting: OnceLock::new(),
            retries: OnceLock::new(),
        };
        let mut defs = BTreeMap::new();
        defs.insert(
            "settings".to_string(),
            definition_of("settings", settings, points),
        );

        inject_all(&mut defs, &resolver_of(&[("app.greeting", "hello")])).unwrap();

        let def = &defs["settings"];
        assert_eq!(def.state(), BeanState::Injected);
        let instance = def.instance().unwrap();
        let settings = instance.as_ref().downcast_ref::<Settings>().unwrap();
        assert_eq!(settings.greeting.get().map(String::as_str), Some("hello"));
        // absent key is not an error, the member stays unset
        assert_eq!(settings.retries.get(), None);
    }

    #[test]
    fn test_bean_member_by_type() {
        let mut defs = BTreeMap::new();
        defs.insert("clock".to_string(), definition_of("clock", Clock, vec![]));
        defs.insert(
            "dial".to_string(),
            definition_of(
                "dial",
                Dial {
                    clock: OnceLock::new(),
                },
                vec![InjectPoint::field("clock")
                    .autowired::<Clock>(AutowiredBinding::required())
                    .apply_field(|d: &Dial| &d.clock)],
            ),
        );

        inject_all(&mut defs, &resolver_of(&[])).unwrap();

        let instance = defs["dial"].instance().unwrap();
        let dial = instance.as_ref().downcast_ref::<Dial>().unwrap();
        assert!(dial.clock.get().is_some());
    }

    #[test]
    fn test_required_bean_member_missing_is_fatal() {
        let mut defs = BTreeMap::new();
        defs.insert(
            "dial".to_string(),
            definition_of(
                "dial",
                Dial {
                    clock: OnceLock::new(),
                },
                vec![InjectPoint::field("clock")
                    .autowired::<Clock>(AutowiredBinding::required())
                    .apply_field(|d: &Dial| &d.clock)],
            ),
        );
        let err = inject_all(&mut defs, &resolver_of(&[])).unwrap_err();
        assert!(err.is_unsatisfied());
        assert!(err.to_string().contains("dial"));
    }

    #[test]
    fn test_optional_bean_member_missing_is_skipped() {
        let mut defs = BTreeMap::new();
        defs.insert(
            "dial".to_string(),
            definition_of(
                "dial",
                Dial {
                    clock: OnceLock::new(),
                },
                vec![InjectPoint::field("clock")
                    .autowired::<Clock>(AutowiredBinding::optional())
                    .apply_field(|d: &Dial| &d.clock)],
            ),
        );
        inject_all(&mut defs, &resolver_of(&[])).unwrap();
        let instance = defs["dial"].instance().unwrap();
        let dial = instance.as_ref().downcast_ref::<Dial>().unwrap();
        assert!(dial.clock.get().is_none());
    }

    #[test]
    fn test_static_member_is_rejected() {
        let point = InjectPoint::field("GLOBAL")
            .value::<String>("${x}")
            .modifiers(MemberModifiers {
                is_static: true,
                ..Default::default()
            })
            .apply_field(|s: &Settings| &s.greeting);
        let mut defs = BTreeMap::new();
        defs.insert(
            "settings".to_string(),
            definition_of(
                "settings",
                Settings {
                    greeting: OnceLock::new(),
                    retries: OnceLock::new(),
                },
                vec![point],
            ),
        );
        let err = inject_all(&mut defs, &resolver_of(&[])).unwrap_err();
        assert!(err.is_definition());
        assert!(err.to_string().contains("static"));
    }

    #[test]
    fn test_setter_arity_must_be_one() {
        let point = InjectPoint::setter("configure", 2)
            .value::<String>("${x}")
            .apply_with(|_s: &Settings, _v: String| {});
        let mut defs = BTreeMap::new();
        defs.insert(
            "settings".to_string(),
            definition_of(
                "settings",
                Settings {
                    greeting: OnceLock::new(),
                    retries: OnceLock::new(),
                },
                vec![point],
            ),
        );
        let err = inject_all(&mut defs, &resolver_of(&[])).unwrap_err();
        assert!(err.is_definition());
        assert!(err.to_string().contains("exactly one parameter"));
    }
}
