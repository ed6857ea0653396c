use std::any::TypeId;
use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::container::definition::{BeanDefinition, CreationStrategy};
use crate::errors::ContextError;
use crate::metadata::component::FactoryMethodSpec;
use crate::metadata::key::TypeKind;
use crate::metadata::scan::ScanResult;

/// Turn scanned descriptors into named definitions. Non-struct and
/// unmarked candidates are skipped; marker misuse is fatal here, before
/// anything is instantiated.
pub(crate) fn build_definitions(
    scan: ScanResult,
) -> Result<BTreeMap<String, BeanDefinition>, ContextError> {
    let mut definitions: BTreeMap<String, BeanDefinition> = BTreeMap::new();

    for meta in scan.into_components() {
        if meta.kind != TypeKind::Struct {
            debug!(
                type_name = meta.type_key.type_name,
                kind = ?meta.kind,
                "skipping non-struct candidate"
            );
            continue;
        }
        if !meta.component {
            debug!(
                type_name = meta.type_key.type_name,
                "skipping unmarked candidate"
            );
            continue;
        }

        let name = meta
            .name
            .clone()
            .unwrap_or_else(|| decapitalize(meta.type_key.simple_name()));

        if meta.constructors.is_empty() {
            return Err(ContextError::definition(format!(
                "no accessible constructor on {}",
                meta.type_key.type_name
            )));
        }
        if meta.constructors.len() > 1 {
            return Err(ContextError::definition(format!(
                "more than one candidate constructor on {}",
                meta.type_key.type_name
            )));
        }
        if meta.post_construct.len() > 1 {
            return Err(ContextError::definition(format!(
                "more than one post-construct hook on {}",
                meta.type_key.type_name
            )));
        }
        if meta.pre_destroy.len() > 1 {
            return Err(ContextError::definition(format!(
                "more than one pre-destroy hook on {}",
                meta.type_key.type_name
            )));
        }

        let is_configuration = meta.configuration;
        let factory_methods = if is_configuration {
            meta.factory_methods
        } else {
            if !meta.factory_methods.is_empty() {
                debug!(
                    type_name = meta.type_key.type_name,
                    "ignoring factory methods outside a configuration holder"
                );
            }
            Vec::new()
        };

        let constructor = meta
            .constructors
            .into_iter()
            .next()
            .map(CreationStrategy::Constructor)
            .ok_or_else(|| ContextError::definition("constructor list emptied unexpectedly"))?;

        let mut definition = BeanDefinition::new(&name, meta.type_key, constructor);
        definition.order = meta.order.unwrap_or(i32::MAX);
        definition.primary = meta.primary;
        definition.configuration = is_configuration;
        definition.init_hook = meta.post_construct.into_iter().next();
        definition.destroy_hook = meta.pre_destroy.into_iter().next();
        definition.methods = meta.methods;
        definition.provides = meta.provides;
        definition.inject_points = meta.inject_points;

        insert_definition(&mut definitions, definition)?;

        for factory in factory_methods {
            let definition = build_factory_definition(&name, &meta.type_key.type_name, factory)?;
            insert_definition(&mut definitions, definition)?;
        }
    }

    info!(count = definitions.len(), "bean definitions registered");
    Ok(definitions)
}

fn build_factory_definition(
    holder_name: &str,
    holder_type: &str,
    factory: FactoryMethodSpec,
) -> Result<BeanDefinition, ContextError> {
    if factory.modifiers.is_abstract {
        return Err(ContextError::definition(format!(
            "factory method '{}' on {} must not be abstract",
            factory.method_name, holder_type
        )));
    }
    if factory.modifiers.is_final {
        return Err(ContextError::definition(format!(
            "factory method '{}' on {} must not be final",
            factory.method_name, holder_type
        )));
    }
    if factory.modifiers.is_private {
        return Err(ContextError::definition(format!(
            "factory method '{}' on {} must not be private",
            factory.method_name, holder_type
        )));
    }
    if factory.return_key.type_id == TypeId::of::<()>() {
        return Err(ContextError::definition(format!(
            "factory method '{}' on {} must declare a return type",
            factory.method_name, holder_type
        )));
    }

    let name = factory
        .bean_name
        .clone()
        .unwrap_or_else(|| factory.method_name.to_string());

    let strategy = CreationStrategy::Factory {
        owner: holder_name.to_string(),
        method: factory.clone(),
    };
    let mut definition = BeanDefinition::new(&name, factory.return_key, strategy);
    definition.order = factory.order.unwrap_or(i32::MAX);
    definition.primary = factory.primary;
    definition.init_hook_name = factory.init_method.map(str::to_string);
    definition.destroy_hook_name = factory.destroy_method.map(str::to_string);
    definition.methods = factory.methods;
    definition.provides = factory.provides;
    definition.inject_points = factory.inject_points;
    Ok(definition)
}

fn insert_definition(
    definitions: &mut BTreeMap<String, BeanDefinition>,
    definition: BeanDefinition,
) -> Result<(), ContextError> {
    if definitions.contains_key(&definition.name) {
        return Err(ContextError::definition(format!(
            "Duplicate bean name '{}'",
            definition.name
        )));
    }
    debug!(
        name = definition.name,
        bean_type = definition.bean_type.type_name,
        strategy = ?definition.strategy,
        order = definition.order,
        "registered bean definition"
    );
    definitions.insert(definition.name.clone(), definition);
    Ok(())
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::component::{ComponentMetadata, ConstructorSpec};

    struct MailGateway;
    struct AppConfig;

    fn gateway_meta() -> ComponentMetadata {
        ComponentMetadata::component::<MailGateway>()
            .constructor(ConstructorSpec::builder().build(|_args| Ok(MailGateway)))
            .build()
    }

    #[test]
    fn test_default_name_is_decapitalized_simple_name() {
        let mut scan = ScanResult::new();
        scan.register(gateway_meta());
        let defs = build_definitions(scan).unwrap();
        assert!(defs.contains_key("mailGateway"));
        let def = &defs["mailGateway"];
        assert_eq!(def.order, i32::MAX);
        assert!(!def.primary);
        assert!(!def.configuration);
    }

    #[test]
    fn test_explicit_name_wins() {
        let mut scan = ScanResult::new();
        scan.register(
            ComponentMetadata::component::<MailGateway>()
                .name("outbox")
                .constructor(ConstructorSpec::builder().build(|_args| Ok(MailGateway)))
                .build(),
        );
        let defs = build_definitions(scan).unwrap();
        assert!(defs.contains_key("outbox"));
        assert!(!defs.contains_key("mailGateway"));
    }

    #[test]
    fn test_non_struct_and_unmarked_candidates_are_skipped() {
        trait Port: Send + Sync {}
        let mut scan = ScanResult::new();
        scan.register(ComponentMetadata::candidate::<dyn Port>(TypeKind::Trait));
        scan.register(ComponentMetadata::candidate::<AppConfig>(TypeKind::Struct));
        let defs = build_definitions(scan).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn test_constructor_count_must_be_one() {
        let mut scan = ScanResult::new();
        scan.register(ComponentMetadata::component::<MailGateway>().build());
        let err = build_definitions(scan).unwrap_err();
        assert!(err.to_string().contains("no accessible constructor"));

        let mut scan = ScanResult::new();
        scan.register(
            ComponentMetadata::component::<MailGateway>()
                .constructor(ConstructorSpec::builder().build(|_args| Ok(MailGateway)))
                .constructor(ConstructorSpec::builder().build(|_args| Ok(MailGateway)))
                .build(),
        );
        let err = build_definitions(scan).unwrap_err();
        assert!(err.to_string().contains("more than one candidate constructor"));
    }

    #[test]
    fn test_duplicate_names_are_fatal() {
        let mut scan = ScanResult::new();
        scan.register(gateway_meta());
        scan.register(
            ComponentMetadata::component::<AppConfig>()
                .name("mailGateway")
                .constructor(ConstructorSpec::builder().build(|_args| Ok(AppConfig)))
                .build(),
        );
        let err = build_definitions(scan).unwrap_err();
        assert!(err.to_string().contains("Duplicate bean name 'mailGateway'"));
    }

    #[test]
    fn test_factory_methods_expand_to_definitions() {
        let mut scan = ScanResult::new();
        scan.register(
            ComponentMetadata::configuration::<AppConfig>()
                .constructor(ConstructorSpec::builder().build(|_args| Ok(AppConfig)))
                .factory_method(
                    FactoryMethodSpec::builder::<AppConfig, String>("greeting")
                        .order(5)
                        .primary()
                        .init_method("warm_up")
                        .build(|_owner, _args| Ok("hi".to_string())),
                )
                .factory_method(
                    FactoryMethodSpec::builder::<AppConfig, u32>("port_bean")
                        .bean_name("port")
                        .build(|_owner, _args| Ok(8080)),
                )
                .build(),
        );
        let defs = build_definitions(scan).unwrap();
        assert_eq!(defs.len(), 3);

        let greeting = &defs["greeting"];
        assert_eq!(greeting.order, 5);
        assert!(greeting.primary);
        assert!(!greeting.configuration);
        assert_eq!(greeting.init_hook_name.as_deref(), Some("warm_up"));
        assert!(matches!(
            greeting.strategy,
            CreationStrategy::Factory { ref owner, .. } if owner == "appConfig"
        ));

        assert!(defs.contains_key("port"));
        assert!(!defs.contains_key("port_bean"));
    }

    #[test]
    fn test_factory_method_modifier_violations() {
        use crate::metadata::key::MemberModifiers;

        let cases: [(MemberModifiers, &str); 3] = [
            (
                MemberModifiers {
                    is_abstract: true,
                    ..Default::default()
                },
                "abstract",
            ),
            (
                MemberModifiers {
                    is_final: true,
                    ..Default::default()
                },
                "final",
            ),
            (
                MemberModifiers {
                    is_private: true,
                    ..Default::default()
                },
                "private",
            ),
        ];

        for (modifiers, word) in cases {
            let mut scan = ScanResult::new();
            scan.register(
                ComponentMetadata::configuration::<AppConfig>()
                    .constructor(ConstructorSpec::builder().build(|_args| Ok(AppConfig)))
                    .factory_method(
                        FactoryMethodSpec::builder::<AppConfig, String>("bad")
                            .modifiers(modifiers)
                            .build(|_owner, _args| Ok(String::new())),
                    )
                    .build(),
            );
            let err = build_definitions(scan).unwrap_err();
            assert!(err.to_string().contains(word), "expected {word} in {err}");
        }
    }

    #[test]
    fn test_factory_method_must_return_a_value() {
        let mut scan = ScanResult::new();
        scan.register(
            ComponentMetadata::configuration::<AppConfig>()
                .constructor(ConstructorSpec::builder().build(|_args| Ok(AppConfig)))
                .factory_method(
                    FactoryMethodSpec::builder::<AppConfig, ()>("side_effect")
                        .build(|_owner, _args| Ok(())),
                )
                .build(),
        );
        let err = build_definitions(scan).unwrap_err();
        assert!(err.to_string().contains("must declare a return type"));
    }

    #[test]
    fn test_factory_methods_outside_configuration_are_ignored() {
        let mut scan = ScanResult::new();
        scan.register(
            ComponentMetadata::component::<AppConfig>()
                .constructor(ConstructorSpec::builder().build(|_args| Ok(AppConfig)))
                .factory_method(
                    FactoryMethodSpec::builder::<AppConfig, String>("stray")
                        .build(|_owner, _args| Ok(String::new())),
                )
                .build(),
        );
        let defs = build_definitions(scan).unwrap();
        assert_eq!(defs.len(), 1);
        assert!(!defs.contains_key("stray"));
    }
}
