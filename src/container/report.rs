use serde::{Deserialize, Serialize};

use crate::container::definition::{BeanDefinition, BeanState, CreationStrategy};

/// Serializable snapshot of a context's registry, for diagnostics and
/// startup logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextReport {
    pub context_id: String,
    pub bean_count: usize,
    pub beans: Vec<BeanReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeanReport {
    pub name: String,
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    pub primary: bool,
    pub configuration: bool,
    pub strategy: String,
    pub state: BeanState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_hook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroy_hook: Option<String>,
    pub provides: Vec<String>,
}

impl BeanReport {
    pub(crate) fn from_definition(definition: &BeanDefinition) -> Self {
        let strategy = match &definition.strategy {
            CreationStrategy::Constructor(_) => "constructor".to_string(),
            CreationStrategy::Factory { owner, method } => {
                format!("factory {}::{}", owner, method.method_name)
            }
        };
        Self {
            name: definition.name.clone(),
            type_name: definition.bean_type.type_name.to_string(),
            order: (definition.order != i32::MAX).then_some(definition.order),
            primary: definition.primary,
            configuration: definition.configuration,
            strategy,
            state: definition.state(),
            init_hook: definition
                .init_hook
                .as_ref()
                .map(|h| h.method.to_string())
                .or_else(|| definition.init_hook_name.clone()),
            destroy_hook: definition
                .destroy_hook
                .as_ref()
                .map(|h| h.method.to_string())
                .or_else(|| definition.destroy_hook_name.clone()),
            provides: definition
                .provides
                .iter()
                .map(|p| p.key.type_name.to_string())
                .collect(),
        }
    }
}
