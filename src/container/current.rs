use std::sync::{Arc, RwLock};

use tracing::debug;
use uuid::Uuid;

use crate::container::context::ApplicationContext;
use crate::errors::ContextError;

static CURRENT: RwLock<Option<Arc<ApplicationContext>>> = RwLock::new(None);

/// The context registered by the most recent successful bootstrap, if
/// one is still open.
pub fn current_context() -> Option<Arc<ApplicationContext>> {
    CURRENT.read().ok().and_then(|guard| guard.clone())
}

pub fn require_current_context() -> Result<Arc<ApplicationContext>, ContextError> {
    current_context().ok_or(ContextError::ContextUnset)
}

pub(crate) fn set_current(context: Arc<ApplicationContext>) -> Result<(), ContextError> {
    let mut guard = CURRENT
        .write()
        .map_err(|_| ContextError::lock("current context handle"))?;
    debug!(id = %context.id(), "current context handle set");
    *guard = Some(context);
    Ok(())
}

/// Unset the handle, but only if it still points at the closing
/// context; a newer bootstrap keeps its registration.
pub(crate) fn clear_current(id: Uuid) {
    if let Ok(mut guard) = CURRENT.write() {
        if guard.as_ref().map(|c| c.id() == id).unwrap_or(false) {
            *guard = None;
            debug!(%id, "current context handle cleared");
        }
    }
}
