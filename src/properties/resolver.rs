use std::any::Any;

use tracing::warn;

use crate::metadata::component::BoxedValue;
use crate::metadata::key::TypeKey;
use crate::properties::convert::ConverterRegistry;
use crate::properties::error::PropertyError;
use crate::properties::source::PropertySource;

/// Placeholder chains deeper than this are treated as absent. A chain
/// this long is a self-referential configuration, not a real lookup.
const MAX_RESOLUTION_DEPTH: usize = 16;

/// A `${key}` or `${key:default}` expression split at its first colon.
struct Placeholder<'a> {
    key: &'a str,
    default: Option<&'a str>,
}

fn parse_placeholder(expression: &str) -> Option<Placeholder<'_>> {
    let inner = expression.strip_prefix("${")?.strip_suffix('}')?;
    match inner.find(':') {
        Some(pos) => Some(Placeholder {
            key: &inner[..pos],
            default: Some(&inner[pos + 1..]),
        }),
        None => Some(Placeholder {
            key: inner,
            default: None,
        }),
    }
}

/// Resolves property expressions against one source, converting the
/// final string through the registry. Lookups accept either a plain
/// key or a `${...}` placeholder; defaults may themselves be
/// placeholders and resolve depth-first.
///
/// Absence is an `Option`, not an error; only the `get_required_*`
/// entry points turn a miss into [`PropertyError::Missing`].
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    source: PropertySource,
    converters: ConverterRegistry,
}

impl PropertyResolver {
    pub fn new(source: PropertySource) -> Self {
        Self {
            source,
            converters: ConverterRegistry::with_defaults(),
        }
    }

    pub fn with_converters(source: PropertySource, converters: ConverterRegistry) -> Self {
        Self { source, converters }
    }

    /// Resolve an expression to its final string form.
    pub fn get_string(&self, expression: &str) -> Option<String> {
        self.get_string_at(expression, 0)
    }

    /// Resolve to a string, consulting the default when the key is
    /// absent. The default is evaluated like a stored value: a `${...}`
    /// expression resolves with its own nested defaults, any other text
    /// is returned as-is. A default expression that itself misses
    /// yields `None`.
    pub fn get_string_or(&self, expression: &str, default: &str) -> Option<String> {
        self.get_string(expression)
            .or_else(|| self.resolve_default(default, 0))
    }

    pub fn get_required_string(&self, expression: &str) -> Result<String, PropertyError> {
        self.get_string(expression)
            .ok_or_else(|| PropertyError::missing(missing_key(expression)))
    }

    /// Resolve and convert to `T`. Absence is `Ok(None)`; conversion
    /// failures are errors even when the caller treats the key as
    /// optional.
    pub fn get<T: Any + Send + Sync>(&self, expression: &str) -> Result<Option<T>, PropertyError> {
        match self.get_string(expression) {
            Some(text) => self.converters.convert_to::<T>(&text).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_or<T: Any + Send + Sync>(
        &self,
        expression: &str,
        default: T,
    ) -> Result<T, PropertyError> {
        Ok(self.get::<T>(expression)?.unwrap_or(default))
    }

    pub fn get_required<T: Any + Send + Sync>(&self, expression: &str) -> Result<T, PropertyError> {
        self.get::<T>(expression)?
            .ok_or_else(|| PropertyError::missing(missing_key(expression)))
    }

    /// Resolve and convert to a runtime-chosen target type.
    pub fn get_any(
        &self,
        expression: &str,
        target: TypeKey,
    ) -> Result<Option<BoxedValue>, PropertyError> {
        match self.get_string(expression) {
            Some(text) => self.converters.convert(&text, target).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_required_any(
        &self,
        expression: &str,
        target: TypeKey,
    ) -> Result<BoxedValue, PropertyError> {
        self.get_any(expression, target)?
            .ok_or_else(|| PropertyError::missing(missing_key(expression)))
    }

    pub fn source(&self) -> &PropertySource {
        &self.source
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    fn get_string_at(&self, expression: &str, depth: usize) -> Option<String> {
        if depth > MAX_RESOLUTION_DEPTH {
            warn!(expression, "property resolution exceeded depth limit; treating as absent");
            return None;
        }
        match parse_placeholder(expression) {
            Some(placeholder) => {
                if let Some(value) = self.lookup(placeholder.key, depth) {
                    return Some(value);
                }
                match placeholder.default {
                    Some(default) => self.resolve_default(default, depth),
                    None => None,
                }
            }
            None => self.lookup(expression, depth),
        }
    }

    fn lookup(&self, key: &str, depth: usize) -> Option<String> {
        let raw = self.source.get(key)?;
        // stored values may themselves be placeholders
        if parse_placeholder(raw).is_some() {
            self.get_string_at(raw, depth + 1)
        } else {
            Some(raw.to_string())
        }
    }

    fn resolve_default(&self, default: &str, depth: usize) -> Option<String> {
        if parse_placeholder(default).is_some() {
            self.get_string_at(default, depth + 1)
        } else {
            Some(default.to_string())
        }
    }
}

fn missing_key(expression: &str) -> String {
    match parse_placeholder(expression) {
        Some(placeholder) => placeholder.key.to_string(),
        None => expression.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(pairs: &[(&str, &str)]) -> PropertyResolver {
        PropertyResolver::new(PropertySource::of(pairs.iter().copied()))
    }

    #[test]
    fn test_plain_key_and_placeholder() {
        let r = resolver(&[("app.title", "Summer")]);
        assert_eq!(r.get_string("app.title").as_deref(), Some("Summer"));
        assert_eq!(r.get_string("${app.title}").as_deref(), Some("Summer"));
        assert_eq!(r.get_string("${app.missing}"), None);
        assert_eq!(r.get_string("app.missing"), None);
    }

    #[test]
    fn test_default_at_first_colon() {
        let r = resolver(&[]);
        assert_eq!(r.get_string("${app.port:8080}").as_deref(), Some("8080"));
        // everything after the first colon is the default
        assert_eq!(
            r.get_string("${jdbc.url:jdbc:h2:mem}").as_deref(),
            Some("jdbc:h2:mem")
        );
        // empty default is a valid value
        assert_eq!(r.get_string("${app.port:}").as_deref(), Some(""));
    }

    #[test]
    fn test_source_value_wins_over_default() {
        let r = resolver(&[("app.port", "9090")]);
        assert_eq!(r.get_string("${app.port:8080}").as_deref(), Some("9090"));
    }

    #[test]
    fn test_nested_default_chain() {
        let r = resolver(&[("c.d", "deep")]);
        assert_eq!(
            r.get_string("${a.b:${c.d:literal}}").as_deref(),
            Some("deep")
        );
        let r = resolver(&[]);
        assert_eq!(
            r.get_string("${a.b:${c.d:literal}}").as_deref(),
            Some("literal")
        );
        assert_eq!(r.get_string("${a.b:${c.d}}"), None);
    }

    #[test]
    fn test_stored_value_expansion() {
        let r = resolver(&[("alias", "${real}"), ("real", "value")]);
        assert_eq!(r.get_string("alias").as_deref(), Some("value"));
        assert_eq!(r.get_string("${alias}").as_deref(), Some("value"));
    }

    #[test]
    fn test_self_reference_is_absent() {
        let r = resolver(&[("loop", "${loop}")]);
        assert_eq!(r.get_string("loop"), None);
        assert_eq!(r.get_string("${loop:fallback}").as_deref(), Some("fallback"));
    }

    #[test]
    fn test_method_default_resolves_placeholders() {
        let r = resolver(&[("app.title", "Armature")]);
        assert_eq!(
            r.get_string_or("${missing.key}", "${app.title}").as_deref(),
            Some("Armature")
        );
        assert_eq!(
            r.get_string_or("${missing.key}", "${also.missing:fallback}")
                .as_deref(),
            Some("fallback")
        );
        // plain-text defaults pass through untouched
        assert_eq!(
            r.get_string_or("${missing.key}", "plain").as_deref(),
            Some("plain")
        );
        // a default expression can itself miss
        assert_eq!(r.get_string_or("${missing.key}", "${also.missing}"), None);
        // a present key never consults the default
        assert_eq!(
            r.get_string_or("${app.title}", "${missing.key}").as_deref(),
            Some("Armature")
        );
    }

    #[test]
    fn test_required_reports_placeholder_key() {
        let r = resolver(&[]);
        let err = r.get_required_string("${app.title}").unwrap_err();
        assert_eq!(err.to_string(), "Required property 'app.title' not found");
        let err = r.get_required_string("app.title").unwrap_err();
        assert_eq!(err.to_string(), "Required property 'app.title' not found");
    }

    #[test]
    fn test_typed_get_and_defaults() {
        let r = resolver(&[("app.port", "8080"), ("app.bad", "x")]);
        assert_eq!(r.get::<u16>("${app.port}").unwrap(), Some(8080));
        assert_eq!(r.get::<u16>("${app.absent}").unwrap(), None);
        assert_eq!(r.get_or::<u16>("${app.absent}", 9090).unwrap(), 9090);
        assert_eq!(
            r.get_string_or("${app.absent}", "fallback").as_deref(),
            Some("fallback")
        );
        // conversion failures surface even for optional lookups
        assert!(r.get::<u16>("${app.bad}").is_err());
        assert!(r.get_or::<u16>("${app.bad}", 1).is_err());
    }

    #[test]
    fn test_required_typed() {
        let r = resolver(&[("retry.backoff", "PT2S")]);
        let backoff: chrono::Duration = r.get_required("${retry.backoff}").unwrap();
        assert_eq!(backoff, chrono::Duration::try_seconds(2).unwrap());
        assert!(r.get_required::<i32>("${retry.count}").unwrap_err().is_missing());
    }

    #[test]
    fn test_any_entry_points() {
        let r = resolver(&[("n", "7")]);
        let boxed = r.get_any("${n}", TypeKey::of::<i64>()).unwrap().unwrap();
        assert_eq!(*boxed.downcast::<i64>().unwrap(), 7);
        assert!(r
            .get_required_any("${gone}", TypeKey::of::<i64>())
            .unwrap_err()
            .is_missing());
    }
}
