use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::metadata::component::BoxedValue;
use crate::metadata::key::TypeKey;
use crate::properties::error::PropertyError;

/// Parses one string into a boxed value of a fixed target type.
pub type ConvertFn = Arc<dyn Fn(&str) -> Result<BoxedValue, PropertyError> + Send + Sync>;

/// Conversion table keyed by target type. Pre-populated with the
/// primitive, string, and date/time targets; callers may register
/// additional targets before bootstrap.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, ConvertFn>,
}

impl ConverterRegistry {
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_from_str::<String>();
        registry.register_from_str::<bool>();
        registry.register_from_str::<char>();
        registry.register_from_str::<i8>();
        registry.register_from_str::<i16>();
        registry.register_from_str::<i32>();
        registry.register_from_str::<i64>();
        registry.register_from_str::<u8>();
        registry.register_from_str::<u16>();
        registry.register_from_str::<u32>();
        registry.register_from_str::<u64>();
        registry.register_from_str::<isize>();
        registry.register_from_str::<usize>();
        registry.register_from_str::<f32>();
        registry.register_from_str::<f64>();
        registry.register_from_str::<NaiveDate>();
        registry.register_from_str::<NaiveTime>();
        registry.register_from_str::<NaiveDateTime>();
        registry.register_from_str::<DateTime<Utc>>();
        registry.register_from_str::<DateTime<FixedOffset>>();
        registry.register_from_str::<FixedOffset>();
        registry.register(parse_duration);
        registry.register(parse_std_duration);
        registry
    }

    /// Register a custom parser for target type `T`, replacing any
    /// previous one.
    pub fn register<T, F>(&mut self, parse: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&str) -> Result<T, PropertyError> + Send + Sync + 'static,
    {
        let convert: ConvertFn =
            Arc::new(move |text: &str| parse(text).map(|v| Box::new(v) as BoxedValue));
        self.converters.insert(TypeId::of::<T>(), convert);
        self
    }

    /// Register `T`'s `FromStr` implementation as its parser.
    pub fn register_from_str<T>(&mut self) -> &mut Self
    where
        T: Any + Send + Sync + FromStr,
        T::Err: std::fmt::Display,
    {
        self.register(|text: &str| {
            text.parse::<T>().map_err(|e| {
                PropertyError::convert(text, TypeKey::of::<T>().simple_name(), e.to_string())
            })
        })
    }

    pub fn supports(&self, target: TypeKey) -> bool {
        self.converters.contains_key(&target.type_id)
    }

    /// Convert a resolved string into a boxed value of the target type.
    pub fn convert(&self, text: &str, target: TypeKey) -> Result<BoxedValue, PropertyError> {
        let convert = self
            .converters
            .get(&target.type_id)
            .ok_or_else(|| PropertyError::unsupported(target.type_name))?;
        convert(text)
    }

    pub fn convert_to<T: Any + Send + Sync>(&self, text: &str) -> Result<T, PropertyError> {
        let boxed = self.convert(text, TypeKey::of::<T>())?;
        boxed
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| PropertyError::unsupported(std::any::type_name::<T>()))
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConverterRegistry({} targets)", self.converters.len())
    }
}

/// Parse an ISO-8601 duration of the `[+|-]PnDTnHnMn.nS` form into a
/// signed `chrono::Duration`. Date part accepts days only; the seconds
/// component may carry a decimal fraction down to nanoseconds.
pub fn parse_duration(text: &str) -> Result<chrono::Duration, PropertyError> {
    let fail = |reason: &str| PropertyError::convert(text, "Duration", reason);

    let (negative, rest) = match text.strip_prefix(['+', '-']) {
        Some(rest) => (text.starts_with('-'), rest),
        None => (false, text),
    };
    let body = rest
        .strip_prefix(['P', 'p'])
        .ok_or_else(|| fail("expected leading 'P'"))?;
    if body.is_empty() {
        return Err(fail("duration has no components"));
    }

    let (date_part, time_part) = match body.split_once(['T', 't']) {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut total = chrono::Duration::zero();
    let mut add = |component: chrono::Duration| -> Result<(), PropertyError> {
        total = total
            .checked_add(&component)
            .ok_or_else(|| fail("duration out of range"))?;
        Ok(())
    };

    if !date_part.is_empty() {
        let digits = date_part
            .strip_suffix(['D', 'd'])
            .ok_or_else(|| fail("date part must be '<days>D'"))?;
        let days = parse_component_int(digits).ok_or_else(|| fail("invalid day count"))?;
        add(chrono::Duration::try_days(days).ok_or_else(|| fail("duration out of range"))?)?;
    }

    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return Err(fail("time designator 'T' with no components"));
        }
        let mut digits = String::new();
        let mut fraction = String::new();
        let mut in_fraction = false;
        for ch in time_part.chars() {
            match ch {
                '0'..='9' => {
                    if in_fraction {
                        fraction.push(ch);
                    } else {
                        digits.push(ch);
                    }
                }
                '.' | ',' => {
                    if in_fraction {
                        return Err(fail("repeated decimal point"));
                    }
                    in_fraction = true;
                }
                'H' | 'h' | 'M' | 'm' => {
                    if in_fraction {
                        return Err(fail("fraction is only allowed on seconds"));
                    }
                    let n = parse_component_int(&digits).ok_or_else(|| fail("invalid count"))?;
                    let component = if matches!(ch, 'H' | 'h') {
                        chrono::Duration::try_hours(n)
                    } else {
                        chrono::Duration::try_minutes(n)
                    };
                    add(component.ok_or_else(|| fail("duration out of range"))?)?;
                    digits.clear();
                }
                'S' | 's' => {
                    let n = parse_component_int(&digits).ok_or_else(|| fail("invalid count"))?;
                    add(chrono::Duration::try_seconds(n)
                        .ok_or_else(|| fail("duration out of range"))?)?;
                    if in_fraction {
                        if fraction.is_empty() {
                            return Err(fail("decimal point with no fraction digits"));
                        }
                        let nanos = parse_fraction_nanos(&fraction)
                            .ok_or_else(|| fail("invalid fraction"))?;
                        add(chrono::Duration::nanoseconds(nanos))?;
                    }
                    digits.clear();
                    fraction.clear();
                    in_fraction = false;
                }
                other => {
                    return Err(fail(&format!("unexpected character '{other}'")));
                }
            }
        }
        if !digits.is_empty() || in_fraction {
            return Err(fail("dangling digits without a unit"));
        }
    }

    if negative {
        total = chrono::Duration::zero()
            .checked_sub(&total)
            .ok_or_else(|| fail("duration out of range"))?;
    }
    Ok(total)
}

/// Parse an ISO-8601 duration into an unsigned `std::time::Duration`.
/// Negative durations are rejected.
pub fn parse_std_duration(text: &str) -> Result<std::time::Duration, PropertyError> {
    parse_duration(text)?
        .to_std()
        .map_err(|_| PropertyError::convert(text, "Duration", "negative duration"))
}

fn parse_component_int(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok()
}

fn parse_fraction_nanos(fraction: &str) -> Option<i64> {
    // pad or cut to nanosecond precision
    let mut padded: String = fraction.chars().take(9).collect();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded.parse::<i64>().ok()
}
