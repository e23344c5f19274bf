//! Pluggable body type conversion.

use crate::exchange::BodyValue;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

type ConverterFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<BodyValue> + Send + Sync>;

/// Registry of body converters keyed by (source, target) type pair.
///
/// Seeded with `String`/`Vec<u8>`/`&'static str` conversions; adapters
/// register protocol-specific pairs at component setup.
pub struct TypeConverterRegistry {
    converters: RwLock<HashMap<(TypeId, TypeId), ConverterFn>>,
}

impl TypeConverterRegistry {
    pub fn new() -> Self {
        let registry = Self {
            converters: RwLock::new(HashMap::new()),
        };
        registry.register::<String, Vec<u8>>(|value| Some(value.clone().into_bytes()));
        registry.register::<Vec<u8>, String>(|value| String::from_utf8(value.clone()).ok());
        registry.register::<&'static str, String>(|value| Some((*value).to_string()));
        registry.register::<&'static str, Vec<u8>>(|value| Some(value.as_bytes().to_vec()));
        registry
    }

    /// Registers a converter from `S` to `T`.
    pub fn register<S, T>(&self, convert: fn(&S) -> Option<T>)
    where
        S: Any + Send + Sync,
        T: Any + Send + Sync,
    {
        let erased: ConverterFn = Arc::new(move |source| {
            source
                .downcast_ref::<S>()
                .and_then(convert)
                .map(|converted| Box::new(converted) as BodyValue)
        });
        let mut converters = self.converters.write().expect("converter lock poisoned");
        converters.insert((TypeId::of::<S>(), TypeId::of::<T>()), erased);
    }

    /// Converts a body to an owned `T`, cloning when the body already is one.
    pub fn convert_to<T>(&self, body: &BodyValue) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        if let Some(value) = body.downcast_ref::<T>() {
            return Some(value.clone());
        }
        let source_type = (**body).type_id();
        let converter = {
            let converters = self.converters.read().expect("converter lock poisoned");
            converters.get(&(source_type, TypeId::of::<T>())).cloned()
        }?;
        converter(body.as_ref())
            .and_then(|converted| converted.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }
}

impl Default for TypeConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeConverterRegistry;
    use crate::exchange::BodyValue;

    #[test]
    fn identity_conversion_clones_the_body() {
        let registry = TypeConverterRegistry::new();
        let body: BodyValue = Box::new("Hello World".to_string());

        assert_eq!(
            registry.convert_to::<String>(&body).as_deref(),
            Some("Hello World")
        );
    }

    #[test]
    fn seeded_string_byte_conversions_round_out_of_the_box() {
        let registry = TypeConverterRegistry::new();
        let body: BodyValue = Box::new("abc".to_string());

        assert_eq!(registry.convert_to::<Vec<u8>>(&body), Some(b"abc".to_vec()));

        let bytes: BodyValue = Box::new(b"xyz".to_vec());
        assert_eq!(registry.convert_to::<String>(&bytes).as_deref(), Some("xyz"));
    }

    #[test]
    fn unknown_pair_yields_none() {
        let registry = TypeConverterRegistry::new();
        let body: BodyValue = Box::new(42_u32);

        assert!(registry.convert_to::<String>(&body).is_none());
    }

    #[test]
    fn registered_converter_is_used_for_custom_pairs() {
        let registry = TypeConverterRegistry::new();
        registry.register::<u32, String>(|value| Some(value.to_string()));
        let body: BodyValue = Box::new(42_u32);

        assert_eq!(registry.convert_to::<String>(&body).as_deref(), Some("42"));
    }
}
