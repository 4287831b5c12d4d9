// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Exported value representation.

use crate::plugins::ResourceLoader;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Key/value container used for `exports` and object values.
pub type Object = BTreeMap<String, Value>;

/// A value exported by a module, definition or plugin.
///
/// Values are cheap enough to clone and can be shared between threads.
/// `Native` values keep their identity across clones.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// null
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Ordered list
    Array(Vec<Value>),
    /// String-keyed map
    Object(Object),
    /// Opaque Rust object
    Native(NativeValue),
}

/// Shared handle to an arbitrary Rust object exported by a module.
#[derive(Clone)]
pub struct NativeValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl NativeValue {
    /// Wrap a Rust object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped object if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Get a shared handle to the wrapped object if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Returns true if both handles point at the same object.
    pub fn ptr_eq(&self, other: &NativeValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeValue({})", self.type_name)
    }
}

/// Resource loader stored inside a `Value`, see [`Value::loader`].
pub(crate) struct LoaderHandle(pub(crate) Arc<dyn ResourceLoader>);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                // NaN is never equal to itself
                if a.is_nan() && b.is_nan() {
                    false
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    /// Wrap an arbitrary Rust object.
    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        Value::Native(NativeValue::new(value))
    }

    /// Wrap a resource loader so a plugin module can export it.
    pub fn loader(loader: impl ResourceLoader + 'static) -> Self {
        Value::native(LoaderHandle(Arc::new(loader)))
    }

    /// Returns the wrapped resource loader, if this value is one.
    pub fn as_loader(&self) -> Option<Arc<dyn ResourceLoader>> {
        match self {
            Value::Native(native) => native
                .downcast_ref::<LoaderHandle>()
                .map(|handle| Arc::clone(&handle.0)),
            _ => None,
        }
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the map, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Get a shared handle to a native object of type `T`.
    pub fn downcast_native<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Native(native) => native.downcast::<T>(),
            _ => None,
        }
    }

    /// Returns the type of this value as a string.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Native(_) => "native",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Native(native) => write!(f, "[native {}]", native.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Logger;

    #[test]
    fn test_native_identity() {
        let a = Value::native(Logger);
        let b = a.clone();
        let c = Value::native(Logger);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.downcast_native::<Logger>().is_some());
        assert!(a.downcast_native::<String>().is_none());
    }

    #[test]
    fn test_nan_is_not_equal() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::from(3), Value::Number(3.0));
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({ "key1": 100, "key2": [true, null, "x"] });
        let value = Value::from(json);
        assert_eq!(value.get("key1"), Some(&Value::Number(100.0)));
        assert_eq!(
            value.get("key2"),
            Some(&Value::Array(vec![
                Value::Bool(true),
                Value::Null,
                Value::from("x")
            ]))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("[Logger]").to_string(), "[Logger]");
        assert_eq!(Value::Array(vec![1.into(), 2.into()]).to_string(), "[1, 2]");
        assert_eq!(Value::Object(Object::new()).to_string(), "[object Object]");
    }
}
