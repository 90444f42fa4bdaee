//! Dynamic values passed between codecs.
//!
//! A constructor argument is either a primitive, null, or an [`Object`]: a
//! shared handle to any registered payload. Object identity is the pointer
//! identity of the underlying `Arc`, which is what the reference table keys on.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::{SerializationError, SerializationResult};

/// Anything that can travel inside an [`Object`].
pub trait Payload: Any + Send + Sync + fmt::Debug {
    /// View as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Convert into a shareable `Any` for owned downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    /// Rust type name, for diagnostics.
    fn rust_type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn rust_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A shared, type-erased object.
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Payload>,
}

impl Object {
    /// Wrap a value in a fresh allocation.
    pub fn new<T: Payload>(value: T) -> Self {
        Object {
            inner: Arc::new(value),
        }
    }

    /// Wrap an existing allocation, keeping its identity.
    pub fn from_arc<T: Payload>(value: Arc<T>) -> Self {
        Object { inner: value }
    }

    fn payload(&self) -> &dyn Payload {
        &*self.inner
    }

    /// `TypeId` of the payload.
    pub fn payload_type_id(&self) -> TypeId {
        self.payload().as_any().type_id()
    }

    /// Rust type name of the payload.
    pub fn rust_type_name(&self) -> &'static str {
        self.payload().rust_type_name()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.payload().as_any().is::<T>()
    }

    /// Borrow the payload as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload().as_any().downcast_ref::<T>()
    }

    /// Share the payload as an `Arc<T>`, keeping identity.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let any: Arc<dyn Any + Send + Sync> = Payload::into_any(Arc::clone(&self.inner));
        any.downcast::<T>().ok()
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        self.identity() == other.identity()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.payload(), f)
    }
}

/// An ordered map of values. Insertion order is the encoding order.
#[derive(Debug, Clone, Default)]
pub struct ValueMap(pub Vec<(Value, Value)>);

/// A constructor argument or collection element.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent object.
    Null,
    /// `boolean`
    Bool(bool),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `char`, a UTF-16 code unit.
    Char(u16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Any registered object.
    Object(Object),
}

impl Value {
    /// Wrap a value as a fresh object.
    pub fn object<T: Payload>(value: T) -> Value {
        Value::Object(Object::new(value))
    }

    /// Wrap a shared value, keeping its identity.
    pub fn from_arc<T: Payload>(value: Arc<T>) -> Value {
        Value::Object(Object::from_arc(value))
    }

    /// `Null` for `None`, an object otherwise.
    pub fn optional<T: Payload>(value: Option<T>) -> Value {
        value.map_or(Value::Null, Value::object)
    }

    /// A string object.
    pub fn string(value: impl Into<String>) -> Value {
        Value::object(value.into())
    }

    /// A byte array object.
    pub fn bytes(value: impl Into<Vec<u8>>) -> Value {
        Value::object(value.into())
    }

    /// A list object.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::object(items.into_iter().collect::<Vec<Value>>())
    }

    /// A list of fresh objects built from owned values.
    pub fn list_of<T: Payload + Clone>(items: &[T]) -> Value {
        Value::list(items.iter().cloned().map(Value::object))
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Object(object) => object.rust_type_name(),
        }
    }

    /// Whether this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The object, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Box a primitive into its object form; objects and null pass through.
    pub fn boxed(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Bool(v) => Value::object(*v),
            Value::Byte(v) => Value::object(*v),
            Value::Short(v) => Value::object(*v),
            Value::Char(v) => Value::object(*v),
            Value::Int(v) => Value::object(*v),
            Value::Long(v) => Value::object(*v),
            Value::Float(v) => Value::object(*v),
            Value::Double(v) => Value::object(*v),
            Value::Object(object) => Value::Object(object.clone()),
        }
    }

    /// The shared `T` this value holds; primitives are boxed first.
    pub fn downcast<T: Any + Send + Sync>(&self) -> SerializationResult<Arc<T>> {
        let expected = std::any::type_name::<T>();
        match self.boxed() {
            Value::Object(object) => object
                .downcast::<T>()
                .ok_or_else(|| SerializationError::unexpected(expected, object.rust_type_name())),
            _ => Err(SerializationError::unexpected(expected, "null")),
        }
    }

    /// An owned copy of the `T` this value holds.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self) -> SerializationResult<T> {
        self.downcast::<T>().map(|v| T::clone(&v))
    }

    /// `None` for null, otherwise the shared `T`.
    pub fn downcast_optional<T: Any + Send + Sync>(&self) -> SerializationResult<Option<Arc<T>>> {
        match self {
            Value::Null => Ok(None),
            other => other.downcast::<T>().map(Some),
        }
    }

    /// Owned copies of every element of a list value.
    pub fn cloned_elements<T: Any + Send + Sync + Clone>(&self) -> SerializationResult<Vec<T>> {
        self.downcast::<Vec<Value>>()?.iter().map(Value::cloned::<T>).collect()
    }
}
