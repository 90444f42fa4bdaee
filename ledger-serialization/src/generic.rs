//! Generic codec for immutable types, driven by an explicit constructor schema.
//!
//! A type registers its constructor parameters in order, each with a getter
//! that reads the matching property, plus a constructor taking the decoded
//! arguments. The body is:
//!
//! ```text
//! varint(field count) | fixed32(fingerprint) | field_1 .. field_n
//! ```
//!
//! Primitive fields are written inline; everything else goes back through
//! the engine as an object slot.

use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use crate::codec::Serializer;
use crate::descriptor::{FieldType, ParamDescriptor, TypeDescriptor, TypeName};
use crate::error::{BoxError, SerializationError, SerializationResult};
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Payload, Value};

type Getter<T> = dyn Fn(&T) -> Value + Send + Sync;
type Constructor<T> = dyn Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync;

struct Field<T> {
    name: &'static str,
    field_type: FieldType,
    getter: Box<Getter<T>>,
}

/// Constructor schema of an immutable type, built fluently and handed to
/// [`Registrar::register_immutable`](crate::Registrar::register_immutable).
///
/// ```ignore
/// ImmutableSchema::new(TypeName::new("ledger.StateRef", 1))
///     .field("txhash", FieldType::Object("SecureHash"), |s: &StateRef| Value::object(s.txhash))
///     .field("index", FieldType::Int, |s: &StateRef| Value::Int(s.index as i32))
///     .constructor(|args| Ok(StateRef::new(args.cloned(0)?, args.int(1)? as u32)))
/// ```
pub struct ImmutableSchema<T> {
    type_name: TypeName,
    fields: Vec<Field<T>>,
    constructor: Option<Box<Constructor<T>>>,
}

impl<T: Payload> ImmutableSchema<T> {
    /// Start a schema for `type_name`.
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
            constructor: None,
        }
    }

    /// Append the next constructor parameter and the getter for its property.
    pub fn field<G>(mut self, name: &'static str, field_type: FieldType, getter: G) -> Self
    where
        G: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.fields.push(Field {
            name,
            field_type,
            getter: Box::new(getter),
        });
        self
    }

    /// Set the constructor.
    pub fn constructor<C>(mut self, constructor: C) -> Self
    where
        C: Fn(&Args<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(Box::new(constructor));
        self
    }

    pub(crate) fn build(self) -> SerializationResult<ImmutableCodec<T>> {
        let type_name = self.type_name;
        let reject = |reason: String| SerializationError::Registration(format!("{type_name}: {reason}"));

        let constructor = self
            .constructor
            .ok_or_else(|| reject("no constructor".to_string()))?;
        if u32::try_from(self.fields.len()).is_err() {
            return Err(reject("too many parameters".to_string()));
        }

        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(self.fields.len());
        let mut getters = Vec::with_capacity(self.fields.len());
        for (index, field) in self.fields.into_iter().enumerate() {
            if !is_identifier(field.name) {
                return Err(reject(format!("parameter name {:?} is not an identifier", field.name)));
            }
            if !seen.insert(field.name) {
                return Err(reject(format!("parameter {} declared twice", field.name)));
            }
            if let FieldType::Object(declared) = field.field_type {
                if declared.trim().is_empty() {
                    return Err(reject(format!("parameter {} has no declared type", field.name)));
                }
            }
            params.push(ParamDescriptor {
                name: field.name,
                index: index as u32,
                field_type: field.field_type,
            });
            getters.push(field.getter);
        }

        Ok(ImmutableCodec {
            descriptor: Arc::new(TypeDescriptor::new(type_name, params)),
            getters,
            constructor,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Registered form of an [`ImmutableSchema`].
pub(crate) struct ImmutableCodec<T> {
    descriptor: Arc<TypeDescriptor>,
    getters: Vec<Box<Getter<T>>>,
    constructor: Box<Constructor<T>>,
}

impl<T> ImmutableCodec<T> {
    pub(crate) fn descriptor_arc(&self) -> Arc<TypeDescriptor> {
        Arc::clone(&self.descriptor)
    }
}

impl<T: Payload> Serializer<T> for ImmutableCodec<T> {
    fn write(&self, session: &mut EncodeSession<'_>, value: &T) -> SerializationResult<()> {
        let out = session.output();
        out.write_var_u32(self.descriptor.arity());
        out.write_u32_fixed(self.descriptor.fingerprint());
        for (param, getter) in self.descriptor.params().iter().zip(&self.getters) {
            let field = getter(value);
            session.write_field(param, &field)?;
        }
        Ok(())
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<T> {
        let type_name = self.descriptor.type_name();
        let count = session.input().read_var_u32()?;
        let fingerprint = session.input().read_u32_fixed()?;
        if fingerprint != self.descriptor.fingerprint() {
            return Err(SerializationError::TypeEvolution {
                type_name: type_name.to_string(),
                expected: self.descriptor.fingerprint(),
                actual: fingerprint,
            });
        }
        if count != self.descriptor.arity() {
            return Err(SerializationError::SchemaMismatch {
                type_name: type_name.to_string(),
                expected: self.descriptor.arity(),
                actual: count,
            });
        }

        let mut values = Vec::with_capacity(self.descriptor.params().len());
        for param in self.descriptor.params() {
            values.push(session.read_field(param.field_type)?);
        }
        let args = Args {
            descriptor: &self.descriptor,
            values,
        };
        (self.constructor)(&args).map_err(|err| match err.downcast::<SerializationError>() {
            Ok(own) => *own,
            Err(source) => SerializationError::ConstructorInvocation {
                type_name: type_name.to_string(),
                source,
            },
        })
    }

    fn descriptor(&self) -> Option<Arc<TypeDescriptor>> {
        Some(self.descriptor_arc())
    }
}

/// Decoded constructor arguments, in declared order.
///
/// Accessors fail with [`SerializationError::UnexpectedType`] when the value
/// at a position is not of the requested type; inside a constructor `?`
/// passes that through untouched.
pub struct Args<'a> {
    descriptor: &'a TypeDescriptor,
    values: Vec<Value>,
}

macro_rules! primitive_arg {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self, index: usize) -> SerializationResult<$ty> {
            match self.get(index)? {
                Value::$variant(v) => Ok(*v),
                other => Err(self.mismatch(index, other)),
            }
        }
    };
}

impl<'a> Args<'a> {
    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The type being constructed.
    pub fn type_name(&self) -> TypeName {
        self.descriptor.type_name()
    }

    /// Argument at `index`.
    pub fn get(&self, index: usize) -> SerializationResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            SerializationError::unexpected(
                format!("argument {index} of {}", self.descriptor.type_name()),
                "end of arguments",
            )
        })
    }

    /// Argument for the parameter called `name`.
    pub fn by_name(&self, name: &str) -> SerializationResult<&Value> {
        let index = self
            .descriptor
            .params()
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| {
                SerializationError::unexpected(
                    format!("parameter {name} of {}", self.descriptor.type_name()),
                    "no such parameter",
                )
            })?;
        self.get(index)
    }

    primitive_arg!(/// `boolean` argument.
        bool, Bool, bool);
    primitive_arg!(/// `byte` argument.
        byte, Byte, i8);
    primitive_arg!(/// `short` argument.
        short, Short, i16);
    primitive_arg!(/// `char` argument.
        char, Char, u16);
    primitive_arg!(/// `int` argument.
        int, Int, i32);
    primitive_arg!(/// `long` argument.
        long, Long, i64);
    primitive_arg!(/// `float` argument.
        float, Float, f32);
    primitive_arg!(/// `double` argument.
        double, Double, f64);

    /// Shared object argument; null is rejected.
    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> SerializationResult<Arc<T>> {
        self.get(index)?.downcast::<T>()
    }

    /// Optional object argument.
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> SerializationResult<Option<Arc<T>>> {
        self.get(index)?.downcast_optional::<T>()
    }

    /// Owned copy of an object argument.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, index: usize) -> SerializationResult<T> {
        self.get(index)?.cloned::<T>()
    }

    /// Owned copies of the elements of a list argument.
    pub fn list<T: Any + Send + Sync + Clone>(&self, index: usize) -> SerializationResult<Vec<T>> {
        self.get(index)?.cloned_elements::<T>()
    }

    fn mismatch(&self, index: usize, actual: &Value) -> SerializationError {
        let expected = self
            .descriptor
            .params()
            .get(index)
            .map_or("argument", |p| p.field_type.declared_name());
        SerializationError::unexpected(expected, actual.kind_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        left: i32,
        right: String,
    }

    fn pair_schema() -> ImmutableSchema<Pair> {
        ImmutableSchema::new(TypeName::new("demo.Pair", 1))
            .field("left", FieldType::Int, |p: &Pair| Value::Int(p.left))
            .field("right", FieldType::Object("String"), |p: &Pair| Value::string(p.right.clone()))
            .constructor(|args| {
                Ok(Pair {
                    left: args.int(0)?,
                    right: args.cloned(1)?,
                })
            })
    }

    #[test]
    fn test_build_computes_descriptor() {
        let codec = pair_schema().build().unwrap();
        let descriptor = codec.descriptor_arc();
        assert_eq!(descriptor.arity(), 2);
        assert_eq!(descriptor.params()[1].name, "right");
        assert_eq!(descriptor.params()[1].index, 1);
        assert_eq!(
            descriptor.fingerprint(),
            pair_schema().build().unwrap().descriptor_arc().fingerprint()
        );
    }

    #[test]
    fn test_missing_constructor_rejected() {
        let schema: ImmutableSchema<Pair> = ImmutableSchema::new(TypeName::new("demo.Pair", 1))
            .field("left", FieldType::Int, |p: &Pair| Value::Int(p.left));
        assert!(matches!(schema.build(), Err(SerializationError::Registration(_))));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let schema = ImmutableSchema::new(TypeName::new("demo.Pair", 1))
            .field("left", FieldType::Int, |p: &Pair| Value::Int(p.left))
            .field("left", FieldType::Int, |p: &Pair| Value::Int(p.left))
            .constructor(|_| Err("unused".into()));
        assert!(matches!(schema.build(), Err(SerializationError::Registration(_))));
    }

    #[test]
    fn test_bad_parameter_names_rejected() {
        for name in ["", "1st", "with space", "dash-ed"] {
            let schema = ImmutableSchema::new(TypeName::new("demo.Pair", 1))
                .field(name, FieldType::Int, |p: &Pair| Value::Int(p.left))
                .constructor(|_| Err("unused".into()));
            assert!(schema.build().is_err(), "{name:?} accepted");
        }
        let untyped = ImmutableSchema::new(TypeName::new("demo.Pair", 1))
            .field("right", FieldType::Object(" "), |p: &Pair| Value::string(p.right.clone()))
            .constructor(|_| Err("unused".into()));
        assert!(untyped.build().is_err());
    }

    #[test]
    fn test_args_accessors() {
        let descriptor = pair_schema().build().unwrap().descriptor_arc();
        let args = Args {
            descriptor: &descriptor,
            values: vec![Value::Int(5), Value::string("five")],
        };
        assert_eq!(args.int(0).unwrap(), 5);
        assert_eq!(args.cloned::<String>(1).unwrap(), "five");
        assert!(args.by_name("right").is_ok());
        assert!(args.by_name("middle").is_err());
        assert!(matches!(
            args.long(0),
            Err(SerializationError::UnexpectedType { .. })
        ));
        assert!(args.get(2).is_err());
    }
}
