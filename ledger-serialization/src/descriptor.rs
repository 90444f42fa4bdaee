//! Type names, constructor shapes and their fingerprints.

use std::fmt;

use ledger_core::crypto::sha256;

/// Stable, versioned identifier of a registered type.
///
/// This is what travels in the stream; Rust type paths never do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    name: &'static str,
    version: u32,
}

impl TypeName {
    /// Create a type name.
    pub const fn new(name: &'static str, version: u32) -> Self {
        Self { name, version }
    }

    /// The name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The version.
    pub fn version(&self) -> u32 {
        self.version
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Declared type of a constructor parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `boolean`, one byte.
    Bool,
    /// `byte`, one byte.
    Byte,
    /// `short`, 2 bytes.
    Short,
    /// `char`, 2 bytes.
    Char,
    /// `int`, zig-zag varint.
    Int,
    /// `long`, zig-zag varint.
    Long,
    /// `float`, 4 bytes.
    Float,
    /// `double`, 8 bytes.
    Double,
    /// Any object, written through the engine. The name is the declared type.
    Object(&'static str),
}

impl FieldType {
    /// The declared type name that feeds the fingerprint.
    pub fn declared_name(&self) -> &'static str {
        match self {
            FieldType::Bool => "boolean",
            FieldType::Byte => "byte",
            FieldType::Short => "short",
            FieldType::Char => "char",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Object(name) => name,
        }
    }

    /// Whether values of this type are written inline rather than as objects.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, FieldType::Object(_))
    }
}

/// One constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Parameter name, matching the property it is read back from.
    pub name: &'static str,
    /// Position in the constructor.
    pub index: u32,
    /// Declared type.
    pub field_type: FieldType,
}

/// Constructor shape of a generically encoded type.
///
/// Built once at registration and shared by every call afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    type_name: TypeName,
    params: Vec<ParamDescriptor>,
    fingerprint: u32,
}

impl TypeDescriptor {
    /// Build a descriptor and compute its fingerprint.
    pub fn new(type_name: TypeName, params: Vec<ParamDescriptor>) -> Self {
        let fingerprint = fingerprint(&type_name, &params);
        Self {
            type_name,
            params,
            fingerprint,
        }
    }

    /// The described type.
    pub fn type_name(&self) -> TypeName {
        self.type_name
    }

    /// Parameters in constructor order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Constructor arity.
    pub fn arity(&self) -> u32 {
        self.params.len() as u32
    }

    /// The 32-bit shape fingerprint.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }
}

/// First four bytes, big-endian, of SHA-256 over the type name, version and
/// each parameter's `name|index|declared_type`.
pub fn fingerprint(type_name: &TypeName, params: &[ParamDescriptor]) -> u32 {
    let mut material = Vec::with_capacity(64 + params.len() * 32);
    material.extend_from_slice(type_name.name().as_bytes());
    material.push(0);
    material.extend_from_slice(&type_name.version().to_be_bytes());
    for param in params {
        material.extend_from_slice(param.name.as_bytes());
        material.push(b'|');
        material.extend_from_slice(&param.index.to_be_bytes());
        material.push(b'|');
        material.extend_from_slice(param.field_type.declared_name().as_bytes());
        material.push(0);
    }
    let digest = sha256(&material);
    let bytes = digest.as_bytes();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
