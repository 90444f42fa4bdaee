//! Per-call encode and decode state.
//!
//! A session owns the output buffer or input cursor, the reference table and
//! the depth counter for exactly one call. Codecs receive the session and
//! recurse through it for nested objects.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::context::SerializationContext;
use crate::descriptor::{FieldType, ParamDescriptor};
use crate::error::{SerializationError, SerializationResult};
use crate::primitives::{Input, Output};
use crate::references::{ReferenceReader, ReferenceWriter, NEW_MARKER, NULL_MARKER, REF_BASE};
use crate::registry::{Registration, RegistryTable};
use crate::value::{Object, Value};

/// Longest type name accepted in a stream.
pub const MAX_TYPE_NAME_LEN: usize = 256;

/// State of one encode call.
pub struct EncodeSession<'a> {
    out: Output,
    table: &'a RegistryTable,
    ctx: &'a SerializationContext,
    config: &'a EngineConfig,
    refs: ReferenceWriter,
    depth: usize,
}

impl<'a> EncodeSession<'a> {
    pub(crate) fn new(
        table: &'a RegistryTable,
        ctx: &'a SerializationContext,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            out: Output::new(),
            table,
            ctx,
            config,
            refs: ReferenceWriter::new(),
            depth: 0,
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.out.into_vec()
    }

    /// The raw output buffer.
    pub fn output(&mut self) -> &mut Output {
        &mut self.out
    }

    /// Context of this call.
    pub fn context(&self) -> &'a SerializationContext {
        self.ctx
    }

    /// Engine configuration.
    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Write a value in an object slot. Primitives are boxed.
    pub fn write_value(&mut self, value: &Value) -> SerializationResult<()> {
        match value {
            Value::Null => {
                self.out.write_var_u32(NULL_MARKER);
                Ok(())
            }
            Value::Object(object) => self.write_object(object),
            primitive => match primitive.boxed() {
                Value::Object(object) => self.write_object(&object),
                _ => Err(SerializationError::unexpected("object", primitive.kind_name())),
            },
        }
    }

    /// Write an object slot: a back-reference if this object was already
    /// written, otherwise its type name and body.
    pub fn write_object(&mut self, object: &Object) -> SerializationResult<()> {
        let table = self.table;
        let registration = table.for_encode(object, self.ctx.mode())?;

        if self.refs.is_in_progress(object) {
            return Err(SerializationError::ReferenceCycle {
                type_name: registration.type_name.to_string(),
            });
        }
        if let Some(index) = self.refs.lookup(object) {
            tracing::trace!(type_name = %registration.type_name, index, "back-reference");
            self.out.write_var_u32(REF_BASE + index);
            return Ok(());
        }

        self.out.write_var_u32(NEW_MARKER);
        self.refs.record(object)?;
        self.out.write_str(registration.type_name.name())?;
        self.out.write_var_u32(registration.type_name.version());

        self.enter()?;
        self.refs.push_in_progress(object);
        let previous = registration
            .no_references
            .then(|| self.refs.set_enabled(false));
        let result = registration.codec.encode(self, object);
        if let Some(previous) = previous {
            self.refs.set_enabled(previous);
        }
        self.refs.pop_in_progress();
        self.depth -= 1;
        result
    }

    /// Write a list of values: `varint(count) | slot*`.
    pub fn write_list(&mut self, items: &[Value]) -> SerializationResult<()> {
        self.out.write_len(items.len())?;
        items.iter().try_for_each(|item| self.write_value(item))
    }

    pub(crate) fn write_field(&mut self, param: &ParamDescriptor, value: &Value) -> SerializationResult<()> {
        let out = &mut self.out;
        match (param.field_type, value) {
            (FieldType::Bool, Value::Bool(v)) => out.write_bool(*v),
            (FieldType::Byte, Value::Byte(v)) => out.write_i8(*v),
            (FieldType::Short, Value::Short(v)) => out.write_i16(*v),
            (FieldType::Char, Value::Char(v)) => out.write_char(*v),
            (FieldType::Int, Value::Int(v)) => out.write_var_i32(*v),
            (FieldType::Long, Value::Long(v)) => out.write_var_i64(*v),
            (FieldType::Float, Value::Float(v)) => out.write_f32(*v),
            (FieldType::Double, Value::Double(v)) => out.write_f64(*v),
            (FieldType::Object(_), value) => return self.write_value(value),
            (field_type, value) => {
                return Err(SerializationError::unexpected(
                    format!("{} for parameter {}", field_type.declared_name(), param.name),
                    value.kind_name(),
                ))
            }
        }
        Ok(())
    }

    fn enter(&mut self) -> SerializationResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(SerializationError::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }
}

/// State of one decode call.
pub struct DecodeSession<'a> {
    input: Input<'a>,
    table: &'a RegistryTable,
    ctx: &'a SerializationContext,
    config: &'a EngineConfig,
    refs: ReferenceReader,
    depth: usize,
    expected_root: Option<(TypeId, &'static str)>,
}

impl<'a> DecodeSession<'a> {
    pub(crate) fn new(
        bytes: &'a [u8],
        table: &'a RegistryTable,
        ctx: &'a SerializationContext,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            input: Input::new(bytes),
            table,
            ctx,
            config,
            refs: ReferenceReader::new(),
            depth: 0,
            expected_root: None,
        }
    }

    /// Require the top-level object to be a `T`, checked before its body is read.
    pub(crate) fn expect_root<T: Any>(&mut self) {
        self.expected_root = Some((TypeId::of::<T>(), std::any::type_name::<T>()));
    }

    /// Fail if input remains and the configuration forbids it.
    pub(crate) fn finish(&self) -> SerializationResult<()> {
        let remaining = self.input.remaining();
        if remaining > 0 && self.config.reject_trailing_bytes {
            return Err(SerializationError::TrailingBytes { remaining });
        }
        Ok(())
    }

    /// The raw input cursor.
    pub fn input(&mut self) -> &mut Input<'a> {
        &mut self.input
    }

    /// Context of this call.
    pub fn context(&self) -> &'a SerializationContext {
        self.ctx
    }

    /// Engine configuration.
    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub(crate) fn registry(&self) -> &'a RegistryTable {
        self.table
    }

    /// Decode a complete embedded stream holding a `T`, under this call's
    /// context and limits. Nesting depth carries over from the current slot.
    pub(crate) fn decode_embedded<T: Any + Send + Sync>(&self, bytes: &[u8]) -> SerializationResult<Arc<T>> {
        let mut nested = DecodeSession::new(bytes, self.table, self.ctx, self.config);
        nested.depth = self.depth;
        nested.expect_root::<T>();
        let value = nested.read_value()?;
        nested.finish()?;
        value.downcast::<T>()
    }

    /// Read an object slot.
    pub fn read_value(&mut self) -> SerializationResult<Value> {
        match self.input.read_var_u32()? {
            NULL_MARKER => Ok(Value::Null),
            NEW_MARKER => self.read_new_object().map(Value::Object),
            marker => {
                let object = self.refs.resolve(marker)?;
                tracing::trace!(index = marker - REF_BASE, "back-reference");
                Ok(Value::Object(object))
            }
        }
    }

    /// Read a non-null object slot holding a `T`.
    pub fn read_object<T: Any + Send + Sync>(&mut self) -> SerializationResult<Arc<T>> {
        self.read_value()?.downcast::<T>()
    }

    /// Read an object slot holding a `T` or null.
    pub fn read_optional<T: Any + Send + Sync>(&mut self) -> SerializationResult<Option<Arc<T>>> {
        self.read_value()?.downcast_optional::<T>()
    }

    /// Read a length-prefixed blob within the configured limit.
    pub fn read_blob(&mut self) -> SerializationResult<&'a [u8]> {
        self.input.read_blob(self.config.max_blob_len)
    }

    /// Read a UTF-8 string within the configured limit.
    pub fn read_string(&mut self) -> SerializationResult<String> {
        self.input.read_str(self.config.max_blob_len).map(str::to_owned)
    }

    /// Read a varint element count within the configured limit.
    pub fn read_count(&mut self, what: &'static str) -> SerializationResult<usize> {
        let len = self.input.read_len(what, self.config.max_collection_len)?;
        // every element takes at least one byte
        if len > self.input.remaining() {
            return Err(SerializationError::UnexpectedEof {
                needed: len - self.input.remaining(),
            });
        }
        Ok(len)
    }

    /// Read a list written by [`EncodeSession::write_list`].
    pub fn read_list(&mut self) -> SerializationResult<Vec<Value>> {
        let len = self.read_count("list")?;
        (0..len).map(|_| self.read_value()).collect()
    }

    /// Read `fixed32(count) | slot*`, requiring at least `min_len` elements
    /// and, if given, exactly `expected_len`.
    pub fn read_list_of_length(
        &mut self,
        min_len: usize,
        expected_len: Option<usize>,
    ) -> SerializationResult<Vec<Value>> {
        let len = self.input.read_u32_fixed()? as usize;
        if len < min_len {
            return Err(SerializationError::malformed(format!(
                "list has {len} elements, at least {min_len} required"
            )));
        }
        if let Some(expected) = expected_len {
            if len != expected {
                return Err(SerializationError::malformed(format!(
                    "list has {len} elements, expected {expected}"
                )));
            }
        }
        if len > self.config.max_collection_len {
            return Err(SerializationError::LimitExceeded {
                what: "list",
                len,
                max: self.config.max_collection_len,
            });
        }
        (0..len).map(|_| self.read_value()).collect()
    }

    pub(crate) fn read_field(&mut self, field_type: FieldType) -> SerializationResult<Value> {
        let input = &mut self.input;
        Ok(match field_type {
            FieldType::Bool => Value::Bool(input.read_bool()?),
            FieldType::Byte => Value::Byte(input.read_i8()?),
            FieldType::Short => Value::Short(input.read_i16()?),
            FieldType::Char => Value::Char(input.read_char()?),
            FieldType::Int => Value::Int(input.read_var_i32()?),
            FieldType::Long => Value::Long(input.read_var_i64()?),
            FieldType::Float => Value::Float(input.read_f32()?),
            FieldType::Double => Value::Double(input.read_f64()?),
            FieldType::Object(_) => return self.read_value(),
        })
    }

    fn read_new_object(&mut self) -> SerializationResult<Object> {
        let name = self.input.read_str(MAX_TYPE_NAME_LEN)?;
        let version = self.input.read_var_u32()?;
        let table = self.table;
        let registration = table.for_decode(name, version, self.ctx.mode())?;
        if let Some((type_id, rust_name)) = self.expected_root.take() {
            if registration.type_id != type_id {
                return Err(SerializationError::unexpected(rust_name, registration.rust_name));
            }
        }

        let slot = self.refs.reserve(registration.type_name);
        self.enter()?;
        let previous = registration
            .no_references
            .then(|| self.refs.set_enabled(false));
        let result = registration.codec.decode(self);
        if let Some(previous) = previous {
            self.refs.set_enabled(previous);
        }
        self.depth -= 1;

        let object = result?;
        check_payload(registration, &object)?;
        if let Some(slot) = slot {
            self.refs.fill(slot, object.clone());
        }
        Ok(object)
    }

    fn enter(&mut self) -> SerializationResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(SerializationError::DepthLimitExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }
}

fn check_payload(registration: &Registration, object: &Object) -> SerializationResult<()> {
    if object.payload_type_id() != registration.type_id {
        return Err(SerializationError::unexpected(
            registration.rust_name,
            object.rust_type_name(),
        ));
    }
    Ok(())
}
