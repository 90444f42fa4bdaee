//! Codec traits.
//!
//! [`Serializer`] is the typed interface codec authors implement. The
//! registry stores codecs type-erased as [`Codec`], which works on
//! [`Object`]s.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;
use crate::error::{SerializationError, SerializationResult};
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Object, Payload};

/// Encodes and decodes the body of one type.
pub trait Serializer<T>: Send + Sync {
    /// Write `value`'s body.
    fn write(&self, session: &mut EncodeSession<'_>, value: &T) -> SerializationResult<()>;

    /// Read a body and rebuild the value.
    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<T>;

    /// Constructor shape, for generically encoded types.
    fn descriptor(&self) -> Option<Arc<TypeDescriptor>> {
        None
    }
}

/// Type-erased codec as stored in the registry.
pub trait Codec: Send + Sync {
    /// Write the body of `value`.
    fn encode(&self, session: &mut EncodeSession<'_>, value: &Object) -> SerializationResult<()>;

    /// Read a body.
    ///
    /// Most codecs build a fresh object; some hand back an existing one.
    fn decode(&self, session: &mut DecodeSession<'_>) -> SerializationResult<Object>;

    /// Constructor shape, for generically encoded types.
    fn descriptor(&self) -> Option<Arc<TypeDescriptor>> {
        None
    }
}

/// Adapts a typed [`Serializer`] to [`Codec`].
pub(crate) struct Typed<T, S> {
    serializer: S,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Typed<T, S> {
    pub(crate) fn new(serializer: S) -> Self {
        Self {
            serializer,
            _marker: PhantomData,
        }
    }
}

impl<T: Payload, S: Serializer<T>> Codec for Typed<T, S> {
    fn encode(&self, session: &mut EncodeSession<'_>, value: &Object) -> SerializationResult<()> {
        let typed = value.downcast_ref::<T>().ok_or_else(|| {
            SerializationError::unexpected(std::any::type_name::<T>(), value.rust_type_name())
        })?;
        self.serializer.write(session, typed)
    }

    fn decode(&self, session: &mut DecodeSession<'_>) -> SerializationResult<Object> {
        self.serializer.read(session).map(Object::new)
    }

    fn descriptor(&self) -> Option<Arc<TypeDescriptor>> {
        self.serializer.descriptor()
    }
}

type WriteFn<T> = dyn Fn(&mut EncodeSession<'_>, &T) -> SerializationResult<()> + Send + Sync;
type ReadFn<T> = dyn Fn(&mut DecodeSession<'_>) -> SerializationResult<T> + Send + Sync;

/// A serializer built from a pair of closures.
pub struct FnSerializer<T> {
    write: Box<WriteFn<T>>,
    read: Box<ReadFn<T>>,
}

impl<T> FnSerializer<T> {
    /// Pair a writer with a reader.
    pub fn new<W, R>(write: W, read: R) -> Self
    where
        W: Fn(&mut EncodeSession<'_>, &T) -> SerializationResult<()> + Send + Sync + 'static,
        R: Fn(&mut DecodeSession<'_>) -> SerializationResult<T> + Send + Sync + 'static,
    {
        Self {
            write: Box::new(write),
            read: Box::new(read),
        }
    }
}

impl<T> Serializer<T> for FnSerializer<T> {
    fn write(&self, session: &mut EncodeSession<'_>, value: &T) -> SerializationResult<()> {
        (self.write)(session, value)
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<T> {
        (self.read)(session)
    }
}
