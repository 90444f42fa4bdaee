//! Per-call reference tables.
//!
//! Object slots start with a varint marker: [`NULL_MARKER`], [`NEW_MARKER`],
//! or `REF_BASE + index` for a back-reference to the `index`th object
//! recorded in this stream. Writer and reader number objects identically:
//! in pre-order, and only while tracking is enabled.

use std::collections::HashMap;

use crate::descriptor::TypeName;
use crate::error::{SerializationError, SerializationResult};
use crate::value::Object;

/// Slot marker for an absent object.
pub const NULL_MARKER: u32 = 0;

/// Slot marker for an object whose body follows.
pub const NEW_MARKER: u32 = 1;

/// Back-reference markers start here.
pub const REF_BASE: u32 = 2;

/// Identity table of the encoder.
#[derive(Debug)]
pub(crate) struct ReferenceWriter {
    enabled: bool,
    seen: HashMap<usize, u32>,
    // Recorded objects stay alive for the whole call so no address is reused.
    retained: Vec<Object>,
    in_progress: Vec<usize>,
}

impl ReferenceWriter {
    pub(crate) fn new() -> Self {
        Self {
            enabled: true,
            seen: HashMap::new(),
            retained: Vec::new(),
            in_progress: Vec::new(),
        }
    }

    /// Switch tracking, returning the previous setting.
    pub(crate) fn set_enabled(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    /// Index of an already written object, when tracking is on.
    pub(crate) fn lookup(&self, object: &Object) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        self.seen.get(&object.identity()).copied()
    }

    /// Number an object about to be written, when tracking is on.
    pub(crate) fn record(&mut self, object: &Object) -> SerializationResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let index = u32::try_from(self.retained.len())
            .ok()
            .filter(|index| *index <= u32::MAX - REF_BASE)
            .ok_or_else(|| SerializationError::malformed("too many objects in one stream"))?;
        self.seen.insert(object.identity(), index);
        self.retained.push(object.clone());
        Ok(())
    }

    pub(crate) fn is_in_progress(&self, object: &Object) -> bool {
        self.in_progress.contains(&object.identity())
    }

    pub(crate) fn push_in_progress(&mut self, object: &Object) {
        self.in_progress.push(object.identity());
    }

    pub(crate) fn pop_in_progress(&mut self) {
        self.in_progress.pop();
    }
}

#[derive(Debug)]
enum Slot {
    Pending(TypeName),
    Ready(Object),
}

/// Object table of the decoder.
#[derive(Debug)]
pub(crate) struct ReferenceReader {
    enabled: bool,
    slots: Vec<Slot>,
}

impl ReferenceReader {
    pub(crate) fn new() -> Self {
        Self {
            enabled: true,
            slots: Vec::new(),
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    /// Claim the next index for an object about to be read.
    pub(crate) fn reserve(&mut self, type_name: TypeName) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        self.slots.push(Slot::Pending(type_name));
        Some(self.slots.len() - 1)
    }

    pub(crate) fn fill(&mut self, index: usize, object: Object) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Ready(object);
        }
    }

    /// Resolve a back-reference marker.
    pub(crate) fn resolve(&self, marker: u32) -> SerializationResult<Object> {
        if !self.enabled {
            return Err(SerializationError::malformed(
                "back-reference inside a no-reference object",
            ));
        }
        let index = (marker - REF_BASE) as usize;
        match self.slots.get(index) {
            Some(Slot::Ready(object)) => Ok(object.clone()),
            Some(Slot::Pending(type_name)) => Err(SerializationError::ReferenceCycle {
                type_name: type_name.to_string(),
            }),
            None => Err(SerializationError::malformed(format!(
                "back-reference {index} beyond {} recorded objects",
                self.slots.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_numbers_in_order() {
        let mut writer = ReferenceWriter::new();
        let a = Object::new(1i32);
        let b = Object::new(2i32);
        writer.record(&a).unwrap();
        writer.record(&b).unwrap();
        assert_eq!(writer.lookup(&a), Some(0));
        assert_eq!(writer.lookup(&b), Some(1));
        assert_eq!(writer.lookup(&Object::new(1i32)), None);
    }

    #[test]
    fn test_writer_disabled_records_nothing() {
        let mut writer = ReferenceWriter::new();
        let a = Object::new(1i32);
        assert!(writer.set_enabled(false));
        writer.record(&a).unwrap();
        assert_eq!(writer.lookup(&a), None);
        assert!(!writer.set_enabled(true));
        assert_eq!(writer.lookup(&a), None);
    }

    #[test]
    fn test_reader_resolves_filled_slots() {
        let mut reader = ReferenceReader::new();
        let index = reader.reserve(TypeName::new("demo.Node", 1)).unwrap();
        assert!(matches!(
            reader.resolve(REF_BASE),
            Err(SerializationError::ReferenceCycle { .. })
        ));
        let object = Object::new("x".to_string());
        reader.fill(index, object.clone());
        assert!(reader.resolve(REF_BASE).unwrap().ptr_eq(&object));
        assert!(matches!(
            reader.resolve(REF_BASE + 1),
            Err(SerializationError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_reader_rejects_references_when_disabled() {
        let mut reader = ReferenceReader::new();
        reader.set_enabled(false);
        assert_eq!(reader.reserve(TypeName::new("demo.Node", 1)), None);
        assert!(reader.resolve(REF_BASE).is_err());
    }
}
