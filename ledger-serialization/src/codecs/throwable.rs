//! Recorded errors.
//!
//! Body: `blob(kind) | slot(message) | slot(cause) | varint(n) | slot*n`.
//! An empty suppressed list always decodes to [`Suppressed::NoneRecorded`].

use std::sync::Arc;

use ledger_core::{ErrorRecord, Suppressed};

use crate::codec::Serializer;
use crate::descriptor::TypeName;
use crate::error::SerializationResult;
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::Value;

/// Recorded error.
pub const ERROR_RECORD: TypeName = TypeName::new("ledger.ErrorRecord", 1);

struct ErrorRecordCodec;

impl Serializer<ErrorRecord> for ErrorRecordCodec {
    fn write(&self, session: &mut EncodeSession<'_>, record: &ErrorRecord) -> SerializationResult<()> {
        session.output().write_str(record.kind())?;
        session.write_value(&record.message().map_or(Value::Null, Value::string))?;
        session.write_value(
            &record
                .cause()
                .map_or(Value::Null, |cause| Value::from_arc(Arc::clone(cause))),
        )?;
        let suppressed: Vec<Value> = record
            .suppressed()
            .as_slice()
            .iter()
            .map(|e| Value::from_arc(Arc::clone(e)))
            .collect();
        session.write_list(&suppressed)
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<ErrorRecord> {
        let kind = session.read_string()?;
        let message = session
            .read_optional::<String>()?
            .map(|m| m.as_ref().clone());
        let cause = session.read_optional::<ErrorRecord>()?;
        let suppressed = session
            .read_list()?
            .iter()
            .map(Value::downcast::<ErrorRecord>)
            .collect::<SerializationResult<Vec<_>>>()?;
        Ok(ErrorRecord::from_parts(
            kind,
            message,
            cause,
            Suppressed::from_vec(suppressed),
        ))
    }
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_override::<ErrorRecord, _>(ERROR_RECORD, ErrorRecordCodec)?;
    r.allow(ERROR_RECORD)
}
