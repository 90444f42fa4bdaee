//! Transaction model codecs.
//!
//! Transactions are signed over their encoding, so the three transaction
//! types are written with reference tracking disabled: their bytes depend
//! only on their content. Field order here is part of the signed format.

use ledger_core::{
    ComponentGroup, CoreTransaction, NotaryChangeWireTransaction, OpaqueBytes, Party, PrivacySalt,
    SerializedBytes, SignedTransaction, StateRef, TransactionSignature, WireTransaction,
};

use super::constructor_failed;
use crate::codec::Serializer;
use crate::descriptor::{FieldType, TypeName};
use crate::error::{SerializationError, SerializationResult};
use crate::generic::ImmutableSchema;
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Payload, Value};

/// Uninterpreted bytes.
pub const OPAQUE_BYTES: TypeName = TypeName::new("ledger.OpaqueBytes", 1);
/// Output reference.
pub const STATE_REF: TypeName = TypeName::new("ledger.transactions.StateRef", 1);
/// Component group.
pub const COMPONENT_GROUP: TypeName = TypeName::new("ledger.transactions.ComponentGroup", 1);
/// Privacy salt.
pub const PRIVACY_SALT: TypeName = TypeName::new("ledger.transactions.PrivacySalt", 1);
/// Party.
pub const PARTY: TypeName = TypeName::new("ledger.identity.Party", 1);
/// Signature with its signer.
pub const TRANSACTION_SIGNATURE: TypeName = TypeName::new("ledger.transactions.TransactionSignature", 1);
/// Regular transaction.
pub const WIRE_TRANSACTION: TypeName = TypeName::new("ledger.transactions.WireTransaction", 1);
/// Notary change.
pub const NOTARY_CHANGE: TypeName = TypeName::new("ledger.transactions.NotaryChangeWireTransaction", 1);
/// Either kind of transaction.
pub const CORE_TRANSACTION: TypeName = TypeName::new("ledger.transactions.CoreTransaction", 1);
/// Encoded transaction with signatures.
pub const SIGNED_TRANSACTION: TypeName = TypeName::new("ledger.transactions.SignedTransaction", 1);

/// `list(groups) | slot(salt)`
struct WireTransactionCodec;

impl Serializer<WireTransaction> for WireTransactionCodec {
    fn write(&self, session: &mut EncodeSession<'_>, tx: &WireTransaction) -> SerializationResult<()> {
        session.write_list(&list_of(tx.component_groups()))?;
        session.write_value(&Value::object(*tx.privacy_salt()))
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<WireTransaction> {
        let groups = cloned_list::<ComponentGroup>(session)?;
        let salt = session.read_object::<PrivacySalt>()?;
        WireTransaction::new(groups, *salt).map_err(|e| constructor_failed(WIRE_TRANSACTION, e))
    }
}

/// `list(inputs) | slot(notary) | slot(new notary)`
struct NotaryChangeCodec;

impl Serializer<NotaryChangeWireTransaction> for NotaryChangeCodec {
    fn write(
        &self,
        session: &mut EncodeSession<'_>,
        tx: &NotaryChangeWireTransaction,
    ) -> SerializationResult<()> {
        session.write_list(&list_of(tx.inputs()))?;
        session.write_value(&Value::object(tx.notary().clone()))?;
        session.write_value(&Value::object(tx.new_notary().clone()))
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<NotaryChangeWireTransaction> {
        let inputs = cloned_list::<StateRef>(session)?;
        let notary = session.read_object::<Party>()?;
        let new_notary = session.read_object::<Party>()?;
        NotaryChangeWireTransaction::new(inputs, Party::clone(&notary), Party::clone(&new_notary))
            .map_err(|e| constructor_failed(NOTARY_CHANGE, e))
    }
}

/// A single slot holding the concrete transaction.
struct CoreTransactionCodec;

impl Serializer<CoreTransaction> for CoreTransactionCodec {
    fn write(&self, session: &mut EncodeSession<'_>, tx: &CoreTransaction) -> SerializationResult<()> {
        let inner = match tx {
            CoreTransaction::Wire(tx) => Value::object(tx.clone()),
            CoreTransaction::NotaryChange(tx) => Value::object(tx.clone()),
        };
        session.write_value(&inner)
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<CoreTransaction> {
        let inner = session.read_value()?;
        if let Ok(tx) = inner.cloned::<WireTransaction>() {
            return Ok(CoreTransaction::Wire(tx));
        }
        if let Ok(tx) = inner.cloned::<NotaryChangeWireTransaction>() {
            return Ok(CoreTransaction::NotaryChange(tx));
        }
        Err(SerializationError::unexpected("transaction", inner.kind_name()))
    }
}

/// `blob(tx bits) | list(signatures)`
///
/// The transaction bits go in as a bare blob since they are already an
/// encoding. The id is not on the wire; reading decodes the bits under the
/// same context and takes the id of the transaction they hold.
struct SignedTransactionCodec;

impl Serializer<SignedTransaction> for SignedTransactionCodec {
    fn write(&self, session: &mut EncodeSession<'_>, stx: &SignedTransaction) -> SerializationResult<()> {
        session.output().write_blob(stx.tx_bits().bytes())?;
        session.write_list(&list_of(stx.sigs()))
    }

    fn read(&self, session: &mut DecodeSession<'_>) -> SerializationResult<SignedTransaction> {
        let tx_bits = SerializedBytes::new(session.read_blob()?.to_vec());
        let id = session.decode_embedded::<CoreTransaction>(tx_bits.bytes())?.id();
        let sigs = cloned_list::<TransactionSignature>(session)?;
        SignedTransaction::new(tx_bits, id, sigs).map_err(|e| constructor_failed(SIGNED_TRANSACTION, e))
    }
}

fn list_of<T: Payload + Clone>(items: &[T]) -> Vec<Value> {
    items.iter().cloned().map(Value::object).collect()
}

fn cloned_list<T: Clone + Send + Sync + 'static>(session: &mut DecodeSession<'_>) -> SerializationResult<Vec<T>> {
    session.read_list()?.iter().map(Value::cloned::<T>).collect()
}

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_fn::<OpaqueBytes, _, _>(
        OPAQUE_BYTES,
        |s, bytes| s.output().write_blob(bytes.bytes()),
        |s| s.read_blob().map(OpaqueBytes::new),
    )?;
    r.register_immutable(
        ImmutableSchema::new(STATE_REF)
            .field("txhash", FieldType::Object("SecureHash"), |s: &StateRef| Value::object(s.txhash))
            .field("index", FieldType::Int, |s: &StateRef| Value::Int(s.index as i32))
            .constructor(|args| Ok(StateRef::new(args.cloned(0)?, args.int(1)? as u32))),
    )?;
    r.register_immutable(
        ImmutableSchema::new(COMPONENT_GROUP)
            .field("groupIndex", FieldType::Int, |g: &ComponentGroup| Value::Int(g.group_index as i32))
            .field(
                "components",
                FieldType::Object("List<OpaqueBytes>"),
                |g: &ComponentGroup| Value::list_of(&g.components),
            )
            .constructor(|args| Ok(ComponentGroup::new(args.int(0)? as u32, args.list(1)?))),
    )?;
    r.register_immutable(
        ImmutableSchema::new(PRIVACY_SALT)
            .field("bytes", FieldType::Object("byte[]"), |s: &PrivacySalt| {
                Value::bytes(s.as_bytes().to_vec())
            })
            .constructor(|args| {
                let bytes: Vec<u8> = args.cloned(0)?;
                PrivacySalt::from_slice(&bytes).map_err(Into::into)
            }),
    )?;
    r.register_immutable(
        ImmutableSchema::new(PARTY)
            .field("name", FieldType::Object("X500Name"), |p: &Party| Value::object(p.name.clone()))
            .field("owningKey", FieldType::Object("PublicKey"), |p: &Party| {
                Value::object(p.owning_key.clone())
            })
            .constructor(|args| Ok(Party::new(args.cloned(0)?, args.cloned(1)?))),
    )?;
    r.register_immutable(
        ImmutableSchema::new(TRANSACTION_SIGNATURE)
            .field("bytes", FieldType::Object("Signature"), |s: &TransactionSignature| {
                Value::object(s.bytes.clone())
            })
            .field("by", FieldType::Object("PublicKey"), |s: &TransactionSignature| {
                Value::object(s.by.clone())
            })
            .constructor(|args| {
                Ok(TransactionSignature {
                    bytes: args.cloned(0)?,
                    by: args.cloned(1)?,
                })
            }),
    )?;

    r.register_override::<WireTransaction, _>(WIRE_TRANSACTION, WireTransactionCodec)?;
    r.register_override::<NotaryChangeWireTransaction, _>(NOTARY_CHANGE, NotaryChangeCodec)?;
    r.register_override::<CoreTransaction, _>(CORE_TRANSACTION, CoreTransactionCodec)?;
    r.register_override::<SignedTransaction, _>(SIGNED_TRANSACTION, SignedTransactionCodec)?;
    r.no_references_within::<WireTransaction>()?;
    r.no_references_within::<NotaryChangeWireTransaction>()?;
    r.no_references_within::<CoreTransaction>()?;
    r.no_references_within::<SignedTransaction>()?;

    for type_name in [
        OPAQUE_BYTES,
        STATE_REF,
        COMPONENT_GROUP,
        PRIVACY_SALT,
        PARTY,
        TRANSACTION_SIGNATURE,
        WIRE_TRANSACTION,
        NOTARY_CHANGE,
        CORE_TRANSACTION,
        SIGNED_TRANSACTION,
    ] {
        r.allow(type_name)?;
    }
    Ok(())
}
