//! Boxed primitives, strings, byte arrays and collections.

use crate::descriptor::TypeName;
use crate::error::SerializationResult;
use crate::registry::Registrar;
use crate::session::{DecodeSession, EncodeSession};
use crate::value::{Value, ValueMap};

/// Boxed `boolean`.
pub const BOOL: TypeName = TypeName::new("builtin.bool", 1);
/// Boxed `byte`.
pub const BYTE: TypeName = TypeName::new("builtin.byte", 1);
/// Boxed `short`.
pub const SHORT: TypeName = TypeName::new("builtin.short", 1);
/// Boxed `char`.
pub const CHAR: TypeName = TypeName::new("builtin.char", 1);
/// Boxed `int`.
pub const INT: TypeName = TypeName::new("builtin.int", 1);
/// Boxed `long`.
pub const LONG: TypeName = TypeName::new("builtin.long", 1);
/// Boxed `float`.
pub const FLOAT: TypeName = TypeName::new("builtin.float", 1);
/// Boxed `double`.
pub const DOUBLE: TypeName = TypeName::new("builtin.double", 1);
/// UTF-8 string.
pub const STRING: TypeName = TypeName::new("builtin.string", 1);
/// Byte array.
pub const BYTES: TypeName = TypeName::new("builtin.bytes", 1);
/// Ordered list of values.
pub const LIST: TypeName = TypeName::new("builtin.list", 1);
/// Insertion-ordered map of values.
pub const MAP: TypeName = TypeName::new("builtin.map", 1);

pub(crate) fn register(r: &mut Registrar) -> SerializationResult<()> {
    r.register_fn::<bool, _, _>(
        BOOL,
        |s, v| {
            s.output().write_bool(*v);
            Ok(())
        },
        |s| s.input().read_bool(),
    )?;
    r.register_fn::<i8, _, _>(
        BYTE,
        |s, v| {
            s.output().write_i8(*v);
            Ok(())
        },
        |s| s.input().read_i8(),
    )?;
    r.register_fn::<i16, _, _>(
        SHORT,
        |s, v| {
            s.output().write_i16(*v);
            Ok(())
        },
        |s| s.input().read_i16(),
    )?;
    r.register_fn::<u16, _, _>(
        CHAR,
        |s, v| {
            s.output().write_char(*v);
            Ok(())
        },
        |s| s.input().read_char(),
    )?;
    r.register_fn::<i32, _, _>(
        INT,
        |s, v| {
            s.output().write_var_i32(*v);
            Ok(())
        },
        |s| s.input().read_var_i32(),
    )?;
    r.register_fn::<i64, _, _>(
        LONG,
        |s, v| {
            s.output().write_var_i64(*v);
            Ok(())
        },
        |s| s.input().read_var_i64(),
    )?;
    r.register_fn::<f32, _, _>(
        FLOAT,
        |s, v| {
            s.output().write_f32(*v);
            Ok(())
        },
        |s| s.input().read_f32(),
    )?;
    r.register_fn::<f64, _, _>(
        DOUBLE,
        |s, v| {
            s.output().write_f64(*v);
            Ok(())
        },
        |s| s.input().read_f64(),
    )?;
    r.register_fn::<String, _, _>(STRING, |s, v| s.output().write_str(v), |s| s.read_string())?;
    r.register_fn::<Vec<u8>, _, _>(
        BYTES,
        |s, v| s.output().write_blob(v),
        |s| s.read_blob().map(<[u8]>::to_vec),
    )?;
    r.register_fn::<Vec<Value>, _, _>(LIST, |s, v| s.write_list(v), |s| s.read_list())?;
    r.register_fn::<ValueMap, _, _>(MAP, write_map, read_map)?;

    for type_name in [
        BOOL, BYTE, SHORT, CHAR, INT, LONG, FLOAT, DOUBLE, STRING, BYTES, LIST, MAP,
    ] {
        r.allow(type_name)?;
    }
    Ok(())
}

fn write_map(session: &mut EncodeSession<'_>, map: &ValueMap) -> SerializationResult<()> {
    session.output().write_len(map.0.len())?;
    for (key, value) in &map.0 {
        session.write_value(key)?;
        session.write_value(value)?;
    }
    Ok(())
}

fn read_map(session: &mut DecodeSession<'_>) -> SerializationResult<ValueMap> {
    let len = session.read_count("map")?;
    let mut entries = Vec::with_capacity(len);
    for _ in 0..len {
        let key = session.read_value()?;
        let value = session.read_value()?;
        entries.push((key, value));
    }
    Ok(ValueMap(entries))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::context::SerializationContext;
    use crate::engine::SerializationEngine;
    use crate::error::SerializationError;
    use crate::value::{Value, ValueMap};

    fn engine() -> SerializationEngine {
        SerializationEngine::with_defaults().unwrap()
    }

    #[test]
    fn test_boxed_int_layout() {
        let engine = engine();
        let ctx = SerializationContext::external_network();
        let bytes = engine.encode_value(&Value::Int(42), &ctx).unwrap();
        let mut expected = vec![0x01, 11];
        expected.extend_from_slice(b"builtin.int");
        expected.extend_from_slice(&[0x01, 0x54]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_scalars_round_trip() {
        let engine = engine();
        let ctx = SerializationContext::external_network();
        let bytes = engine.encode(&-3.5f64, &ctx).unwrap();
        assert_eq!(*engine.decode::<f64>(bytes.bytes(), &ctx).unwrap(), -3.5);
        let bytes = engine.encode(&u16::from(b'z'), &ctx).unwrap();
        assert_eq!(*engine.decode::<u16>(bytes.bytes(), &ctx).unwrap(), u16::from(b'z'));
        let bytes = engine.encode(&i64::MIN, &ctx).unwrap();
        assert_eq!(*engine.decode::<i64>(bytes.bytes(), &ctx).unwrap(), i64::MIN);
    }

    #[test]
    fn test_list_keeps_shared_elements() {
        let engine = engine();
        let ctx = SerializationContext::internal_storage();
        let shared = Arc::new("same".to_string());
        let list = Value::list([Value::from_arc(Arc::clone(&shared)), Value::from_arc(shared), Value::Null]);
        let bytes = engine.encode_value(&list, &ctx).unwrap();

        let decoded = engine.decode::<Vec<Value>>(&bytes, &ctx).unwrap();
        assert_eq!(decoded.len(), 3);
        let first = decoded[0].as_object().unwrap();
        let second = decoded[1].as_object().unwrap();
        assert!(first.ptr_eq(second));
        assert!(decoded[2].is_null());
    }

    #[test]
    fn test_map_preserves_order() {
        let engine = engine();
        let ctx = SerializationContext::internal_storage();
        let map = ValueMap(vec![
            (Value::string("b"), Value::Int(2)),
            (Value::string("a"), Value::Int(1)),
        ]);
        let bytes = engine.encode(&map, &ctx).unwrap();
        let decoded = engine.decode::<ValueMap>(bytes.bytes(), &ctx).unwrap();
        let keys: Vec<String> = decoded.0.iter().map(|(k, _)| k.cloned::<String>().unwrap()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(decoded.0[0].1.cloned::<i32>().unwrap(), 2);
    }

    #[test]
    fn test_oversized_list_count_rejected() {
        let engine = engine();
        let ctx = SerializationContext::internal_storage();
        let mut bytes = vec![0x01, 12];
        bytes.extend_from_slice(b"builtin.list");
        bytes.push(0x01);
        // count of 2^21, above the default limit
        bytes.extend_from_slice(&[0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            engine.decode_value(&bytes, &ctx),
            Err(SerializationError::LimitExceeded { what: "list", .. })
        ));
    }
}
