//! End-to-end behaviour of the engine through its public API.

use std::fmt;
use std::sync::{Arc, Mutex};

use ledger_core::{CompositeKey, KeyNode, KeyPair, NodeAndWeight, Party, PublicKey, StateRef, X500Name};
use ledger_serialization::codecs::keys::{COMPOSITE_KEY, PRIVATE_KEY};
use ledger_serialization::{
    fingerprint, EngineConfig, FieldType, ImmutableSchema, Output, ParamDescriptor,
    SerializationContext, SerializationEngine, SerializationError, TypeName, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct MyValue {
    value: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct Note {
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Pair {
    left: Arc<Note>,
    right: Arc<Note>,
}

#[derive(Debug, Clone, PartialEq)]
struct Digest {
    left: Arc<Note>,
    right: Arc<Note>,
}

#[derive(Debug, Clone, PartialEq)]
struct Secret {
    code: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Percent {
    value: i32,
}

#[derive(Debug, PartialEq)]
struct PercentOutOfRange(i32);

impl fmt::Display for PercentOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a percentage", self.0)
    }
}

impl std::error::Error for PercentOutOfRange {}

/// Node for building reference cycles. The lock exists only so a test can
/// close a cycle after both nodes are shared; nothing mutates a `Link`
/// once encoding has started.
#[derive(Debug)]
struct Link {
    label: String,
    next: Mutex<Option<Arc<Link>>>,
}

const MY_VALUE: TypeName = TypeName::new("demo.MyValue", 1);
const NOTE: TypeName = TypeName::new("demo.Note", 1);
const PAIR: TypeName = TypeName::new("demo.Pair", 1);
const DIGEST: TypeName = TypeName::new("demo.Digest", 1);
const SECRET: TypeName = TypeName::new("demo.Secret", 1);
const PERCENT: TypeName = TypeName::new("demo.Percent", 1);
const LINK: TypeName = TypeName::new("demo.Link", 1);
const TRADE: TypeName = TypeName::new("demo.Trade", 1);

fn note_field<T: 'static>(get: fn(&T) -> &Arc<Note>) -> impl Fn(&T) -> Value + Send + Sync + 'static {
    move |value: &T| Value::from_arc(Arc::clone(get(value)))
}

fn engine_with(config: EngineConfig) -> SerializationEngine {
    let engine = SerializationEngine::with_config(config).unwrap();
    engine
        .with_whitelist_disabled(|r| {
            r.register_immutable(
                ImmutableSchema::new(MY_VALUE)
                    .field("value", FieldType::Int, |v: &MyValue| Value::Int(v.value))
                    .constructor(|args| Ok(MyValue { value: args.int(0)? })),
            )?;
            r.register_immutable(
                ImmutableSchema::new(NOTE)
                    .field("text", FieldType::Object("String"), |n: &Note| Value::string(n.text.clone()))
                    .constructor(|args| Ok(Note { text: args.cloned(0)? })),
            )?;
            r.register_immutable(
                ImmutableSchema::new(PAIR)
                    .field("left", FieldType::Object("Note"), note_field(|p: &Pair| &p.left))
                    .field("right", FieldType::Object("Note"), note_field(|p: &Pair| &p.right))
                    .constructor(|args| {
                        Ok(Pair {
                            left: args.object(0)?,
                            right: args.object(1)?,
                        })
                    }),
            )?;
            r.register_immutable(
                ImmutableSchema::new(DIGEST)
                    .field("left", FieldType::Object("Note"), note_field(|d: &Digest| &d.left))
                    .field("right", FieldType::Object("Note"), note_field(|d: &Digest| &d.right))
                    .constructor(|args| {
                        Ok(Digest {
                            left: args.object(0)?,
                            right: args.object(1)?,
                        })
                    }),
            )?;
            r.no_references_within::<Digest>()?;
            r.register_immutable(
                ImmutableSchema::new(SECRET)
                    .field("code", FieldType::Long, |s: &Secret| Value::Long(s.code))
                    .constructor(|args| Ok(Secret { code: args.long(0)? })),
            )?;
            r.register_immutable(
                ImmutableSchema::new(PERCENT)
                    .field("value", FieldType::Int, |p: &Percent| Value::Int(p.value))
                    .constructor(|args| {
                        let value = args.int(0)?;
                        if !(0..=100).contains(&value) {
                            return Err(PercentOutOfRange(value).into());
                        }
                        Ok(Percent { value })
                    }),
            )?;
            r.register_immutable(
                ImmutableSchema::new(LINK)
                    .field("label", FieldType::Object("String"), |l: &Link| Value::string(l.label.clone()))
                    .field("next", FieldType::Object("Link"), |l: &Link| {
                        let next = l.next.lock().ok().and_then(|next| next.clone());
                        next.map_or(Value::Null, Value::from_arc)
                    })
                    .constructor(|args| {
                        Ok(Link {
                            label: args.cloned(0)?,
                            next: Mutex::new(args.optional(1)?),
                        })
                    }),
            )?;
            r.no_references_within::<Link>()?;
            for type_name in [MY_VALUE, NOTE, PAIR, DIGEST, PERCENT, LINK] {
                r.allow(type_name)?;
            }
            Ok(())
        })
        .unwrap();
    engine
}

fn engine() -> SerializationEngine {
    engine_with(EngineConfig::default())
}

fn note(text: &str) -> Arc<Note> {
    Arc::new(Note { text: text.into() })
}

#[test]
fn test_registered_values_round_trip() {
    let engine = engine();
    let ctx = SerializationContext::external_network();

    let value = MyValue { value: -7 };
    let bytes = engine.encode(&value, &ctx).unwrap();
    assert_eq!(*engine.decode::<MyValue>(bytes.bytes(), &ctx).unwrap(), value);

    let pair = Pair {
        left: note("a"),
        right: note("b"),
    };
    let bytes = engine.encode(&pair, &ctx).unwrap();
    assert_eq!(*engine.decode::<Pair>(bytes.bytes(), &ctx).unwrap(), pair);

    let party = Party::new(
        X500Name::parse("O=Bank A, L=London, C=GB").unwrap(),
        KeyPair::generate().public_key(),
    );
    let bytes = engine.encode(&party, &ctx).unwrap();
    assert_eq!(*engine.decode::<Party>(bytes.bytes(), &ctx).unwrap(), party);
}

#[test]
fn test_no_reference_type_is_byte_stable() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let shared = note("same");
    let digest = Digest {
        left: Arc::clone(&shared),
        right: shared,
    };

    let first = engine.encode(&digest, &ctx).unwrap();
    let decoded = engine.decode::<Digest>(first.bytes(), &ctx).unwrap();
    let second = engine.encode(&*decoded, &ctx).unwrap();
    assert_eq!(first, second);

    // sharing does not show in the bytes
    let unshared = Digest {
        left: note("same"),
        right: note("same"),
    };
    assert_eq!(engine.encode(&unshared, &ctx).unwrap(), first);
    assert!(!Arc::ptr_eq(&decoded.left, &decoded.right));
}

#[test]
fn test_fingerprint_is_deterministic_and_shape_sensitive() {
    let param = |name, index, field_type| ParamDescriptor {
        name,
        index,
        field_type,
    };
    let base = vec![
        param("issuer", 0, FieldType::Object("Party")),
        param("quantity", 1, FieldType::Long),
    ];
    let fp = fingerprint(&TRADE, &base);
    assert_eq!(fp, fingerprint(&TRADE, &base));

    let renamed = vec![base[0].clone(), param("amount", 1, FieldType::Long)];
    let reordered = vec![
        param("quantity", 0, FieldType::Long),
        param("issuer", 1, FieldType::Object("Party")),
    ];
    let retyped = vec![base[0].clone(), param("quantity", 1, FieldType::Int)];
    for changed in [renamed, reordered, retyped] {
        assert_ne!(fingerprint(&TRADE, &changed), fp);
    }

    let engine = engine();
    let a = engine.descriptor_of::<MyValue>().unwrap().fingerprint();
    let b = engine.descriptor_of::<MyValue>().unwrap().fingerprint();
    assert_eq!(a, b);
}

#[test]
fn test_whitelist_enforced_on_network() {
    let engine = engine();
    let network = SerializationContext::external_network();
    let storage = SerializationContext::internal_storage();

    let bytes = engine.encode(&Secret { code: 99 }, &storage).unwrap();
    assert_eq!(engine.decode::<Secret>(bytes.bytes(), &storage).unwrap().code, 99);
    let err = engine.decode::<Secret>(bytes.bytes(), &network).unwrap_err();
    assert!(matches!(err, SerializationError::SecurityViolation { .. }));
    assert!(err.is_security_relevant());

    let mut out = Output::new();
    out.write_var_u32(1);
    out.write_str("demo.Unregistered").unwrap();
    out.write_var_u32(1);
    assert!(matches!(
        engine.decode_value(out.as_slice(), &storage),
        Err(SerializationError::SecurityViolation { .. })
    ));
}

fn stream_head(name: &str, version: u32) -> Vec<u8> {
    let mut out = Output::new();
    out.write_var_u32(1);
    out.write_str(name).unwrap();
    out.write_var_u32(version);
    out.into_vec()
}

#[test]
fn test_version_checked_after_whitelist() {
    let engine = engine();
    let network = SerializationContext::external_network();
    let storage = SerializationContext::internal_storage();

    // storage-only type at a version this process does not have
    let stale_key = stream_head(PRIVATE_KEY.name(), PRIVATE_KEY.version() + 1);
    assert!(matches!(
        engine.decode_value(&stale_key, &network),
        Err(SerializationError::SecurityViolation { .. })
    ));
    assert!(matches!(
        engine.decode_value(&stale_key, &storage),
        Err(SerializationError::VersionMismatch {
            expected: 1,
            actual: 2,
            ..
        })
    ));

    let stale_value = stream_head(MY_VALUE.name(), 2);
    for ctx in [&network, &storage] {
        let err = engine.decode::<MyValue>(&stale_value, ctx).unwrap_err();
        assert!(matches!(
            err,
            SerializationError::VersionMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert!(err.is_security_relevant());
    }
}

#[test]
fn test_shared_identity_preserved() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let shared = note("shared");
    let pair = Pair {
        left: Arc::clone(&shared),
        right: shared,
    };

    let bytes = engine.encode(&pair, &ctx).unwrap();
    let decoded = engine.decode::<Pair>(bytes.bytes(), &ctx).unwrap();
    assert!(Arc::ptr_eq(&decoded.left, &decoded.right));

    let distinct = Pair {
        left: note("shared"),
        right: note("shared"),
    };
    let decoded = engine
        .decode::<Pair>(engine.encode(&distinct, &ctx).unwrap().bytes(), &ctx)
        .unwrap();
    assert!(!Arc::ptr_eq(&decoded.left, &decoded.right));
}

#[derive(Debug, Clone, PartialEq)]
struct TradeV3 {
    issuer: String,
    quantity: i64,
    price: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct TradeV4 {
    issuer: String,
    quantity: i64,
    price: f64,
    venue: String,
}

fn trade_v3_schema() -> ImmutableSchema<TradeV3> {
    ImmutableSchema::new(TRADE)
        .field("issuer", FieldType::Object("String"), |t: &TradeV3| Value::string(t.issuer.clone()))
        .field("quantity", FieldType::Long, |t: &TradeV3| Value::Long(t.quantity))
        .field("price", FieldType::Double, |t: &TradeV3| Value::Double(t.price))
        .constructor(|args| {
            Ok(TradeV3 {
                issuer: args.cloned(0)?,
                quantity: args.long(1)?,
                price: args.double(2)?,
            })
        })
}

#[test]
fn test_evolved_constructor_detected() {
    let old = SerializationEngine::with_defaults().unwrap();
    old.with_whitelist_disabled(|r| {
        r.register_immutable(trade_v3_schema())?;
        r.allow(TRADE)
    })
    .unwrap();

    let new = SerializationEngine::with_defaults().unwrap();
    new.with_whitelist_disabled(|r| {
        r.register_immutable(
            ImmutableSchema::new(TRADE)
                .field("issuer", FieldType::Object("String"), |t: &TradeV4| Value::string(t.issuer.clone()))
                .field("quantity", FieldType::Long, |t: &TradeV4| Value::Long(t.quantity))
                .field("price", FieldType::Double, |t: &TradeV4| Value::Double(t.price))
                .field("venue", FieldType::Object("String"), |t: &TradeV4| Value::string(t.venue.clone()))
                .constructor(|args| {
                    Ok(TradeV4 {
                        issuer: args.cloned(0)?,
                        quantity: args.long(1)?,
                        price: args.double(2)?,
                        venue: args.cloned(3)?,
                    })
                }),
        )?;
        r.allow(TRADE)
    })
    .unwrap();

    let ctx = SerializationContext::external_network();
    let trade = TradeV3 {
        issuer: "Bank A".into(),
        quantity: 10,
        price: 101.5,
    };
    let bytes = old.encode(&trade, &ctx).unwrap();
    assert!(matches!(
        new.decode::<TradeV4>(bytes.bytes(), &ctx),
        Err(SerializationError::TypeEvolution { .. })
    ));
}

#[test]
fn test_field_count_mismatch_with_matching_fingerprint() {
    let engine = SerializationEngine::with_defaults().unwrap();
    let descriptor = engine
        .with_whitelist_disabled(|r| r.register_immutable(trade_v3_schema()))
        .unwrap();

    let mut out = Output::new();
    out.write_var_u32(1);
    out.write_str(TRADE.name()).unwrap();
    out.write_var_u32(1);
    out.write_var_u32(2);
    out.write_u32_fixed(descriptor.fingerprint());
    let ctx = SerializationContext::internal_storage();
    assert!(matches!(
        engine.decode::<TradeV3>(out.as_slice(), &ctx),
        Err(SerializationError::SchemaMismatch {
            expected: 3,
            actual: 2,
            ..
        })
    ));
}

fn composite_key_stream(engine: &SerializationEngine, threshold: u32, children: &[NodeAndWeight]) -> Vec<u8> {
    let ctx = SerializationContext::internal_storage();
    let mut out = Output::new();
    out.write_var_u32(1);
    out.write_str(COMPOSITE_KEY.name()).unwrap();
    out.write_var_u32(COMPOSITE_KEY.version());
    out.write_u32_fixed(threshold);
    out.write_u32_fixed(children.len() as u32);
    let mut bytes = out.into_vec();
    for child in children {
        bytes.extend_from_slice(engine.encode(child, &ctx).unwrap().bytes());
    }
    bytes
}

fn leaf(key: &PublicKey, weight: u32) -> NodeAndWeight {
    NodeAndWeight {
        node: KeyNode::Leaf(key.clone()),
        weight,
    }
}

#[test]
fn test_composite_key_child_bound() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let a = KeyPair::generate().public_key();
    let b = KeyPair::generate().public_key();

    let one = composite_key_stream(&engine, 1, &[leaf(&a, 1)]);
    assert!(matches!(
        engine.decode::<CompositeKey>(&one, &ctx),
        Err(SerializationError::MalformedStream(_))
    ));

    let original = CompositeKey::builder().add_key(a.clone(), 1).add_key(b.clone(), 2).build(Some(2)).unwrap();
    let two = composite_key_stream(&engine, 2, original.children());
    let rebuilt = engine.decode::<CompositeKey>(&two, &ctx).unwrap();
    assert_eq!(rebuilt.threshold(), original.threshold());
    assert_eq!(rebuilt.children(), original.children());
    assert_eq!(engine.encode(&original, &ctx).unwrap().into_bytes(), two);
}

#[test]
fn test_my_value_envelope_bytes() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let fp = engine.descriptor_of::<MyValue>().unwrap().fingerprint();

    let mut expected = vec![0x01, 12];
    expected.extend_from_slice(b"demo.MyValue");
    expected.push(0x01);
    expected.push(0x01);
    expected.extend_from_slice(&fp.to_be_bytes());
    expected.push(0x54);

    let bytes = engine.encode(&MyValue { value: 42 }, &ctx).unwrap();
    assert_eq!(bytes.bytes(), &expected[..]);
    assert_eq!(*engine.decode::<MyValue>(&expected, &ctx).unwrap(), MyValue { value: 42 });
}

#[test]
fn test_constructor_error_keeps_identity() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let bytes = engine.encode(&Percent { value: 150 }, &ctx).unwrap();
    let err = engine.decode::<Percent>(bytes.bytes(), &ctx).unwrap_err();
    assert!(matches!(err, SerializationError::ConstructorInvocation { .. }));
    assert_eq!(err.constructor_error::<PercentOutOfRange>(), Some(&PercentOutOfRange(150)));
    assert!(err.to_string().contains("150 is not a percentage"));
}

#[test]
fn test_cycle_under_no_reference_type_fails() {
    let engine = engine();
    let ctx = SerializationContext::internal_storage();
    let a = Arc::new(Link {
        label: "a".into(),
        next: Mutex::new(None),
    });
    let b = Arc::new(Link {
        label: "b".into(),
        next: Mutex::new(Some(Arc::clone(&a))),
    });
    *a.next.lock().unwrap() = Some(Arc::clone(&b));

    assert!(matches!(
        engine.encode_arc(Arc::clone(&a), &ctx),
        Err(SerializationError::ReferenceCycle { .. })
    ));
    // break the cycle so the Arcs are freed
    *a.next.lock().unwrap() = None;
}

#[test]
fn test_depth_limit() {
    let engine = engine_with(EngineConfig {
        max_depth: 8,
        ..EngineConfig::default()
    });
    let ctx = SerializationContext::internal_storage();
    let mut chain = Arc::new(Link {
        label: "0".into(),
        next: Mutex::new(None),
    });
    for i in 1..20 {
        chain = Arc::new(Link {
            label: i.to_string(),
            next: Mutex::new(Some(chain)),
        });
    }
    assert!(matches!(
        engine.encode_arc(chain, &ctx),
        Err(SerializationError::DepthLimitExceeded { limit: 8 })
    ));
}

#[test]
fn test_registration_window_concurrent_with_decodes() {
    let engine = engine();
    let ctx = SerializationContext::external_network();
    let state = StateRef::new(ledger_core::crypto::sha256(b"tx"), 1);
    let bytes = engine.encode(&state, &ctx).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    assert_eq!(*engine.decode::<StateRef>(bytes.bytes(), &ctx).unwrap(), state);
                    assert!(engine.decode::<Secret>(
                        engine.encode(&Secret { code: 1 }, &SerializationContext::internal_storage())
                            .unwrap()
                            .bytes(),
                        &ctx
                    )
                    .is_err());
                }
            });
        }
        scope.spawn(|| {
            engine
                .with_whitelist_disabled(|r| {
                    r.register_fn::<u128, _, _>(
                        TypeName::new("demo.Wide", 1),
                        |s, v| {
                            s.output().write_raw(&v.to_be_bytes());
                            Ok(())
                        },
                        |s| {
                            let mut raw = [0u8; 16];
                            raw.copy_from_slice(s.input().read_raw(16)?);
                            Ok(u128::from_be_bytes(raw))
                        },
                    )
                })
                .unwrap();
        });
    });

    let wide = engine.encode(&u128::MAX, &SerializationContext::internal_storage()).unwrap();
    assert_eq!(
        *engine
            .decode::<u128>(wide.bytes(), &SerializationContext::internal_storage())
            .unwrap(),
        u128::MAX
    );
}
