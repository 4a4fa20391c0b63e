use super::*;
use crate::config::LayoutConfig;
use crate::error::{AbiError, LayoutError};
use crate::storable::BigEndian;
use crate::types::Value;
use ntest::timeout;
use rand::Rng;
use std::sync::Arc;

fn abc_schema() -> Arc<RecordSchema> {
    Arc::new(
        RecordSchema::new(
            "abc",
            vec![
                FieldDef::scalar::<u8>("a"),
                FieldDef::scalar::<u32>("b"),
                FieldDef::scalar::<u8>("c"),
            ],
        )
        .unwrap(),
    )
}

fn timespec_schema() -> Arc<RecordSchema> {
    Arc::new(
        RecordSchema::new(
            "timespec",
            vec![
                FieldDef::scalar::<i64>("tv_sec"),
                FieldDef::scalar::<i64>("tv_nsec"),
            ],
        )
        .unwrap(),
    )
}

fn event_schema() -> Arc<RecordSchema> {
    Arc::new(
        RecordSchema::new(
            "event",
            vec![
                FieldDef::scalar::<u16>("kind"),
                FieldDef::record("time", timespec_schema()),
                FieldDef::new("tag", FieldKind::array(FieldKind::of::<u8>(), 3)),
            ],
        )
        .unwrap(),
    )
}

#[repr(C)]
struct NativeEvent {
    kind: u16,
    time: [i64; 2],
    tag: [u8; 3],
}

#[timeout(1000)]
#[test]
fn test_u8_u32_u8_layout() {
    let schema = abc_schema();
    assert_eq!(schema.field_offset("a").unwrap(), 0);
    assert_eq!(schema.field_offset("b").unwrap(), 4);
    assert_eq!(schema.field_offset("c").unwrap(), 8);
    assert_eq!(schema.record_size(), 9);
    assert_eq!(schema.full_size(), 12);
    assert_eq!(schema.alignment(), 4);

    let padding = schema.padding();
    assert_eq!(padding.leading, vec![0, 3, 0]);
    assert_eq!(padding.trailing, 3);
}

#[timeout(1000)]
#[test]
fn test_empty_record() {
    let schema = RecordSchema::new("empty", Vec::new()).unwrap();
    assert_eq!(schema.alignment(), 1);
    assert_eq!(schema.record_size(), 0);
    assert_eq!(schema.full_size(), 0);
    let record = Record::new_zeroed(Arc::new(schema)).unwrap();
    assert!(record.as_bytes().is_empty());
}

#[timeout(5000)]
#[test]
fn test_random_field_lists_pad_consistently() {
    let kinds: [fn() -> FieldKind; 7] = [
        FieldKind::of::<u8>,
        FieldKind::of::<u16>,
        FieldKind::of::<u32>,
        FieldKind::of::<u64>,
        FieldKind::of::<f32>,
        FieldKind::of::<bool>,
        || FieldKind::array(FieldKind::of::<u16>(), 3),
    ];
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let count = rng.gen_range(0..12);
        let defs: Vec<FieldDef> = (0..count)
            .map(|i| FieldDef::new(format!("f{i}"), kinds[rng.gen_range(0..kinds.len())]()))
            .collect();
        let schema = RecordSchema::new("random", defs).unwrap();

        let sizes: usize = schema.fields().iter().map(|f| f.size).sum();
        assert_eq!(sizes + schema.padding().total(), schema.full_size());
        assert_eq!(schema.full_size() % schema.alignment(), 0);
        for field in schema.fields() {
            assert_eq!(field.offset % field.align, 0);
        }
    }
}

#[timeout(1000)]
#[test]
fn test_nested_layout_matches_native() {
    let schema = event_schema();
    assert_eq!(
        schema.field_offset("time").unwrap(),
        std::mem::offset_of!(NativeEvent, time)
    );
    assert_eq!(
        schema.field_offset("tag").unwrap(),
        std::mem::offset_of!(NativeEvent, tag)
    );
    assert_eq!(schema.full_size(), std::mem::size_of::<NativeEvent>());
    assert_eq!(schema.alignment(), std::mem::align_of::<NativeEvent>());
}

#[timeout(1000)]
#[test]
fn test_duplicate_field_rejected() {
    let err = RecordSchema::new(
        "dup",
        vec![FieldDef::scalar::<u8>("x"), FieldDef::scalar::<u16>("x")],
    )
    .unwrap_err();
    assert_eq!(
        err,
        LayoutError::DuplicateField {
            record: "dup".to_string(),
            field: "x".to_string()
        }
    );
}

#[timeout(1000)]
#[test]
fn test_config_limits() {
    let config = LayoutConfig {
        max_record_size: 8,
        ..Default::default()
    };
    let err = RecordSchema::with_config(
        "big",
        vec![FieldDef::scalar::<u64>("a"), FieldDef::scalar::<u8>("b")],
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::RecordTooLarge { size: 16, .. }));

    let config = LayoutConfig {
        max_nesting_depth: 0,
        ..Default::default()
    };
    let err = RecordSchema::with_config(
        "nested",
        vec![FieldDef::record("ts", timespec_schema())],
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::NestingTooDeep { depth: 1, .. }));

    let err = RecordSchema::new(
        "huge",
        vec![FieldDef::new(
            "arr",
            FieldKind::array(FieldKind::of::<u64>(), usize::MAX / 4),
        )],
    )
    .unwrap_err();
    assert!(matches!(err, LayoutError::CapacityOverflow { .. }));
}

#[timeout(1000)]
#[test]
fn test_path_resolution() {
    let schema = event_schema();
    let resolved = schema.resolve(&FieldPath::parse("time.tv_nsec")).unwrap();
    assert_eq!(resolved.offset, 16);
    assert_eq!(resolved.field.name, "tv_nsec");

    let err = schema.resolve(&"time.tv_usec".into()).unwrap_err();
    assert_eq!(
        err,
        LayoutError::FieldNotFound {
            record: "timespec".to_string(),
            field: "tv_usec".to_string()
        }
    );

    let err = schema.resolve(&["kind", "x"].into()).unwrap_err();
    assert!(matches!(err, LayoutError::NotARecord { .. }));
}

#[timeout(1000)]
#[test]
fn test_typed_field_access() {
    let mut record = Record::new_zeroed(abc_schema()).unwrap();
    record.set("a", 0x11u8).unwrap();
    record.set("b", 0xAABB_CCDDu32).unwrap();
    record.set("c", 0x22u8).unwrap();

    assert_eq!(record.get::<u32>("b").unwrap(), 0xAABB_CCDD);
    assert_eq!(record.as_bytes()[0], 0x11);
    assert_eq!(&record.as_bytes()[1..4], &[0, 0, 0]);
    assert_eq!(&record.as_bytes()[4..8], &0xAABB_CCDDu32.to_ne_bytes());
    assert_eq!(record.as_bytes()[8], 0x22);

    // Big-endian view of the same 4 bytes
    record.set("b", BigEndian(0x0102_0304u32)).unwrap();
    assert_eq!(&record.as_bytes()[4..8], &[1, 2, 3, 4]);

    let err = record.get::<u16>("b").unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::TypeMismatch { .. })
    ));
    let err = record.get::<u8>("missing").unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::FieldNotFound { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_path_access() {
    let mut record = Record::new_zeroed(event_schema()).unwrap();
    record.set_path("time.tv_sec", 1_700_000_000i64).unwrap();
    record.set_path(["time", "tv_nsec"], 5i64).unwrap();
    assert_eq!(record.get_path::<i64>("time.tv_sec").unwrap(), 1_700_000_000);

    let ts = record.sub_record("time").unwrap();
    assert_eq!(ts.get::<i64>("tv_nsec").unwrap(), 5);
    assert!(record.sub_record("kind").is_err());
}

#[timeout(1000)]
#[test]
fn test_from_bytes_length_checked() {
    let err = Record::from_bytes(abc_schema(), &[0u8; 9]).unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::LengthMismatch {
            expected: 12,
            got: 9
        })
    ));
    assert!(Record::from_bytes(abc_schema(), &[0u8; 12]).is_ok());
}

#[timeout(1000)]
#[test]
fn test_peek_and_poke_native_struct() {
    let schema = event_schema();
    let mut native = NativeEvent {
        kind: 7,
        time: [42, 99],
        tag: *b"abc",
    };

    let mut record = unsafe { Record::peek(schema.clone(), &native as *const _ as *const u8) }.unwrap();
    assert_eq!(record.get::<u16>("kind").unwrap(), 7);
    assert_eq!(record.get_path::<i64>("time.tv_nsec").unwrap(), 99);

    record.set("kind", 8u16).unwrap();
    record.set_path("time.tv_sec", -1i64).unwrap();
    unsafe { record.poke(&mut native as *mut _ as *mut u8) };
    assert_eq!(native.kind, 8);
    assert_eq!(native.time, [-1, 99]);
    assert_eq!(&native.tag, b"abc");

    let base = &mut native as *mut _ as *mut u8;
    unsafe {
        poke_field(&schema, base, "kind", 3u16).unwrap();
        assert_eq!(peek_field::<u16>(&schema, base, "kind").unwrap(), 3);
        assert!(peek_field::<u32>(&schema, base, "kind").is_err());
    }
    assert_eq!(native.kind, 3);
}

#[timeout(1000)]
#[test]
fn test_assoc_list_walks_schema() {
    let mut record = Record::new_zeroed(event_schema()).unwrap();
    record.set("kind", 2u16).unwrap();
    record.set_path("time.tv_sec", 10i64).unwrap();
    record
        .set_value("tag", &Value::Bytes(b"xyz".to_vec()))
        .unwrap();

    let list = record.to_assoc_list();
    let names: Vec<&str> = list.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["kind", "time", "tag"]);
    assert_eq!(list[0].1, Value::U16(2));
    assert_eq!(list[1].1.get("tv_sec"), Some(&Value::I64(10)));
    assert_eq!(list[2].1, Value::Bytes(b"xyz".to_vec()));
}

#[timeout(1000)]
#[test]
fn test_set_value_nested_and_mismatch() {
    let mut record = Record::new_zeroed(event_schema()).unwrap();
    record
        .set_value(
            "time",
            &Value::Record(vec![("tv_nsec".to_string(), Value::I64(77))]),
        )
        .unwrap();
    assert_eq!(record.get_path::<i64>("time.tv_nsec").unwrap(), 77);

    let err = record.set_value("kind", &Value::U32(1)).unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::TypeMismatch { .. })
    ));
    let err = record
        .set_value("tag", &Value::Bytes(vec![1, 2]))
        .unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::LengthMismatch { expected: 3, got: 2 })
    ));
}

#[timeout(1000)]
#[test]
fn test_failed_set_value_leaves_field_unchanged() {
    let mut record = Record::new_zeroed(event_schema()).unwrap();
    record.set_path("time.tv_sec", 1i64).unwrap();

    let err = record
        .set_value(
            "time",
            &Value::Record(vec![
                ("tv_sec".to_string(), Value::I64(5)),
                ("bogus".to_string(), Value::I64(1)),
            ]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::FieldNotFound { .. })
    ));
    assert_eq!(record.get_path::<i64>("time.tv_sec").unwrap(), 1);

    let schema = Arc::new(
        RecordSchema::new(
            "triple",
            vec![FieldDef::new("xs", FieldKind::array(FieldKind::of::<u16>(), 3))],
        )
        .unwrap(),
    );
    let mut triple = Record::new_zeroed(schema).unwrap();
    let err = triple
        .set_value(
            "xs",
            &Value::Array(vec![Value::U16(1), Value::U16(2), Value::U32(3)]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AbiError::Layout(LayoutError::TypeMismatch { .. })
    ));
    assert_eq!(triple.as_bytes(), &[0u8; 6]);
}

#[timeout(1000)]
#[test]
fn test_decode_fields_checks_length() {
    let schema = abc_schema();
    let err = schema.decode_fields(&[0u8; 2]).unwrap_err();
    assert_eq!(err.len, 2);
    assert_eq!(err.size, 9);

    let mut image = [0u8; 9];
    image[4] = 7;
    let fields = schema.decode_fields(&image).unwrap();
    assert_eq!(fields[1], ("b".to_string(), Value::U32(7)));
}

#[timeout(1000)]
#[test]
fn test_clone_copies_bytes() {
    let mut original = Record::new_zeroed(abc_schema()).unwrap();
    original.set("b", 5u32).unwrap();
    let copy = original.clone();
    original.set("b", 6u32).unwrap();
    assert_eq!(copy.get::<u32>("b").unwrap(), 5);
    assert!(Arc::ptr_eq(copy.schema(), original.schema()));
}

#[timeout(1000)]
#[test]
fn test_scoped_record() {
    let schema = timespec_schema();
    let result = with_scoped_record(&schema, |record| {
        assert_eq!(record.as_ptr() as usize % schema.alignment(), 0);
        record.set("tv_sec", 3i64)?;
        record.get::<i64>("tv_sec")
    })
    .unwrap();
    assert_eq!(result.unwrap(), 3);

    let failed: crate::error::Result<()> =
        with_scoped_record(&schema, |record| record.set("nope", 1i64)).unwrap();
    assert!(failed.is_err());

    let unwound = std::panic::catch_unwind(|| {
        with_scoped_record::<()>(&timespec_schema(), |_| panic!("syscall wrapper failed"))
    });
    assert!(unwound.is_err());
}
