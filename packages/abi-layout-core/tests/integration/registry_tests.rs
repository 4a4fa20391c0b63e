//! Type registry shared between threads.

use ntest::timeout;
use std::sync::Arc;
use std::thread;

use abi_layout_core::descriptor::{FieldDescriptor, RecordDescriptor};
use abi_layout_core::record::Record;
use abi_layout_core::types::{TypeLayout, TypeRegistry};
use abi_layout_core::{AbiError, LayoutConfig};

fn descriptor(name: &str, fields: &[(&str, &str)]) -> RecordDescriptor {
    RecordDescriptor {
        name: name.to_string(),
        fields: fields
            .iter()
            .map(|(field, ty)| FieldDescriptor {
                name: field.to_string(),
                r#type: ty.to_string(),
                offset: None,
            })
            .collect(),
    }
}

#[timeout(5000)]
#[test]
fn test_concurrent_record_registration() {
    let registry = Arc::new(TypeRegistry::with_config(LayoutConfig::default()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let name = format!("sample_{i}");
                let schema = descriptor(&name, &[("ts", "timespec"), ("id", "u32")])
                    .build(&registry)
                    .unwrap();
                registry.register_record(schema).unwrap();
                registry.record(&name).unwrap().full_size()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 24);
    }
    assert_eq!(
        registry
            .record_names()
            .iter()
            .filter(|n| n.starts_with("sample_"))
            .count(),
        8
    );
}

#[timeout(5000)]
#[test]
fn test_duplicate_registration_from_threads() {
    let registry = Arc::new(TypeRegistry::with_config(LayoutConfig::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let schema = descriptor("shared", &[("a", "u8")]).build(&registry).unwrap();
                registry.register_record(schema).is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
}

#[timeout(1000)]
#[test]
fn test_opaque_types_in_records() {
    let registry = TypeRegistry::with_config(LayoutConfig {
        register_abi_records: false,
        ..Default::default()
    })
    .unwrap();
    registry
        .register(TypeLayout::opaque("uuid".to_string(), 16, 8))
        .unwrap();

    let schema = descriptor("tagged", &[("flag", "bool"), ("id", "uuid")])
        .build(&registry)
        .unwrap();
    assert_eq!(schema.field_offset("id").unwrap(), 8);

    let schema = registry.register_record(schema).unwrap();
    let mut record = Record::new_zeroed(schema).unwrap();
    record.set("id", [0xABu8; 16]).unwrap();
    assert_eq!(&record.as_bytes()[8..24], &[0xAB; 16]);

    let err = descriptor("broken", &[("id", "timespec")])
        .build(&registry)
        .unwrap_err();
    assert!(matches!(
        AbiError::from(err),
        AbiError::Layout(abi_layout_core::LayoutError::UnknownType { .. })
    ));
}
