//! Records passed to C-style callees as raw, aligned buffers.

use ntest::timeout;
use std::time::Duration;

use abi_layout_core::abi::{self, DmaBufSync, DmaBufSyncFlags};
use abi_layout_core::record::{peek_field, poke_field, with_scoped_record, Record};
use abi_layout_core::storable::BigEndian;
use abi_layout_core::types::Value;
use abi_layout_core::{LayoutConfig, TypeRegistry};

#[repr(C)]
struct NativeTimespec {
    tv_sec: i64,
    tv_nsec: isize,
}

/// Stand-in for a system call that fills a caller-provided `timespec`.
unsafe fn fake_clock_gettime(out: *mut u8) -> i32 {
    let ts = out as *mut NativeTimespec;
    (*ts).tv_sec = 1_700_000_000;
    (*ts).tv_nsec = 123_456_789;
    0
}

/// Stand-in for an ioctl that reads a `dma_buf_sync` argument.
unsafe fn fake_dma_buf_ioctl(arg: *const u8) -> u64 {
    *(arg as *const u64)
}

fn registry() -> TypeRegistry {
    TypeRegistry::with_config(LayoutConfig::default()).unwrap()
}

#[timeout(1000)]
#[test]
fn test_scoped_timespec_out_parameter() {
    let registry = registry();
    let schema = registry.record(abi::TIMESPEC).unwrap();

    let elapsed = with_scoped_record(&schema, |record| {
        let rc = unsafe { fake_clock_gettime(record.as_mut_ptr()) };
        assert_eq!(rc, 0);
        abi::timespec_to_duration(record)
    })
    .unwrap()
    .unwrap();
    assert_eq!(elapsed, Duration::new(1_700_000_000, 123_456_789));
}

#[timeout(1000)]
#[test]
fn test_ioctl_argument_by_pointer() {
    let registry = registry();
    let schema = registry.record(abi::DMA_BUF_SYNC).unwrap();
    let mut record = Record::new_zeroed(schema).unwrap();

    let flags: DmaBufSyncFlags = [DmaBufSync::Read, DmaBufSync::End].into_iter().collect();
    record.set("flags", flags).unwrap();
    assert_eq!(unsafe { fake_dma_buf_ioctl(record.as_ptr()) }, 0b101);
}

#[timeout(1000)]
#[test]
fn test_peek_poke_native_memory() {
    let registry = registry();
    let schema = registry.record(abi::TIMEVAL).unwrap();

    let mut native = [0u64; 2];
    let base = native.as_mut_ptr() as *mut u8;
    unsafe {
        poke_field(&schema, base, "tv_sec", 42i64).unwrap();
        poke_field(&schema, base, "tv_usec", 7isize).unwrap();
        assert_eq!(peek_field::<i64>(&schema, base, "tv_sec").unwrap(), 42);
    }
    assert_eq!(native, [42, 7]);

    let record = unsafe { Record::peek(schema.clone(), base) }.unwrap();
    assert_eq!(
        record.to_value(),
        Value::Record(vec![
            ("tv_sec".to_string(), Value::I64(42)),
            ("tv_usec".to_string(), Value::I64(7)),
        ])
    );

    let mut copy = [0u64; 2];
    unsafe { record.poke(copy.as_mut_ptr() as *mut u8) };
    assert_eq!(copy, native);
}

#[timeout(1000)]
#[test]
fn test_big_endian_wire_header() {
    let registry = registry();
    let header = abi_layout_core::descriptor::RecordDescriptor {
        name: "wire_header".to_string(),
        fields: [("magic", "be:u32"), ("len", "be:u16"), ("kind", "u8")]
            .iter()
            .map(|(name, ty)| abi_layout_core::descriptor::FieldDescriptor {
                name: name.to_string(),
                r#type: ty.to_string(),
                offset: None,
            })
            .collect(),
    }
    .build(&registry)
    .unwrap();
    let schema = registry.register_record(header).unwrap();

    let record = Record::from_bytes(schema, &[0xCA, 0xFE, 0xBA, 0xBE, 0x01, 0x00, 0x05, 0x00]).unwrap();
    assert_eq!(record.get::<BigEndian<u32>>("magic").unwrap().0, 0xCAFE_BABE);
    assert_eq!(record.get::<BigEndian<u16>>("len").unwrap().0, 0x0100);
    assert_eq!(record.value("magic").unwrap(), Value::U32(0xCAFE_BABE));
}
