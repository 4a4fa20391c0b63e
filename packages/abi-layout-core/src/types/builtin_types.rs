use super::error::TypeError;
use super::type_layout::TypeLayout;
use super::type_registry::TypeRegistry;
use super::value::ValueType;
use crate::storable::{BigEndian, ByteSwap, LittleEndian};

/// Registers all built-in scalar types in the registry.
///
/// Host-order integers, floats, `bool`, `usize`/`isize`, `ptr`, and the
/// `be:`/`le:` byte-order variants of the multi-byte integers.
///
/// # Arguments
/// * `registry` - Type registry to populate
///
/// # Returns
/// `Ok(())` if all types registered successfully.
pub fn register_builtin_types(registry: &TypeRegistry) -> Result<(), TypeError> {
    register_value_type::<i8>(registry)?;
    register_value_type::<u8>(registry)?;
    register_value_type::<bool>(registry)?;
    register_value_type::<f32>(registry)?;
    register_value_type::<f64>(registry)?;
    register_value_type::<usize>(registry)?;
    register_value_type::<isize>(registry)?;
    register_value_type::<*const u8>(registry)?;

    register_ordered_type::<i16>(registry)?;
    register_ordered_type::<i32>(registry)?;
    register_ordered_type::<i64>(registry)?;
    register_ordered_type::<u16>(registry)?;
    register_ordered_type::<u32>(registry)?;
    register_ordered_type::<u64>(registry)?;

    Ok(())
}

/// Registers a type with its host-order, big-endian and little-endian variants.
fn register_ordered_type<T: ValueType + ByteSwap + 'static>(
    registry: &TypeRegistry,
) -> Result<(), TypeError> {
    register_value_type::<T>(registry)?;
    register_value_type::<BigEndian<T>>(registry)?;
    register_value_type::<LittleEndian<T>>(registry)
}

/// Helper to register a value type.
fn register_value_type<T: ValueType + 'static>(registry: &TypeRegistry) -> Result<(), TypeError> {
    registry.register(TypeLayout::of::<T>())
}
