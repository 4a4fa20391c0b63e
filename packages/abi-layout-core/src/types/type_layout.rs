use std::sync::Arc;

use super::error::TypeError;
use super::value::{Value, ValueType};

/// Type alias for decoder function signature.
pub type DecoderFn = dyn Fn(&[u8]) -> Value + Send + Sync;

/// Type alias for encoder function signature.
pub type EncoderFn = dyn Fn(&Value, &mut [u8]) -> Result<(), TypeError> + Send + Sync;

/// Layout information for a scalar field type.
///
/// Contains size, alignment, and the decode/encode functions that move
/// values between field bytes and [`Value`]s. Used for field offset
/// calculation and dynamic record access.
#[derive(Clone)]
pub struct TypeLayout {
    /// Type identifier (e.g., "u64", "be:u32", "ptr")
    pub type_id: String,
    /// Size in bytes
    pub size: usize,
    /// Alignment requirement in bytes
    pub align: usize,
    /// Decoder: reads exactly `size` bytes into a value
    pub decoder: Arc<DecoderFn>,
    /// Encoder: writes a value into exactly `size` bytes
    pub encoder: Arc<EncoderFn>,
}

impl std::fmt::Debug for TypeLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeLayout")
            .field("type_id", &self.type_id)
            .field("size", &self.size)
            .field("align", &self.align)
            .finish_non_exhaustive()
    }
}

impl TypeLayout {
    /// Creates a new type layout.
    ///
    /// # Arguments
    /// * `type_id` - Type identifier string
    /// * `size` - Size in bytes
    /// * `align` - Alignment requirement in bytes
    /// * `decoder` - Function reading `size` bytes into a value
    /// * `encoder` - Function writing a value into `size` bytes
    pub fn new(
        type_id: String,
        size: usize,
        align: usize,
        decoder: impl Fn(&[u8]) -> Value + Send + Sync + 'static,
        encoder: impl Fn(&Value, &mut [u8]) -> Result<(), TypeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            type_id,
            size,
            align,
            decoder: Arc::new(decoder),
            encoder: Arc::new(encoder),
        }
    }

    /// Layout of a [`ValueType`], with size and alignment from its `Storable` impl.
    pub fn of<T: ValueType + 'static>() -> Self {
        let type_id = T::type_id();
        let encoder_id = type_id.clone();
        Self::new(
            type_id,
            T::SIZE,
            T::ALIGN,
            |src| T::decode(src).into_value(),
            move |value, dst| {
                let typed = T::from_value(value).ok_or_else(|| TypeError::ValueMismatch {
                    type_id: encoder_id.clone(),
                    got: value.kind(),
                })?;
                typed.encode(dst);
                Ok(())
            },
        )
    }

    /// Layout of an opaque blob copied as raw bytes.
    pub fn opaque(type_id: String, size: usize, align: usize) -> Self {
        let encoder_id = type_id.clone();
        Self::new(
            type_id,
            size,
            align,
            move |src| Value::Bytes(src[..size].to_vec()),
            move |value, dst| match value {
                Value::Bytes(bytes) if bytes.len() == size => {
                    dst[..size].copy_from_slice(bytes);
                    Ok(())
                }
                other => Err(TypeError::ValueMismatch {
                    type_id: encoder_id.clone(),
                    got: other.kind(),
                }),
            },
        )
    }

    /// Validates that the layout is consistent.
    ///
    /// # Returns
    /// `Ok(())` if valid, `Err(TypeError)` otherwise.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.align == 0 || !self.align.is_power_of_two() {
            return Err(TypeError::InvalidAlignment {
                type_id: self.type_id.clone(),
                align: self.align,
            });
        }

        // C types always have a size that is a multiple of their alignment
        if self.size % self.align != 0 {
            return Err(TypeError::SizeAlignmentMismatch {
                type_id: self.type_id.clone(),
                size: self.size,
                align: self.align,
            });
        }

        Ok(())
    }

    /// Decodes a value from field bytes.
    ///
    /// `src` must hold at least `size` bytes.
    pub fn decode(&self, src: &[u8]) -> Value {
        (self.decoder)(src)
    }

    /// Encodes a value into field bytes.
    ///
    /// `dst` must hold at least `size` bytes.
    pub fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<(), TypeError> {
        (self.encoder)(value, dst)
    }
}
