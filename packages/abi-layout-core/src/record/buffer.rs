//! Owned, aligned, zero-initialised byte storage for records.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::LayoutError;

/// Heap buffer aligned to a record's alignment.
///
/// Exclusively owned; cloning duplicates the bytes.
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    len: usize,
    align: usize,
}

// SAFETY: the buffer is uniquely owned and has no interior mutability.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocates `len` zeroed bytes aligned to `align`.
    ///
    /// # Panics
    /// Panics if `align` is 0, which indicates a construction bug.
    pub fn zeroed(len: usize, align: usize) -> Result<Self, LayoutError> {
        assert!(align > 0, "buffer alignment must be non-zero");
        if len == 0 {
            // Aligned dangling pointer, never dereferenced for zero-sized buffers
            let ptr = NonNull::new(align as *mut u8).ok_or(LayoutError::CapacityOverflow {
                operation: "buffer allocation",
            })?;
            return Ok(Self { ptr, len, align });
        }

        let layout = Layout::from_size_align(len, align).map_err(|_| {
            LayoutError::CapacityOverflow {
                operation: "buffer allocation",
            }
        })?;
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => alloc::handle_alloc_error(layout),
        };
        Ok(Self { ptr, len, align })
    }

    /// Allocates an aligned copy of `bytes`.
    pub fn from_slice(bytes: &[u8], align: usize) -> Result<Self, LayoutError> {
        let mut buffer = Self::zeroed(bytes.len(), align)?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn align(&self) -> usize {
        self.align
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for len bytes (or dangling and aligned when len is 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Clone for AlignedBuffer {
    fn clone(&self) -> Self {
        let mut copy = match Self::zeroed(self.len, self.align) {
            Ok(copy) => copy,
            // Same size and alignment as an existing allocation
            Err(_) => unreachable!("layout of an existing buffer is valid"),
        };
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        copy
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // SAFETY: allocated in `zeroed` with exactly this layout.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.len, self.align);
            alloc::dealloc(self.ptr.as_ptr(), layout);
        }
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("align", &self.align)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_and_aligned() {
        for align in [1, 2, 4, 8, 16, 64] {
            let buffer = AlignedBuffer::zeroed(24, align).unwrap();
            assert_eq!(buffer.as_ptr() as usize % align, 0);
            assert!(buffer.as_slice().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AlignedBuffer::zeroed(0, 8).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.as_slice(), &[] as &[u8]);
        let copy = buffer.clone();
        assert_eq!(copy.align(), 8);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = AlignedBuffer::from_slice(&[1, 2, 3, 4], 4).unwrap();
        let copy = original.clone();
        original.as_mut_slice()[0] = 9;
        assert_eq!(copy.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(original.as_slice(), &[9, 2, 3, 4]);
    }

    #[test]
    fn test_invalid_alignment_rejected() {
        assert!(AlignedBuffer::zeroed(8, 3).is_err());
    }
}
