//! Offset arithmetic and layout validation.

use super::field::Field;
use crate::error::LayoutError;

/// Rounds `offset` up to the next multiple of `align`.
///
/// `padded(x, a) = x + ((a - x mod a) mod a)`; no padding when already aligned.
///
/// # Panics
/// Panics if `align` is 0, which indicates a construction bug.
pub(crate) fn align_offset(offset: usize, align: usize) -> Result<usize, LayoutError> {
    assert!(align > 0, "alignment must be non-zero");
    offset
        .checked_add(padding_for(offset, align))
        .ok_or(LayoutError::CapacityOverflow {
            operation: "offset alignment",
        })
}

/// Bytes of padding needed to align `offset` to `align`.
pub(crate) fn padding_for(offset: usize, align: usize) -> usize {
    (align - offset % align) % align
}

/// Calculates the logical record size from resolved fields.
///
/// The logical size is the maximum of (field offset + field size), without
/// trailing padding.
pub(crate) fn calculate_record_size(fields: &[Field]) -> Result<usize, LayoutError> {
    let mut max_end = 0;

    for field in fields {
        let field_end = field
            .offset
            .checked_add(field.size)
            .ok_or(LayoutError::CapacityOverflow {
                operation: "record size calculation",
            })?;

        max_end = max_end.max(field_end);
    }

    Ok(max_end)
}

/// Validates field alignment and the absence of overlapping fields.
///
/// Returns the name of the first offending field.
pub(crate) fn validate_field_layout(fields: &[Field]) -> Result<(), String> {
    for field in fields {
        if field.offset % field.align != 0 {
            return Err(field.name.clone());
        }
    }

    let mut ranges: Vec<(usize, usize, &str)> = fields
        .iter()
        .filter(|f| f.size > 0)
        .map(|f| (f.offset, f.end_offset(), f.name.as_str()))
        .collect();
    ranges.sort_by_key(|&(start, _, _)| start);

    for pair in ranges.windows(2) {
        if pair[0].1 > pair[1].0 {
            return Err(pair[1].2.to_string());
        }
    }

    Ok(())
}
