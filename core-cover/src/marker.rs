//! # JPEG Marker Codec
//!
//! Minimal reader/writer for length-prefixed marker segments.
//!
//! ## Segment layout
//!
//! ```text
//! +--------+--------+-----------------+----------------------+
//! | tag hi | tag lo | length (BE u16) | payload (length - 2) |
//! +--------+--------+-----------------+----------------------+
//! ```
//!
//! The length field counts its own two bytes, so an empty payload is encoded
//! with a length of `2`. A container always starts with the start-of-image
//! marker `FF D8`; the comment segment uses tag `FF FE`.
//!
//! Scanning is byte-wise and stateless: the first occurrence of a tag wins,
//! regardless of segment boundaries. Previously published covers were written
//! with the same layout, so this must stay byte-compatible.

use tracing::trace;

use crate::error::{ContainerError, Result};

/// Start-of-image marker
pub const START_OF_IMAGE: [u8; 2] = [0xFF, 0xD8];

/// Comment segment marker
pub const COMMENT: [u8; 2] = [0xFF, 0xFE];

/// Size of the big-endian length field following a tag
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Largest payload a single segment can carry (65533 bytes)
pub const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - LENGTH_FIELD_SIZE;

/// Find the offset of the first exact match of `tag`
///
/// # Errors
///
/// `ContainerError::MarkerNotFound` when the tag does not occur (an empty tag
/// never matches).
pub fn locate(container: &[u8], tag: &[u8]) -> Result<usize> {
    if tag.is_empty() {
        return Err(ContainerError::MarkerNotFound { tag: Vec::new() });
    }

    container
        .windows(tag.len())
        .position(|window| window == tag)
        .ok_or_else(|| ContainerError::MarkerNotFound { tag: tag.to_vec() })
}

/// Read the segment whose length field starts at `offset_after_tag`
///
/// Returns the payload slice and the offset one past its last byte.
pub fn read_segment(container: &[u8], offset_after_tag: usize) -> Result<(&[u8], usize)> {
    let payload_start = offset_after_tag
        .checked_add(LENGTH_FIELD_SIZE)
        .filter(|&end| end <= container.len())
        .ok_or(ContainerError::TruncatedLength {
            offset: offset_after_tag,
        })?;

    let declared = u16::from_be_bytes([
        container[offset_after_tag],
        container[offset_after_tag + 1],
    ]);
    if (declared as usize) < LENGTH_FIELD_SIZE {
        return Err(ContainerError::InvalidLength {
            offset: offset_after_tag,
            declared,
        });
    }

    let payload_len = declared as usize - LENGTH_FIELD_SIZE;
    let payload_end = payload_start + payload_len;
    if payload_end > container.len() {
        return Err(ContainerError::SegmentOverrun {
            declared: payload_len,
            available: container.len() - payload_start,
        });
    }

    Ok((&container[payload_start..payload_end], payload_end))
}

/// Encode the self-inclusive length field for a payload of `payload_len` bytes
pub fn encode_length(payload_len: usize) -> Result<[u8; 2]> {
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(ContainerError::PayloadTooLarge {
            len: payload_len,
            max: MAX_SEGMENT_PAYLOAD,
        });
    }
    Ok(((payload_len + LENGTH_FIELD_SIZE) as u16).to_be_bytes())
}

/// Build `tag || length || payload`
pub fn write_segment(tag: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let length = encode_length(payload.len())?;

    let mut segment = Vec::with_capacity(tag.len() + LENGTH_FIELD_SIZE + payload.len());
    segment.extend_from_slice(tag);
    segment.extend_from_slice(&length);
    segment.extend_from_slice(payload);
    Ok(segment)
}

/// Byte span `[start, end)` of the first comment segment, tag included
pub fn comment_span(container: &[u8]) -> Result<Option<(usize, usize)>> {
    let start = match locate(container, &COMMENT) {
        Ok(offset) => offset,
        Err(ContainerError::MarkerNotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let (_, end) = read_segment(container, start + COMMENT.len())?;
    Ok(Some((start, end)))
}

/// Write `comment` as the container's only comment segment
///
/// An existing comment segment is removed wholesale; the new segment is
/// placed directly after the start-of-image marker. All other bytes keep
/// their relative order.
///
/// # Errors
///
/// - `MissingStartOfImage` if the container does not begin with `FF D8`
/// - `PayloadTooLarge` if `comment` exceeds [`MAX_SEGMENT_PAYLOAD`]
/// - any read error from a corrupt existing comment segment
pub fn embed_comment(container: &[u8], comment: &[u8]) -> Result<Vec<u8>> {
    if !container.starts_with(&START_OF_IMAGE) {
        return Err(ContainerError::MissingStartOfImage);
    }

    let segment = write_segment(&COMMENT, comment)?;
    let existing = comment_span(container)?;

    let mut output = Vec::with_capacity(container.len() + segment.len());
    output.extend_from_slice(&START_OF_IMAGE);
    output.extend_from_slice(&segment);

    let rest = &container[START_OF_IMAGE.len()..];
    match existing {
        Some((start, end)) => {
            trace!(start, end, "Replacing existing comment segment");
            output.extend_from_slice(&container[START_OF_IMAGE.len()..start]);
            output.extend_from_slice(&container[end..]);
        }
        None => output.extend_from_slice(rest),
    }

    Ok(output)
}

/// Read the first comment segment as UTF-8 text
pub fn extract_comment(container: &[u8]) -> Result<String> {
    let offset = locate(container, &COMMENT)?;
    let (payload, _) = read_segment(container, offset + COMMENT.len())?;
    Ok(String::from_utf8(payload.to_vec())?)
}
