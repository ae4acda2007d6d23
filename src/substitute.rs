//! Swaps a linked resource's payload for new raster bytes.
//!
//! The engine mutates exactly one resource table entry and nothing else; the
//! serializer recomputes every downstream offset and length from structure, so
//! a size change here can never leave stale offsets in the output. On any
//! failure the document is returned to the caller untouched.

use crate::{
    document::{Document, ResourceRef},
    error::{LayerswapError, LayerswapResult},
};

/// Hard cap on a single embedded payload. Larger replacements are rejected
/// before the document is touched.
pub const MAX_RESOURCE_BYTES: usize = 256 * 1024 * 1024;

/// Raster encodings accepted inside a linked-resource slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterEncoding {
    Png,
    Jpeg,
}

impl RasterEncoding {
    /// Identify an encoding from its magic bytes. `None` for anything the
    /// engine does not embed.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// Replace the payload of the resource `resource_ref` points at.
///
/// Fails fast, leaving `doc` unmodified, when:
/// - `new_bytes` exceeds [`MAX_RESOURCE_BYTES`] (`ResourceTooLarge`);
/// - `new_bytes` is not a recognized raster encoding, or the slot currently
///   holds a recognized encoding and the replacement is a different one
///   (`UnsupportedEncoding`) — the engine never re-encodes on the caller's
///   behalf;
/// - `resource_ref` is out of bounds (`DanglingReference`).
pub fn substitute(
    doc: &mut Document,
    resource_ref: &ResourceRef,
    new_bytes: Vec<u8>,
) -> LayerswapResult<()> {
    if new_bytes.len() > MAX_RESOURCE_BYTES {
        return Err(LayerswapError::ResourceTooLarge {
            len: new_bytes.len(),
            max: MAX_RESOURCE_BYTES,
        });
    }
    let table_len = doc.resources.len();
    let Some(resource) = doc.resources.get_mut(resource_ref.0) else {
        return Err(LayerswapError::DanglingReference {
            index: resource_ref.0,
            table_len,
        });
    };

    let Some(new_encoding) = RasterEncoding::sniff(&new_bytes) else {
        return Err(LayerswapError::unsupported_encoding(
            "replacement bytes are not PNG or JPEG",
        ));
    };
    if let Some(slot_encoding) = RasterEncoding::sniff(&resource.payload) {
        if slot_encoding != new_encoding {
            return Err(LayerswapError::unsupported_encoding(format!(
                "slot '{}' holds {slot_encoding:?} but replacement is {new_encoding:?}",
                resource.name
            )));
        }
    }

    tracing::debug!(
        resource = %resource.name,
        old_len = resource.payload.len(),
        new_len = new_bytes.len(),
        "substituting linked resource payload"
    );
    resource.payload = new_bytes;
    Ok(())
}
