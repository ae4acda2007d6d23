//! Binary reader for layered template documents.
//!
//! Parsing is a pure transformation over an immutable byte buffer. Every read
//! is bounds-checked and every declared length or offset is validated against
//! the buffer before it is trusted, so a truncated or corrupted document fails
//! with `Format` instead of panicking.

use crate::{
    document::{Document, FORMAT_VERSION, Layer, LayerContent, LinkedResource, SIGNATURE},
    error::{LayerswapError, LayerswapResult},
};

pub(crate) const HEADER_LEN: usize = 34;

/// Maximum tree depth accepted before a document is rejected as malformed.
/// Real authoring tools nest a handful of groups; anything deeper is garbage
/// or an attempt to overflow the recursive descent.
const MAX_GROUP_DEPTH: usize = 64;

pub fn parse(bytes: &[u8]) -> LayerswapResult<Document> {
    let mut cur = Cursor::new(bytes);

    let signature = cur.take(4)?;
    if signature != SIGNATURE {
        return Err(LayerswapError::format(format!(
            "bad signature {signature:02x?}, expected {SIGNATURE:02x?}"
        )));
    }
    let version = cur.read_u16()?;
    if version != FORMAT_VERSION {
        return Err(LayerswapError::format(format!(
            "unsupported format version {version} (supported: {FORMAT_VERSION})"
        )));
    }

    let canvas_width = cur.read_u32()?;
    let canvas_height = cur.read_u32()?;
    if canvas_width == 0 || canvas_height == 0 {
        return Err(LayerswapError::format("canvas dimensions must be > 0"));
    }

    let declared_len = cur.read_u64()? as usize;
    if declared_len != bytes.len() {
        return Err(LayerswapError::format(format!(
            "declared file length {declared_len} does not match buffer length {}",
            bytes.len()
        )));
    }
    let table_offset = cur.read_u64()? as usize;
    let layer_section_len = cur.read_u32()? as usize;

    let layer_section_end = HEADER_LEN
        .checked_add(layer_section_len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| LayerswapError::format("layer section length exceeds buffer"))?;
    if table_offset != layer_section_end || table_offset > bytes.len() {
        return Err(LayerswapError::format(format!(
            "resource table offset {table_offset} does not follow the layer section (expected {layer_section_end})"
        )));
    }

    let top_count = cur.read_u16()? as usize;
    let mut layers = Vec::with_capacity(top_count);
    for _ in 0..top_count {
        layers.push(read_layer(&mut cur, 0)?);
    }
    if cur.pos != layer_section_end {
        return Err(LayerswapError::format(format!(
            "layer section declared {layer_section_len} bytes but records consumed {}",
            cur.pos - HEADER_LEN
        )));
    }

    let resources = read_resource_table(&mut cur, bytes)?;

    Ok(Document {
        canvas_width,
        canvas_height,
        layers,
        resources,
    })
}

fn read_layer(cur: &mut Cursor<'_>, depth: usize) -> LayerswapResult<Layer> {
    if depth > MAX_GROUP_DEPTH {
        return Err(LayerswapError::format(format!(
            "group nesting exceeds {MAX_GROUP_DEPTH} levels"
        )));
    }

    let kind = cur.read_u8()?;
    let name = cur.read_string()?;
    let opacity = cur.read_u8()?;

    let content = match kind {
        0 => {
            let data_len = cur.read_u32()? as usize;
            LayerContent::Raster(cur.take(data_len)?.to_vec())
        }
        1 => {
            let child_count = cur.read_u16()? as usize;
            let mut children = Vec::with_capacity(child_count);
            for _ in 0..child_count {
                children.push(read_layer(cur, depth + 1)?);
            }
            LayerContent::Group(children)
        }
        2 => LayerContent::Placeholder(cur.read_u32()?),
        other => {
            return Err(LayerswapError::format(format!(
                "unknown layer kind {other} in layer '{name}'"
            )));
        }
    };

    Ok(Layer {
        name,
        opacity,
        content,
    })
}

fn read_resource_table(
    cur: &mut Cursor<'_>,
    bytes: &[u8],
) -> LayerswapResult<Vec<LinkedResource>> {
    let count = cur.read_u16()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name = cur.read_string()?;
        let offset = cur.read_u64()? as usize;
        let length = cur.read_u64()? as usize;
        entries.push((name, offset, length));
    }

    // Payloads sit back-to-back after the table, in table order. Each declared
    // offset must land exactly where the previous payload ended.
    let mut expected_offset = cur.pos;
    let mut resources = Vec::with_capacity(count);
    for (name, offset, length) in entries {
        if offset != expected_offset {
            return Err(LayerswapError::format(format!(
                "resource '{name}' declares offset {offset}, expected {expected_offset}"
            )));
        }
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                LayerswapError::format(format!(
                    "resource '{name}' payload ({offset}+{length}) exceeds buffer of {} bytes",
                    bytes.len()
                ))
            })?;
        resources.push(LinkedResource {
            name,
            payload: bytes[offset..end].to_vec(),
        });
        expected_offset = end;
    }
    if expected_offset != bytes.len() {
        return Err(LayerswapError::format(format!(
            "{} trailing bytes after the last resource payload",
            bytes.len() - expected_offset
        )));
    }

    Ok(resources)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> LayerswapResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                LayerswapError::format(format!(
                    "truncated document: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.bytes.len().saturating_sub(self.pos)
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> LayerswapResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> LayerswapResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> LayerswapResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> LayerswapResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_string(&mut self) -> LayerswapResult<String> {
        let len = self.read_u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| LayerswapError::format("layer/resource name is not valid UTF-8"))
    }
}
