//! Binary writer for layered template documents.
//!
//! Every offset and length field is recomputed from the in-memory structure,
//! so any edit that changes a payload's size (substitution in particular) is
//! reconciled here rather than patched in place. Serializing an unmodified
//! parse yields the identical byte stream.

use crate::{
    document::{Document, FORMAT_VERSION, Layer, LayerContent, SIGNATURE},
    parse::HEADER_LEN,
};

/// Encode a document. Name, count, and raster-length fields have fixed
/// widths; hand-built documents that overflow them are caught by
/// [`Document::validate`], which callers run before serializing anything
/// they did not get from [`crate::parse::parse`].
pub fn serialize(doc: &Document) -> Vec<u8> {
    let mut layer_section = Vec::new();
    write_u16(&mut layer_section, doc.layers.len() as u16);
    for layer in &doc.layers {
        write_layer(&mut layer_section, layer);
    }

    let table_offset = HEADER_LEN + layer_section.len();

    let mut table = Vec::new();
    write_u16(&mut table, doc.resources.len() as u16);
    let mut table_body_len = 2usize;
    for res in &doc.resources {
        table_body_len += 2 + res.name.len() + 8 + 8;
    }
    let mut payload_offset = table_offset + table_body_len;
    for res in &doc.resources {
        write_string(&mut table, &res.name);
        write_u64(&mut table, payload_offset as u64);
        write_u64(&mut table, res.payload.len() as u64);
        payload_offset += res.payload.len();
    }

    let total_len = payload_offset;

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&SIGNATURE);
    write_u16(&mut out, FORMAT_VERSION);
    write_u32(&mut out, doc.canvas_width);
    write_u32(&mut out, doc.canvas_height);
    write_u64(&mut out, total_len as u64);
    write_u64(&mut out, table_offset as u64);
    write_u32(&mut out, layer_section.len() as u32);

    out.extend_from_slice(&layer_section);
    out.extend_from_slice(&table);
    for res in &doc.resources {
        out.extend_from_slice(&res.payload);
    }

    debug_assert_eq!(out.len(), total_len);
    out
}

fn write_layer(out: &mut Vec<u8>, layer: &Layer) {
    match &layer.content {
        LayerContent::Raster(data) => {
            out.push(0);
            write_string(out, &layer.name);
            out.push(layer.opacity);
            write_u32(out, data.len() as u32);
            out.extend_from_slice(data);
        }
        LayerContent::Group(children) => {
            out.push(1);
            write_string(out, &layer.name);
            out.push(layer.opacity);
            write_u16(out, children.len() as u16);
            for child in children {
                write_layer(out, child);
            }
        }
        LayerContent::Placeholder(index) => {
            out.push(2);
            write_string(out, &layer.name);
            out.push(layer.opacity);
            write_u32(out, *index);
        }
    }
}

fn write_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn write_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    write_u16(out, s.len() as u16);
    out.extend_from_slice(s.as_bytes());
}
