use crate::error::{LayerswapError, LayerswapResult};

/// Magic bytes at the start of every layered template document.
pub const SIGNATURE: [u8; 4] = *b"8BLT";

/// Highest format version this crate reads and writes.
pub const FORMAT_VERSION: u16 = 1;

/// Parsed layered template document: an ordered layer tree plus the
/// linked-resource table that placeholder layers index into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub layers: Vec<Layer>,
    pub resources: Vec<LinkedResource>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub opacity: u8,
    pub content: LayerContent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerContent {
    /// Raw channel bytes, carried through untouched.
    Raster(Vec<u8>),
    Group(Vec<Layer>),
    /// Index into `Document::resources`.
    Placeholder(u32),
}

/// A named, length-prefixed payload in the document's resource table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedResource {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Path of child indices from the document root to a single layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerRef(pub Vec<usize>);

/// Index into a document's linked-resource table, produced by the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceRef(pub usize);

impl Document {
    pub fn validate(&self) -> LayerswapResult<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(LayerswapError::validation(
                "canvas width/height must be > 0",
            ));
        }
        if self.layers.len() > u16::MAX as usize {
            return Err(LayerswapError::validation(format!(
                "{} top-level layers exceeds the u16 field limit",
                self.layers.len()
            )));
        }
        if self.resources.len() > u16::MAX as usize {
            return Err(LayerswapError::validation(format!(
                "{} resources exceeds the u16 field limit",
                self.resources.len()
            )));
        }
        let table_len = self.resources.len();
        for layer in &self.layers {
            validate_layer(layer, table_len)?;
        }
        for res in &self.resources {
            if res.name.len() > u16::MAX as usize {
                return Err(LayerswapError::validation(format!(
                    "resource name of {} bytes exceeds the u16 field limit",
                    res.name.len()
                )));
            }
        }
        Ok(())
    }

    /// Borrow the layer a `LayerRef` points at, if the path is still valid.
    pub fn layer(&self, layer_ref: &LayerRef) -> Option<&Layer> {
        let (first, rest) = layer_ref.0.split_first()?;
        let mut layer = self.layers.get(*first)?;
        for idx in rest {
            let LayerContent::Group(children) = &layer.content else {
                return None;
            };
            layer = children.get(*idx)?;
        }
        Some(layer)
    }

    pub fn resource(&self, resource_ref: &ResourceRef) -> Option<&LinkedResource> {
        self.resources.get(resource_ref.0)
    }
}

fn validate_layer(layer: &Layer, table_len: usize) -> LayerswapResult<()> {
    // Names, counts, and raster lengths are written with fixed-width length
    // prefixes; anything wider would truncate on serialization and the bytes
    // would mis-parse.
    if layer.name.len() > u16::MAX as usize {
        return Err(LayerswapError::validation(format!(
            "layer name of {} bytes exceeds the u16 field limit",
            layer.name.len()
        )));
    }
    match &layer.content {
        LayerContent::Raster(data) => {
            if data.len() > u32::MAX as usize {
                return Err(LayerswapError::validation(format!(
                    "raster data of {} bytes in layer '{}' exceeds the u32 field limit",
                    data.len(),
                    layer.name
                )));
            }
            Ok(())
        }
        LayerContent::Group(children) => {
            if children.len() > u16::MAX as usize {
                return Err(LayerswapError::validation(format!(
                    "group '{}' has {} children, exceeding the u16 field limit",
                    layer.name,
                    children.len()
                )));
            }
            for child in children {
                validate_layer(child, table_len)?;
            }
            Ok(())
        }
        LayerContent::Placeholder(index) => {
            if (*index as usize) >= table_len {
                return Err(LayerswapError::validation(format!(
                    "placeholder '{}' references resource {index} but the table holds {table_len} entries",
                    layer.name
                )));
            }
            Ok(())
        }
    }
}
