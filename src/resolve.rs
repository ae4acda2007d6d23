//! Locates placeholder layers and the resource table entries they point at.
//!
//! The resolver is read-only: it walks a parsed [`Document`] and hands back
//! stable references for the substitution engine to act on.

use crate::{
    document::{Document, Layer, LayerContent, LayerRef, ResourceRef},
    error::{LayerswapError, LayerswapResult},
};

/// Binding name template authors give the replaceable smart layer. This is
/// convention shared with the authoring side, not protocol; callers may pass
/// any other name where their templates differ.
pub const REPLACE_LAYER_NAME: &str = "REPLACE_LAYER";

/// Depth-first search for the first layer whose name equals `binding_name`.
///
/// First match wins. Duplicate binding names are a template-authoring error;
/// the resolver does not try to disambiguate them.
pub fn find_placeholder(doc: &Document, binding_name: &str) -> LayerswapResult<LayerRef> {
    let mut path = Vec::new();
    if let Some(found) = find_in_layers(&doc.layers, binding_name, &mut path) {
        return Ok(found);
    }
    Err(LayerswapError::NotFound(binding_name.to_string()))
}

fn find_in_layers(layers: &[Layer], binding_name: &str, path: &mut Vec<usize>) -> Option<LayerRef> {
    for (idx, layer) in layers.iter().enumerate() {
        path.push(idx);
        if matches!(layer.content, LayerContent::Placeholder(_)) && layer.name == binding_name {
            return Some(LayerRef(path.clone()));
        }
        if let LayerContent::Group(children) = &layer.content {
            if let Some(found) = find_in_layers(children, binding_name, path) {
                return Some(found);
            }
        }
        path.pop();
    }
    None
}

/// Follow a placeholder's resource index into the linked-resource table.
pub fn resolve_resource(doc: &Document, layer_ref: &LayerRef) -> LayerswapResult<ResourceRef> {
    let layer = doc.layer(layer_ref).ok_or_else(|| {
        LayerswapError::validation(format!("layer path {:?} no longer exists", layer_ref.0))
    })?;
    let LayerContent::Placeholder(index) = layer.content else {
        return Err(LayerswapError::validation(format!(
            "layer '{}' is not a placeholder",
            layer.name
        )));
    };
    let index = index as usize;
    if index >= doc.resources.len() {
        return Err(LayerswapError::DanglingReference {
            index,
            table_len: doc.resources.len(),
        });
    }
    Ok(ResourceRef(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LinkedResource;

    fn doc_with_two_placeholders() -> Document {
        Document {
            canvas_width: 100,
            canvas_height: 100,
            layers: vec![
                Layer {
                    name: "Group A".to_string(),
                    opacity: 255,
                    content: LayerContent::Group(vec![Layer {
                        name: "REPLACE_LAYER".to_string(),
                        opacity: 255,
                        content: LayerContent::Placeholder(0),
                    }]),
                },
                Layer {
                    name: "REPLACE_LAYER".to_string(),
                    opacity: 255,
                    content: LayerContent::Placeholder(1),
                },
            ],
            resources: vec![
                LinkedResource {
                    name: "first".to_string(),
                    payload: vec![1],
                },
                LinkedResource {
                    name: "second".to_string(),
                    payload: vec![2],
                },
            ],
        }
    }

    #[test]
    fn depth_first_first_match_wins() {
        let doc = doc_with_two_placeholders();
        let layer_ref = find_placeholder(&doc, REPLACE_LAYER_NAME).unwrap();
        // The nested placeholder comes first in depth-first order.
        assert_eq!(layer_ref, LayerRef(vec![0, 0]));
        let resource = resolve_resource(&doc, &layer_ref).unwrap();
        assert_eq!(resource, ResourceRef(0));
    }

    #[test]
    fn missing_binding_is_not_found() {
        let doc = doc_with_two_placeholders();
        let err = find_placeholder(&doc, "NO_SUCH_LAYER").unwrap_err();
        assert!(matches!(err, LayerswapError::NotFound(_)));
    }

    #[test]
    fn name_match_on_non_placeholder_is_skipped() {
        let mut doc = doc_with_two_placeholders();
        doc.layers.insert(
            0,
            Layer {
                name: REPLACE_LAYER_NAME.to_string(),
                opacity: 255,
                content: LayerContent::Raster(vec![0]),
            },
        );
        let layer_ref = find_placeholder(&doc, REPLACE_LAYER_NAME).unwrap();
        assert_eq!(layer_ref, LayerRef(vec![1, 0]));
    }

    #[test]
    fn dangling_index_is_reported() {
        let mut doc = doc_with_two_placeholders();
        doc.resources.pop();
        let layer_ref = find_placeholder(&doc, REPLACE_LAYER_NAME).unwrap();
        assert!(resolve_resource(&doc, &layer_ref).is_ok());

        let second = LayerRef(vec![1]);
        let err = resolve_resource(&doc, &second).unwrap_err();
        assert!(matches!(
            err,
            LayerswapError::DanglingReference {
                index: 1,
                table_len: 1
            }
        ));
    }
}
