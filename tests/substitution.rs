use layerswap::{
    Document, Layer, LayerContent, LayerswapError, LinkedResource, REPLACE_LAYER_NAME,
    ResourceRef, find_placeholder, parse, replace_in_document, resolve_resource, serialize,
    substitute,
};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn png_bytes(total_len: usize) -> Vec<u8> {
    let mut bytes = PNG_MAGIC.to_vec();
    bytes.resize(total_len, 0x5C);
    bytes
}

/// A template with one placeholder bound to a 100-byte embedded resource,
/// surrounded by layers and resources that must survive untouched.
fn template() -> Document {
    Document {
        canvas_width: 1000,
        canvas_height: 1000,
        layers: vec![
            Layer {
                name: "Background".to_string(),
                opacity: 255,
                content: LayerContent::Raster(vec![0x10; 512]),
            },
            Layer {
                name: "Art".to_string(),
                opacity: 255,
                content: LayerContent::Group(vec![Layer {
                    name: REPLACE_LAYER_NAME.to_string(),
                    opacity: 255,
                    content: LayerContent::Placeholder(0),
                }]),
            },
        ],
        resources: vec![
            LinkedResource {
                name: "placeholder.png".to_string(),
                payload: png_bytes(100),
            },
            LinkedResource {
                name: "logo.png".to_string(),
                payload: png_bytes(64),
            },
        ],
    }
}

#[test]
fn growing_payload_keeps_document_reparseable() {
    // 100-byte slot, 250-byte replacement: every offset after the modified
    // region must still line up when the output is parsed again.
    let template_bytes = serialize(&template());
    let out = replace_in_document(&template_bytes, REPLACE_LAYER_NAME, png_bytes(250)).unwrap();

    let doc = parse(&out).unwrap();
    assert_eq!(doc.resources[0].payload.len(), 250);
    assert_eq!(doc.resources[1].payload, png_bytes(64));
    assert_eq!(serialize(&parse(&out).unwrap()), out);
}

#[test]
fn shrinking_payload_keeps_document_reparseable() {
    let template_bytes = serialize(&template());
    let out = replace_in_document(&template_bytes, REPLACE_LAYER_NAME, png_bytes(20)).unwrap();
    let doc = parse(&out).unwrap();
    assert_eq!(doc.resources[0].payload.len(), 20);
    assert_eq!(doc.resources[1].payload, png_bytes(64));
}

#[test]
fn substitution_touches_only_the_target_resource() {
    let original = template();
    let mut doc = original.clone();

    let layer_ref = find_placeholder(&doc, REPLACE_LAYER_NAME).unwrap();
    let resource_ref = resolve_resource(&doc, &layer_ref).unwrap();
    substitute(&mut doc, &resource_ref, png_bytes(250)).unwrap();

    assert_eq!(doc.layers, original.layers);
    assert_eq!(doc.resources[1], original.resources[1]);
    assert_eq!(
        doc.resource(&resource_ref).unwrap().payload,
        png_bytes(250)
    );
}

#[test]
fn resubstituting_the_output_finds_the_same_binding() {
    let template_bytes = serialize(&template());
    let once = replace_in_document(&template_bytes, REPLACE_LAYER_NAME, png_bytes(250)).unwrap();
    let twice = replace_in_document(&once, REPLACE_LAYER_NAME, png_bytes(33)).unwrap();
    assert_eq!(parse(&twice).unwrap().resources[0].payload.len(), 33);
}

#[test]
fn missing_binding_name_is_not_found() {
    let mut doc = template();
    doc.layers[1] = Layer {
        name: "Art".to_string(),
        opacity: 255,
        content: LayerContent::Group(vec![]),
    };
    let bytes = serialize(&doc);

    let err = replace_in_document(&bytes, REPLACE_LAYER_NAME, png_bytes(10)).unwrap_err();
    assert!(matches!(err, LayerswapError::NotFound(_)));
    // The document on disk is untouched by a failed attempt by construction;
    // also check the parsed form was never mutated via the pure pipeline.
    assert_eq!(parse(&bytes).unwrap(), doc);
}

#[test]
fn dangling_resource_index_is_reported() {
    let mut doc = template();
    doc.layers[1] = Layer {
        name: "Art".to_string(),
        opacity: 255,
        content: LayerContent::Group(vec![Layer {
            name: REPLACE_LAYER_NAME.to_string(),
            opacity: 255,
            content: LayerContent::Placeholder(9),
        }]),
    };

    let layer_ref = find_placeholder(&doc, REPLACE_LAYER_NAME).unwrap();
    let err = resolve_resource(&doc, &layer_ref).unwrap_err();
    assert!(matches!(
        err,
        LayerswapError::DanglingReference {
            index: 9,
            table_len: 2
        }
    ));
}

#[test]
fn failed_substitution_leaves_document_untouched() {
    let mut doc = template();
    let before = doc.clone();
    let err = substitute(&mut doc, &ResourceRef(0), b"definitely not raster".to_vec()).unwrap_err();
    assert!(matches!(err, LayerswapError::UnsupportedEncoding(_)));
    assert_eq!(doc, before);

    // Retry with corrected input succeeds on the same document.
    substitute(&mut doc, &ResourceRef(0), png_bytes(40)).unwrap();
    assert_eq!(doc.resources[0].payload.len(), 40);
}

#[test]
fn real_png_replacement_survives_the_full_pipeline() {
    let img = image::RgbaImage::from_raw(8, 8, vec![0x7Fu8; 8 * 8 * 4]).unwrap();
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let template_bytes = serialize(&template());
    let out = replace_in_document(&template_bytes, REPLACE_LAYER_NAME, png.clone()).unwrap();

    let doc = parse(&out).unwrap();
    assert_eq!(doc.resources[0].payload, png);
    let decoded = image::load_from_memory(&doc.resources[0].payload).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (8, 8));
}
