#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod library;
pub mod matcher;
pub mod parse;
pub mod pipeline;
pub mod records;
pub mod resolve;
pub mod serialize;
pub mod substitute;

pub use document::{Document, Layer, LayerContent, LayerRef, LinkedResource, ResourceRef};
pub use error::{LayerswapError, LayerswapResult};
pub use library::{Library, TemplateUpdate, new_record_id};
pub use matcher::{DEFAULT_RATIO_TOLERANCE, best_match, ranked_matches};
pub use parse::parse;
pub use pipeline::{replace_in_document, select_template};
pub use records::{BaseRecord, CandidateAsset, TemplateRecord, output_file_name};
pub use resolve::{REPLACE_LAYER_NAME, find_placeholder, resolve_resource};
pub use serialize::serialize;
pub use substitute::{MAX_RESOURCE_BYTES, RasterEncoding, substitute};
