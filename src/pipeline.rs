//! End-to-end orchestration: parse a template, resolve its placeholder, swap
//! in the candidate bytes, and re-serialize. Pure over byte buffers; callers
//! own all storage I/O.

use crate::{
    error::LayerswapResult,
    matcher,
    parse::parse,
    records::{BaseRecord, CandidateAsset, TemplateRecord},
    resolve::{find_placeholder, resolve_resource},
    serialize::serialize,
    substitute::substitute,
};

/// One-shot substitution: template bytes in, finished document bytes out.
#[tracing::instrument(skip(template_bytes, asset_bytes), fields(template_len = template_bytes.len()))]
pub fn replace_in_document(
    template_bytes: &[u8],
    binding_name: &str,
    asset_bytes: Vec<u8>,
) -> LayerswapResult<Vec<u8>> {
    let mut doc = parse(template_bytes)?;
    let layer_ref = find_placeholder(&doc, binding_name)?;
    let resource_ref = resolve_resource(&doc, &layer_ref)?;
    substitute(&mut doc, &resource_ref, asset_bytes)?;
    Ok(serialize(&doc))
}

/// Match a candidate against the known bases and pick the first enabled
/// template of the winning base. `None` when no base is within tolerance or
/// the winning base has no usable template; both are normal outcomes the
/// caller surfaces to the user.
pub fn select_template<'a>(
    bases: &'a [BaseRecord],
    templates: &'a [&'a TemplateRecord],
    candidate: &CandidateAsset,
    tolerance: f64,
) -> Option<(&'a BaseRecord, &'a TemplateRecord)> {
    let base = matcher::best_match(candidate.ratio(), bases, tolerance)?;
    let template = templates
        .iter()
        .copied()
        .find(|t| t.base_id == base.id && t.enabled)?;
    Some((base, template))
}
