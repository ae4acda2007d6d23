//! Ranks base canvases by aspect-ratio distance to a candidate asset.

use crate::records::BaseRecord;

/// Default matching tolerance, in absolute ratio units (width / height).
/// A 1.0 candidate matches bases with ratios in [0.95, 1.05].
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.05;

/// Pick the base whose aspect ratio is closest to `candidate_ratio`, among
/// those within `tolerance`. Returns `None` when no base qualifies; that is a
/// normal outcome the caller must surface, not an error.
///
/// Deterministic: ties on distance keep the earliest base in `bases`.
pub fn best_match<'a>(
    candidate_ratio: f64,
    bases: &'a [BaseRecord],
    tolerance: f64,
) -> Option<&'a BaseRecord> {
    let mut best: Option<(&BaseRecord, f64)> = None;
    for base in bases {
        let diff = (base.aspect_ratio() - candidate_ratio).abs();
        if diff > tolerance {
            continue;
        }
        // Strict comparison keeps the earlier base on equal distance.
        if best.is_none_or(|(_, best_diff)| diff < best_diff) {
            best = Some((base, diff));
        }
    }
    best.map(|(base, _)| base)
}

/// Every qualifying base, closest first. Equal distances keep input order.
pub fn ranked_matches<'a>(
    candidate_ratio: f64,
    bases: &'a [BaseRecord],
    tolerance: f64,
) -> Vec<&'a BaseRecord> {
    let mut matches: Vec<(&BaseRecord, f64)> = bases
        .iter()
        .filter_map(|base| {
            let diff = (base.aspect_ratio() - candidate_ratio).abs();
            (diff <= tolerance).then_some((base, diff))
        })
        .collect();
    matches.sort_by(|a, b| a.1.total_cmp(&b.1));
    matches.into_iter().map(|(base, _)| base).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(id: &str, width: u32, height: u32) -> BaseRecord {
        BaseRecord {
            id: id.to_string(),
            name: id.to_string(),
            width,
            height,
            file_prefix: None,
        }
    }

    fn two_bases() -> Vec<BaseRecord> {
        // Ratios 1.0 and 1.78.
        vec![base("a", 1000, 1000), base("b", 1780, 1000)]
    }

    #[test]
    fn square_candidate_picks_square_base() {
        let bases = two_bases();
        let hit = best_match(1.0, &bases, DEFAULT_RATIO_TOLERANCE).unwrap();
        assert_eq!(hit.id, "a");
    }

    #[test]
    fn widescreen_candidate_picks_widescreen_base() {
        let bases = two_bases();
        let hit = best_match(1.76, &bases, DEFAULT_RATIO_TOLERANCE).unwrap();
        assert_eq!(hit.id, "b");
    }

    #[test]
    fn out_of_tolerance_candidate_matches_nothing() {
        let bases = two_bases();
        assert!(best_match(2.5, &bases, DEFAULT_RATIO_TOLERANCE).is_none());
    }

    #[test]
    fn boundary_diff_exactly_tolerance_qualifies() {
        // 1250/1000 is exactly 1.25 in f64, so the diff from 1.0 is exactly
        // the 0.25 tolerance and must qualify; any smaller tolerance must not.
        let bases = vec![base("edge", 1250, 1000)];
        assert!(best_match(1.0, &bases, 0.25).is_some());
        assert!(best_match(1.0, &bases, 0.2499999).is_none());
    }

    #[test]
    fn ties_keep_input_order() {
        // 0.75 and 1.25 are exactly representable and equidistant from 1.0.
        let bases = vec![base("low", 750, 1000), base("high", 1250, 1000)];
        let hit = best_match(1.0, &bases, 0.25).unwrap();
        assert_eq!(hit.id, "low");

        let ranked = ranked_matches(1.0, &bases, 0.25);
        assert_eq!(
            ranked.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(),
            ["low", "high"]
        );
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let bases = two_bases();
        let first = best_match(1.0, &bases, DEFAULT_RATIO_TOLERANCE).map(|b| b.id.clone());
        for _ in 0..10 {
            let again = best_match(1.0, &bases, DEFAULT_RATIO_TOLERANCE).map(|b| b.id.clone());
            assert_eq!(first, again);
        }
    }
}
