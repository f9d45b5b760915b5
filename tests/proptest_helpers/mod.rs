//! Shared proptest strategies and configuration.

use labelstate::engine::{Region, RegionShape};
use proptest::prelude::*;

pub fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

/// A rectangle region for the "rect"/"labels" pair of the mixed template.
pub fn arb_rect_region() -> impl Strategy<Value = Region> {
    (
        0.0..80.0f64,
        0.0..80.0f64,
        0.5..20.0f64,
        0.5..20.0f64,
        prop_oneof![Just("Cat"), Just("Dog")],
    )
        .prop_map(|(x, y, width, height, label)| {
            Region::new(
                "labels",
                "rect",
                RegionShape::Rectangle {
                    x,
                    y,
                    width,
                    height,
                    rotation: None,
                },
                vec![label.to_string()],
            )
        })
}

/// A text span region for the "txt"/"ner" pair of the mixed template.
pub fn arb_span_region() -> impl Strategy<Value = Region> {
    (
        0usize..200,
        1usize..40,
        prop_oneof![Just("Person"), Just("Place")],
    )
        .prop_map(|(start, len, label)| {
            Region::new(
                "ner",
                "txt",
                RegionShape::TextSpan {
                    start,
                    end: start + len,
                    text: None,
                },
                vec![label.to_string()],
            )
        })
}

/// A small batch of mixed-modality regions.
pub fn arb_regions(max: usize) -> impl Strategy<Value = Vec<Region>> {
    prop::collection::vec(
        prop_oneof![arb_rect_region(), arb_span_region()],
        1..=max,
    )
}

/// Ordered endpoint index pairs for links over `n` regions.
pub fn arb_link_indices(n: usize, max: usize) -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..n, 0..n), 0..=max)
        .prop_map(|pairs| pairs.into_iter().filter(|(a, b)| a != b).collect())
}
