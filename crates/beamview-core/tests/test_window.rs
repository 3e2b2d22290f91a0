use beamview_core::process::window::{window_mask, WindowFunctionCache};

#[test]
fn test_identical_arguments_give_identical_masks() {
    let mut cache = WindowFunctionCache::new();
    let first = cache.get(10, 0, 21, 10, 0, 21, 5.0, 2.0).clone();
    let second = cache.get(10, 0, 21, 10, 0, 21, 5.0, 2.0).clone();
    assert_eq!(first, second);
}

#[test]
fn test_radius_change_is_local() {
    let mut cache = WindowFunctionCache::new();
    let before = cache.get(10, 0, 21, 10, 0, 21, 5.0, 2.0).clone();
    let after = cache.get(10, 0, 21, 10, 0, 21, 6.0, 2.0).clone();
    assert_ne!(before, after);

    for (((r, c), &a), &b) in before.indexed_iter().zip(after.iter()) {
        let d = ((r as f64 - 10.0).powi(2) + (c as f64 - 10.0).powi(2)).sqrt();
        if d > 6.0 + 2.0 {
            assert_eq!(a, b, "mask changed at ({r}, {c}), distance {d}");
        }
    }
}

#[test]
fn test_mask_values_in_unit_range() {
    let mask = window_mask(8, 0, 17, 8, 0, 17, 4.0, 3.0);
    assert_eq!(mask.dim(), (17, 17));
    assert!(mask.iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert_eq!(mask[[8, 8]], 1.0);
    assert_eq!(mask[[0, 0]], 0.0);
}

#[test]
fn test_mask_offset_box_uses_frame_coordinates() {
    // Box rows 5..15, cols 20..30 around center (10, 25).
    let mask = window_mask(10, 5, 15, 25, 20, 30, 3.0, 0.0);
    assert_eq!(mask.dim(), (10, 10));
    assert_eq!(mask[[5, 5]], 1.0);
    assert_eq!(mask[[0, 0]], 0.0);
}

#[test]
fn test_large_mask_matches_sequential() {
    // Above the parallel threshold the rows are computed with rayon.
    let big = window_mask(150, 0, 301, 150, 0, 301, 100.0, 20.0);
    let mut cache = WindowFunctionCache::new();
    let cached = cache.get(150, 0, 301, 150, 0, 301, 100.0, 20.0);
    assert_eq!(&big, cached);
    assert_eq!(big[[150, 150]], 1.0);
    assert_eq!(big[[150, 300]], 0.0);
}
