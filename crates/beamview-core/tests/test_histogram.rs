#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;
use beamview_core::process::histogram::LogHistogram;
use ndarray::Array2;

#[test]
fn test_default_edges_span_one_count_to_full_scale() {
    let hist = LogHistogram::default();
    let edges = hist.edges();
    assert_eq!(edges.len(), 1000);
    assert_eq!(hist.bins(), 999);
    assert_eq!(edges[0], 1.0 / 65536.0);
    assert_eq!(edges[999], 1.0);
    assert!(edges.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_edges_are_evenly_spaced_in_log() {
    let hist = LogHistogram::new(5, 10_000.0);
    let expected = [1e-4, 1e-3, 1e-2, 1e-1, 1.0];
    for (edge, want) in hist.edges().iter().zip(expected) {
        assert_relative_eq!(*edge, want, max_relative = 1e-12);
    }
}

#[test]
fn test_counts_below_inside_and_above() {
    let hist = LogHistogram::new(3, 100.0);
    let data = Array2::from_shape_vec(
        (1, 8),
        vec![0.0, 0.5, 1.0, 5.0, 20.0, 100.0, 200.0, f64::NAN],
    )
    .unwrap();

    let result = hist.compute(&data);
    assert_eq!(result.counts, vec![2, 2]);
    assert_eq!(result.below, 2);
    assert_eq!(result.above, 1);
    assert_eq!(result.total(), 4);
}

#[test]
fn test_log_counts_offset_empty_bins() {
    let hist = LogHistogram::new(3, 100.0);
    let result = hist.compute(&Array2::from_elem((2, 2), 50.0));
    let log_counts = result.log_counts();
    assert_relative_eq!(log_counts[0], 0.5f64.log10());
    assert_relative_eq!(log_counts[1], 4.5f64.log10());
    assert_relative_eq!(result.log_edges()[2], 0.0);
}

#[test]
fn test_peak_of_empty_histogram() {
    let hist = LogHistogram::default();
    let result = hist.compute(&Array2::zeros((3, 3)));
    assert_eq!(result.below, 9);
    assert!(result.peak().is_none());
}

#[test]
fn test_float_frame_samples() {
    let hist = LogHistogram::default();
    let frame = common::constant_float(2, 3, 65536.0);
    let result = hist.compute(&common::samples(&frame));
    assert_eq!(result.counts[998], 6);
}
