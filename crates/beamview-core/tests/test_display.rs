use beamview_core::error::BeamviewError;
use beamview_core::process::display::{gray_to_rgb, DisplayScaler};
use ndarray::Array2;

#[test]
fn test_mid_gray_maps_to_itself() {
    let avg = Array2::from_elem((4, 5), 128.0);
    let display = DisplayScaler::default().render(&avg, 0.0, 255.0, None).unwrap();
    assert_eq!(display.data.dim(), (4, 5, 3));
    assert!(display.data.iter().all(|&v| v == 128));
    assert_eq!(display.pixel(3, 4), [128, 128, 128]);
}

#[test]
fn test_equal_bounds_are_degenerate() {
    let avg = Array2::from_elem((2, 2), 1.0);
    let err = DisplayScaler::default()
        .render(&avg, 10.0, 10.0, None)
        .unwrap_err();
    assert!(matches!(err, BeamviewError::DegenerateRange { .. }));
}

#[test]
fn test_non_finite_bounds_are_degenerate() {
    let avg = Array2::from_elem((2, 2), 1.0);
    assert!(DisplayScaler::default()
        .render(&avg, 0.0, f64::INFINITY, None)
        .is_err());
}

#[test]
fn test_values_outside_window_clip() {
    let avg = Array2::from_shape_vec((1, 3), vec![-5.0, 1000.0, 50.0]).unwrap();
    let display = DisplayScaler::default().render(&avg, 0.0, 100.0, None).unwrap();
    assert_eq!(display.pixel(0, 0), [0, 0, 0]);
    assert_eq!(display.pixel(0, 1), [255, 255, 255]);
    assert_eq!(display.pixel(0, 2), [127, 127, 127]);
}

#[test]
fn test_inverted_window() {
    let avg = Array2::from_elem((1, 1), 0.0);
    let display = DisplayScaler::default().render(&avg, 255.0, 0.0, None).unwrap();
    assert_eq!(display.pixel(0, 0), [255, 255, 255]);
}

#[test]
fn test_background_subtraction() {
    let avg = Array2::from_elem((2, 2), 200.0);
    let background = Array2::from_elem((2, 2), 72.0);

    let on = DisplayScaler::new(true)
        .render(&avg, 0.0, 255.0, Some(&background))
        .unwrap();
    assert_eq!(on.pixel(0, 0), [128, 128, 128]);

    let off = DisplayScaler::new(false)
        .render(&avg, 0.0, 255.0, Some(&background))
        .unwrap();
    assert_eq!(off.pixel(0, 0), [200, 200, 200]);
}

#[test]
fn test_background_shape_mismatch() {
    let avg = Array2::from_elem((2, 2), 200.0);
    let background = Array2::from_elem((3, 3), 72.0);
    let err = DisplayScaler::new(true)
        .render(&avg, 0.0, 255.0, Some(&background))
        .unwrap_err();
    assert!(matches!(err, BeamviewError::ShapeMismatch { .. }));
}

#[test]
fn test_gray_to_rgb_and_image_conversion() {
    let gray = Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as u8);
    let display = gray_to_rgb(&gray);
    assert_eq!(display.pixel(2, 3), [11, 11, 11]);

    let img = display.to_rgb_image().unwrap();
    assert_eq!(img.dimensions(), (4, 3));
    assert_eq!(img.get_pixel(3, 2).0, [11, 11, 11]);
}
