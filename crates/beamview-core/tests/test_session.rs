#[allow(dead_code)]
mod common;

use beamview_core::acquisition::source::RawFrame;
use beamview_core::io::timestamp_log::TimestampLog;
use beamview_core::pipeline::config::{OutputConfig, PipelineConfig};
use beamview_core::pipeline::session::{Session, FRAME_TIMESTAMP_LOG, HOST_TIMESTAMP_LOG};
use beamview_core::process::roi::{RoiExtractor, RoiParams};
use ndarray::Array2;
use tempfile::TempDir;

fn config(target: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.accumulation.target = target;
    config.display.min = 0.0;
    config.display.max = 255.0;
    config
}

#[test]
fn test_end_to_end_average_and_restart() {
    let mut session = Session::new(&config(2)).unwrap();

    assert!(session.process_frame(common::constant_raw(4, 4, 10)).is_none());
    let display = session.process_frame(common::constant_raw(4, 4, 10));
    assert!(display.is_some());
    let avg = session.accumulator().average().unwrap();
    assert_eq!(avg, &Array2::from_elem((4, 4), 10.0));

    assert!(session.process_frame(common::constant_raw(4, 4, 20)).is_none());
    assert_eq!(session.accumulator().count(), 1);
    assert_eq!(
        session.accumulator().average().unwrap(),
        &Array2::from_elem((4, 4), 10.0)
    );
}

#[test]
fn test_display_reflects_average() {
    let mut session = Session::new(&config(1)).unwrap();
    let display = session.process_frame(common::constant_raw(4, 4, 128)).unwrap();
    assert_eq!(display.pixel(0, 0), [128, 128, 128]);
    assert_eq!(session.last_display(), Some(&display));
    assert_eq!(session.stats().rendered, 1);
}

#[test]
fn test_degenerate_range_skips_render() {
    let mut session = Session::new(&config(1)).unwrap();
    session.set_display_range(5.0, 5.0);
    assert!(session.process_frame(common::constant_raw(4, 4, 10)).is_none());
    assert_eq!(session.stats().skipped_renders, 1);
    assert!(session.accumulator().average().is_some());

    session.set_display_range(0.0, 255.0);
    assert!(session.render_latest().is_some());
}

#[test]
fn test_sequence_gaps_tracked() {
    let mut session = Session::new(&config(10)).unwrap();
    for seq in [0, 2, 5] {
        session.process_frame(common::raw_with_sequence(4, 4, 1, seq));
    }
    assert_eq!(session.tracker().total_dropped(), 3);
    assert_eq!(session.stats().frames, 3);
}

#[test]
fn test_series_records_windowed_sum() {
    let roi = RoiParams::new(10, 10, 4.0, 2.0);
    let mut cfg = config(5);
    cfg.roi = Some(roi);
    let mut session = Session::new(&cfg).unwrap();

    let frame = common::constant_raw(20, 20, 3);
    let expected = RoiExtractor::new().apply(&frame, Some(&roi)).data.sum();
    session.process_frame(frame);

    assert_eq!(session.series().pushed(), 1);
    assert!((session.series().latest().unwrap() - expected).abs() < 1e-9);
    assert_eq!(session.accumulator().buffer().unwrap().dim(), (12, 12));
}

#[test]
fn test_full_frame_series() {
    let mut session = Session::new(&config(5)).unwrap();
    session.process_frame(common::constant_raw(4, 4, 2));
    assert_eq!(session.series().latest(), Some(32.0));
}

#[test]
fn test_background_subtraction() {
    let mut session = Session::new(&config(1)).unwrap();
    assert!(!session.capture_background());

    session.process_frame(common::constant_raw(4, 4, 100));
    assert!(session.capture_background());
    session.set_subtract_background(true);

    let display = session.process_frame(common::constant_raw(4, 4, 150)).unwrap();
    assert_eq!(display.pixel(1, 1), [50, 50, 50]);
}

#[test]
fn test_mismatched_background_is_dropped() {
    let mut session = Session::new(&config(1)).unwrap();
    session.process_frame(common::constant_raw(4, 4, 100));
    session.capture_background();
    session.set_subtract_background(true);

    let display = session.process_frame(common::constant_raw(2, 2, 60)).unwrap();
    assert_eq!(display.pixel(0, 0), [60, 60, 60]);
    assert!(session.background().is_none());
}

#[test]
fn test_annotations_drawn_on_display() {
    let mut session = Session::new(&config(1)).unwrap();
    session.set_annotation_script(Some("color red\ncrosshair 2 2 2".into()));
    let display = session.process_frame(common::constant_raw(4, 4, 0)).unwrap();
    assert_eq!(display.pixel(2, 2), [255, 0, 0]);
    assert_eq!(display.pixel(0, 0), [0, 0, 0]);

    session.set_annotation_script(None);
    let display = session.process_frame(common::constant_raw(4, 4, 0)).unwrap();
    assert_eq!(display.pixel(2, 2), [0, 0, 0]);
}

#[test]
fn test_changing_roi_resets_accumulator() {
    let mut session = Session::new(&config(3)).unwrap();
    session.process_frame(common::constant_raw(20, 20, 1));
    assert_eq!(session.accumulator().count(), 1);
    session.set_roi(Some(RoiParams::new(10, 10, 3.0, 0.0)));
    assert_eq!(session.accumulator().count(), 0);
}

#[test]
fn test_changing_roi_keeps_last_average() {
    let mut session = Session::new(&config(1)).unwrap();
    session.process_frame(common::constant_raw(20, 20, 40));
    session.set_roi(Some(RoiParams::new(10, 10, 3.0, 0.0)));

    assert!(session.render_latest().is_some());
    assert!(session.capture_background());
    assert_eq!(session.background().unwrap().dim(), (20, 20));
}

#[test]
fn test_histogram_of_latest_average() {
    let mut session = Session::new(&config(1)).unwrap();
    assert!(session.histogram().is_none());

    session.process_frame(common::constant_raw(4, 4, 256));
    let histogram = session.histogram().unwrap();
    assert_eq!(histogram.total(), 16);
    let (lower, upper, count) = histogram.peak().unwrap();
    assert_eq!(count, 16);
    assert!(lower * 65536.0 <= 256.0 && 256.0 < upper * 65536.0);
}

#[test]
fn test_processor_swap() {
    let mut cfg = config(1);
    cfg.processor.name = "subtract-previous".into();
    let mut session = Session::new(&cfg).unwrap();
    assert_eq!(session.processor_name(), "subtract-previous");

    session.process_frame(common::constant_raw(2, 2, 10));
    let display = session.process_frame(common::constant_raw(2, 2, 15)).unwrap();
    assert_eq!(display.pixel(0, 0), [5, 5, 5]);

    session.swap_processor("passthrough").unwrap();
    assert!(session.swap_processor("nope").is_err());
    assert_eq!(session.processor_name(), "passthrough");
}

#[test]
fn test_unknown_processor_in_config() {
    let mut cfg = config(1);
    cfg.processor.name = "nope".into();
    assert!(Session::new(&cfg).is_err());
}

#[test]
fn test_output_files() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::new(&config(2)).unwrap();
    session
        .attach_output(&OutputConfig {
            directory: Some(dir.path().to_path_buf()),
            save_averages: true,
            save_display: true,
            timestamp_logs: true,
            ..Default::default()
        })
        .unwrap();

    for seq in 0..4u32 {
        let raw = RawFrame {
            pixels: Array2::from_elem((4, 4), 40),
            sequence: seq * 2,
            host_timestamp: 100.0 + seq as f64,
        };
        session.process_raw(raw, 12);
    }
    assert_eq!(session.output().unwrap().saved_averages(), 2);
    assert_eq!(session.finish_output().unwrap(), 4);

    assert!(dir.path().join("average_000000.tif").exists());
    assert!(dir.path().join("average_000001.tif").exists());
    assert!(dir.path().join("display_000001.png").exists());

    let frames = TimestampLog::open(&dir.path().join(FRAME_TIMESTAMP_LOG)).unwrap();
    assert_eq!(frames.to_vec(), vec![0.0, 2.0, 4.0, 6.0]);
    let host = TimestampLog::open(&dir.path().join(HOST_TIMESTAMP_LOG)).unwrap();
    assert_eq!(host.get(3), Some(103.0));
    assert_eq!(session.tracker().total_dropped(), 3);
}

#[test]
fn test_reset_after_reconnect() {
    let mut session = Session::new(&config(3)).unwrap();
    session.process_frame(common::raw_with_sequence(4, 4, 1, 0));
    session.process_frame(common::raw_with_sequence(4, 4, 1, 5));
    session.reset();
    assert_eq!(session.accumulator().count(), 0);
    assert_eq!(session.tracker().last(), None);
    assert_eq!(session.tracker().total_dropped(), 4);
}
