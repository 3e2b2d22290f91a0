use beamview_core::acquisition::sequence::FrameSequenceTracker;

#[test]
fn test_wraparound_has_no_drops() {
    let mut tracker = FrameSequenceTracker::new(12);
    for seq in 0..4096u32 {
        assert_eq!(tracker.observe(seq), 0);
    }
    assert_eq!(tracker.observe(0), 0);
    assert_eq!(tracker.observe(1), 0);
    assert_eq!(tracker.total_dropped(), 0);
    assert_eq!(tracker.frames_observed(), 4098);
}

#[test]
fn test_gaps_report_delta_minus_one() {
    let mut tracker = FrameSequenceTracker::new(12);
    let drops: Vec<u64> = [0, 2, 5].iter().map(|&s| tracker.observe(s)).collect();
    assert_eq!(drops, vec![0, 1, 2]);
    assert_eq!(tracker.total_dropped(), 3);
    assert_eq!(tracker.gap_events(), 2);
}

#[test]
fn test_gap_across_wrap() {
    let mut tracker = FrameSequenceTracker::new(4);
    tracker.observe(14);
    assert_eq!(tracker.observe(1), 2);
}

#[test]
fn test_repeated_counter_is_a_full_cycle() {
    let mut tracker = FrameSequenceTracker::new(12);
    tracker.observe(5);
    assert_eq!(tracker.observe(5), 4095);
}

#[test]
fn test_reset_keeps_total() {
    let mut tracker = FrameSequenceTracker::default();
    tracker.observe(0);
    tracker.observe(3);
    tracker.reset();
    assert_eq!(tracker.last(), None);
    assert_eq!(tracker.observe(100), 0);
    assert_eq!(tracker.total_dropped(), 2);
}

#[test]
fn test_counter_is_reduced_modulo() {
    let tracker = FrameSequenceTracker::new(12);
    assert_eq!(tracker.modulus(), 4096);
    let mut tracker = FrameSequenceTracker::new(12);
    tracker.observe(4096 + 7);
    assert_eq!(tracker.last(), Some(7));
}
