use beamview_core::device::registers::{LinearMap, RegisterMap};
use beamview_core::error::BeamviewError;

#[test]
fn test_exp_reply_updates_register() {
    let mut map = RegisterMap::sui_camera().unwrap();
    assert!(map.update("EXP 42\r"));
    assert_eq!(map.value("EXP").unwrap(), Some(42));
    assert_eq!(map.value("FRAME:PERIOD").unwrap(), None);
}

#[test]
fn test_unrelated_line_leaves_state_unchanged() {
    let mut map = RegisterMap::sui_camera().unwrap();
    map.update("EXP 42\r");
    assert!(!map.update("GAIN 3\r"));
    assert!(!map.update("OK\r"));
    assert_eq!(map.value("EXP").unwrap(), Some(42));
}

#[test]
fn test_same_value_still_counts_as_update() {
    let mut map = RegisterMap::sui_camera().unwrap();
    assert!(map.update("FRAME:PERIOD 1000\r"));
    assert!(map.update("FRAME:PERIOD 1000\r"));
}

#[test]
fn test_unparsable_value_is_ignored() {
    let mut map = RegisterMap::sui_camera().unwrap();
    map.update("EXP 10\r");
    assert!(!map.update("EXP ten\r"));
    assert_eq!(map.value("EXP").unwrap(), Some(10));
}

#[test]
fn test_calibrated_values() {
    let mut map = RegisterMap::sui_camera().unwrap();
    map.update("EXP 42\r");
    assert_eq!(map.to_display("EXP").unwrap(), 70.0);
    assert_eq!(map.to_device("EXP", 70.0).unwrap(), 42.0);
}

#[test]
fn test_unknown_and_unread_registers() {
    let map = RegisterMap::sui_camera().unwrap();
    assert!(matches!(
        map.to_display("EXP"),
        Err(BeamviewError::RegisterUnknown(_))
    ));
    assert!(matches!(
        map.value("NOPE"),
        Err(BeamviewError::UnknownRegister(_))
    ));
}

#[test]
fn test_clear_forgets_values() {
    let mut map = RegisterMap::sui_camera().unwrap();
    map.update("EXP 42\r");
    map.clear();
    assert_eq!(map.value("EXP").unwrap(), None);
    assert_eq!(map.len(), 2);
}

#[test]
fn test_linear_map_rejects_zero_scale() {
    assert!(LinearMap::new(0.0, 28.0).is_err());
    assert!(LinearMap::new(f64::NAN, 0.0).is_err());
}

#[test]
fn test_linear_map_round_trip() {
    let map = LinearMap::new(2.0, 28.0).unwrap();
    assert_eq!(map.to_display(10.0), 48.0);
    assert_eq!(map.to_raw(48.0), 10.0);
    assert_eq!(LinearMap::identity().to_display(5.0), 5.0);
}
