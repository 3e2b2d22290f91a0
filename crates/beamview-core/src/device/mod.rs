pub mod camera;
pub mod registers;
pub mod serial;
pub mod transport;

pub use camera::{counts_to_seconds, CameraControl};
pub use registers::{LinearMap, RegisterMap};
pub use serial::SerialLineAssembler;
pub use transport::{MockSerial, SerialTransport};
