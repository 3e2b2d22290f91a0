pub mod annotate;
pub mod config;
pub mod devices;
pub mod run;
#[cfg(feature = "serial")]
pub mod serial;
pub mod timestamps;
