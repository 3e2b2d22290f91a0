pub mod acquisition;
pub mod consts;
pub mod device;
pub mod error;
pub mod frame;
pub mod io;
pub mod pipeline;
pub mod process;
