pub mod config;
pub mod series;
pub mod session;

pub use config::PipelineConfig;
pub use series::ScrollingSeries;
pub use session::{Session, SessionOutput, SessionStats};
