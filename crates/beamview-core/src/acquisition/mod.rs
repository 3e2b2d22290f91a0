pub mod directory;
pub mod reader;
pub mod sequence;
pub mod source;

pub use directory::DirectorySource;
pub use reader::{AcquisitionEvent, AcquisitionReader};
pub use sequence::FrameSequenceTracker;
pub use source::{
    AcquisitionSource, RawFrame, ResolutionRequest, SensorBounds, SyntheticSource,
    SYNTHETIC_DEVICE_ID,
};
