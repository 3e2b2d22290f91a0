pub mod accumulator;
pub mod annotation;
pub mod display;
pub mod histogram;
pub mod plugin;
pub mod roi;
pub mod window;

pub use accumulator::{AccumulatorBuffer, FrameAccumulator};
pub use annotation::{Annotation, AnnotationEngine, CommentStyle};
pub use display::DisplayScaler;
pub use histogram::{Histogram, LogHistogram};
pub use plugin::{FrameProcessor, ProcessorRegistry, ProcessorSlot};
pub use roi::{RoiBox, RoiExtractor, RoiParams};
pub use window::WindowFunctionCache;
