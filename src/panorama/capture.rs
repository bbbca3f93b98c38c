mod pipeline;
mod state;
mod timing;
mod types;


pub use pipeline::CapturePipeline;
pub use state::{CaptureState, CaptureStatus, CaptureTicket};
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use types::{CaptureConfig, CaptureConfigBuilder, CaptureRequest};
