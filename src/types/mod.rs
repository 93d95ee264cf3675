pub mod sample;
pub mod status;

pub use sample::{Channel, Sample, CHANNEL_COUNT};
pub use status::{PipelineState, PipelineStatus, StatusCell};
