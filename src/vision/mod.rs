pub mod encode;
pub mod pipeline;

pub use encode::{encode_frame, EncodeError};
pub use pipeline::VisionReactor;
