pub mod format;
pub mod frames;

pub use format::AudioFormat;
pub use frames::{ClientMessage, ServerEvent};
