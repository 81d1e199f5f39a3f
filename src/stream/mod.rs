//! Step-level stream consumption and progress emission.

pub mod emitter;
pub mod runner;

pub use emitter::{CallbackEmitter, ChannelEmitter, ProgressSink, SseEmitter};
pub use runner::StreamRunner;
