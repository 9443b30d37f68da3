pub mod capture_engine;
pub mod channel_subscriber;
pub mod chunk_emitter;
pub(crate) mod drain;
pub mod duration_tracker;
