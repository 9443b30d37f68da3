pub mod audio_source;
pub mod capture_session;
pub mod capture_subscriber;
pub mod chunk_encoder;
