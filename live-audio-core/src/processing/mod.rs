pub mod buffer_pool;
pub mod buffer_queue;
pub mod wav_format;
