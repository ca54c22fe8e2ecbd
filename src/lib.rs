pub mod audio;
pub mod audio_api;
pub mod pipeline;
pub mod shared;
