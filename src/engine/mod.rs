//! Audio Engine Module
//!
//! Buffer storage and file I/O shared by the processing network and the CLI:
//! - Audio buffer management
//! - WAV import/export

pub mod buffer;
pub mod io;

pub use buffer::{db_to_linear, linear_to_db, AudioBuffer, ChannelLayout, DB_FLOOR};
pub use io::{
    export_audio, generate_stereo_test_tone, generate_test_tone, import_audio, to_mono,
    to_stereo, ExportFormat,
};
