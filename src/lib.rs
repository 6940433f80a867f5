//! voice-speak: text-to-speech from the command line.
//!
//! Two front ends share this library: `speak` plays speech through the
//! speakers, `speak-stdout` writes the MP3 stream to stdout for piping.

pub mod cli;
pub mod config;
pub mod language;
pub mod logger;
pub mod output;
pub mod tts;
