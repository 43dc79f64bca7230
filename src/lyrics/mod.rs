//! Lyric content handling: the LRCLIB client and the LRC format parser.

pub mod lrclib;
pub mod parser;

pub use lrclib::{LrclibClient, LyricRecord};
pub use parser::LyricBody;
