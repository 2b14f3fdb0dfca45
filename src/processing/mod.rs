//! Text processing and analysis module

pub mod text_processor;
pub mod skills;
pub mod analyzer;
