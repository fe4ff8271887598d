//! Museum Caption
//!
//! Matches museum photographs to metadata exports and generates exhibition
//! labels and catalog entries with a hosted multimodal model.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod pipeline;
pub mod scanner;
pub mod spreadsheet;
