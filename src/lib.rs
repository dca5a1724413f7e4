//! VCT: Venus Content Toolkit
//!
//! Bulk CSV import and export for game-reference content: parse a
//! spreadsheet, map its columns to record fields, validate and preview the
//! rows, then import them one at a time into a local record store.

pub mod cli;
pub mod core;
pub mod entities;
pub mod pipeline;
