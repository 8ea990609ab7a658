//! mitra-report - period aggregation and spreadsheet reports for mitra
//! delivery data
//!
//! Reads an exported JSON document, normalizes shipment and mitra rows,
//! aggregates them by period, hub and project, and writes an xlsx workbook.

pub mod cli;
pub mod config;
pub mod parsers;
pub mod report;
pub mod services;
pub mod types;
