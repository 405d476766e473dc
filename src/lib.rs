//! Sales spreadsheet reports.
//!
//! Two pipelines share this crate: [`pipeline::merge_monthly`] merges a
//! directory of workbooks into a report with per customer, per product and
//! per month totals, and [`pipeline::clean_export`] normalizes one messy CSV
//! export into a clean workbook.

pub mod config;
pub mod csv;
pub mod domain;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod xlsx;
