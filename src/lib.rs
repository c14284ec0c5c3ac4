//! QMS Desk: quality records as plain text
//!
//! A Unix-style toolkit for tracking controlled documents, quality events,
//! CAPAs and change controls as YAML files, with cross-type search and a
//! status dashboard.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
