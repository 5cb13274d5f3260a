//! nbpdf Server Library
//!
//! Converts uploaded Jupyter notebooks to PDF through an external
//! toolchain. The binary in main.rs wires these modules into an HTTP
//! server.
//!
//! # Modules
//!
//! - `upload`: Multipart extraction and filename rules
//! - `staging`: Per-request scratch directories
//! - `notebook`: nbformat 4 model and loader
//! - `convert`: Swappable conversion backends (typeset, html)
//! - `pipeline`: Stage, load, convert, clean up
//! - `routes`: HTTP endpoints

pub mod config;
pub mod convert;
pub mod error;
pub mod notebook;
pub mod pipeline;
pub mod routes;
pub mod staging;
pub mod state;
pub mod upload;

pub use routes::app;
