//! Notebook module
//!
//! Typed nbformat 4 model and the loader that turns a staged upload into it.
//! nbformat 3 uploads are upgraded on the raw JSON before typed parsing.

mod loader;
mod types;
mod upgrade;

pub use loader::{load_notebook, parse_notebook, ParseError};
pub use types::{Cell, MultilineText, Notebook, Output, NBFORMAT_MAJOR};
