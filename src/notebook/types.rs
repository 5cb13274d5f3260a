//! nbformat 4 document model
//!
//! Only the fields the export tools need are typed. Metadata and MIME
//! bundles stay as raw JSON so nothing is lost when the notebook is written
//! back out for conversion.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The only major format version accepted
pub const NBFORMAT_MAJOR: u32 = 4;

/// A parsed notebook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    pub nbformat: u32,

    #[serde(default)]
    pub nbformat_minor: u32,
}

impl Notebook {
    /// Title from notebook metadata, if one was set
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn code_cell_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, Cell::Code { .. }))
            .count()
    }

    /// Serialize back to nbformat JSON
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Notebook cell, tagged by `cell_type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        source: MultilineText,
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        outputs: Vec<Output>,
    },
    Markdown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        source: MultilineText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attachments: Option<Map<String, Value>>,
    },
    Raw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        source: MultilineText,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attachments: Option<Map<String, Value>>,
    },
}

impl Cell {
    pub fn source(&self) -> Cow<'_, str> {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source.text()
            }
        }
    }
}

/// Code cell output, tagged by `output_type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    Stream {
        name: String,
        text: MultilineText,
    },
    DisplayData {
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u64>,
        #[serde(default)]
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// nbformat text: either one string or a list of lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    Lines(Vec<String>),
    Text(String),
}

impl MultilineText {
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            MultilineText::Text(s) => Cow::Borrowed(s),
            MultilineText::Lines(lines) => Cow::Owned(lines.concat()),
        }
    }
}
