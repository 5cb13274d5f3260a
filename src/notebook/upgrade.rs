//! nbformat 3 to 4 upgrade
//!
//! Works on raw JSON before typed deserialization. v3 keeps cells inside
//! worksheets, names code input `input`, has separate heading cells, and
//! stores outputs under short MIME keys.

use serde_json::{json, Map, Value};

use super::loader::ParseError;

/// Oldest major version that can be upgraded
pub const OLDEST_UPGRADABLE: u64 = 3;

/// v3 output keys and the MIME types they become
const V3_MIME_KEYS: &[(&str, &str)] = &[
    ("text", "text/plain"),
    ("html", "text/html"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpeg", "image/jpeg"),
    ("latex", "text/latex"),
    ("json", "application/json"),
    ("javascript", "application/javascript"),
    ("markdown", "text/markdown"),
    ("pdf", "application/pdf"),
];

/// Rewrite a v3 notebook in place as v4
pub fn upgrade_v3(notebook: Value) -> Result<Value, ParseError> {
    let Value::Object(mut root) = notebook else {
        return Err(ParseError::Schema("notebook is not a JSON object".to_string()));
    };

    let mut cells = Vec::new();
    if let Some(worksheets) = root.remove("worksheets") {
        let Value::Array(worksheets) = worksheets else {
            return Err(ParseError::Schema("worksheets is not a list".to_string()));
        };
        for worksheet in worksheets {
            if let Some(Value::Array(ws_cells)) = worksheet.get("cells") {
                for cell in ws_cells {
                    cells.push(upgrade_cell(cell.clone())?);
                }
            }
        }
    }

    let mut metadata = match root.remove("metadata") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    // v3 kept the notebook name in metadata; v4 dropped it
    if let Some(Value::String(name)) = metadata.remove("name") {
        if !name.is_empty() && !metadata.contains_key("title") {
            metadata.insert("title".to_string(), Value::String(name));
        }
    }

    root.insert("cells".to_string(), Value::Array(cells));
    root.insert("metadata".to_string(), Value::Object(metadata));
    root.insert("nbformat".to_string(), json!(4));
    root.insert("nbformat_minor".to_string(), json!(0));

    Ok(Value::Object(root))
}

fn upgrade_cell(cell: Value) -> Result<Value, ParseError> {
    let Value::Object(mut cell) = cell else {
        return Err(ParseError::Schema("cell is not a JSON object".to_string()));
    };

    let cell_type = cell
        .get("cell_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut metadata = match cell.remove("metadata") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let upgraded = match cell_type.as_str() {
        "code" => {
            if let Some(collapsed) = cell.remove("collapsed") {
                metadata.insert("collapsed".to_string(), collapsed);
            }
            let outputs = match cell.remove("outputs") {
                Some(Value::Array(outputs)) => outputs.into_iter().map(upgrade_output).collect(),
                _ => Vec::new(),
            };
            json!({
                "cell_type": "code",
                "metadata": metadata,
                "source": cell.remove("input").unwrap_or_else(|| json!("")),
                "execution_count": cell.remove("prompt_number").unwrap_or(Value::Null),
                "outputs": outputs,
            })
        }
        "heading" => {
            let level = cell
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6) as usize;
            let text = join_text(cell.get("source"));
            let heading: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            json!({
                "cell_type": "markdown",
                "metadata": metadata,
                "source": format!("{} {}", "#".repeat(level), heading.join(" ")),
            })
        }
        "markdown" | "raw" => json!({
            "cell_type": cell_type,
            "metadata": metadata,
            "source": cell.remove("source").unwrap_or_else(|| json!("")),
        }),
        // v3 stored raw cells as "plaintext" in some writers
        "plaintext" => json!({
            "cell_type": "raw",
            "metadata": metadata,
            "source": cell.remove("source").unwrap_or_else(|| json!("")),
        }),
        other => {
            return Err(ParseError::Schema(format!(
                "unknown nbformat 3 cell type '{}'",
                other
            )))
        }
    };

    Ok(upgraded)
}

fn upgrade_output(output: Value) -> Value {
    let Value::Object(mut output) = output else {
        return output;
    };

    let output_type = output
        .get("output_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match output_type.as_str() {
        "pyout" | "execute_result" => {
            let execution_count = output.remove("prompt_number").unwrap_or(Value::Null);
            let metadata = output.remove("metadata").unwrap_or_else(|| json!({}));
            json!({
                "output_type": "execute_result",
                "execution_count": execution_count,
                "data": mime_bundle(&mut output),
                "metadata": metadata,
            })
        }
        "display_data" => {
            let metadata = output.remove("metadata").unwrap_or_else(|| json!({}));
            json!({
                "output_type": "display_data",
                "data": mime_bundle(&mut output),
                "metadata": metadata,
            })
        }
        "pyerr" | "error" => json!({
            "output_type": "error",
            "ename": output.remove("ename").unwrap_or_else(|| json!("")),
            "evalue": output.remove("evalue").unwrap_or_else(|| json!("")),
            "traceback": output.remove("traceback").unwrap_or_else(|| json!([])),
        }),
        "stream" => json!({
            "output_type": "stream",
            "name": output.remove("stream").unwrap_or_else(|| json!("stdout")),
            "text": output.remove("text").unwrap_or_else(|| json!("")),
        }),
        _ => Value::Object(output),
    }
}

/// Move short v3 keys into a MIME bundle
fn mime_bundle(output: &mut Map<String, Value>) -> Map<String, Value> {
    let mut data = Map::new();
    for (key, mime) in V3_MIME_KEYS {
        if let Some(value) = output.remove(*key) {
            data.insert(mime.to_string(), value);
        }
    }
    data
}

fn join_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(lines)) => lines.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_becomes_markdown() {
        let cell = json!({"cell_type": "heading", "level": 2, "metadata": {}, "source": ["Results"]});
        let upgraded = upgrade_cell(cell).unwrap();
        assert_eq!(upgraded["cell_type"], "markdown");
        assert_eq!(upgraded["source"], "## Results");
    }

    #[test]
    fn test_pyout_becomes_execute_result() {
        let output = json!({
            "output_type": "pyout",
            "prompt_number": 4,
            "text": ["42"],
            "png": "iVBORw0KGgo=",
            "metadata": {}
        });
        let upgraded = upgrade_output(output);
        assert_eq!(upgraded["output_type"], "execute_result");
        assert_eq!(upgraded["execution_count"], 4);
        assert_eq!(upgraded["data"]["text/plain"], json!(["42"]));
        assert_eq!(upgraded["data"]["image/png"], "iVBORw0KGgo=");
    }

    #[test]
    fn test_stream_name_moves() {
        let upgraded = upgrade_output(json!({"output_type": "stream", "stream": "stderr", "text": "oops"}));
        assert_eq!(upgraded["name"], "stderr");
        assert_eq!(upgraded["text"], "oops");
    }

    #[test]
    fn test_unknown_cell_type_is_rejected() {
        let err = upgrade_cell(json!({"cell_type": "widget", "source": ""})).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }
}
