use serde::Deserialize;
use serde_json::Value;

const SCHEMA_JSON: &str = include_str!("../../docs/yaml-schema/firmware-db.schema.json");

/// A schema violation with a JSON path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Index of the `---` separated document the issue was found in.
    pub document: usize,
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "document {}: {}", self.document, self.message)
        } else {
            write!(f, "document {}: {}: {}", self.document, self.path, self.message)
        }
    }
}

/// Validate every document of a database YAML string against the embedded
/// JSON Schema.
///
/// Returns `Ok(())` if valid, or all schema violations found.
pub fn validate_yaml_schema(yaml_text: &str) -> Result<(), Vec<SchemaIssue>> {
    let schema: Value = serde_json::from_str(SCHEMA_JSON).map_err(|e| {
        vec![SchemaIssue {
            document: 0,
            path: String::new(),
            message: format!("embedded schema is not valid JSON: {e}"),
        }]
    })?;
    let validator = jsonschema::draft202012::new(&schema).map_err(|e| {
        vec![SchemaIssue {
            document: 0,
            path: String::new(),
            message: format!("embedded schema is not a valid JSON Schema: {e}"),
        }]
    })?;

    let mut issues = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(yaml_text).enumerate() {
        let instance = match Value::deserialize(document) {
            Ok(v) => v,
            Err(e) => {
                issues.push(SchemaIssue {
                    document: index,
                    path: String::new(),
                    message: format!("YAML parse error: {e}"),
                });
                // The stream cannot be resumed after a syntax error.
                break;
            }
        };
        issues.extend(validator.iter_errors(&instance).map(|e| SchemaIssue {
            document: index,
            path: e.instance_path().to_string(),
            message: e.to_string(),
        }));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
