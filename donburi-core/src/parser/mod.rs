use std::path::Path;

use crate::error::ParseError;
use crate::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

impl DocumentFormat {
    /// Pick a format from a file extension, falling back to auto-detection.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => DocumentFormat::Json,
            Some("yaml" | "yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Auto,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: from_json(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: from_yaml(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

fn from_json(input: &str) -> Result<Document, ParseError> {
    Ok(serde_json::from_str::<Document>(input)?)
}

fn from_yaml(input: &str) -> Result<Document, ParseError> {
    // An empty YAML file is an empty document, not an error.
    if input.trim().is_empty() {
        return Ok(Document::default());
    }
    Ok(serde_yaml::from_str::<Document>(input)?)
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    // JSON always starts with `{` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') {
        return match from_json(input) {
            Ok(document) => Ok(ParsedDocument {
                document,
                format: DocumentFormat::Json,
            }),
            // Flow-style YAML also starts with `{`.
            Err(json_err) => from_yaml(input)
                .map(|document| ParsedDocument {
                    document,
                    format: DocumentFormat::Yaml,
                })
                .map_err(|_| json_err),
        };
    }

    match from_yaml(input) {
        Ok(document) => Ok(ParsedDocument {
            document,
            format: DocumentFormat::Yaml,
        }),
        Err(yaml_err) => from_json(input)
            .map(|document| ParsedDocument {
                document,
                format: DocumentFormat::Json,
            })
            .map_err(|_| yaml_err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_detects_json() {
        let parsed = parse_document_str(r#"{"tasks": [{"debug": "x"}]}"#, DocumentFormat::Auto).unwrap();
        assert_eq!(parsed.format, DocumentFormat::Json);
        assert_eq!(parsed.document.tasks.len(), 1);
    }

    #[test]
    fn auto_detects_yaml() {
        let parsed = parse_document_str("db_tasks:\n  - debug: x\n", DocumentFormat::Auto).unwrap();
        assert_eq!(parsed.format, DocumentFormat::Yaml);
        assert!(parsed.document.tasks.is_empty());
        assert_eq!(parsed.document.db_tasks.len(), 1);
    }

    #[test]
    fn empty_yaml_is_an_empty_document() {
        let parsed = parse_document_str("   \n", DocumentFormat::Yaml).unwrap();
        assert!(parsed.document.tasks.is_empty());
    }

    #[test]
    fn garbage_reports_the_first_attempted_format() {
        let err = parse_document_str("tasks: [", DocumentFormat::Auto).unwrap_err();
        assert!(matches!(err, ParseError::Yaml(_)));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), DocumentFormat::Auto);
    }
}
