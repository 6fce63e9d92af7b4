//! Turning raw input records into corpus documents.

use anyhow::{Context, Result};
use lsir_core::{Document, LsirError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Field name to values, as found in one raw record.
pub type FieldMap = BTreeMap<String, Vec<String>>;

pub trait RecordParser {
    /// Parses one raw record; `None` when the record carries nothing usable.
    fn parse(&self, raw: &str) -> Option<FieldMap>;
}

/// One JSON object per line. String values become single entries, arrays of
/// strings keep every entry, everything else is ignored.
#[derive(Debug, Default)]
pub struct JsonRecordParser;

impl RecordParser for JsonRecordParser {
    fn parse(&self, raw: &str) -> Option<FieldMap> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unparsable record");
                return None;
            }
        };
        let mut fields = FieldMap::new();
        for (key, value) in object {
            let values: Vec<String> = match value {
                Value::String(s) => vec![s],
                Value::Number(n) => vec![n.to_string()],
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
                _ => continue,
            };
            fields.insert(key.to_lowercase(), values);
        }
        Some(fields)
    }
}

pub fn parser_for(format: &str) -> Result<Box<dyn RecordParser>, LsirError> {
    match format.to_lowercase().as_str() {
        "jsonl" | "json-lines" | "ndjson" => Ok(Box::new(JsonRecordParser)),
        other => Err(LsirError::UnsupportedFormat(other.to_string())),
    }
}

fn first(fields: &FieldMap, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .flat_map(|values| values.iter())
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Builds a document from a field map; `None` when title, description and
/// keywords are all empty.
pub fn to_document(fields: &FieldMap) -> Option<Document> {
    let keywords: Vec<String> = fields
        .get("keywords")
        .into_iter()
        .flatten()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    let document = Document {
        external_id: first(fields, &["id", "external_id"]),
        language: first(fields, &["language", "lang"]),
        title: first(fields, &["title"]),
        description: first(fields, &["description", "abstract"]),
        keywords,
    };
    if document.title.is_empty() && document.description.is_empty() && document.keywords.is_empty() {
        return None;
    }
    Some(document)
}

/// Reads every record of `path`, in order.
pub fn read_documents(path: &Path, parser: &dyn RecordParser) -> Result<Vec<Document>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut documents = Vec::new();
    let mut skipped = 0usize;
    for line in BufReader::new(f).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parser.parse(&line).as_ref().and_then(to_document) {
            Some(doc) => documents.push(doc),
            None => skipped += 1,
        }
    }
    tracing::info!(path = %path.display(), documents = documents.len(), skipped, "read records");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_strings_and_arrays() {
        let fields = JsonRecordParser
            .parse(r#"{"id": "r1", "Title": "Redes", "keywords": ["a", 3, "b"], "year": 2001, "extra": null}"#)
            .unwrap();
        assert_eq!(fields["title"], vec!["Redes"]);
        assert_eq!(fields["keywords"], vec!["a", "b"]);
        assert_eq!(fields["year"], vec!["2001"]);
        assert!(!fields.contains_key("extra"));
    }

    #[test]
    fn garbage_is_not_a_record() {
        assert!(JsonRecordParser.parse("not json").is_none());
        assert!(JsonRecordParser.parse("[1, 2]").is_none());
        assert!(JsonRecordParser.parse("   ").is_none());
    }

    #[test]
    fn empty_records_are_skipped() {
        let fields = JsonRecordParser.parse(r#"{"id": "r1", "title": " ", "keywords": []}"#).unwrap();
        assert!(to_document(&fields).is_none());
    }

    #[test]
    fn abstract_is_an_alias_for_description() {
        let fields = JsonRecordParser.parse(r#"{"id": "r2", "abstract": "sobre grafos", "lang": "es"}"#).unwrap();
        let doc = to_document(&fields).unwrap();
        assert_eq!(doc.external_id, "r2");
        assert_eq!(doc.description, "sobre grafos");
        assert_eq!(doc.language, "es");
        assert!(doc.title.is_empty());
    }

    #[test]
    fn only_json_lines_are_supported() {
        assert!(parser_for("jsonl").is_ok());
        assert!(parser_for("JSONL").is_ok());
        assert!(matches!(parser_for("marc21"), Err(LsirError::UnsupportedFormat(_))));
    }

    #[test]
    fn reads_a_file_in_order() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"{{"id": "a", "title": "first"}}"#).unwrap();
        writeln!(f).unwrap();
        writeln!(f, r#"{{"id": "b"}}"#).unwrap();
        writeln!(f, r#"{{"id": "c", "title": "third"}}"#).unwrap();
        let docs = read_documents(f.path(), &JsonRecordParser).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.external_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
