//! `start` command: open a new session.

use anyhow::{Result, bail};

use thinktrace::api::StartSessionRequest;
use thinktrace::session::{Metadata, SessionRegistry};

use super::print_json;

pub async fn run(
    registry: &SessionRegistry,
    thought: String,
    estimated_steps: Option<u32>,
    context: Option<String>,
    metadata: Vec<String>,
) -> Result<()> {
    let metadata = if metadata.is_empty() {
        None
    } else {
        Some(parse_metadata(&metadata)?)
    };

    let request = StartSessionRequest {
        initial_thought: thought,
        context: context.as_deref().map(parse_value),
        estimated_steps,
        metadata,
    };

    let response = registry.start(request).await?;
    print_json(&response)
}

/// Parse JSON when possible, otherwise keep the raw text as a string.
fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

/// Parse repeated `KEY=VALUE` arguments. Later keys win.
fn parse_metadata(entries: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("invalid metadata entry '{entry}', expected KEY=VALUE");
        };
        if key.is_empty() {
            bail!("invalid metadata entry '{entry}', key is empty");
        }
        metadata.insert(key.to_string(), parse_value(value));
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_value_prefers_json() {
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value("{\"a\":true}"), json!({"a": true}));
        assert_eq!(parse_value("plain words"), json!("plain words"));
    }

    #[test]
    fn parse_metadata_entries() {
        let entries = vec![
            "project=migration".to_string(),
            "phase=2".to_string(),
            "note=a=b".to_string(),
        ];
        let metadata = parse_metadata(&entries).unwrap();

        assert_eq!(metadata["project"], json!("migration"));
        assert_eq!(metadata["phase"], json!(2));
        assert_eq!(metadata["note"], json!("a=b"));
    }

    #[test]
    fn parse_metadata_rejects_malformed_entries() {
        assert!(parse_metadata(&["no-separator".to_string()]).is_err());
        assert!(parse_metadata(&["=value".to_string()]).is_err());
    }
}
