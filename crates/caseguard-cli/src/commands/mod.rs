//! Command handlers

pub mod authz;
pub mod config;
pub mod email;
pub mod evidence;
pub mod ledger;
pub mod password;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Read a JSON or YAML document, chosen by file extension
pub async fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    parse_document(path, &content).with_context(|| format!("cannot parse {}", path.display()))
}

fn parse_document<T: DeserializeOwned>(path: &Path, content: &str) -> anyhow::Result<T> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(content)?),
        _ => Ok(serde_json::from_str(content)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_parse_by_extension() {
        let yaml: BTreeMap<String, u64> = parse_document(Path::new("a.yml"), "x: 1\n").unwrap();
        assert_eq!(yaml["x"], 1);
        let json: BTreeMap<String, u64> = parse_document(Path::new("a.json"), r#"{"x": 2}"#).unwrap();
        assert_eq!(json["x"], 2);
        assert!(parse_document::<BTreeMap<String, u64>>(Path::new("a.json"), "x: 1").is_err());
    }
}
