// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;

/// Parses the front-end's state-snapshot text format: one `KEY=VALUE` per
/// line, first `=` separates, `\r` stripped, unparseable lines skipped.
/// Used for both the local-file and remote-HTTP snapshot modes once the raw
/// body has been fetched.
pub fn parse(text: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for line in text.split("\r\n").flat_map(|l| l.split('\n')) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            params.insert(key.to_string(), value.to_string());
        }
    }
    params
}

/// Shape of the remote HTTP snapshot endpoint's JSON body:
/// `{"data": {"readFile": "Action=rungame\r\n..."}}`.
#[derive(Debug, serde::Deserialize)]
pub struct RemoteSnapshotBody {
    pub data: RemoteSnapshotData,
}

#[derive(Debug, serde::Deserialize)]
pub struct RemoteSnapshotData {
    #[serde(rename = "readFile")]
    pub read_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_lines_splitting_on_first_equals_only() {
        let text = "Action=rungame\r\nSystemId=mame\r\nGamePath=/roms/mame/a=b.zip\r\n";
        let params = parse(text);
        assert_eq!(params.get("Action").map(String::as_str), Some("rungame"));
        assert_eq!(params.get("SystemId").map(String::as_str), Some("mame"));
        assert_eq!(params.get("GamePath").map(String::as_str), Some("/roms/mame/a=b.zip"));
    }

    #[test]
    fn skips_unparseable_lines_and_blank_lines() {
        let text = "Action=rungame\r\n\r\nnoequalsign\r\nSystemId=mame\r\n";
        let params = parse(text);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn strips_cr_without_requiring_crlf() {
        let text = "Action=rungame\nSystemId=mame\n";
        let params = parse(text);
        assert_eq!(params.get("Action").map(String::as_str), Some("rungame"));
        assert_eq!(params.get("SystemId").map(String::as_str), Some("mame"));
    }

    #[test]
    fn deserializes_remote_snapshot_envelope() {
        let json = r#"{"data":{"readFile":"Action=rungame\r\nSystemId=mame"}}"#;
        let body: RemoteSnapshotBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.data.read_file, "Action=rungame\r\nSystemId=mame");
    }
}
