use anyhow::{Context, Result};
use serde::Serialize;
use sha2::Digest;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

/// Pretty-print `value` as JSON to `path`, creating parent directories.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("serialize JSON")?;
    writer.write_all(b"\n").context("write JSON")?;
    writer.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Uppercase the first character: `total` -> `Total`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("total"), "Total");
        assert_eq!(capitalize("X"), "X");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_write_json_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/out.json");
        write_json_pretty(&path, &serde_json::json!({"k": [1, 2]})).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["k"][1], 2);
    }

    #[test]
    fn test_write_json_dash_is_a_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("-");
        write_json_pretty(&path, &serde_json::json!([])).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]\n");
    }
}
