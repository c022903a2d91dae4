use crate::error::CatalogError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Output layout of a JSON artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    Compact,
    /// Pretty printed, indented by the given number of spaces.
    Indented(usize),
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Serialize `value` into a temp file next to `path`, then rename it over
/// `path`. A failure leaves any previous file in place.
pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    style: JsonStyle,
) -> Result<(), CatalogError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        match style {
            JsonStyle::Compact => serde_json::to_writer(&mut writer, value)?,
            JsonStyle::Indented(width) => {
                let indent = " ".repeat(width);
                let formatter = PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = Serializer::with_formatter(&mut writer, formatter);
                value.serialize(&mut ser)?;
            }
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CatalogError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_compact_and_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let value = json!({"makes": [{"id": 1}]});

        write_json_atomic(&path, &value, JsonStyle::Compact).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"makes":[{"id":1}]}"#);

        write_json_atomic(&path, &value, JsonStyle::Indented(4)).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n    \"makes\": [\n        {\n            \"id\": 1\n        }\n    ]\n}"
        );
    }

    #[test]
    fn failed_replace_keeps_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be replaced by a file
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let err = write_json_atomic(&target, &json!({}), JsonStyle::Compact).unwrap_err();
        assert!(matches!(err, CatalogError::Persist { .. }));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(target.join("keep").exists());
    }

    #[test]
    fn read_json_reports_missing_file_as_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json::<serde_json::Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
