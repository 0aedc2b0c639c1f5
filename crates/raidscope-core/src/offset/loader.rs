use std::fs;
use std::path::Path;

use tracing::debug;

use super::Offsets;
use crate::error::Result;

/// Load an offsets table from a JSON file.
///
/// The table is returned as parsed; callers decide when to [`Offsets::validate`].
pub fn load_offsets<P: AsRef<Path>>(path: P) -> Result<Offsets> {
    let content = fs::read_to_string(path.as_ref())?;
    let offsets: Offsets = serde_json::from_str(&content)?;
    debug!(
        "Loaded offsets version {} from {}",
        offsets.version,
        path.as_ref().display()
    );
    Ok(offsets)
}

/// Save an offsets table as pretty-printed JSON.
pub fn save_offsets<P: AsRef<Path>>(path: P, offsets: &Offsets) -> Result<()> {
    let content = serde_json::to_string_pretty(offsets)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offset::test_offsets;

    #[test]
    fn test_save_then_load_preserves_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");
        let offsets = test_offsets();

        save_offsets(&path, &offsets).unwrap();
        let loaded = load_offsets(&path).unwrap();

        assert_eq!(loaded, offsets);
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_offsets(dir.path().join("missing.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_malformed_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_offsets(&path),
            Err(crate::error::Error::Json(_))
        ));
    }
}
