use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::properties::PropertyMode;

/// Session context supplied by the host before a file is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportContext {
    /// Directory the file is created in. It must already exist.
    pub target_dir: PathBuf,
    /// Value of the `system_name` property of the metadata group.
    pub system_name: String,
    /// File extension without the dot.
    pub extension: String,
    pub property_mode: PropertyMode,
}

impl Default for ExportContext {
    fn default() -> Self {
        ExportContext {
            target_dir: PathBuf::from("."),
            system_name: String::from("tsdat-export"),
            extension: String::from("dat"),
            property_mode: PropertyMode::Json,
        }
    }
}

impl ExportContext {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        ExportContext { target_dir: target_dir.into(), ..Self::default() }
    }

    /// Load a context from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ExportError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn validate(&self) -> Result<(), ExportError> {
        if self.extension.is_empty() || self.extension.contains(['/', '\\', '.']) {
            return Err(ExportError::InvalidArgument(format!("invalid file extension '{}'", self.extension)));
        }
        if !self.target_dir.is_dir() {
            return Err(ExportError::InvalidArgument(
                format!("target directory {} does not exist", self.target_dir.display())
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let ctx = ExportContext::from_json_str(r#"{ "target_dir": "/tmp/out", "property_mode": "flat" }"#).unwrap();
        assert_eq!(ctx.target_dir, PathBuf::from("/tmp/out"));
        assert_eq!(ctx.property_mode, PropertyMode::Flat);
        assert_eq!(ctx.extension, "dat");
        assert_eq!(ctx.system_name, "tsdat-export");
    }

    #[test]
    fn rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = ExportContext::new(dir.path());
        assert!(ctx.validate().is_ok());
        ctx.extension = "../x".into();
        assert!(matches!(ctx.validate(), Err(ExportError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ExportContext::new(dir.path().join("missing"));
        assert!(matches!(ctx.validate(), Err(ExportError::InvalidArgument(_))));
    }
}
