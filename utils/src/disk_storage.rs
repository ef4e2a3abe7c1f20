//! Utilities for loading a struct from a TOML file on the disk.
//! The struct should implement Deserialize from serde and have a Default.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::de::DeserializeOwned;

pub trait DiskStorageInterface
where
    Self: Sized + Debug + Default + DeserializeOwned,
{
    const FILE_NAME: &'static str;

    /// Get the path to the file
    fn path() -> crate::Result<PathBuf> {
        let dirs = BaseDirs::new().ok_or(crate::Error::BaseDirsFailed)?;
        let path = dirs
            .home_dir()
            .join(".holdboard")
            .join(Self::FILE_NAME)
            .with_extension("toml");
        Ok(path)
    }

    /// Load the content from the default file if it exists otherwise return the default value
    fn load() -> crate::Result<Self> {
        let path = Self::path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Checks values that parse fine but cannot be used. Runs on every load.
    fn validate(&self) -> crate::Result<()> {
        Ok(())
    }

    /// Load the content from an explicit file, which has to exist
    fn load_from(path: &Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::Error::FileReadFailed(path.to_path_buf(), e))?;

        let value: Self = toml::from_str(&content)
            .map_err(|e| crate::Error::TomlParsingFailed(path.to_path_buf(), e))?;
        value.validate()?;
        Ok(value)
    }
}
