//! Reading and writing the published leaderboard document.

use std::{fs, path::Path};

use holdboard_common::Snapshot;

/// Writes `snapshot` as pretty JSON. The document is written next to `path`
/// first and moved over it, so readers never see a half written file.
pub fn write(snapshot: &Snapshot, path: &Path) -> crate::Result<()> {
    let content =
        serde_json::to_string_pretty(snapshot).map_err(crate::Error::JsonFormattingFailed)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| crate::Error::CreateDirAllFailed(parent.to_path_buf(), e))?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = Path::new(&staging);

    fs::write(staging, content + "\n")
        .map_err(|e| crate::Error::FileWriteFailed(staging.to_path_buf(), e))?;
    fs::rename(staging, path).map_err(|error| crate::Error::FileRenameFailed {
        from: staging.to_path_buf(),
        to: path.to_path_buf(),
        error,
    })
}

pub fn load(path: &Path) -> crate::Result<Snapshot> {
    let content = fs::read_to_string(path)
        .map_err(|e| crate::Error::FileReadFailed(path.to_path_buf(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| crate::Error::JsonParsingFailed(path.to_path_buf(), e))
}
