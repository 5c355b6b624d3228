// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Dotfiles directory with component directories laid out on disk.
pub(crate) struct ComponentFixture {
    root: TempDir,
}

impl ComponentFixture {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            root: TempDir::new()?,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.path().join(path)
    }

    /// Write file relative to fixture root, creating parents as needed.
    pub(crate) fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;

        Ok(())
    }

    pub(crate) fn read(&self, path: impl AsRef<Path>) -> Result<String> {
        Ok(fs::read_to_string(self.join(path))?)
    }

    #[cfg(unix)]
    pub(crate) fn mode(&self, path: impl AsRef<Path>) -> Result<u32> {
        use std::os::unix::fs::PermissionsExt;
        Ok(fs::metadata(self.join(path))?.permissions().mode() & 0o777)
    }
}
