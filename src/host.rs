// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host capabilities.
//!
//! Everything polkadot needs from the outside world goes through the [`Host`]
//! trait: stat, recursive listing, reading, creating directories and files,
//! executable lookup, environment lookup, and the user's home directory. Tag
//! resolution, weaving, and generation never touch [`std::fs`] directly, so
//! they can be driven by an in-memory host in tests.

#[cfg(test)]
pub(crate) mod memory;

use ignore::WalkBuilder;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Kind of filesystem entry found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,

    /// Directory.
    Dir,

    /// Anything else, e.g., sockets, fifos, dangling links.
    Other,
}

/// Layer of indirection for host access.
pub trait Host {
    /// Writer handed out by [`Host::create_file`].
    type Output: io::Write;

    /// Determine what kind of entry lives at a path, following symlinks.
    ///
    /// Returns `None` if nothing is there.
    fn kind(&self, path: &Path) -> Option<EntryKind>;

    /// Make path absolute relative to current working directory.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;

    /// Recursively list every regular file below a root.
    ///
    /// Paths that cannot be walked are skipped. A missing root yields
    /// nothing.
    fn walk_files(&self, root: &Path) -> Vec<PathBuf>;

    /// Read full contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create a directory and all of its missing parents with permission bits.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create or truncate a file, and set its permission bits.
    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Self::Output>;

    /// Permission bits of a directory.
    fn dir_mode(&self, path: &Path) -> io::Result<u32>;

    /// Directory containing the running executable.
    fn executable_dir(&self) -> io::Result<PathBuf>;

    /// Look up executable on search path.
    fn which(&self, name: &str) -> Option<PathBuf>;

    /// Read environment variable, empty if unset.
    fn env_var(&self, name: &str) -> String;

    /// Absolute path to user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Host access through the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsHost;

impl OsHost {
    /// Construct new operating system host.
    pub fn new() -> Self {
        Self
    }
}

impl Host for OsHost {
    type Output = File;

    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let metadata = fs::metadata(path).ok()?;
        if metadata.is_file() {
            Some(EntryKind::File)
        } else if metadata.is_dir() {
            Some(EntryKind::Dir)
        } else {
            Some(EntryKind::Other)
        }
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }

    fn walk_files(&self, root: &Path) -> Vec<PathBuf> {
        // INVARIANT: Walk everything, hidden files and ignored files included.
        //   Symlinks are reported as found, not followed.
        WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    debug!("skip path during walk: {error}");
                    None
                }
            })
            .filter(|entry| match entry.file_type() {
                Some(kind) if kind.is_file() => true,
                // INVARIANT: Linked fragments count, linked directories are
                //   never descended into.
                Some(kind) if kind.is_symlink() => {
                    fs::metadata(entry.path()).is_ok_and(|metadata| metadata.is_file())
                }
                _ => false,
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    #[cfg(unix)]
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    #[cfg(not(unix))]
    fn create_dir_all(&self, path: &Path, _mode: u32) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    #[cfg(unix)]
    fn create_file(&self, path: &Path, mode: u32) -> io::Result<File> {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;

        // INVARIANT: Existing files and umask must not change requested mode.
        file.set_permissions(fs::Permissions::from_mode(mode))?;

        Ok(file)
    }

    #[cfg(not(unix))]
    fn create_file(&self, path: &Path, _mode: u32) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    #[cfg(unix)]
    fn dir_mode(&self, path: &Path) -> io::Result<u32> {
        use std::os::unix::fs::PermissionsExt;
        Ok(fs::metadata(path)?.permissions().mode() & 0o777)
    }

    #[cfg(not(unix))]
    fn dir_mode(&self, path: &Path) -> io::Result<u32> {
        fs::metadata(path).map(|_| 0o755)
    }

    fn executable_dir(&self) -> io::Result<PathBuf> {
        let exe = std::env::current_exe()?;
        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::other(format!(
                "executable {:?} has no parent directory",
                exe.display()
            ))
        })
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn env_var(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn os_host_walk_files_lists_nested_regular_files() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        fs::create_dir_all(root.path().join("a/b"))?;
        fs::write(root.path().join("a/b/deep.conf"), "deep")?;
        fs::write(root.path().join("top.conf"), "top")?;
        fs::write(root.path().join(".hidden"), "hidden")?;

        let host = OsHost::new();
        let result = host.walk_files(root.path());
        let expect = vec![
            root.path().join(".hidden"),
            root.path().join("a/b/deep.conf"),
            root.path().join("top.conf"),
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn os_host_walk_files_missing_root() {
        let host = OsHost::new();
        let result = host.walk_files(Path::new("/definitely/not/here/at/all"));
        assert!(result.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn os_host_walk_files_keeps_symlinked_fragments() -> anyhow::Result<()> {
        use std::os::unix::fs::symlink;

        let root = TempDir::new()?;
        fs::create_dir_all(root.path().join("shared/nested"))?;
        fs::create_dir_all(root.path().join("frag"))?;
        fs::write(root.path().join("shared/a_linux.conf"), "X")?;
        fs::write(root.path().join("shared/nested/c_linux.conf"), "Z")?;
        fs::write(root.path().join("frag/b_linux.conf"), "Y")?;
        symlink(
            root.path().join("shared/a_linux.conf"),
            root.path().join("frag/a_linux.conf"),
        )?;
        symlink(root.path().join("shared/nested"), root.path().join("frag/nested"))?;
        symlink(root.path().join("shared/gone"), root.path().join("frag/dangling"))?;

        let host = OsHost::new();
        let result = host.walk_files(&root.path().join("frag"));
        let expect = vec![
            root.path().join("frag/a_linux.conf"),
            root.path().join("frag/b_linux.conf"),
        ];
        assert_eq!(result, expect);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn os_host_walk_files_skips_unreadable_directory() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new()?;
        fs::create_dir_all(root.path().join("locked"))?;
        fs::write(root.path().join("locked/hidden.conf"), "")?;
        fs::write(root.path().join("a.conf"), "")?;
        fs::write(root.path().join("z.conf"), "")?;
        fs::set_permissions(root.path().join("locked"), fs::Permissions::from_mode(0o000))?;

        // Privileged users read through permission bits.
        if fs::read_dir(root.path().join("locked")).is_ok() {
            fs::set_permissions(root.path().join("locked"), fs::Permissions::from_mode(0o755))?;
            return Ok(());
        }

        let host = OsHost::new();
        let result = host.walk_files(root.path());
        fs::set_permissions(root.path().join("locked"), fs::Permissions::from_mode(0o755))?;

        let expect = vec![root.path().join("a.conf"), root.path().join("z.conf")];
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn os_host_kind() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        fs::write(root.path().join("file"), "")?;

        let host = OsHost::new();
        assert_eq!(host.kind(root.path()), Some(EntryKind::Dir));
        assert_eq!(host.kind(&root.path().join("file")), Some(EntryKind::File));
        assert_eq!(host.kind(&root.path().join("nope")), None);

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn os_host_create_file_applies_mode_to_existing_file() -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new()?;
        let path = root.path().join("out");
        fs::write(&path, "stale content")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;

        let host = OsHost::new();
        let mut file = host.create_file(&path, 0o600)?;
        file.write_all(b"fresh")?;
        drop(file);

        assert_eq!(fs::read_to_string(&path)?, "fresh");
        assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o600);

        Ok(())
    }

    #[sealed_test(env = [("POLKADOT_TEST_VAR", "hello")])]
    fn os_host_env_var() {
        let host = OsHost::new();
        assert_eq!(host.env_var("POLKADOT_TEST_VAR"), "hello");
        assert_eq!(host.env_var("POLKADOT_TEST_UNSET_VAR"), "");
    }
}
