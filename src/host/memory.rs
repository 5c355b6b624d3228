// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! In-memory host for unit tests.

use crate::host::{EntryKind, Host};

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
    rc::Rc,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemoryFile {
    contents: Vec<u8>,
    mode: u32,
}

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeMap<PathBuf, u32>,
}

impl Tree {
    fn insert_parents(&mut self, path: &Path, mode: u32) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.dirs.entry(ancestor.to_path_buf()).or_insert(mode);
        }
    }
}

/// Host whose filesystem, search path, and environment live in memory.
///
/// Clones share the same filesystem, so a clone kept by the test can inspect
/// whatever the code under test wrote.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryHost {
    tree: Rc<RefCell<Tree>>,
    unreadable: BTreeSet<PathBuf>,
    executables: BTreeMap<String, PathBuf>,
    env: BTreeMap<String, String>,
    home: Option<PathBuf>,
    executable_dir: Option<PathBuf>,
    current_dir: PathBuf,
}

impl MemoryHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(self, path: impl Into<PathBuf>, contents: impl AsRef<[u8]>) -> Self {
        let path = path.into();
        {
            let mut tree = self.tree.borrow_mut();
            tree.insert_parents(&path, 0o755);
            tree.files.insert(
                path,
                MemoryFile {
                    contents: contents.as_ref().to_vec(),
                    mode: 0o644,
                },
            );
        }
        self
    }

    pub(crate) fn with_dir(self, path: impl Into<PathBuf>, mode: u32) -> Self {
        let path = path.into();
        {
            let mut tree = self.tree.borrow_mut();
            tree.insert_parents(&path, 0o755);
            tree.dirs.insert(path, mode);
        }
        self
    }

    /// Register a file that shows up in listings, but fails to read.
    pub(crate) fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.unreadable.insert(path.clone());
        self.with_file(path, "")
    }

    pub(crate) fn with_executable(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(name.into(), path.into());
        self
    }

    pub(crate) fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub(crate) fn with_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.home = Some(path.into());
        self
    }

    pub(crate) fn with_executable_dir(self, path: impl Into<PathBuf>, mode: u32) -> Self {
        let path = path.into();
        let host = self.with_dir(path.clone(), mode);
        Self {
            executable_dir: Some(path),
            ..host
        }
    }

    /// Resolve relative paths against a directory other than `/`.
    pub(crate) fn with_current_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_dir = path.into();
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        Path::new("/").join(&self.current_dir).join(path)
    }

    pub(crate) fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.tree
            .borrow()
            .files
            .get(path.as_ref())
            .map(|file| String::from_utf8_lossy(&file.contents).into_owned())
    }

    pub(crate) fn file_mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.tree.borrow().files.get(path.as_ref()).map(|file| file.mode)
    }

    pub(crate) fn dir_mode_of(&self, path: impl AsRef<Path>) -> Option<u32> {
        self.tree.borrow().dirs.get(path.as_ref()).copied()
    }
}

/// Handle to a file created through [`MemoryHost`].
#[derive(Debug)]
pub(crate) struct MemoryOutput {
    tree: Rc<RefCell<Tree>>,
    path: PathBuf,
}

impl io::Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut tree = self.tree.borrow_mut();
        let file = tree
            .files
            .get_mut(&self.path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        file.contents.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Host for MemoryHost {
    type Output = MemoryOutput;

    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let path = self.resolve(path);
        let path = path.as_path();
        let tree = self.tree.borrow();
        if tree.files.contains_key(path) {
            Some(EntryKind::File)
        } else if tree.dirs.contains_key(path) {
            Some(EntryKind::Dir)
        } else {
            None
        }
    }

    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(self.resolve(path))
    }

    fn walk_files(&self, root: &Path) -> Vec<PathBuf> {
        // INVARIANT: Listed paths keep the spelling of the root they were
        //   found under, just like a real walk.
        let absolute = self.resolve(root);
        self.tree
            .borrow()
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&absolute).ok())
            .map(|relative| root.join(relative))
            .collect()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = self.resolve(path);
        let path = path.as_path();
        if self.unreadable.contains(path) {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }

        self.tree
            .borrow()
            .files
            .get(path)
            .map(|file| file.contents.clone())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.insert_parents(path, mode);
        tree.dirs.entry(path.to_path_buf()).or_insert(mode);
        Ok(())
    }

    fn create_file(&self, path: &Path, mode: u32) -> io::Result<MemoryOutput> {
        let mut tree = self.tree.borrow_mut();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !tree.dirs.contains_key(parent) {
                return Err(io::Error::from(io::ErrorKind::NotFound));
            }
        }
        tree.files.insert(
            path.to_path_buf(),
            MemoryFile {
                contents: Vec::new(),
                mode,
            },
        );

        Ok(MemoryOutput {
            tree: Rc::clone(&self.tree),
            path: path.to_path_buf(),
        })
    }

    fn dir_mode(&self, path: &Path) -> io::Result<u32> {
        self.dir_mode_of(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn executable_dir(&self) -> io::Result<PathBuf> {
        self.executable_dir
            .clone()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        self.executables.get(name).cloned()
    }

    fn env_var(&self, name: &str) -> String {
        self.env.get(name).cloned().unwrap_or_default()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}
