use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        /// Chunks appended one per `file_size` call, simulating a writer
        /// that is still flushing.
        pending: VecDeque<Vec<u8>>,
    },
    Dir,
}

/// In-memory filesystem. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.entries();
        Self::ensure_parents(&mut files, &path);
        files.insert(
            path,
            MockEntry::File {
                content: content.into(),
                pending: VecDeque::new(),
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.entries();
        Self::ensure_parents(&mut files, &path);
        files.insert(path, MockEntry::Dir);
    }

    /// Queue chunks that get appended to the file, one per size poll.
    pub fn append_while_polled(&self, path: impl AsRef<Path>, chunks: Vec<Vec<u8>>) {
        let mut files = self.entries();
        if let Some(MockEntry::File { pending, .. }) = files.get_mut(path.as_ref()) {
            pending.extend(chunks);
        }
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries().contains_key(path.as_ref())
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            files.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
            current = dir.parent();
        }
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.entries();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        let mut files = self.entries();
        match files.get_mut(path) {
            Some(MockEntry::File { content, pending }) => {
                if let Some(chunk) = pending.pop_front() {
                    content.extend(chunk);
                }
                Ok(content.len() as u64)
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}
