use crate::error::CommonError;
use crate::result::CommonResult;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File system abstraction for loading and saving treebank files
pub trait FileSystem {
    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> CommonResult<String>;

    fn write(&self, path: &Path, contents: &str) -> CommonResult<()>;
}

/// Real file system implementation
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> CommonResult<String> {
        if !path.exists() {
            return Err(CommonError::NotFound(path.to_path_buf()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&self, path: &Path, contents: &str) -> CommonResult<()> {
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// In-memory file system for testing
#[derive(Default)]
pub struct MockFileSystem {
    files: RefCell<HashMap<PathBuf, String>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.get_mut().insert(path.into(), contents.into());
    }

    /// Current contents of a file, if present
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> CommonResult<String> {
        self.files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| CommonError::NotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, contents: &str) -> CommonResult<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
