use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use color_eyre::eyre::Context;

use crate::Result;

pub trait SummaryStore {
    /// `Ok(None)` when there is no summary for `title`.
    fn load(&self, title: &str) -> Result<Option<String>>;
}

#[derive(Clone, Debug)]
pub struct FsSummaryStore {
    dir: PathBuf,
}

impl FsSummaryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsSummaryStore { dir: dir.into() }
    }

    pub fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{title}.txt"))
    }
}

impl SummaryStore for FsSummaryStore {
    fn load(&self, title: &str) -> Result<Option<String>> {
        let path = self.path_for(title);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading summary {}", path.display())),
        }
    }
}

impl SummaryStore for HashMap<String, String> {
    fn load(&self, title: &str) -> Result<Option<String>> {
        Ok(self.get(title).cloned())
    }
}
