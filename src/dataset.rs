//! Loading project rows from the CSV dataset.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use color_eyre::eyre::Context;
use serde::Deserialize;

use crate::Result;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "Name")]
    pub name: String,
    /// Kept verbatim, the page links to exactly what the dataset says.
    #[serde(rename = "Website")]
    pub website: String,
}

pub fn load(path: &Path) -> Result<Vec<ProjectRecord>> {
    let file = File::open(path)
        .with_context(|| format!("could not open dataset {}", path.display()))?;
    from_reader(file).with_context(|| format!("reading {}", path.display()))
}

pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ProjectRecord>> {
    csv::Reader::from_reader(reader)
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("malformed dataset row {}", i + 1)))
        .collect()
}
