//! Reading and writing result documents.
//!
//! A document holds either a single result object or an array of them.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::error::SchemaError;
use crate::lenient::BenchmarkResultJson;
use crate::schema::BenchmarkResult;

/// Parse a document leniently into its results.
pub fn parse_document(content: &str) -> Result<Vec<BenchmarkResultJson>, SchemaError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

pub fn read_document(path: &Path) -> Result<Vec<BenchmarkResultJson>, SchemaError> {
    let content = fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
    let results = parse_document(&content)?;
    tracing::debug!(path = %path.display(), results = results.len(), "read result document");
    Ok(results)
}

/// A file found by [`scan_dir`] and the outcome of parsing it.
#[derive(Debug)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub results: Result<Vec<BenchmarkResultJson>, SchemaError>,
}

/// Every `*.json` file under `root`, recursively, sorted by path.
pub fn find_documents(root: &Path) -> Result<Vec<PathBuf>, SchemaError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            SchemaError::io(path, e.into())
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "json")
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse every document under `root` in parallel. One bad file does not stop the scan.
pub fn scan_dir(root: &Path) -> Result<Vec<LoadedFile>, SchemaError> {
    let paths = find_documents(root)?;
    tracing::debug!(root = %root.display(), files = paths.len(), "scanning result documents");

    // Indexed parallel iterator; collect preserves path order.
    Ok(paths
        .into_par_iter()
        .map(|path| {
            let results = read_document(&path);
            LoadedFile { path, results }
        })
        .collect())
}

/// Files named by `inputs`: plain files as given, directories expanded by [`find_documents`].
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, SchemaError> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            out.extend(find_documents(input)?);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}

pub fn to_json_pretty(results: &[BenchmarkResult]) -> Result<String, SchemaError> {
    let json = match results {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    Ok(json)
}

/// Write results as pretty JSON: a bare object for one result, an array otherwise.
pub fn write_results(path: &Path, results: &[BenchmarkResult]) -> Result<(), SchemaError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SchemaError::io(parent, e))?;
    }
    let json = to_json_pretty(results)?;
    fs::write(path, json).map_err(|e| SchemaError::io(path, e))?;
    tracing::debug!(path = %path.display(), results = results.len(), "wrote results");
    Ok(())
}
