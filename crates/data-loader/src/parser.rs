//! Parsers for the serialized artifacts.
//!
//! - interaction matrix: `{"shape": [rows, cols], "indptr": [..], "indices": [..], "data": [..]}`
//! - id mappings: `[ {raw: index, ..}, {"index": raw, ..} ]`

use crate::error::{LoadError, Result};
use crate::types::{IdMapping, InteractionMatrix, RawId};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

/// Read and decode a JSON artifact.
///
/// A missing file is reported as `FileNotFound`, any decoding problem as
/// `Malformed` naming the file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| LoadError::Malformed {
        file: file_label(path),
        reason: e.to_string(),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// On-disk CSR layout
#[derive(Debug, Deserialize)]
struct CsrFile {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

/// On-disk (forward, reverse) mapping pair
#[derive(Debug, Deserialize)]
struct MappingPairFile(HashMap<String, usize>, HashMap<String, RawId>);

/// Parse the interaction matrix file
pub fn parse_interactions(path: &Path) -> Result<InteractionMatrix> {
    let csr: CsrFile = read_json(path)?;
    let (rows, cols) = csr.shape;
    InteractionMatrix::from_csr(rows, cols, csr.indptr, csr.indices, csr.data)
}

/// Parse a user or item mapping file
pub fn parse_mapping(path: &Path, kind: &str) -> Result<IdMapping> {
    let MappingPairFile(forward, reverse) = read_json(path)?;
    let forward: HashMap<RawId, usize> = forward
        .into_iter()
        .map(|(raw, idx)| (RawId::from(raw), idx))
        .collect();
    IdMapping::from_pair(kind, forward, reverse)
}
