//! Core domain types for the recommender artifacts.
//!
//! - `RawId`: the external identifier of a user or item
//! - `IdMapping`: the raw id <-> dense index bijection (both directions)
//! - `InteractionMatrix`: the CSR user x item interaction matrix
//! - `SparseRow`: a borrowed view of one matrix row

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Raw identifiers
// =============================================================================

/// External identifier of a user or an item.
///
/// Stored as text. Ordering is "natural": ids that both parse as integers
/// compare numerically and sort before non-numeric ids, anything else
/// compares as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawIdRepr")]
pub struct RawId(String);

/// Mapping files may encode raw ids as JSON strings or integers
#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdRepr {
    Text(String),
    Int(i64),
}

impl From<RawIdRepr> for RawId {
    fn from(repr: RawIdRepr) -> Self {
        match repr {
            RawIdRepr::Text(s) => RawId(s),
            RawIdRepr::Int(n) => RawId(n.to_string()),
        }
    }
}

impl RawId {
    pub fn new(id: impl Into<String>) -> Self {
        RawId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<&str> for RawId {
    fn from(s: &str) -> Self {
        RawId(s.to_string())
    }
}

impl From<String> for RawId {
    fn from(s: String) -> Self {
        RawId(s)
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for RawId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RawId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// =============================================================================
// ID mappings
// =============================================================================

/// Bijection between raw ids and dense zero-based indices.
///
/// Both directions are kept and are always consistent: `to_index` has exactly
/// one entry per position of `to_raw`.
#[derive(Debug, Clone)]
pub struct IdMapping {
    kind: String,
    to_index: HashMap<RawId, usize>,
    to_raw: Vec<RawId>,
}

impl IdMapping {
    /// Build a mapping from raw ids listed in index order.
    pub fn from_ordered(kind: impl Into<String>, ids: Vec<RawId>) -> Result<Self> {
        let kind = kind.into();
        let mut to_index = HashMap::with_capacity(ids.len());
        for (idx, raw) in ids.iter().enumerate() {
            if let Some(previous) = to_index.insert(raw.clone(), idx) {
                return Err(LoadError::InvalidMapping {
                    kind,
                    reason: format!("raw id {} maps to both {} and {}", raw, previous, idx),
                });
            }
        }
        Ok(Self {
            kind,
            to_index,
            to_raw: ids,
        })
    }

    /// Build a mapping from a serialized (forward, reverse) pair.
    ///
    /// The reverse keys must be exactly `0..n` and both maps must agree.
    pub fn from_pair(
        kind: impl Into<String>,
        forward: HashMap<RawId, usize>,
        reverse: HashMap<String, RawId>,
    ) -> Result<Self> {
        let kind = kind.into();
        let invalid = |reason: String| LoadError::InvalidMapping {
            kind: kind.clone(),
            reason,
        };

        let n = reverse.len();
        let mut slots: Vec<Option<RawId>> = vec![None; n];
        for (key, raw) in reverse {
            let idx: usize = key
                .trim()
                .parse()
                .map_err(|_| invalid(format!("reverse key {:?} is not an index", key)))?;
            let slot = slots
                .get_mut(idx)
                .ok_or_else(|| invalid(format!("index {} outside 0..{}", idx, n)))?;
            if slot.is_some() {
                return Err(invalid(format!("index {} listed twice", idx)));
            }
            *slot = Some(raw);
        }
        // n distinct keys that all fall in 0..n fill every slot
        let to_raw: Vec<RawId> = slots.into_iter().flatten().collect();

        if forward.len() != n {
            return Err(invalid(format!(
                "forward map has {} entries, reverse map has {}",
                forward.len(),
                n
            )));
        }
        for (raw, idx) in &forward {
            match to_raw.get(*idx) {
                Some(back) if back == raw => {}
                Some(back) => {
                    return Err(invalid(format!(
                        "{} -> {} but {} -> {}",
                        raw, idx, idx, back
                    )));
                }
                None => return Err(invalid(format!("{} -> {} is out of range", raw, idx))),
            }
        }

        Ok(Self {
            kind,
            to_index: forward,
            to_raw,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Resolve a raw id to its dense index
    pub fn index_of(&self, raw: &RawId) -> Option<usize> {
        self.to_index.get(raw).copied()
    }

    /// Resolve a dense index back to its raw id
    pub fn raw_of(&self, idx: usize) -> Option<&RawId> {
        self.to_raw.get(idx)
    }

    pub fn contains(&self, raw: &RawId) -> bool {
        self.to_index.contains_key(raw)
    }

    pub fn len(&self) -> usize {
        self.to_raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_raw.is_empty()
    }
}

// =============================================================================
// Interaction matrix
// =============================================================================

/// Borrowed view of one user's interactions
#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub data: &'a [f32],
}

impl<'a> SparseRow<'a> {
    pub fn empty() -> Self {
        SparseRow {
            indices: &[],
            data: &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.indices.iter().copied().zip(self.data.iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// Sparse user x item matrix in compressed sparse row layout.
///
/// Rows are users, columns are items, values are implicit-feedback
/// confidences. Immutable once built.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl InteractionMatrix {
    /// Build from raw CSR arrays, validating their consistency.
    pub fn from_csr(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self> {
        let expected = rows.checked_add(1).ok_or_else(|| {
            LoadError::InvalidMatrix(format!("row count {} is too large", rows))
        })?;
        if indptr.len() != expected {
            return Err(LoadError::InvalidMatrix(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                expected
            )));
        }
        if indptr[0] != 0 {
            return Err(LoadError::InvalidMatrix("indptr must start at 0".to_string()));
        }
        if let Some(w) = indptr.windows(2).position(|w| w[1] < w[0]) {
            return Err(LoadError::InvalidMatrix(format!(
                "indptr decreases at row {}",
                w
            )));
        }
        if indices.len() != data.len() {
            return Err(LoadError::InvalidMatrix(format!(
                "{} column indices but {} values",
                indices.len(),
                data.len()
            )));
        }
        if indptr[rows] != indices.len() {
            return Err(LoadError::InvalidMatrix(format!(
                "indptr ends at {} but there are {} nonzeros",
                indptr[rows],
                indices.len()
            )));
        }
        if let Some(&col) = indices.iter().find(|&&c| c >= cols) {
            return Err(LoadError::InvalidMatrix(format!(
                "column index {} outside 0..{}",
                col, cols
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::InvalidMatrix("non-finite value".to_string()));
        }

        Ok(Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }

    /// Build from (row, col, value) triplets. Duplicate coordinates are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f32)]) -> Result<Self> {
        let mut sorted = triplets.to_vec();
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::with_capacity(sorted.len());
        let mut data: Vec<f32> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            if r >= rows {
                return Err(LoadError::InvalidMatrix(format!(
                    "row index {} outside 0..{}",
                    r, rows
                )));
            }
            if last == Some((r, c)) {
                if let Some(value) = data.last_mut() {
                    *value += v;
                }
                continue;
            }
            indices.push(c);
            data.push(v);
            indptr[r + 1] += 1;
            last = Some((r, c));
        }
        for r in 0..rows {
            indptr[r + 1] += indptr[r];
        }

        Self::from_csr(rows, cols, indptr, indices, data)
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Borrow one user's row
    pub fn row(&self, user_idx: usize) -> Option<SparseRow<'_>> {
        if user_idx >= self.rows {
            return None;
        }
        let (start, end) = (self.indptr[user_idx], self.indptr[user_idx + 1]);
        Some(SparseRow {
            indices: &self.indices[start..end],
            data: &self.data[start..end],
        })
    }
}
