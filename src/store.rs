// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Sample store keyed by sample id.
//!
//! A file that fails to decode still gets an entry: a named, silent placeholder
//! that the missing-resolution scan can report and a relink can later replace.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::decode::{decode_file, DecodeError, DecodePool};
use crate::sample::{Sample, SampleId};

/// A store shared between threads. Scans take the read lock, replacements the
/// write lock.
pub type SharedSampleStore = Arc<RwLock<SampleStore>>;

/// Samples by id. Iteration is in id order and is stable while the store is
/// borrowed.
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: BTreeMap<SampleId, Sample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedSampleStore {
        Arc::new(RwLock::new(self))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, id: &SampleId) -> Option<&Sample> {
        self.samples.get(id)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, SampleId, Sample> {
        self.samples.iter()
    }

    /// Inserts or overwrites an entry, returning the previous one.
    pub fn insert(&mut self, id: SampleId, sample: Sample) -> Option<Sample> {
        self.samples.insert(id, sample)
    }

    pub fn remove(&mut self, id: &SampleId) -> Option<Sample> {
        self.samples.remove(id)
    }

    /// Swaps an existing entry for a new sample, typically a fresh decode of a
    /// relinked placeholder. Returns the replaced sample, or hands the new one
    /// back if the id is unknown.
    pub fn replace(&mut self, id: &SampleId, sample: Sample) -> Result<Sample, Sample> {
        match self.samples.get_mut(id) {
            Some(entry) => Ok(std::mem::replace(entry, sample)),
            None => Err(sample),
        }
    }

    /// Decodes `path` into the entry for `id`. On failure a placeholder takes
    /// the entry and the error is returned.
    pub fn load(&mut self, id: SampleId, path: &Path) -> Result<(), DecodeError> {
        let result = decode_file(path);
        self.insert_result(id, path, result)
    }

    /// Decodes every entry on the pool and inserts the results in input order.
    /// Returns the failures; each of them is now a placeholder.
    pub fn load_all(
        &mut self,
        pool: &DecodePool,
        entries: Vec<(SampleId, PathBuf)>,
    ) -> Vec<(SampleId, DecodeError)> {
        let paths: Vec<PathBuf> = entries.iter().map(|(_, path)| path.clone()).collect();
        let results = pool.decode_all(&paths);

        let mut failures = Vec::new();
        for ((id, path), result) in entries.into_iter().zip(results) {
            if let Err(e) = self.insert_result(id.clone(), &path, result) {
                failures.push((id, e));
            }
        }

        info!(
            samples = self.len(),
            placeholders = self.placeholder_count(),
            memory_kb = self.total_memory_usage() / 1024,
            "Samples loaded"
        );
        failures
    }

    fn insert_result(
        &mut self,
        id: SampleId,
        path: &Path,
        result: Result<Sample, DecodeError>,
    ) -> Result<(), DecodeError> {
        match result {
            Ok(sample) => {
                self.samples.insert(id, sample);
                Ok(())
            }
            Err(e) => {
                warn!(
                    id = %id,
                    path = ?path,
                    err = %e,
                    "Failed to decode sample, using placeholder"
                );
                self.samples.insert(id, Sample::missing_placeholder(path));
                Err(e)
            }
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.samples
            .values()
            .filter(|s| s.is_missing_placeholder())
            .count()
    }

    /// Returns the total memory used by decoded samples.
    pub fn total_memory_usage(&self) -> usize {
        self.samples.values().map(Sample::memory_size).sum()
    }
}

impl<'a> IntoIterator for &'a SampleStore {
    type Item = (&'a SampleId, &'a Sample);
    type IntoIter = btree_map::Iter<'a, SampleId, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
