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
use std::fmt;
use std::path::PathBuf;

use crate::sample::{Sample, SampleId};

/// A placeholder that needs relinking. This is a snapshot: re-resolve `id`
/// against the store before acting on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingResolutionWorkItem {
    pub id: SampleId,
    pub file_name: PathBuf,
}

impl fmt::Display for MissingResolutionWorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.file_name.display())
    }
}

/// Collects a work item for every placeholder, in store order.
///
/// Reads only: nothing is mutated and the filesystem is not touched. The caller
/// must hold the store stable for the duration of the call.
pub fn collect_missing_resolution_work_items<'a, I>(samples: I) -> Vec<MissingResolutionWorkItem>
where
    I: IntoIterator<Item = (&'a SampleId, &'a Sample)>,
{
    samples
        .into_iter()
        .filter(|(_, sample)| sample.is_missing_placeholder())
        .map(|(id, sample)| MissingResolutionWorkItem {
            id: id.clone(),
            file_name: sample.file_name().to_path_buf(),
        })
        .collect()
}
