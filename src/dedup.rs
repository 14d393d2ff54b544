use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::record::{JobMap, JobRecord};

/// `(provider, id)` pairs recorded by earlier runs, grouped by provider so a
/// lookup borrows both keys.
#[derive(Debug, Clone, Default)]
pub struct MasterDataset {
    seen: HashMap<String, HashSet<String>>,
}

impl MasterDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, provider: impl Into<String>, id: impl Into<String>) {
        self.seen.entry(provider.into()).or_default().insert(id.into());
    }

    pub fn contains(&self, provider: &str, id: &str) -> bool {
        self.seen.get(provider).is_some_and(|ids| ids.contains(id))
    }

    pub fn len(&self) -> usize {
        self.seen.values().map(HashSet::len).sum()
    }
}

impl<'a> FromIterator<&'a JobRecord> for MasterDataset {
    fn from_iter<I: IntoIterator<Item = &'a JobRecord>>(iter: I) -> Self {
        let mut master = MasterDataset::new();
        for r in iter {
            master.insert(r.provider.clone(), r.id.clone());
        }
        master
    }
}

/// Remove records of `provider` already present in `master`. Records of other
/// providers are left alone. Returns how many were removed.
pub fn remove_known(jobs: &mut JobMap, master: &MasterDataset, provider: &str) -> usize {
    let before = jobs.len();
    jobs.retain(|_, job| job.provider != provider || !master.contains(provider, &job.id));
    let removed = before - jobs.len();
    info!("Removed {} {} jobs already in the master list", removed, provider);
    removed
}
