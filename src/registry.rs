use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::{Error, History, Result};

/// Loaded histories by repository name.
///
/// Readers get an `Arc` snapshot and keep using it for the duration of a
/// request, while a reload swaps in a freshly built history without
/// blocking them.
#[derive(Debug, Default)]
pub struct Registry {
    histories: RwLock<HashMap<String, Arc<History>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `history` the current history of `repository`, returning the one
    /// it replaces.
    pub fn install(&self, repository: impl Into<String>, history: History) -> Option<Arc<History>> {
        let repository = repository.into();
        info!(
            repository = %repository,
            commits = history.len(),
            files = history.file_count(),
            "history loaded"
        );

        let replaced = self
            .histories
            .write()
            .insert(repository.clone(), Arc::new(history));
        if let Some(old) = &replaced {
            info!(repository = %repository, commits = old.len(), "previous history replaced");
        }
        replaced
    }

    pub fn get(&self, repository: &str) -> Result<Arc<History>> {
        self.histories
            .read()
            .get(repository)
            .cloned()
            .ok_or_else(|| Error::UnknownRepository(repository.to_owned()))
    }

    pub fn remove(&self, repository: &str) -> Option<Arc<History>> {
        self.histories.write().remove(repository)
    }

    /// Names of every repository with a history, sorted.
    pub fn repositories(&self) -> Vec<String> {
        let mut names: Vec<_> = self.histories.read().keys().cloned().collect();
        names.sort();
        names
    }
}
