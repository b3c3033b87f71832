//! Folder-scope state: the optional folder restriction and the lazily
//! fetched folder catalog.
//!
//! The catalog is fetched at most once per session, with concurrent opens
//! coalesced on an in-flight flag. Selection is session-scoped only: it is
//! never persisted and resets to unrestricted on a fresh session.

use crate::protocol::Folder;

/// Holds the optional folder restriction and the cached catalog.
#[derive(Debug, Default)]
pub struct FolderScope {
    selected: Option<String>,
    catalog: Vec<Folder>,
    loaded: bool,
    fetch_in_flight: bool,
}

impl FolderScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a catalog fetch as started if one is needed.
    ///
    /// Returns `true` exactly when the caller should issue the single
    /// `fetch_folders` call; returns `false` when the catalog is already
    /// loaded or a fetch is in flight (coalescing).
    pub fn begin_fetch(&mut self) -> bool {
        if self.loaded || self.fetch_in_flight {
            return false;
        }
        self.fetch_in_flight = true;
        true
    }

    /// Installs the fetched catalog and clears the in-flight flag.
    ///
    /// An empty result still counts as loaded: the backend degraded the
    /// lookup, and re-fetch storms are not worth the noise.
    pub fn complete_fetch(&mut self, folders: Vec<Folder>) {
        self.catalog = folders;
        self.loaded = true;
        self.fetch_in_flight = false;
    }

    /// Whether the catalog has been fetched this session.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Sets the restriction immediately; effective on the next turn.
    pub fn select(&mut self, folder_id: Option<String>) {
        self.selected = folder_id;
    }

    /// The currently selected folder id, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected folder's catalog entry, when the catalog knows it.
    pub fn selected_folder(&self) -> Option<&Folder> {
        let id = self.selected.as_deref()?;
        self.catalog.iter().find(|f| f.id == id)
    }

    /// Case-insensitive substring filter over folder names.
    ///
    /// Returns the whole catalog when `search` is empty.
    pub fn filter(&self, search: &str) -> Vec<&Folder> {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return self.catalog.iter().collect();
        }
        self.catalog
            .iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Folder> {
        vec![
            Folder {
                id: "1".to_string(),
                name: "Engineering".to_string(),
            },
            Folder {
                id: "2".to_string(),
                name: "Finance".to_string(),
            },
        ]
    }

    /// Test: only the first open triggers a fetch; opens while in flight
    /// or after load are coalesced.
    #[test]
    fn test_begin_fetch_coalesces() {
        let mut scope = FolderScope::new();
        assert!(scope.begin_fetch());
        assert!(!scope.begin_fetch()); // in flight

        scope.complete_fetch(catalog());
        assert!(!scope.begin_fetch()); // loaded
        assert!(scope.is_loaded());
    }

    /// Test: a degraded (empty) fetch still counts as loaded.
    #[test]
    fn test_empty_fetch_counts_as_loaded() {
        let mut scope = FolderScope::new();
        assert!(scope.begin_fetch());
        scope.complete_fetch(Vec::new());
        assert!(scope.is_loaded());
        assert!(!scope.begin_fetch());
    }

    /// Test: filter is a case-insensitive substring match on names.
    #[test]
    fn test_filter_case_insensitive() {
        let mut scope = FolderScope::new();
        scope.begin_fetch();
        scope.complete_fetch(catalog());

        let hits = scope.filter("eng");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Engineering");

        assert_eq!(scope.filter("").len(), 2);
        assert!(scope.filter("marketing").is_empty());
    }

    /// Test: selection is immediate and clearable.
    #[test]
    fn test_select() {
        let mut scope = FolderScope::new();
        scope.begin_fetch();
        scope.complete_fetch(catalog());

        scope.select(Some("2".to_string()));
        assert_eq!(scope.selected(), Some("2"));
        assert_eq!(scope.selected_folder().unwrap().name, "Finance");

        scope.select(None);
        assert_eq!(scope.selected(), None);
    }
}
