//! Overlay asset catalog and the process-wide selection.
//!
//! The catalog is fixed for the lifetime of the process. [`SelectionState`]
//! holds the active asset as an atomic index so an input thread can publish a
//! new choice while the frame loop reads it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

/// Opaque handle to one entry of a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayAsset(usize);

impl OverlayAsset {
    /// Position of this asset in its catalog.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A renderable eyewear image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetEntry {
    pub name: String,
    pub path: PathBuf,
}

impl AssetEntry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("overlay catalog is empty")]
    Empty,

    #[error("duplicate overlay asset name: {0}")]
    DuplicateName(String),
}

/// Ordered, non-empty list of selectable overlays.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<AssetEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<AssetEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.name.eq_ignore_ascii_case(&entry.name)) {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// The eyewear shipped with the app.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                AssetEntry::new("sun", "assets/sun.png"),
                AssetEntry::new("aviator", "assets/aviator.png"),
                AssetEntry::new("round", "assets/round.png"),
                AssetEntry::new("cat-eye", "assets/cat-eye.png"),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> OverlayAsset {
        OverlayAsset(0)
    }

    pub fn get(&self, index: usize) -> Option<OverlayAsset> {
        (index < self.entries.len()).then_some(OverlayAsset(index))
    }

    pub fn find(&self, name: &str) -> Option<OverlayAsset> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
            .map(OverlayAsset)
    }

    pub fn entry(&self, asset: OverlayAsset) -> &AssetEntry {
        match self.entries.get(asset.0) {
            Some(entry) => entry,
            // Handle from another catalog; a catalog is never empty
            None => &self.entries[0],
        }
    }

    pub fn name(&self, asset: OverlayAsset) -> &str {
        &self.entry(asset).name
    }

    pub fn path(&self, asset: OverlayAsset) -> &Path {
        &self.entry(asset).path
    }

    /// The asset after `asset`, wrapping around.
    pub fn next(&self, asset: OverlayAsset) -> OverlayAsset {
        OverlayAsset((asset.0 + 1) % self.entries.len())
    }

    /// The asset before `asset`, wrapping around.
    pub fn prev(&self, asset: OverlayAsset) -> OverlayAsset {
        let len = self.entries.len();
        OverlayAsset((asset.0 + len - 1) % len)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OverlayAsset, &AssetEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (OverlayAsset(i), e))
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (asset, entry) in self.iter() {
            writeln!(f, "[{}] {} ({})", asset.0, entry.name, entry.path.display())?;
        }
        Ok(())
    }
}

/// The currently active overlay. Last write wins.
#[derive(Debug)]
pub struct SelectionState {
    current: AtomicUsize,
}

impl SelectionState {
    /// Start on the catalog's first entry.
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_initial(catalog.first())
    }

    pub fn with_initial(asset: OverlayAsset) -> Self {
        Self {
            current: AtomicUsize::new(asset.0),
        }
    }

    pub fn select(&self, asset: OverlayAsset) {
        let previous = self.current.swap(asset.0, Ordering::AcqRel);
        if previous != asset.0 {
            log::debug!("Overlay selection changed: {} -> {}", previous, asset.0);
        }
    }

    pub fn current(&self) -> OverlayAsset {
        OverlayAsset(self.current.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            AssetEntry::new("a", "a.png"),
            AssetEntry::new("b", "b.png"),
            AssetEntry::new("c", "c.png"),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert_eq!(Catalog::new(vec![]).unwrap_err(), CatalogError::Empty);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Catalog::new(vec![
            AssetEntry::new("a", "1.png"),
            AssetEntry::new("a", "2.png"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateName("a".to_string()));

        let err = Catalog::new(vec![
            AssetEntry::new("Sun", "1.png"),
            AssetEntry::new("sun", "2.png"),
        ])
        .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateName("sun".to_string()));
    }

    #[test]
    fn test_default_selection_is_first_entry() {
        let catalog = catalog();
        let selection = SelectionState::new(&catalog);
        assert_eq!(catalog.name(selection.current()), "a");
    }

    #[test]
    fn test_select_overwrites() {
        let catalog = catalog();
        let selection = SelectionState::new(&catalog);
        let c = catalog.find("c").unwrap();
        selection.select(c);
        assert_eq!(selection.current(), c);
        selection.select(catalog.first());
        assert_eq!(selection.current(), catalog.first());
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let catalog = catalog();
        let last = catalog.get(2).unwrap();
        assert_eq!(catalog.next(last), catalog.first());
        assert_eq!(catalog.prev(catalog.first()), last);
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = catalog();
        assert_eq!(catalog.find("B"), catalog.get(1));
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_get_out_of_range() {
        assert!(catalog().get(3).is_none());
    }

    #[test]
    fn test_builtin_catalog_starts_with_sun() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.name(catalog.first()), "sun");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_foreign_handle_falls_back_to_first_entry() {
        let catalog = catalog();
        let foreign = OverlayAsset(4);
        assert_eq!(catalog.name(foreign), "a");
        assert_eq!(catalog.path(foreign), Path::new("a.png"));
    }

    #[test]
    fn test_display_lists_entries() {
        let text = catalog().to_string();
        assert!(text.contains("[0] a (a.png)"));
        assert!(text.contains("[2] c (c.png)"));
    }
}
