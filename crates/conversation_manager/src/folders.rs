//! Folder registry - flat collection of named group records

use chat_core::{Folder, FolderKind};

/// Owns the folder records. Insertion order is preserved; nothing else about
/// ordering is guaranteed.
#[derive(Debug, Clone, Default)]
pub struct FolderRegistry {
    folders: Vec<Folder>,
}

impl FolderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_folders(folders: Vec<Folder>) -> Self {
        Self { folders }
    }

    /// Create a folder and add it to the registry.
    pub fn create(&mut self, name: impl Into<String>, kind: FolderKind) -> Folder {
        let folder = Folder::new(name, kind);
        self.folders.push(folder.clone());
        folder
    }

    /// Rename a folder. Returns false when the id is unknown.
    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.folders.iter_mut().find(|f| f.id == id) {
            Some(folder) => {
                folder.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Remove a folder. Returns false when the id is unknown. Member
    /// conversations are the caller's responsibility (cascade-to-orphan).
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        self.folders.len() != before
    }

    /// Drop every folder of the given kind.
    pub fn remove_kind(&mut self, kind: FolderKind) {
        self.folders.retain(|f| f.kind != kind);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.folders.iter().any(|f| f.id == id)
    }

    pub fn as_slice(&self) -> &[Folder] {
        &self.folders
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}
