//! Display preferences kept on the terminal.

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, StorageError, keys};

/// Colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored theme, or light. An unrecognised value also reads as light.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        Ok(match store.get(keys::THEME)?.as_deref() {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        })
    }

    /// Persist this theme.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written.
    pub fn save(self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        store.set(keys::THEME, self.as_str())
    }

    /// Flip the stored theme and return the new one.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or written.
    pub fn toggle(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let next = Self::load(store)?.toggled();
        next.save(store)?;
        Ok(next)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
