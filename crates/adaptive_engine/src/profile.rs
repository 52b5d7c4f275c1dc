//! Persistence of the learned profile.
//!
//! The profile is a single pretty-printed JSON document holding a
//! [`LearningState`]. Loading never fails: a missing, empty or unreadable
//! file yields the defaults, which are written back straight away so the
//! next start finds a valid file. Writes go to a sibling temp file that is
//! then renamed over the target.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProfileError;
use crate::learning::LearningState;

/// Default profile file name
pub const PROFILE_FILENAME: &str = "learning_data.json";

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and validates the stored profile without any fallback.
    pub fn try_load(&self) -> Result<LearningState, ProfileError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProfileError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(ProfileError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Err(ProfileError::Empty {
                path: self.path.clone(),
            });
        }
        serde_json::from_str(&contents).map_err(|source| ProfileError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Loads the profile, falling back to (and persisting) defaults.
    pub fn load(&self) -> LearningState {
        let mut state = match self.try_load() {
            Ok(state) => {
                tracing::info!(path = ?self.path, games = state.games, elo = state.elo, "profile loaded");
                state
            }
            Err(ProfileError::Missing { .. }) => {
                tracing::info!(path = ?self.path, "no profile found, creating default");
                self.persist_or_log(&LearningState::default());
                return LearningState::default();
            }
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "profile unusable, resetting to defaults");
                self.persist_or_log(&LearningState::default());
                return LearningState::default();
            }
        };

        if state.normalize() {
            tracing::warn!(path = ?self.path, "profile values out of range were clamped");
            self.persist_or_log(&state);
        }
        state
    }

    /// Atomically replaces the stored profile.
    pub fn save(&self, state: &LearningState) -> Result<(), ProfileError> {
        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ProfileError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|source| ProfileError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| ProfileError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = ?self.path, "profile saved");
        Ok(())
    }

    /// Saves and logs failures; used where the caller has no way to react.
    pub fn persist_or_log(&self, state: &LearningState) {
        if let Err(err) = self.save(state) {
            tracing::error!(path = ?self.path, error = %err, "failed to save profile");
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from(PROFILE_FILENAME));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new(PROFILE_FILENAME)
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod profile_tests;
