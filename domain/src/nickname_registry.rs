//! Nickname registration, the one-time gate a client passes before it may
//! subscribe to push alerts.
//!
//! Nicknames are case-insensitive and stored lowercase in a pretty-printed
//! JSON array so the file stays hand-editable.

use crate::error::Error;
use log::*;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    Invalid,
    Taken,
}

impl RegistrationOutcome {
    /// User-facing explanation for a rejected registration.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            RegistrationOutcome::Registered => None,
            RegistrationOutcome::Invalid => Some("Invalid nickname"),
            RegistrationOutcome::Taken => Some("Nickname already taken"),
        }
    }
}

pub struct NicknameRegistry {
    path: PathBuf,
    nicknames: Mutex<Vec<String>>,
}

impl NicknameRegistry {
    /// Loads the registry from `path`. A missing or unreadable file yields an
    /// empty registry; the file is (re)written on the first registration.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let nicknames = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<Vec<String>>(&contents) {
                Ok(nicknames) => {
                    info!("Loaded {} nickname(s) from {}", nicknames.len(), path.display());
                    nicknames
                }
                Err(e) => {
                    error!("Error reading nicknames file {}: {e}", path.display());
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No nicknames file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                error!("Error reading nicknames file {}: {e}", path.display());
                Vec::new()
            }
        };

        Self {
            path,
            nicknames: Mutex::new(nicknames),
        }
    }

    /// Registers `nickname` unless it is blank or already taken, then
    /// persists the list. On a write failure the registration is undone.
    pub async fn register(&self, nickname: &str) -> Result<RegistrationOutcome, Error> {
        let Some(normalized) = normalize(nickname) else {
            return Ok(RegistrationOutcome::Invalid);
        };

        let mut nicknames = self.nicknames.lock().await;
        if nicknames.contains(&normalized) {
            return Ok(RegistrationOutcome::Taken);
        }

        nicknames.push(normalized);
        let json = serde_json::to_string_pretty(&*nicknames)?;
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            error!("Failed to persist nicknames to {}: {e}", self.path.display());
            nicknames.pop();
            return Err(e.into());
        }

        info!("Registered nickname ({} total)", nicknames.len());
        Ok(RegistrationOutcome::Registered)
    }

    pub async fn contains(&self, nickname: &str) -> bool {
        match normalize(nickname) {
            Some(normalized) => self.nicknames.lock().await.contains(&normalized),
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.nicknames.lock().await.len()
    }
}

fn normalize(nickname: &str) -> Option<String> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
