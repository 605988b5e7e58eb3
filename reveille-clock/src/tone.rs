//! Alarm tone catalog and resolution.
//!
//! Definitions reference tones by string id. Resolution never fails:
//! an id that matches neither a built-in nor a custom tone falls back
//! to the first built-in, so a deleted custom tone degrades to the
//! default sound instead of a silent alarm.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tracing::prelude::*;

/// A named audio resource an alarm rings with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub custom: bool,
}

/// Built-in tones plus user-added custom tones.
#[derive(Debug)]
pub struct ToneCatalog {
    builtin: Vec<Tone>,
    custom: Vec<Tone>,
    custom_path: Option<PathBuf>,
}

impl ToneCatalog {
    /// Catalog of built-ins only; custom tones are kept in memory and
    /// not persisted.
    pub fn new() -> Self {
        Self {
            builtin: builtin_tones(),
            custom: Vec::new(),
            custom_path: None,
        }
    }

    /// Catalog with custom tones persisted at `path`.
    ///
    /// The file is read once here and rewritten after every addition.
    /// A missing file is an empty custom list; read or parse failures
    /// are logged and likewise degrade to empty.
    pub async fn with_custom_file(path: PathBuf) -> Self {
        let custom = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<Tone>>(&bytes) {
                Ok(tones) => tones,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable custom tone file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read custom tone file");
                Vec::new()
            }
        };

        Self {
            builtin: builtin_tones(),
            custom,
            custom_path: Some(path),
        }
    }

    /// Look up a tone by id, falling back to the default tone.
    ///
    /// Built-ins shadow custom tones with the same id.
    pub fn resolve(&self, id: &str) -> &Tone {
        self.builtin
            .iter()
            .find(|tone| tone.id == id)
            .or_else(|| self.custom.iter().find(|tone| tone.id == id))
            .unwrap_or(&self.builtin[0])
    }

    /// All tones, built-ins first.
    pub fn tones(&self) -> impl Iterator<Item = &Tone> {
        self.builtin.iter().chain(self.custom.iter())
    }

    /// Add a custom tone and persist the custom list.
    ///
    /// A save failure is logged; the tone stays available for this
    /// session either way.
    pub async fn add_custom(&mut self, id: String, name: String, uri: String) {
        self.custom.push(Tone {
            id,
            name,
            uri,
            custom: true,
        });
        self.save_custom().await;
    }

    async fn save_custom(&self) {
        let Some(path) = &self.custom_path else {
            return;
        };

        let bytes = match serde_json::to_vec_pretty(&self.custom) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode custom tones");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(path, bytes).await {
            warn!(path = %path.display(), error = %e, "Failed to write custom tone file");
        }
    }
}

impl Default for ToneCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_tones() -> Vec<Tone> {
    [
        (
            "default",
            "Default",
            "https://assets.mixkit.co/active_storage/sfx/212/212-preview.mp3",
        ),
        (
            "digital",
            "Digital",
            "https://assets.mixkit.co/active_storage/sfx/2003/2003-preview.mp3",
        ),
        (
            "classic",
            "Classic",
            "https://assets.mixkit.co/active_storage/sfx/1028/1028-preview.mp3",
        ),
        (
            "gentle",
            "Gentle",
            "https://assets.mixkit.co/active_storage/sfx/2474/2474-preview.mp3",
        ),
        (
            "nature",
            "Nature",
            "https://assets.mixkit.co/active_storage/sfx/2532/2532-preview.mp3",
        ),
    ]
    .into_iter()
    .map(|(id, name, uri)| Tone {
        id: id.to_string(),
        name: name.to_string(),
        uri: uri.to_string(),
        custom: false,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(1);
        std::env::temp_dir().join(format!("reveille-tones-{name}-{suffix}.json"))
    }

    #[test]
    fn resolves_builtin_by_id() {
        let catalog = ToneCatalog::new();
        let tone = catalog.resolve("classic");
        assert_eq!(tone.name, "Classic");
        assert!(!tone.custom);
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let catalog = ToneCatalog::new();
        assert_eq!(catalog.resolve("no-such-tone").id, "default");
    }

    #[tokio::test]
    async fn custom_tone_resolves_after_add() {
        let mut catalog = ToneCatalog::new();
        catalog
            .add_custom(
                "rooster".to_string(),
                "Rooster".to_string(),
                "file:///sounds/rooster.mp3".to_string(),
            )
            .await;

        let tone = catalog.resolve("rooster");
        assert_eq!(tone.name, "Rooster");
        assert!(tone.custom);
    }

    #[tokio::test]
    async fn builtin_shadows_custom_with_same_id() {
        let mut catalog = ToneCatalog::new();
        catalog
            .add_custom(
                "default".to_string(),
                "Impostor".to_string(),
                "file:///impostor.mp3".to_string(),
            )
            .await;

        assert_eq!(catalog.resolve("default").name, "Default");
    }

    #[tokio::test]
    async fn custom_tones_persist_across_catalogs() {
        let path = temp_file("persist");

        let mut catalog = ToneCatalog::with_custom_file(path.clone()).await;
        catalog
            .add_custom(
                "waves".to_string(),
                "Waves".to_string(),
                "file:///waves.mp3".to_string(),
            )
            .await;

        let reloaded = ToneCatalog::with_custom_file(path.clone()).await;
        assert_eq!(reloaded.resolve("waves").name, "Waves");

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_custom_file_loads_empty() {
        let catalog = ToneCatalog::with_custom_file(temp_file("missing")).await;
        assert_eq!(catalog.tones().count(), 5);
    }

    #[tokio::test]
    async fn corrupt_custom_file_loads_empty() {
        let path = temp_file("corrupt");
        std::fs::write(&path, b"not json").unwrap();

        let catalog = ToneCatalog::with_custom_file(path.clone()).await;
        assert_eq!(catalog.tones().count(), 5);

        let _ = std::fs::remove_file(path);
    }
}
