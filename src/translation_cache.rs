//! Persistent cache of artist-name translations.
//!
//! Stored as a single JSON object (`{"original": "translated", …}`) in
//! `~/.cache/lbmapper/translations.json`.  The whole file is rewritten through a
//! temporary file after every new entry, so a crash loses at most the entry
//! being written.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{MapperError, Result};

/// Best-effort default location (`~/.cache/lbmapper/translations.json`).
pub fn default_cache_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| {
        PathBuf::from(h)
            .join(".cache")
            .join("lbmapper")
            .join("translations.json")
    })
}

#[derive(Debug, Default)]
pub struct TranslationCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl TranslationCache {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`.  A missing file gives an empty cache; a
    /// corrupt one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Ignoring unreadable translation cache {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} cached translation(s) from {}", entries.len(), path.display());
        Ok(TranslationCache {
            path: Some(path),
            entries,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// Store a translation and persist immediately.
    ///
    /// Entries are never replaced: if `original` is already cached with a
    /// different value the existing value wins and a warning is logged.
    pub fn put(&mut self, original: &str, translated: &str) -> Result<()> {
        match self.entries.get(original) {
            Some(existing) if existing == translated => return Ok(()),
            Some(existing) => {
                warn!(
                    "Keeping cached translation {:?} -> {:?} (ignoring {:?})",
                    original, existing, translated
                );
                return Ok(());
            }
            None => {}
        }
        self.entries
            .insert(original.to_string(), translated.to_string());
        self.save()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| MapperError::Cache(format!("tempfile in {}: {e}", dir.display())))?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), &self.entries)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.persist(path)
            .map_err(|e| MapperError::Cache(format!("persist {}: {e}", path.display())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranslationCache::open(dir.path().join("translations.json")).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.get("初音ミク"), None);
    }

    #[test]
    fn test_put_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("translations.json");

        let mut cache = TranslationCache::open(&path).unwrap();
        cache.put("初音ミク", "Hatsune Miku").unwrap();
        assert_eq!(cache.get("初音ミク"), Some("Hatsune Miku"));
        drop(cache);

        let reopened = TranslationCache::open(&path).unwrap();
        assert_eq!(reopened.get("初音ミク"), Some("Hatsune Miku"));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_existing_entry_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.json");

        let mut cache = TranslationCache::open(&path).unwrap();
        cache.put("米津玄師", "Kenshi Yonezu").unwrap();
        cache.put("米津玄師", "Yonezu Kenshi").unwrap();
        assert_eq!(cache.get("米津玄師"), Some("Kenshi Yonezu"));

        let reopened = TranslationCache::open(&path).unwrap();
        assert_eq!(reopened.get("米津玄師"), Some("Kenshi Yonezu"));
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.json");
        fs::write(&path, "{not json").unwrap();

        let mut cache = TranslationCache::open(&path).unwrap();
        assert!(cache.is_empty());
        cache.put("a", "b").unwrap();
        assert_eq!(TranslationCache::open(&path).unwrap().get("a"), Some("b"));
    }

    #[test]
    fn test_reads_plain_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.json");
        fs::write(&path, r#"{"宇多田ヒカル": "Hikaru Utada"}"#).unwrap();
        let cache = TranslationCache::open(&path).unwrap();
        assert_eq!(cache.get("宇多田ヒカル"), Some("Hikaru Utada"));
    }

    #[test]
    fn test_in_memory_cache_never_touches_disk() {
        let mut cache = TranslationCache::in_memory();
        cache.put("a", "b").unwrap();
        assert_eq!(cache.get("a"), Some("b"));
        assert!(cache.path().is_none());
    }
}
