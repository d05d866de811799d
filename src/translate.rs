//! Artist-name translation for non-Latin scripts.
//!
//! Catalog search on a Japanese, Chinese or Korean artist name often misses
//! because the catalog credits the romanized form.  The [`Translator`] trait is
//! the plug-in point for whatever produces that form; [`CachingTranslator`]
//! puts the script check and the persistent [`TranslationCache`] in front of it.

use std::process::Command;

use log::{debug, info};

use crate::config::Config;
use crate::error::{MapperError, Result};
use crate::translation_cache::TranslationCache;

/// True if `text` contains CJK ideographs, kana, bopomofo, Hangul,
/// compatibility ideographs or halfwidth katakana.
pub fn contains_non_latin_script(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{3000}'..='\u{9fff}'
            | '\u{ac00}'..='\u{d7af}'
            | '\u{f900}'..='\u{faff}'
            | '\u{ff65}'..='\u{ff9f}')
    })
}

pub trait Translator {
    /// Translate an artist name.  Failures are errors; "no better name" is
    /// returned as the input unchanged.
    fn translate(&mut self, text: &str) -> Result<String>;
}

/// Returns its input.  Used when no translation tool is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn translate(&mut self, text: &str) -> Result<String> {
        (**self).translate(text)
    }
}

/// Runs an external program with a translation prompt as its last argument
/// and takes the trimmed stdout as the answer.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
}

impl CommandTranslator {
    /// `argv[0]` is the program, the rest are fixed leading arguments.
    pub fn new(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| MapperError::Config("translator_command is empty".into()))?;
        Ok(CommandTranslator {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn prompt(artist_name: &str) -> String {
        format!(
            "Translate the following music artist name to the English or romanized \
             form used in international music catalogs. It may be a katakana \
             transliteration of a Western name or a native CJK artist name. \
             Reply with the name only.\n\n{}",
            artist_name
        )
    }
}

impl Translator for CommandTranslator {
    fn translate(&mut self, text: &str) -> Result<String> {
        debug!("Running {} to translate {:?}", self.program, text);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(Self::prompt(text))
            .output()
            .map_err(|e| MapperError::Translation(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MapperError::Translation(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let answer = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if answer.is_empty() {
            Ok(text.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Script gate + cache in front of another translator.
pub struct CachingTranslator<T> {
    cache: TranslationCache,
    inner: T,
}

impl<T: Translator> CachingTranslator<T> {
    pub fn new(cache: TranslationCache, inner: T) -> Self {
        CachingTranslator { cache, inner }
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
}

impl CachingTranslator<Box<dyn Translator>> {
    /// The configured translation program (identity if none) behind the
    /// configured cache file (in-memory if none).
    pub fn from_config(config: &Config) -> Result<Self> {
        let inner: Box<dyn Translator> = match &config.translator_command {
            Some(argv) => Box::new(CommandTranslator::new(argv)?),
            None => Box::new(IdentityTranslator),
        };
        let cache = match &config.translation_cache {
            Some(path) => TranslationCache::open(path)?,
            None => TranslationCache::in_memory(),
        };
        Ok(CachingTranslator::new(cache, inner))
    }
}

impl<T: Translator> Translator for CachingTranslator<T> {
    fn translate(&mut self, text: &str) -> Result<String> {
        if !contains_non_latin_script(text) {
            return Ok(text.to_string());
        }
        if let Some(hit) = self.cache.get(text) {
            debug!("Translation cache hit: {} -> {}", text, hit);
            return Ok(hit.to_string());
        }

        let translated = self.inner.translate(text)?;
        let translated = translated.trim();
        // Only answers that differ from the input are cached
        if translated.is_empty() || translated == text {
            debug!("No translation for {:?}", text);
            return Ok(text.to_string());
        }
        info!("Translated artist {} -> {}", text, translated);
        self.cache.put(text, translated)?;
        Ok(translated.to_string())
    }
}
