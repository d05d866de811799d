//! Title cleanup for catalog searches.
//!
//! Streaming services decorate track and release titles with edit markers,
//! arrangement credits, movement names and edition suffixes that the catalog
//! does not carry.  Stripping them gives a second, broader query.
//!
//! Every pattern is anchored at the end of the string.  Patterns are applied
//! repeatedly until nothing changes, so stacked suffixes like
//! `"Song (Live) (feat. X)"` are removed in full and the result is a fixpoint.

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffixes removed from track names.
static TRACK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // Edit markers: "- TV Edit -", "(TV Size)", "[Radio Edit]"
        Regex::new(r"(?i)\s*[-–—]\s*(?:TV|Radio|Album|Single|Live|Acoustic|Orchestral|Instrumental|Original|Deluxe|Bonus)\s+\w*\s*[-–—]?\s*$").unwrap(),
        Regex::new(r"(?i)\s*\((?:TV|Radio|Album|Single|Live|Acoustic|Orchestral|Instrumental|Original|Deluxe)\s*[^)]*\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\[(?:TV|Radio|Album|Single|Live|Acoustic|Orchestral|Instrumental|Original|Deluxe)\s*[^\]]*\]\s*$").unwrap(),
        // Arrangement / transcription credits: "(Arr. Cortot for Piano)"
        Regex::new(r"(?i)\s*\(Arr\..*?\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\[Arr\..*?\]\s*$").unwrap(),
        Regex::new(r"(?i)\s*\(Transcr\..*?\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\[Transcr\..*?\]\s*$").unwrap(),
        // "(Version for Solo Piano)", "(Acoustic Guitar Version)"
        Regex::new(r"(?i)\s*\(Version for [^)]+\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\([^)]+ Version\)\s*$").unwrap(),
        // Movement / tempo after a colon: "Piano Concerto No. 21: Allegro"
        Regex::new(r"(?i):\s*(?:Allegro|Andante|Adagio|Moderato|Presto|Vivace|Largo|Grave|Lento|Scherzo|Minuet|Rondo|Finale)\b.*$").unwrap(),
        // Key signature: "Sonata in A Major"
        Regex::new(r"(?i)\s+in\s+[A-G][#b♯♭]?\s+(?:Major|Minor|Maj|Min)\s*$").unwrap(),
        // Featured artists: "(feat. X)", "[feat. X]"
        Regex::new(r"(?i)\s*\(feat\.\s+[^)]+\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\[feat\.\s+[^\]]+\]\s*$").unwrap(),
    ]
});

/// Suffixes removed from release names.
static RELEASE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "- Single", "- EP"
        Regex::new(r"(?i)\s*-\s*(?:Single|EP)\s*$").unwrap(),
        // "(Deluxe Version)", "[Special Edition]", "(Bonus)"
        Regex::new(r"(?i)\s*\((?:Deluxe|Special|Bonus|Extended)\s*(?:Version|Edition)?\)\s*$").unwrap(),
        Regex::new(r"(?i)\s*\[(?:Deluxe|Special|Bonus|Extended)\s*(?:Version|Edition)?\]\s*$").unwrap(),
    ]
});

fn strip_to_fixpoint(name: &str, patterns: &[Regex]) -> String {
    let mut current = name.trim().to_string();
    loop {
        let mut next = current.clone();
        for pattern in patterns {
            next = pattern.replace(&next, "").into_owned();
        }
        let next = next.trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Strip edit markers, credits, movement and key annotations from a track name.
pub fn normalize_track(name: &str) -> String {
    strip_to_fixpoint(name, &TRACK_PATTERNS)
}

/// Strip "- Single"/"- EP" and edition suffixes from a release name.
pub fn normalize_release(name: &str) -> String {
    strip_to_fixpoint(name, &RELEASE_PATTERNS)
}

/// The original name plus its normalized form, when that form is non-empty
/// and actually different.
pub fn track_variants(name: &str) -> Vec<String> {
    variants(name, normalize_track(name))
}

/// Release counterpart of [`track_variants`].
pub fn release_variants(name: &str) -> Vec<String> {
    variants(name, normalize_release(name))
}

fn variants(original: &str, normalized: String) -> Vec<String> {
    if normalized.is_empty() || normalized == original {
        vec![original.to_string()]
    } else {
        vec![original.to_string(), normalized]
    }
}
