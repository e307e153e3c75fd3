//! Guidance loading and categorization.
//!
//! A flat directory of reference documents is re-scanned fresh on every
//! request (freshness over latency). Category is inferred purely from
//! filename substrings; each file's text is wrapped with delimiters naming
//! the source file so provenance survives inside the prompt.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::extract::extract_file_text;

/// The three guidance categories. Every bundle carries exactly these three,
/// with the empty string as the valid "no guidance" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    JobDescription,
    Resume,
    CoverLetter,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::JobDescription => "job_description",
            Category::Resume => "resume",
            Category::CoverLetter => "cover_letter",
        }
    }

    /// Filename substring that routes a file into this category.
    fn pattern(self) -> &'static str {
        match self {
            Category::JobDescription => "jd",
            Category::Resume => "resume",
            Category::CoverLetter => "cover letter",
        }
    }
}

/// Precedence order for classification. First match wins.
const CLASSIFY_ORDER: [Category; 3] = [
    Category::JobDescription,
    Category::Resume,
    Category::CoverLetter,
];

/// Classifies a guidance file by case-insensitive substring match on its
/// name: "jd", then "resume", then "cover letter". A file matching none
/// belongs to no category. A file matching several is kept under the first
/// pattern in precedence order and logged, so the conflict is visible.
pub fn classify(filename: &str) -> Option<Category> {
    let lower = filename.to_lowercase();
    let matched: Vec<Category> = CLASSIFY_ORDER
        .into_iter()
        .filter(|category| lower.contains(category.pattern()))
        .collect();

    if matched.len() > 1 {
        warn!(
            "guidance file '{filename}' matches multiple categories, keeping '{}' by precedence",
            matched[0].as_str()
        );
    }

    matched.first().copied()
}

/// Concatenated guidance text per category. An empty string means "no
/// guidance matched", never "missing".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidanceBundle {
    pub job_description: String,
    pub resume: String,
    pub cover_letter: String,
}

impl GuidanceBundle {
    fn slot_mut(&mut self, category: Category) -> &mut String {
        match category {
            Category::JobDescription => &mut self.job_description,
            Category::Resume => &mut self.resume,
            Category::CoverLetter => &mut self.cover_letter,
        }
    }
}

/// Scans `dir` and builds the per-category guidance blobs.
///
/// Entries are visited in lexicographic filename order, so the result is
/// byte-identical across loads of an unchanged directory. A file that fails
/// to extract is logged and skipped; a missing directory yields the empty
/// bundle. Classification happens before extraction, so unmatched files are
/// never parsed.
pub fn load_guidance_blocking(dir: &Path) -> GuidanceBundle {
    let mut bundle = GuidanceBundle::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            warn!("guidance directory '{}' not found", dir.display());
            return bundle;
        }
    };

    let mut names: Vec<std::ffi::OsString> = entries
        .filter_map(|entry| entry.ok().map(|e| e.file_name()))
        .collect();
    names.sort();

    for name in names {
        let Some(filename) = name.to_str() else {
            warn!("skipping guidance file with a non-UTF-8 name");
            continue;
        };
        let Some(category) = classify(filename) else {
            debug!("guidance file '{filename}' matches no category, ignoring");
            continue;
        };

        match extract_file_text(&dir.join(filename)) {
            Ok(Some(text)) if !text.is_empty() => {
                bundle.slot_mut(category).push_str(&format!(
                    "--- START OF GUIDANCE: {filename} ---\n{text}\n--- END OF GUIDANCE: {filename} ---\n\n"
                ));
                debug!("loaded guidance '{filename}' into {}", category.as_str());
            }
            Ok(Some(_)) => debug!("guidance file '{filename}' is empty, skipping"),
            Ok(None) => {} // unrecognized extension
            Err(e) => warn!("failed to extract guidance file '{filename}': {e:#}"),
        }
    }

    bundle
}

/// Runs the directory scan on the blocking pool.
pub async fn load_guidance(dir: PathBuf) -> Result<GuidanceBundle, AppError> {
    tokio::task::spawn_blocking(move || load_guidance_blocking(&dir))
        .await
        .map_err(|e| AppError::Internal(anyhow!("guidance loading task failed: {e}")))
}
