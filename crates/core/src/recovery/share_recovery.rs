//! Re-links existing drawing files under `uploads/parts/` to parts.
//!
//! After a database reset the physical files survive but their records,
//! links and `Part.file_id` denormalizations are gone. Recovery walks the
//! per-part folders in two phases:
//!
//!   Phase 1: folder name equals a part's `article_number` (direct match)
//!   Phase 2: for unmatched folders, PDF filenames are token-matched against
//!            all known article numbers - the same word-boundary logic the
//!            document importer uses
//!
//! Records are registered against the files in place (hash and size read
//! from disk, nothing is copied). Each folder's PDFs are linked as drawings;
//! the alphabetically first one becomes primary and lands in
//! `Part.file_id`. Work is committed in folder batches.

use log::{info, warn};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::errors::Result;
use crate::files::{validation, FileLinkRequest, FileRepositoryTrait, FileStatus, NewFileRecord};
use crate::importers::document::contains_bordered_token;
use crate::parts::PartRepositoryTrait;

/// Folders are processed and committed in groups of this size.
const BATCH_SIZE: usize = 50;

/// Export suffixes stripped from filenames before matching.
fn strip_suffixes() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)[-_](nabidka|draw)\b").unwrap())
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    pub folders_scanned: usize,
    pub folders_matched: usize,
    pub files_registered: usize,
    pub links_created: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

pub struct ShareRecoveryImporter {
    uploads_root: PathBuf,
    parts: Arc<dyn PartRepositoryTrait>,
    files: Arc<dyn FileRepositoryTrait>,
}

impl ShareRecoveryImporter {
    pub fn new(
        uploads_root: impl Into<PathBuf>,
        parts: Arc<dyn PartRepositoryTrait>,
        files: Arc<dyn FileRepositoryTrait>,
    ) -> Self {
        Self {
            uploads_root: uploads_root.into(),
            parts,
            files,
        }
    }

    /// Scans `uploads/parts/*/` and re-attaches what it can. With `dry_run`
    /// nothing is written; the report shows what would happen.
    pub async fn recover(&self, dry_run: bool) -> Result<RecoveryReport> {
        let parts_dir = self.uploads_root.join("parts");
        let mut report = RecoveryReport::default();

        if !parts_dir.exists() {
            warn!("Directory not found: {}", parts_dir.display());
            return Ok(report);
        }

        let mut folders: Vec<PathBuf> = std::fs::read_dir(&parts_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        info!("Found {} folders in {}", folders.len(), parts_dir.display());

        // article_number (exact and lowercase) → (part id, part number)
        let all_parts = self.parts.list_active()?;
        let mut by_article: HashMap<String, (i64, String)> = HashMap::new();
        let mut by_article_lower: HashMap<String, (i64, String)> = HashMap::new();
        for part in &all_parts {
            if let Some(article) = &part.article_number {
                by_article.insert(article.clone(), (part.id, part.part_number.clone()));
                let key = article.to_lowercase().trim().to_string();
                if !key.is_empty() {
                    by_article_lower.insert(key, (part.id, part.part_number.clone()));
                }
            }
        }
        info!("Loaded {} active parts with article numbers", by_article.len());

        // Parts that already carry an active drawing link are left alone:
        // recovery must never clobber an existing primary-drawing assignment.
        let all_part_ids: Vec<i64> = all_parts.iter().map(|p| p.id).collect();
        let already_linked: HashSet<i64> = self
            .files
            .entities_with_links("part", "drawing", &all_part_ids)?
            .into_iter()
            .collect();
        info!("{} parts already have a drawing link", already_linked.len());

        for batch in folders.chunks(BATCH_SIZE) {
            for folder in batch {
                report.folders_scanned += 1;
                let folder_name = folder
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();

                // Phase 1: direct folder-name match.
                let mut target = by_article.get(&folder_name).cloned();

                let pdfs = list_pdfs(folder)?;
                if pdfs.is_empty() {
                    report.skipped += 1;
                    continue;
                }

                // Phase 2: filename token match for unmatched folders.
                if target.is_none() {
                    for pdf in &pdfs {
                        let filename = pdf
                            .file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or_default();
                        if let Some(found) = match_filename_to_article(filename, &by_article_lower)
                        {
                            target = Some(found);
                            break;
                        }
                    }
                }

                let Some((part_id, part_number)) = target else {
                    report.skipped += 1;
                    continue;
                };

                if already_linked.contains(&part_id) {
                    info!(
                        "Skipping '{folder_name}': part {part_number} already has a drawing link"
                    );
                    report.skipped += 1;
                    continue;
                }
                report.folders_matched += 1;

                if dry_run {
                    info!(
                        "[dry-run] would attach {} PDFs from '{folder_name}' to part \
                         {part_number}",
                        pdfs.len()
                    );
                    continue;
                }

                // Alphabetically first PDF becomes the primary drawing.
                for (index, pdf) in pdfs.iter().enumerate() {
                    match self.register_pdf(pdf, part_id, index == 0).await {
                        Ok(registered) => {
                            if registered {
                                report.files_registered += 1;
                                report.links_created += 1;
                            } else {
                                report.skipped += 1;
                            }
                        }
                        Err(e) => {
                            let message =
                                format!("Failed to register {}: {e}", pdf.display());
                            warn!("{message}");
                            report.errors.push(message);
                        }
                    }
                }
            }

            info!(
                "Recovery progress: {}/{} folders, {} files registered",
                report.folders_scanned,
                folders.len(),
                report.files_registered
            );
        }

        info!(
            "Recovery complete: {} folders matched, {} files registered, {} links, \
             {} skipped, {} errors",
            report.folders_matched,
            report.files_registered,
            report.links_created,
            report.skipped,
            report.errors.len()
        );
        Ok(report)
    }

    /// Registers one PDF in place: record (hash + size, no copy), drawing
    /// link, and for the primary one the `Part.file_id` denormalization.
    /// Returns false when the path is already registered.
    async fn register_pdf(&self, pdf: &Path, part_id: i64, primary: bool) -> Result<bool> {
        let relative = pdf
            .strip_prefix(&self.uploads_root)
            .unwrap_or(pdf)
            .to_string_lossy()
            .replace('\\', "/");

        if self.files.path_exists(&relative)? {
            return Ok(false);
        }

        let filename = pdf
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let content_hash = sha256_file(pdf)?;
        let size = std::fs::metadata(pdf)?.len() as i64;

        let record = self
            .files
            .insert(NewFileRecord {
                file_hash: content_hash,
                file_path: relative,
                original_filename: filename,
                file_size: size,
                file_type: "pdf".to_string(),
                mime_type: validation::mime_type_for("pdf").to_string(),
                status: FileStatus::Active,
                created_by: Some("recovery".to_string()),
            })
            .await?;

        self.files
            .upsert_link(FileLinkRequest {
                file_id: record.id,
                entity_type: "part".to_string(),
                entity_id: part_id,
                is_primary: primary,
                revision: None,
                link_type: "drawing".to_string(),
                created_by: Some("recovery".to_string()),
            })
            .await?;

        if primary {
            self.parts
                .set_primary_file(part_id, record.id, Some("recovery".to_string()))
                .await?;
        }

        Ok(true)
    }
}

fn list_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("pdf"))
                    .unwrap_or(false)
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Token-matches a PDF filename against known article numbers. Longest
/// identifier wins, exactly like the document importer.
pub fn match_filename_to_article(
    pdf_filename: &str,
    lookup: &HashMap<String, (i64, String)>,
) -> Option<(i64, String)> {
    let mut stem = pdf_filename.to_lowercase().trim().to_string();
    if let Some(stripped) = stem.strip_suffix(".pdf") {
        stem = stripped.to_string();
    }
    let stem = strip_suffixes().replace_all(&stem, "").to_string();

    if let Some(found) = lookup.get(&stem) {
        return Some(found.clone());
    }

    let mut token_matches: Vec<(&String, &(i64, String))> = lookup
        .iter()
        .filter(|(identifier, _)| contains_bordered_token(&stem, identifier))
        .collect();
    token_matches.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    token_matches.first().map(|(_, found)| (*found).clone())
}

fn sha256_file(path: &Path) -> Result<String> {
    use std::io::Read;

    let mut hasher = Sha256::new();
    let mut file = std::fs::File::open(path)?;
    let mut buffer = [0u8; 4096];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
