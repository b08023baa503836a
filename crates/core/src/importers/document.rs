//! Drawing importer from the Infor document store (`SLDocumentObjects_Exts`).
//!
//! Distinct from the generic kernel: it needs bookmark-paginated metadata
//! listing followed by selective parallel binary downloads.
//!
//! Flow:
//!   1. `list_documents`  - paginated metadata fetch, no binary content
//!   2. `preview_import`  - match documents to parts, flag duplicates
//!   3. `execute_import`  - download, store, link, update `Part.file_id`

use base64::Engine;
use futures::future::join_all;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::kernel::DuplicateAction;
use crate::errors::Result;
use crate::files::{FileLinkRequest, FileService, FileStatus, StoreBytes};
use crate::parts::{Part, PartRepositoryTrait};
use gestima_infor::{CollectionRequest, InforClientTrait, InforError, RawRow};

const IDO_NAME: &str = "SLDocumentObjects_Exts";

const METADATA_PROPERTIES: [&str; 7] = [
    "DocumentName",
    "DocumentExtension",
    "DocumentType",
    "RowPointer",
    "Sequence",
    "Description",
    "StorageMethod",
];

const DEFAULT_FILTER: &str = "DocumentType IN ('Výkres-platný', 'PDF', 'Výkres')";

/// Metadata page size.
const PAGE_SIZE: i64 = 200;

/// Safety guard for the paginated metadata fetch.
const MAX_PAGES: usize = 500;

/// Max concurrent binary downloads against the gateway.
const DOWNLOAD_CONCURRENCY: usize = 10;

/// Database writes are flushed per batch of this many rows.
const COMMIT_BATCH: usize = 100;

/// One matched (or unmatched) document row staged for import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedDocument {
    pub row_index: usize,
    pub document_name: String,
    pub document_extension: String,
    pub row_pointer: String,
    pub sequence: String,
    pub description: Option<String>,
    pub matched_article_number: Option<String>,
    pub matched_part_id: Option<i64>,
    pub matched_part_number: Option<String>,
    pub is_valid: bool,
    pub is_duplicate: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub duplicate_action: DuplicateAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentImportSummary {
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct DocumentImporter {
    client: Arc<dyn InforClientTrait>,
    files: Arc<FileService>,
    parts: Arc<dyn PartRepositoryTrait>,
}

impl DocumentImporter {
    pub fn new(
        client: Arc<dyn InforClientTrait>,
        files: Arc<FileService>,
        parts: Arc<dyn PartRepositoryTrait>,
    ) -> Self {
        Self {
            client,
            files,
            parts,
        }
    }

    /// Loads document metadata without binary content, page by page.
    ///
    /// Bookmark pagination is guarded twice: a hard page cap and a repeated-
    /// bookmark check (the gateway occasionally hands the same bookmark back,
    /// which would loop forever).
    pub async fn list_documents(
        &self,
        filter: Option<&str>,
        record_cap: usize,
    ) -> Result<Vec<RawRow>> {
        let effective_filter = filter.unwrap_or(DEFAULT_FILTER);
        let mut all_rows: Vec<RawRow> = Vec::new();
        let mut seen_bookmarks: HashSet<String> = HashSet::new();
        let mut bookmark: Option<String> = None;

        info!("Listing documents from {IDO_NAME} (filter='{effective_filter}')");

        for page in 0..MAX_PAGES {
            let page_size = if record_cap > 0 {
                let remaining = record_cap.saturating_sub(all_rows.len());
                if remaining == 0 {
                    break;
                }
                (PAGE_SIZE as usize).min(remaining) as i64
            } else {
                PAGE_SIZE
            };

            let result = self
                .client
                .load_collection(
                    CollectionRequest::new(IDO_NAME, &METADATA_PROPERTIES)
                        .with_filter(effective_filter)
                        .with_record_cap(page_size)
                        .with_bookmark(bookmark.clone()),
                )
                .await?;

            let fetched = result.data.len();
            all_rows.extend(result.data);

            info!(
                "Documents page {page}: {fetched} rows (total={}, has_more={})",
                all_rows.len(),
                result.has_more
            );

            if let Some(new_bookmark) = &result.bookmark {
                if !seen_bookmarks.insert(new_bookmark.clone()) {
                    warn!(
                        "Bookmark loop detected on page {page} ({} rows so far), stopping",
                        all_rows.len()
                    );
                    break;
                }
            }

            bookmark = result.bookmark;

            if !result.has_more || bookmark.is_none() || fetched == 0 {
                break;
            }
            if record_cap > 0 && all_rows.len() >= record_cap {
                break;
            }
        }

        info!("Document listing done - {} rows", all_rows.len());
        Ok(all_rows)
    }

    /// Downloads one document's binary content by row pointer. The
    /// `DocumentObject` property carries the PDF as base64.
    pub async fn download_document(
        &self,
        row_pointer: &str,
    ) -> Result<(Vec<u8>, String, String)> {
        let result = self
            .client
            .load_collection(
                CollectionRequest::new(
                    IDO_NAME,
                    &["DocumentObject", "DocumentName", "DocumentExtension"],
                )
                .with_filter(format!("RowPointer = '{row_pointer}'"))
                .with_record_cap(1),
            )
            .await?;

        let row = result.data.into_iter().next().ok_or_else(|| {
            InforError::NotFound(format!("document row_pointer={row_pointer}"))
        })?;

        let encoded = row
            .get("DocumentObject")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                InforError::UnexpectedResponse(format!(
                    "document has no binary content: row_pointer={row_pointer}"
                ))
            })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| InforError::UnexpectedResponse(format!("base64 decode failed: {e}")))?;

        let name = row
            .get("DocumentName")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let extension = row
            .get("DocumentExtension")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("pdf")
            .to_string();

        info!("Downloaded {} bytes for '{name}' (ext={extension})", bytes.len());
        Ok((bytes, name, extension))
    }

    /// Preview: match against the active part set and flag documents whose
    /// matched part already carries an active drawing link.
    pub async fn preview_import(&self, rows: &[RawRow]) -> Result<Vec<StagedDocument>> {
        let parts = self.parts.list_active()?;
        info!("Loaded {} parts for document matching", parts.len());

        let mut staged = match_documents_to_parts(rows, &parts);

        let matched_ids: Vec<i64> = staged
            .iter()
            .filter_map(|row| row.matched_part_id)
            .collect();

        if !matched_ids.is_empty() {
            let existing: HashSet<i64> = self
                .files
                .entities_with_links("part", "drawing", &matched_ids)?
                .into_iter()
                .collect();
            for row in &mut staged {
                if let Some(part_id) = row.matched_part_id {
                    if existing.contains(&part_id) {
                        row.is_duplicate = true;
                    }
                }
            }
        }

        let duplicates = staged.iter().filter(|r| r.is_duplicate).count();
        info!(
            "Document preview complete - valid={}, duplicates={duplicates}",
            staged.iter().filter(|r| r.is_valid).count()
        );

        Ok(staged)
    }

    /// Executes the import for valid staged rows.
    ///
    /// Downloads run up to [`DOWNLOAD_CONCURRENCY`] at a time; stores, links
    /// and part updates are strictly sequential (single-writer store).
    /// Rows are processed in batches of [`COMMIT_BATCH`].
    pub async fn execute_import(
        &self,
        staged: Vec<StagedDocument>,
        created_by: &str,
    ) -> Result<DocumentImportSummary> {
        let mut summary = DocumentImportSummary::default();
        let errors: Mutex<Vec<String>> = Mutex::new(Vec::new());

        // Pre-load the affected parts so updates hit fresh rows.
        let part_ids: Vec<i64> = staged
            .iter()
            .filter(|row| row.is_valid)
            .filter_map(|row| row.matched_part_id)
            .collect();
        let parts_by_id: HashMap<i64, Part> = if part_ids.is_empty() {
            HashMap::new()
        } else {
            self.parts
                .list_active()?
                .into_iter()
                .filter(|p| part_ids.contains(&p.id))
                .map(|p| (p.id, p))
                .collect()
        };

        // Filter down to the rows worth downloading.
        let mut valid_rows: Vec<(StagedDocument, Part)> = Vec::new();
        for row in staged {
            if !row.is_valid {
                summary.skipped_count += 1;
                continue;
            }
            if row.is_duplicate && row.duplicate_action == DuplicateAction::Skip {
                summary.skipped_count += 1;
                continue;
            }
            let Some(part) = row.matched_part_id.and_then(|id| parts_by_id.get(&id)) else {
                let message = format!(
                    "Part id={:?} not found at execution time (document='{}')",
                    row.matched_part_id, row.document_name
                );
                warn!("{message}");
                errors.lock().unwrap().push(message);
                summary.skipped_count += 1;
                continue;
            };
            valid_rows.push((row, part.clone()));
        }

        info!(
            "Executing document import: {} rows ({} skipped), concurrency={DOWNLOAD_CONCURRENCY}",
            valid_rows.len(),
            summary.skipped_count
        );

        let semaphore = Arc::new(Semaphore::new(DOWNLOAD_CONCURRENCY));

        for batch in valid_rows.chunks(COMMIT_BATCH) {
            // Parallel downloads for this batch.
            let downloads = batch.iter().map(|(row, _)| {
                let semaphore = semaphore.clone();
                let errors = &errors;
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    match self.download_document(&row.row_pointer).await {
                        Ok(result) => Some(result),
                        Err(e) => {
                            let message =
                                format!("Download failed for '{}': {e}", row.document_name);
                            error!("{message}");
                            errors.lock().unwrap().push(message);
                            None
                        }
                    }
                }
            });
            let downloaded = join_all(downloads).await;

            // Sequential store + link + part update.
            let mut batch_stored = 0;
            for ((row, part), download) in batch.iter().zip(downloaded) {
                let Some((bytes, infor_name, infor_ext)) = download else {
                    summary.skipped_count += 1;
                    continue;
                };

                let extension = infor_ext.trim_start_matches('.').to_lowercase();
                let filename = if infor_name.contains('.') {
                    infor_name.clone()
                } else {
                    format!("{infor_name}.{extension}")
                };

                let article = row
                    .matched_article_number
                    .clone()
                    .unwrap_or_else(|| part.part_number.clone());
                let directory = format!("parts/{article}");

                let record = match self
                    .files
                    .store_from_bytes(StoreBytes {
                        content: &bytes,
                        filename: &filename,
                        directory: &directory,
                        allowed_types: Some(&["pdf"]),
                        status: FileStatus::Active,
                        created_by: Some(created_by),
                    })
                    .await
                {
                    Ok(record) => record,
                    Err(e) => {
                        let message =
                            format!("Store failed for '{}': {e}", row.document_name);
                        error!("{message}");
                        errors.lock().unwrap().push(message);
                        summary.skipped_count += 1;
                        continue;
                    }
                };

                // Same content already linked to a different part is a soft
                // warning - possibly a wrong drawing assignment in the ERP.
                match self
                    .files
                    .duplicate_hash_entities(&record.file_hash, record.id, "part", part.id)
                {
                    Ok(other_parts) if !other_parts.is_empty() => {
                        let message = format!(
                            "Duplicate hash: '{}' for part {article} has identical content as \
                             file(s) already linked to part id(s) {other_parts:?}",
                            row.document_name
                        );
                        warn!("{message}");
                        summary.warnings.push(message);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Non-fatal probe.
                        warn!("Duplicate hash check failed: {e}");
                    }
                }

                if let Err(e) = self
                    .files
                    .link(FileLinkRequest {
                        file_id: record.id,
                        entity_type: "part".to_string(),
                        entity_id: part.id,
                        is_primary: true,
                        revision: None,
                        link_type: "drawing".to_string(),
                        created_by: Some(created_by.to_string()),
                    })
                    .await
                {
                    let message = format!(
                        "Link failed for '{}' -> part {}: {e}",
                        row.document_name, part.id
                    );
                    error!("{message}");
                    errors.lock().unwrap().push(message);
                    summary.skipped_count += 1;
                    continue;
                }

                let is_update = part.file_id.is_some();
                if let Err(e) = self
                    .parts
                    .set_primary_file(part.id, record.id, Some(created_by.to_string()))
                    .await
                {
                    let message =
                        format!("Part update failed for '{}': {e}", row.document_name);
                    error!("{message}");
                    errors.lock().unwrap().push(message);
                    summary.skipped_count += 1;
                    continue;
                }

                if is_update {
                    summary.updated_count += 1;
                } else {
                    summary.created_count += 1;
                }
                batch_stored += 1;
            }

            info!(
                "Document batch committed: {batch_stored} stored (running total: created={}, \
                 updated={})",
                summary.created_count, summary.updated_count
            );
        }

        summary.errors = errors.into_inner().unwrap();
        info!(
            "Document import complete - created={}, updated={}, skipped={}, errors={}, \
             warnings={}",
            summary.created_count,
            summary.updated_count,
            summary.skipped_count,
            summary.errors.len(),
            summary.warnings.len()
        );
        Ok(summary)
    }
}

/// Matches documents to parts via the article number embedded in the
/// document name. Pure function, no I/O.
///
/// An identifier matches only as a whole token: either the normalized name
/// equals it, or it appears bordered by start/end of string or a
/// non-alphanumeric character. A bare substring is never enough - "35126"
/// must not match "52083512611".
///
/// Exact matches beat token matches; among token matches the longest
/// identifier wins (most specific), with a warning naming all candidates.
pub fn match_documents_to_parts(documents: &[RawRow], parts: &[Part]) -> Vec<StagedDocument> {
    // Case-insensitive lookup: article_number → part.
    let mut lookup: HashMap<String, &Part> = HashMap::new();
    for part in parts {
        if let Some(article) = &part.article_number {
            let key = article.to_lowercase().trim().to_string();
            if !key.is_empty() {
                lookup.entry(key).or_insert(part);
            }
        }
    }

    let mut staged = Vec::with_capacity(documents.len());

    for (row_index, doc) in documents.iter().enumerate() {
        let document_name = doc
            .get("DocumentName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let document_extension = doc
            .get("DocumentExtension")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("pdf")
            .to_string();
        let row_pointer = doc
            .get("RowPointer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let sequence = doc
            .get("Sequence")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        let description = doc
            .get("Description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut normalized = document_name.to_lowercase().trim().to_string();
        if let Some(stripped) = normalized.strip_suffix(".pdf") {
            normalized = stripped.to_string();
        }

        let mut exact_matches: Vec<(&String, &Part)> = Vec::new();
        let mut token_matches: Vec<(&String, &Part)> = Vec::new();

        for (identifier, part) in &lookup {
            if *identifier == normalized {
                exact_matches.push((identifier, part));
            } else if contains_bordered_token(&normalized, identifier) {
                token_matches.push((identifier, part));
            }
        }

        let (matched_identifier, matched_part): (Option<&String>, Option<&Part>) =
            if !exact_matches.is_empty() {
                exact_matches.sort_by_key(|(identifier, _)| identifier.as_str().to_string());
                if exact_matches.len() > 1 {
                    warnings.push(format!(
                        "Ambiguous exact match: multiple parts match '{document_name}'. \
                         Using first: '{}'",
                        exact_matches[0].0
                    ));
                }
                (Some(exact_matches[0].0), Some(exact_matches[0].1))
            } else if !token_matches.is_empty() {
                // Longest identifier first; ties broken alphabetically for
                // deterministic output.
                token_matches.sort_by(|(a, _), (b, _)| {
                    b.len().cmp(&a.len()).then_with(|| a.cmp(b))
                });
                if token_matches.len() > 1 {
                    let candidates: Vec<&str> =
                        token_matches.iter().map(|(id, _)| id.as_str()).collect();
                    warnings.push(format!(
                        "Multiple token matches for '{document_name}': {candidates:?}. \
                         Using longest: '{}'",
                        token_matches[0].0
                    ));
                }
                (Some(token_matches[0].0), Some(token_matches[0].1))
            } else {
                (None, None)
            };

        if row_pointer.is_empty() {
            errors.push("Missing RowPointer - cannot download document.".to_string());
        }
        if matched_part.is_none() {
            errors.push(format!(
                "No matching part found for DocumentName='{document_name}'."
            ));
        }

        // Recover the original-case article number for display.
        let matched_article_number = matched_part.and_then(|part| {
            part.article_number.as_ref().and_then(|article| {
                matched_identifier
                    .filter(|id| article.to_lowercase().trim() == id.as_str())
                    .map(|_| article.clone())
            })
        });

        staged.push(StagedDocument {
            row_index,
            document_name,
            document_extension,
            row_pointer,
            sequence,
            description,
            matched_article_number,
            matched_part_id: matched_part.map(|p| p.id),
            matched_part_number: matched_part.map(|p| p.part_number.clone()),
            is_valid: errors.is_empty(),
            is_duplicate: false, // filled in by preview
            errors,
            warnings,
            duplicate_action: DuplicateAction::Skip,
        });
    }

    info!(
        "Matched {} documents - valid={}, invalid={}",
        staged.len(),
        staged.iter().filter(|r| r.is_valid).count(),
        staged.iter().filter(|r| !r.is_valid).count()
    );

    staged
}

/// Whether `token` occurs in `haystack` bordered by the string boundaries or
/// non-alphanumeric characters on both sides.
pub fn contains_bordered_token(haystack: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    let mut search_from = 0;
    while let Some(found) = haystack[search_from..].find(token) {
        let start = search_from + found;
        let end = start + token.len();
        let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Audit;
    use crate::parts::PartStatus;
    use serde_json::json;

    fn part(id: i64, article_number: &str) -> Part {
        Part {
            id,
            part_number: format!("1000{id:04}"),
            article_number: Some(article_number.to_string()),
            name: None,
            drawing_number: None,
            revision: None,
            customer_revision: None,
            status: PartStatus::Active,
            source: None,
            stock_shape: None,
            stock_diameter: None,
            stock_length: None,
            stock_width: None,
            stock_height: None,
            stock_wall_thickness: None,
            length: 0.0,
            notes: None,
            file_id: None,
            audit: Audit::default(),
        }
    }

    fn doc(name: &str) -> RawRow {
        json!({
            "DocumentName": name,
            "DocumentExtension": "pdf",
            "DocumentType": "Výkres",
            "RowPointer": format!("rp-{name}"),
            "Sequence": "1",
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_bordered_token() {
        assert!(contains_bordered_token("99.001.77854_koppelplatte", "99.001.77854"));
        assert!(contains_bordered_token("abc-123-drawing", "abc-123"));
        assert!(contains_bordered_token("x 35126 y", "35126"));
        // Embedded substring without borders must not match.
        assert!(!contains_bordered_token("52083512611", "35126"));
        assert!(!contains_bordered_token("a35126", "35126"));
        assert!(!contains_bordered_token("35126b", "35126"));
    }

    #[test]
    fn test_exact_match_preferred() {
        let parts = vec![part(1, "ABC-123"), part(2, "ABC")];
        let staged = match_documents_to_parts(&[doc("ABC-123.pdf")], &parts);
        assert_eq!(staged[0].matched_part_id, Some(1));
        assert!(staged[0].is_valid);
        assert!(staged[0].warnings.is_empty());
    }

    #[test]
    fn test_longest_token_wins() {
        // Both "ABC-123" and "ABC" appear as bordered tokens; the longer
        // identifier is the more specific match.
        let parts = vec![part(1, "ABC-123"), part(2, "ABC")];
        let staged = match_documents_to_parts(&[doc("ABC-123-drawing.pdf")], &parts);
        assert_eq!(staged[0].matched_part_id, Some(1));
        assert_eq!(staged[0].matched_article_number.as_deref(), Some("ABC-123"));
        assert_eq!(staged[0].warnings.len(), 1);
    }

    #[test]
    fn test_revision_suffix_matches_token() {
        let parts = vec![
            part(1, "ABC-123"),
            part(2, "ABC"),
            part(3, "99.001.77854"),
        ];
        let staged = match_documents_to_parts(&[doc("99.001.77854_rev_A.pdf")], &parts);
        assert_eq!(staged[0].matched_part_id, Some(3));
    }

    #[test]
    fn test_embedded_number_does_not_match() {
        let parts = vec![part(1, "35126")];
        let staged = match_documents_to_parts(&[doc("52083512611.pdf")], &parts);
        assert_eq!(staged[0].matched_part_id, None);
        assert!(!staged[0].is_valid);
    }

    #[test]
    fn test_full_document_name_scenario() {
        let parts = vec![part(1, "99.001.77854")];
        let staged = match_documents_to_parts(
            &[doc("99.001.77854_Koppelplatte_F4-nabidka.pdf")],
            &parts,
        );
        assert_eq!(staged[0].matched_part_id, Some(1));
        assert!(staged[0].is_valid);
    }

    #[test]
    fn test_missing_row_pointer_is_an_error() {
        let parts = vec![part(1, "ABC")];
        let mut row = doc("ABC.pdf");
        row.insert("RowPointer".to_string(), Value::String(String::new()));
        let staged = match_documents_to_parts(&[row], &parts);
        assert!(!staged[0].is_valid);
        assert!(staged[0].errors[0].contains("RowPointer"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let parts = vec![part(1, "AbC-123")];
        let staged = match_documents_to_parts(&[doc("abc-123.PDF")], &parts);
        // ".PDF" is stripped case-insensitively after lowercasing.
        assert_eq!(staged[0].matched_part_id, Some(1));
        assert_eq!(staged[0].matched_article_number.as_deref(), Some("AbC-123"));
    }
}
