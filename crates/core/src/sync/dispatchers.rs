//! Per-step dispatch: routes fetched rows into the matching importer.
//!
//! All dispatchers follow the preview → execute flow with
//! `duplicate_action = update`, which is what makes watermark replays after
//! a crash idempotent.

use log::error;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::scheduler::SyncContext;
use crate::errors::Result;
use crate::importers::{
    kernel, DocumentImporter, DuplicateAction, JobMaterialsImporter, JobRoutingImporter,
    MaterialItemImporter, PartImporter, ProductionImporter,
};
use crate::importers::kernel::{EntityImporter, MappedRow, DUPLICATE_ACTION_KEY, SKIP_KEY};
use crate::parts::Part;
use gestima_infor::RawRow;

/// Username stamped on rows the background sync writes.
const SYNC_USER: &str = "sync";

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub fetched: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<String>,
}

/// Routes one step's rows to its importer path.
pub async fn dispatch_step(
    ctx: &Arc<SyncContext>,
    step_name: &str,
    rows: Vec<RawRow>,
) -> Result<DispatchOutcome> {
    if rows.is_empty() {
        return Ok(DispatchOutcome::default());
    }

    match step_name {
        "parts" => {
            let importer = PartImporter::new(
                ctx.parts.clone(),
                ctx.numbering.clone(),
                Some(SYNC_USER),
            );
            preview_then_execute(&importer, &rows).await
        }
        "materials" => {
            let importer = MaterialItemImporter::new(
                ctx.materials.clone(),
                ctx.numbering.clone(),
                Some(SYNC_USER),
            );
            preview_then_execute(&importer, &rows).await
        }
        "operations" => dispatch_operations(ctx, rows).await,
        "production" => dispatch_production(ctx, rows).await,
        "material_inputs" => dispatch_material_inputs(ctx, rows).await,
        "documents" => dispatch_documents(ctx, rows).await,
        other => Ok(DispatchOutcome {
            errors: vec![format!("Unknown sync step: {other}")],
            ..Default::default()
        }),
    }
}

/// Kernel preview → extract rows that are valid or duplicate-valid, force
/// `duplicate_action = update`, execute.
async fn preview_then_execute(
    importer: &dyn EntityImporter,
    rows: &[RawRow],
) -> Result<DispatchOutcome> {
    let preview = kernel::preview_import(importer, rows).await?;

    let mut prepared: Vec<MappedRow> = Vec::new();
    for row in preview.rows {
        if row.validation.is_valid || row.validation.is_duplicate {
            let mut mapped = row.mapped;
            mapped.insert(
                DUPLICATE_ACTION_KEY.to_string(),
                Value::from(DuplicateAction::Update.as_str()),
            );
            prepared.push(mapped);
        }
    }

    if prepared.is_empty() {
        return Ok(DispatchOutcome::default());
    }

    let summary = kernel::execute_import(importer, prepared).await?;
    Ok(DispatchOutcome {
        fetched: rows.len(),
        created_count: summary.created_count,
        updated_count: summary.updated_count,
        skipped_count: summary.skipped_count,
        errors: summary.errors,
    })
}

/// Groups raw rows by an article-number column.
fn group_by_article(rows: Vec<RawRow>, key: &str) -> HashMap<String, Vec<RawRow>> {
    let mut groups: HashMap<String, Vec<RawRow>> = HashMap::new();
    for row in rows {
        let article = match row.get(key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        groups.entry(article).or_default().push(row);
    }
    groups
}

fn batch_part_lookup(
    ctx: &Arc<SyncContext>,
    articles: &HashMap<String, Vec<RawRow>>,
) -> Result<HashMap<String, Part>> {
    let keys: Vec<String> = articles.keys().cloned().collect();
    let parts = ctx.parts.list_by_article_numbers(&keys)?;
    Ok(parts
        .into_iter()
        .filter_map(|part| part.article_number.clone().map(|article| (article, part)))
        .collect())
}

/// Operations from `SLJobRoutes` Type `S`: group by `DerJobItem`, resolve
/// parts in one query, then run the routing importer per matched part.
async fn dispatch_operations(
    ctx: &Arc<SyncContext>,
    rows: Vec<RawRow>,
) -> Result<DispatchOutcome> {
    ctx.wc_resolver.warmup_cache()?;

    let groups = group_by_article(rows, "DerJobItem");
    let parts_by_article = batch_part_lookup(ctx, &groups)?;

    let mut outcome = DispatchOutcome::default();

    for (article_number, group_rows) in groups {
        let Some(part) = parts_by_article.get(&article_number) else {
            continue;
        };

        let importer = JobRoutingImporter::new(
            part.id,
            ctx.wc_resolver.clone(),
            ctx.operations.clone(),
            Some(SYNC_USER),
        );

        let mut mapped_rows: Vec<MappedRow> = Vec::new();
        for row in &group_rows {
            let mapped = kernel::map_row(&importer, row).await?;
            if kernel::row_bool(&mapped, SKIP_KEY) {
                continue;
            }
            let mut mapped = mapped;
            mapped.insert(
                DUPLICATE_ACTION_KEY.to_string(),
                Value::from(DuplicateAction::Update.as_str()),
            );
            mapped_rows.push(mapped);
        }

        if mapped_rows.is_empty() {
            continue;
        }

        match kernel::execute_import(&importer, mapped_rows).await {
            Ok(summary) => {
                outcome.created_count += summary.created_count;
                outcome.updated_count += summary.updated_count;
                outcome.skipped_count += summary.skipped_count;
                outcome.errors.extend(summary.errors);
            }
            Err(e) => {
                let message = format!("Operations sync failed for {article_number}: {e}");
                error!("{message}");
                outcome.errors.push(message);
            }
        }
    }

    Ok(outcome)
}

/// Production telemetry from `SLJobRoutes` Type `J`: group by `JobItem`,
/// resolve parts, run the production importer per group.
async fn dispatch_production(
    ctx: &Arc<SyncContext>,
    rows: Vec<RawRow>,
) -> Result<DispatchOutcome> {
    ctx.wc_resolver.warmup_cache()?;

    let groups = group_by_article(rows, "JobItem");
    let parts_by_article = batch_part_lookup(ctx, &groups)?;

    let importer = ProductionImporter::new(
        ctx.wc_resolver.clone(),
        ctx.parts.clone(),
        ctx.production.clone(),
        Some(SYNC_USER),
    );

    let mut outcome = DispatchOutcome::default();

    for (article_number, group_rows) in groups {
        let Some(part) = parts_by_article.get(&article_number) else {
            continue;
        };

        let mut mapped_rows: Vec<MappedRow> = Vec::new();
        for row in &group_rows {
            let mapped = kernel::map_row(&importer, row).await?;
            if kernel::row_bool(&mapped, SKIP_KEY) {
                continue;
            }
            let mut mapped = mapped;
            mapped.insert("part_id".to_string(), Value::from(part.id));
            mapped.insert(
                DUPLICATE_ACTION_KEY.to_string(),
                Value::from(DuplicateAction::Update.as_str()),
            );
            mapped_rows.push(mapped);
        }

        if mapped_rows.is_empty() {
            continue;
        }

        match kernel::execute_import(&importer, mapped_rows).await {
            Ok(summary) => {
                outcome.created_count += summary.created_count;
                outcome.updated_count += summary.updated_count;
                outcome.skipped_count += summary.skipped_count;
                outcome.errors.extend(summary.errors);
            }
            Err(e) => {
                let message = format!("Production sync failed for {article_number}: {e}");
                error!("{message}");
                outcome.errors.push(message);
            }
        }
    }

    Ok(outcome)
}

/// Material inputs from `SLJobmatls`: batch-resolve parts, material items
/// and operations, then upsert per part group. The kernel's execute path is
/// bypassed because the repository also maintains the material-operation
/// link table; commits happen per part group.
async fn dispatch_material_inputs(
    ctx: &Arc<SyncContext>,
    rows: Vec<RawRow>,
) -> Result<DispatchOutcome> {
    let groups = group_by_article(rows, "ItmItem");
    let parts_by_article = batch_part_lookup(ctx, &groups)?;

    // Batch MaterialItem lookup across all groups.
    let mut codes: HashSet<String> = HashSet::new();
    for group_rows in groups.values() {
        for row in group_rows {
            if let Some(Value::String(code)) = row.get("Item") {
                if !code.is_empty() {
                    codes.insert(code.clone());
                }
            }
        }
    }
    let code_list: Vec<String> = codes.into_iter().collect();
    let items_by_code: HashMap<String, crate::materials::MaterialItem> = ctx
        .materials
        .list_items_by_codes(&code_list)?
        .into_iter()
        .map(|item| (item.code.clone(), item))
        .collect();

    // Batch operation index for linking.
    let part_ids: Vec<i64> = parts_by_article.values().map(|p| p.id).collect();
    let ops_index: HashMap<(i64, i32), i64> = ctx
        .operations
        .seq_index_for_parts(&part_ids)?
        .into_iter()
        .map(|(part_id, seq, op_id)| ((part_id, seq), op_id))
        .collect();

    let mut outcome = DispatchOutcome::default();

    for (article_number, group_rows) in groups {
        let Some(part) = parts_by_article.get(&article_number) else {
            continue;
        };

        let importer = JobMaterialsImporter::new(part.id, items_by_code.clone(), ops_index.clone());

        let mut upserts = Vec::new();
        let mut seq_counter = 0;
        for row in &group_rows {
            let Some(mapped) = importer.map_row(row) else {
                // Unknown material item code - material master data must be
                // imported first.
                outcome.errors.push(format!(
                    "Material item not found for row {:?} (part {article_number})",
                    row.get("Item")
                ));
                continue;
            };
            seq_counter += 10;
            upserts.push(importer.to_upsert(&mapped, seq_counter));
        }

        if upserts.is_empty() {
            continue;
        }

        match ctx.materials.upsert_inputs_for_part(part.id, upserts).await {
            Ok((created, updated)) => {
                outcome.created_count += created;
                outcome.updated_count += updated;
            }
            Err(e) => {
                let message = format!("Material inputs sync failed for {article_number}: {e}");
                error!("{message}");
                outcome.errors.push(message);
            }
        }
    }

    Ok(outcome)
}

/// Documents: preview → execute on the document importer with
/// `duplicate_action = update`, overwriting existing drawings.
async fn dispatch_documents(
    ctx: &Arc<SyncContext>,
    rows: Vec<RawRow>,
) -> Result<DispatchOutcome> {
    let importer = DocumentImporter::new(ctx.client.clone(), ctx.files.clone(), ctx.parts.clone());

    let mut staged = importer.preview_import(&rows).await?;
    for row in &mut staged {
        if row.is_valid {
            row.duplicate_action = DuplicateAction::Update;
        }
    }

    if !staged.iter().any(|r| r.is_valid) {
        return Ok(DispatchOutcome::default());
    }

    let summary = importer.execute_import(staged, SYNC_USER).await?;
    Ok(DispatchOutcome {
        fetched: rows.len(),
        created_count: summary.created_count,
        updated_count: summary.updated_count,
        skipped_count: summary.skipped_count,
        errors: summary.errors,
    })
}
