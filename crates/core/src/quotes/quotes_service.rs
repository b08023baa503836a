//! Quote engine: workflow transitions, pricing, totals, snapshots.

use chrono::{NaiveDateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::quotes_model::{
    BatchMatchInfo, NewQuote, NewQuoteItem, PartMatch, PartnerSnapshot, Quote, QuoteError,
    QuoteHeaderUpdate, QuoteItem, QuoteItemSnapshot, QuoteItemUpdate, QuoteSnapshot, QuoteStatus,
    QuoteTotals,
};
use super::quotes_traits::QuoteRepositoryTrait;
use crate::batches::{BatchMatch, BatchRepositoryTrait, BatchService};
use crate::errors::Result;
use crate::importers::article_matcher;
use crate::numbering::{NumberClass, NumberingService};
use crate::partners::PartnerRepositoryTrait;
use crate::parts::PartRepositoryTrait;

/// Totals and line totals must agree with their recomputation within one
/// cent. Violations abort the transaction.
const MONEY_TOLERANCE: Decimal = dec!(0.01);

const HUNDRED: Decimal = dec!(100);

pub struct QuoteService {
    quotes: Arc<dyn QuoteRepositoryTrait>,
    batches: Arc<dyn BatchRepositoryTrait>,
    batch_service: Arc<BatchService>,
    parts: Arc<dyn PartRepositoryTrait>,
    partners: Arc<dyn PartnerRepositoryTrait>,
    numbering: Arc<NumberingService>,
}

impl QuoteService {
    pub fn new(
        quotes: Arc<dyn QuoteRepositoryTrait>,
        batches: Arc<dyn BatchRepositoryTrait>,
        batch_service: Arc<BatchService>,
        parts: Arc<dyn PartRepositoryTrait>,
        partners: Arc<dyn PartnerRepositoryTrait>,
        numbering: Arc<NumberingService>,
    ) -> Self {
        Self {
            quotes,
            batches,
            batch_service,
            parts,
            partners,
            numbering,
        }
    }

    // === Creation and header updates ===

    pub async fn create_quote(&self, mut new_quote: NewQuote) -> Result<Quote> {
        if new_quote.quote_number.is_empty() {
            new_quote.quote_number = self.numbering.generate(NumberClass::Quote)?;
        }
        let quote = self.quotes.create(new_quote).await?;
        info!("Created quote {}", quote.quote_number);
        Ok(quote)
    }

    pub async fn update_quote(&self, update: QuoteHeaderUpdate) -> Result<Quote> {
        let quote = self.quotes.get_by_id(update.id)?;
        Self::check_edit_lock(&quote)?;

        let updated_by = update.updated_by.clone();
        let quote = self.quotes.update_header(update).await?;
        // Discount/tax percent changes move the derived totals.
        self.recalculate_totals(quote.id, updated_by.as_deref())
            .await?;
        self.quotes.get_by_id(quote.id)
    }

    /// Soft delete, restricted by workflow state: a SENT or APPROVED quote
    /// holds a legally binding snapshot and cannot be removed.
    pub async fn delete_quote(&self, quote_id: i64, deleted_by: Option<&str>) -> Result<()> {
        let quote = self.quotes.get_by_id(quote_id)?;
        match quote.status {
            QuoteStatus::Draft | QuoteStatus::Rejected => {
                self.quotes
                    .soft_delete(quote_id, deleted_by.map(str::to_string))
                    .await?;
                info!("Deleted quote {}", quote.quote_number);
                Ok(())
            }
            QuoteStatus::Sent | QuoteStatus::Approved => Err(QuoteError::DeleteForbidden(
                format!(
                    "Quote {} is {} and holds a legally binding snapshot; it cannot be deleted. \
                     Reject it first.",
                    quote.quote_number,
                    quote.status.as_str()
                ),
            )
            .into()),
        }
    }

    // === Items ===

    /// Adds an item, auto-pricing it from the part's latest frozen pricing
    /// set. Refused with `NoFrozenPricing` when none exists.
    pub async fn add_item(
        &self,
        quote_id: i64,
        part_id: i64,
        quantity: i32,
        notes: Option<String>,
        created_by: Option<&str>,
    ) -> Result<QuoteItem> {
        let quote = self.quotes.get_by_id(quote_id)?;
        Self::check_edit_lock(&quote)?;

        let part = self.parts.get_by_id(part_id)?;
        let unit_price = self.latest_frozen_batch_price(part_id)?;
        let line_total = Self::line_total(quantity, unit_price)?;

        let item = self
            .quotes
            .insert_item(NewQuoteItem {
                quote_id,
                part_id: Some(part_id),
                part_number: Some(part.part_number.clone()),
                part_name: part.name.clone(),
                quantity,
                unit_price,
                line_total,
                notes,
                created_by: created_by.map(str::to_string),
            })
            .await?;

        self.recalculate_totals(quote_id, created_by).await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        item_id: i64,
        quantity: Option<i32>,
        unit_price: Option<Decimal>,
        notes: Option<String>,
        version: i32,
        updated_by: Option<&str>,
    ) -> Result<QuoteItem> {
        let item = self.quotes.get_item(item_id)?;
        let quote = self.quotes.get_by_id(item.quote_id)?;
        Self::check_edit_lock(&quote)?;

        let quantity = quantity.unwrap_or(item.quantity);
        let unit_price = unit_price.unwrap_or(item.unit_price);
        let line_total = Self::line_total(quantity, unit_price)?;

        let updated = self
            .quotes
            .update_item(QuoteItemUpdate {
                id: item_id,
                quantity,
                unit_price,
                line_total,
                notes: notes.or(item.notes),
                version,
                updated_by: updated_by.map(str::to_string),
            })
            .await?;

        self.recalculate_totals(quote.id, updated_by).await?;
        Ok(updated)
    }

    pub async fn delete_item(&self, item_id: i64, deleted_by: Option<&str>) -> Result<()> {
        let item = self.quotes.get_item(item_id)?;
        let quote = self.quotes.get_by_id(item.quote_id)?;
        Self::check_edit_lock(&quote)?;

        self.quotes
            .soft_delete_item(item_id, deleted_by.map(str::to_string))
            .await?;
        self.recalculate_totals(quote.id, deleted_by).await?;
        Ok(())
    }

    // === Pricing ===

    /// Unit price from the part's most recent frozen pricing set: the first
    /// batch's `unit_price_frozen`, falling back to its `unit_cost`.
    pub fn latest_frozen_batch_price(&self, part_id: i64) -> Result<Decimal> {
        let set = self
            .batches
            .latest_frozen_set_for_part(part_id)?
            .ok_or(QuoteError::NoFrozenPricing { part_id })?;

        let batch = self
            .batches
            .first_batch_in_set(set.id)?
            .ok_or_else(|| {
                warn!("Frozen set {} contains no batches", set.set_number);
                QuoteError::NoFrozenPricing { part_id }
            })?;

        let price = batch.unit_price_frozen.unwrap_or(batch.unit_cost);
        debug!("Auto-loaded price for part {part_id}: {price}");
        Ok(price)
    }

    // === Totals ===

    /// Recomputes every derived money column from the active items:
    ///
    /// ```text
    /// subtotal        = sum(item.line_total)
    /// discount_amount = subtotal * discount_percent / 100
    /// taxable         = subtotal - discount_amount
    /// tax_amount      = taxable * tax_percent / 100
    /// total           = taxable + tax_amount
    /// ```
    ///
    /// Runs on every item create/update/delete and every header update.
    pub async fn recalculate_totals(
        &self,
        quote_id: i64,
        updated_by: Option<&str>,
    ) -> Result<QuoteTotals> {
        let quote = self.quotes.get_by_id(quote_id)?;
        let items = self.quotes.list_items(quote_id)?;

        for item in &items {
            Self::verify_line_invariant(item)?;
        }

        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let discount_amount = subtotal * quote.discount_percent / HUNDRED;
        let taxable = subtotal - discount_amount;
        let tax_amount = taxable * quote.tax_percent / HUNDRED;
        let total = taxable + tax_amount;

        let totals = QuoteTotals {
            subtotal,
            discount_amount,
            tax_amount,
            total,
        };

        // Self-check before persisting: the recomputed subtotal must match
        // the item sum we just produced it from. Kept active as a tripwire
        // for storage-level corruption.
        let expected: Decimal = items.iter().map(|i| i.line_total).sum();
        if (subtotal - expected).abs() > MONEY_TOLERANCE {
            return Err(QuoteError::InvariantViolation(format!(
                "Quote {} subtotal mismatch: {subtotal} != {expected}",
                quote.quote_number
            ))
            .into());
        }

        self.quotes
            .save_totals(quote_id, totals, updated_by.map(str::to_string))
            .await?;

        debug!(
            "Recalculated quote {}: subtotal={subtotal}, discount={discount_amount}, \
             tax={tax_amount}, total={total}",
            quote.quote_number
        );

        Ok(totals)
    }

    fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal> {
        let line_total = Decimal::from(quantity) * unit_price;
        Ok(line_total)
    }

    fn verify_line_invariant(item: &QuoteItem) -> Result<()> {
        let expected = Decimal::from(item.quantity) * item.unit_price;
        if (item.line_total - expected).abs() > MONEY_TOLERANCE {
            return Err(QuoteError::InvariantViolation(format!(
                "QuoteItem {} line_total mismatch: stored {}, expected {expected}",
                item.id, item.line_total
            ))
            .into());
        }
        Ok(())
    }

    // === Workflow transitions ===

    fn check_edit_lock(quote: &Quote) -> Result<()> {
        if !quote.status.is_editable() {
            return Err(QuoteError::EditLocked(quote.status.as_str().to_string()).into());
        }
        Ok(())
    }

    /// DRAFT → SENT. Materializes the snapshot document and makes the quote
    /// read-only.
    pub async fn send(&self, quote_id: i64, username: &str) -> Result<Quote> {
        let quote = self.quotes.get_by_id(quote_id)?;
        if quote.status != QuoteStatus::Draft {
            return Err(QuoteError::InvalidStateTransition {
                from: quote.status.as_str().to_string(),
                to: QuoteStatus::Sent.as_str().to_string(),
            }
            .into());
        }

        let sent_at = Utc::now().naive_utc();
        let snapshot = self.build_snapshot(&quote, sent_at, username)?;
        let quote = self
            .quotes
            .mark_sent(
                quote_id,
                serde_json::to_value(&snapshot)?,
                sent_at,
                Some(username.to_string()),
            )
            .await?;

        info!("Quote {} transitioned to SENT by {username}", quote.quote_number);
        Ok(quote)
    }

    /// SENT → APPROVED.
    pub async fn approve(&self, quote_id: i64, username: &str) -> Result<Quote> {
        let quote = self.quotes.get_by_id(quote_id)?;
        if quote.status != QuoteStatus::Sent {
            return Err(QuoteError::InvalidStateTransition {
                from: quote.status.as_str().to_string(),
                to: QuoteStatus::Approved.as_str().to_string(),
            }
            .into());
        }

        let quote = self
            .quotes
            .mark_approved(quote_id, Utc::now().naive_utc(), Some(username.to_string()))
            .await?;
        info!("Quote {} approved by {username}", quote.quote_number);
        Ok(quote)
    }

    /// SENT → REJECTED.
    pub async fn reject(&self, quote_id: i64, username: &str) -> Result<Quote> {
        let quote = self.quotes.get_by_id(quote_id)?;
        if quote.status != QuoteStatus::Sent {
            return Err(QuoteError::InvalidStateTransition {
                from: quote.status.as_str().to_string(),
                to: QuoteStatus::Rejected.as_str().to_string(),
            }
            .into());
        }

        let quote = self
            .quotes
            .mark_rejected(quote_id, Utc::now().naive_utc(), Some(username.to_string()))
            .await?;
        info!("Quote {} rejected by {username}", quote.quote_number);
        Ok(quote)
    }

    /// Clones a quote (from any state) into a fresh DRAFT: new number, title
    /// suffixed "(Copy)", items duplicated without ids, totals recomputed.
    pub async fn clone_quote(&self, quote_id: i64, username: &str) -> Result<Quote> {
        let original = self.quotes.get_by_id(quote_id)?;
        let items = self.quotes.list_items(quote_id)?;

        let new_number = self.numbering.generate(NumberClass::Quote)?;
        let new_quote = NewQuote {
            quote_number: new_number.clone(),
            partner_id: original.partner_id,
            title: format!("{} (Copy)", original.title),
            description: original.description.clone(),
            valid_until: original.valid_until,
            discount_percent: original.discount_percent,
            tax_percent: original.tax_percent,
            notes: original.notes.clone(),
            created_by: Some(username.to_string()),
        };

        let cloned_items: Vec<NewQuoteItem> = items
            .iter()
            .map(|item| NewQuoteItem {
                quote_id: 0, // assigned by the repository
                part_id: item.part_id,
                part_number: item.part_number.clone(),
                part_name: item.part_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
                notes: item.notes.clone(),
                created_by: Some(username.to_string()),
            })
            .collect();

        let clone = self.quotes.insert_clone(new_quote, cloned_items).await?;
        self.recalculate_totals(clone.id, Some(username)).await?;

        info!("Cloned quote {} -> {new_number}", original.quote_number);
        self.quotes.get_by_id(clone.id)
    }

    // === Snapshot ===

    fn build_snapshot(
        &self,
        quote: &Quote,
        sent_at: NaiveDateTime,
        username: &str,
    ) -> Result<QuoteSnapshot> {
        let partner = match quote.partner_id {
            Some(partner_id) => {
                let partner = self.partners.get_by_id(partner_id)?;
                Some(PartnerSnapshot {
                    partner_number: partner.partner_number,
                    company_name: partner.company_name,
                    ico: partner.ico,
                    dic: partner.dic,
                    email: partner.email,
                    phone: partner.phone,
                    contact_person: partner.contact_person,
                    street: partner.street,
                    city: partner.city,
                    postal_code: partner.postal_code,
                    country: partner.country,
                })
            }
            None => None,
        };

        let items = self
            .quotes
            .list_items(quote.id)?
            .into_iter()
            .map(|item| QuoteItemSnapshot {
                part_number: item.part_number,
                part_name: item.part_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
                notes: item.notes,
            })
            .collect();

        Ok(QuoteSnapshot {
            quote_number: quote.quote_number.clone(),
            title: quote.title.clone(),
            description: quote.description.clone(),
            valid_until: quote.valid_until,
            partner,
            items,
            subtotal: quote.subtotal,
            discount_percent: quote.discount_percent,
            discount_amount: quote.discount_amount,
            tax_percent: quote.tax_percent,
            tax_amount: quote.tax_amount,
            total: quote.total,
            notes: quote.notes.clone(),
            created_at: quote.audit.created_at,
            sent_at,
            sent_by: Some(username.to_string()),
        })
    }

    // === Request-driven matching ===

    /// Finds an existing part for an article number, trying the fuzzy-search
    /// variants in priority order (exact, prefix-stripped, base).
    pub fn match_part_by_article_number(
        &self,
        article_number: &str,
    ) -> Result<Option<(crate::parts::Part, Option<String>)>> {
        for variant in article_matcher::generate_variants(article_number) {
            if let Some(part) = self.parts.get_by_article_number(&variant)? {
                let stored = part.article_number.as_deref().unwrap_or(&variant);
                let (match_type, warning) = article_matcher::match_type(article_number, stored);
                info!(
                    "Found part: '{article_number}' -> {} (match={})",
                    part.part_number,
                    match_type.as_str()
                );
                return Ok(Some((part, warning)));
            }
        }
        debug!("Part not found: {article_number}");
        Ok(None)
    }

    /// Matches a single requested line (part + batch) for quote creation.
    pub fn match_item(
        &self,
        article_number: &str,
        drawing_number: Option<&str>,
        name: &str,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<PartMatch> {
        let normalized = article_matcher::normalize(article_number);

        let Some((part, fuzzy_warning)) = self.match_part_by_article_number(article_number)?
        else {
            return Ok(PartMatch {
                part_id: None,
                part_number: None,
                part_exists: false,
                article_number: normalized.base,
                drawing_number: drawing_number.map(str::to_string),
                name: name.to_string(),
                quantity,
                notes: notes.map(str::to_string),
                batch_match: BatchMatchInfo {
                    batch_id: None,
                    batch_quantity: None,
                    status: BatchMatch::Missing,
                    unit_price: Decimal::ZERO,
                    line_total: Decimal::ZERO,
                    warnings: vec!["New part - will be created without pricing".to_string()],
                },
            });
        };

        let notes = match (&fuzzy_warning, notes) {
            (Some(warning), Some(notes)) => Some(format!("{warning}\n{notes}")),
            (Some(warning), None) => Some(warning.clone()),
            (None, notes) => notes.map(str::to_string),
        };

        let (batch, status, warnings) = self.batch_service.find_best_batch(part.id, quantity)?;

        let unit_price = batch
            .as_ref()
            .map(|b| b.unit_price_frozen.unwrap_or(b.unit_cost))
            .unwrap_or(Decimal::ZERO);
        let line_total = Decimal::from(quantity) * unit_price;

        Ok(PartMatch {
            part_id: Some(part.id),
            part_number: Some(part.part_number.clone()),
            part_exists: true,
            article_number: normalized.base,
            drawing_number: drawing_number.map(str::to_string),
            name: name.to_string(),
            quantity,
            notes,
            batch_match: BatchMatchInfo {
                batch_id: batch.as_ref().map(|b| b.id),
                batch_quantity: batch.as_ref().map(|b| b.quantity),
                status,
                unit_price,
                line_total,
                warnings,
            },
        })
    }
}
