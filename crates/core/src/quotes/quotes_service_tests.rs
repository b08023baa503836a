use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use super::*;
use crate::audit::Audit;
use crate::batches::{
    Batch, BatchFreeze, BatchRepositoryTrait, BatchService, BatchSet, BatchSetStatus, NewBatch,
    NewBatchSet,
};
use crate::errors::{DatabaseError, Error, Result};
use crate::numbering::{NumberClass, NumberingRepositoryTrait, NumberingService, QuoteNumberRange};
use crate::partners::{NewPartner, Partner, PartnerRepositoryTrait};
use crate::parts::{NewPart, Part, PartImportUpdate, PartRepositoryTrait, PartStatus, PartUpdate};

// --- Mock quote repository ---

#[derive(Default)]
struct MockQuoteRepository {
    quotes: Mutex<Vec<Quote>>,
    items: Mutex<Vec<QuoteItem>>,
}

impl MockQuoteRepository {
    fn quote_mut<R>(&self, id: i64, f: impl FnOnce(&mut Quote) -> R) -> Result<R> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = quotes
            .iter_mut()
            .find(|q| q.id == id && !q.audit.is_deleted())
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("quote {id}"))))?;
        Ok(f(quote))
    }
}

#[async_trait]
impl QuoteRepositoryTrait for MockQuoteRepository {
    async fn create(&self, new_quote: NewQuote) -> Result<Quote> {
        let mut quotes = self.quotes.lock().unwrap();
        let quote = Quote {
            id: quotes.len() as i64 + 1,
            quote_number: new_quote.quote_number,
            partner_id: new_quote.partner_id,
            title: new_quote.title,
            description: new_quote.description,
            valid_until: new_quote.valid_until,
            status: QuoteStatus::Draft,
            sent_at: None,
            approved_at: None,
            rejected_at: None,
            subtotal: Decimal::ZERO,
            discount_percent: new_quote.discount_percent,
            discount_amount: Decimal::ZERO,
            tax_percent: new_quote.tax_percent,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            snapshot_data: None,
            notes: new_quote.notes,
            audit: Audit::new(new_quote.created_by.as_deref()),
        };
        quotes.push(quote.clone());
        Ok(quote)
    }

    fn get_by_id(&self, id: i64) -> Result<Quote> {
        self.quotes
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == id && !q.audit.is_deleted())
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("quote {id}"))))
    }

    fn list_items(&self, quote_id: i64) -> Result<Vec<QuoteItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.quote_id == quote_id && !i.audit.is_deleted())
            .cloned()
            .collect())
    }

    fn get_item(&self, item_id: i64) -> Result<QuoteItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == item_id && !i.audit.is_deleted())
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("item {item_id}"))))
    }

    async fn update_header(&self, update: QuoteHeaderUpdate) -> Result<Quote> {
        self.quote_mut(update.id, |quote| {
            if quote.audit.version != update.version {
                return Err(Error::VersionConflict {
                    entity: "Quote".to_string(),
                    expected: update.version,
                    actual: quote.audit.version,
                });
            }
            if let Some(title) = update.title {
                quote.title = title;
            }
            if let Some(discount) = update.discount_percent {
                quote.discount_percent = discount;
            }
            if let Some(tax) = update.tax_percent {
                quote.tax_percent = tax;
            }
            quote.audit.touch(update.updated_by.as_deref());
            Ok(quote.clone())
        })?
    }

    async fn insert_item(&self, new_item: NewQuoteItem) -> Result<QuoteItem> {
        let mut items = self.items.lock().unwrap();
        let item = QuoteItem {
            id: items.len() as i64 + 1,
            quote_id: new_item.quote_id,
            part_id: new_item.part_id,
            part_number: new_item.part_number,
            part_name: new_item.part_name,
            quantity: new_item.quantity,
            unit_price: new_item.unit_price,
            line_total: new_item.line_total,
            notes: new_item.notes,
            audit: Audit::new(new_item.created_by.as_deref()),
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, update: QuoteItemUpdate) -> Result<QuoteItem> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == update.id && !i.audit.is_deleted())
            .ok_or_else(|| {
                Error::Database(DatabaseError::NotFound(format!("item {}", update.id)))
            })?;
        if item.audit.version != update.version {
            return Err(Error::VersionConflict {
                entity: "QuoteItem".to_string(),
                expected: update.version,
                actual: item.audit.version,
            });
        }
        item.quantity = update.quantity;
        item.unit_price = update.unit_price;
        item.line_total = update.line_total;
        item.notes = update.notes;
        item.audit.touch(update.updated_by.as_deref());
        Ok(item.clone())
    }

    async fn soft_delete_item(&self, item_id: i64, deleted_by: Option<String>) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
            item.audit.tombstone(deleted_by.as_deref());
        }
        Ok(())
    }

    async fn save_totals(
        &self,
        quote_id: i64,
        totals: QuoteTotals,
        updated_by: Option<String>,
    ) -> Result<()> {
        self.quote_mut(quote_id, |quote| {
            quote.subtotal = totals.subtotal;
            quote.discount_amount = totals.discount_amount;
            quote.tax_amount = totals.tax_amount;
            quote.total = totals.total;
            quote.audit.touch(updated_by.as_deref());
        })
    }

    async fn mark_sent(
        &self,
        quote_id: i64,
        snapshot: Value,
        sent_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.quote_mut(quote_id, |quote| {
            quote.status = QuoteStatus::Sent;
            quote.sent_at = Some(sent_at);
            quote.snapshot_data = Some(snapshot);
            quote.audit.touch(updated_by.as_deref());
            quote.clone()
        })
    }

    async fn mark_approved(
        &self,
        quote_id: i64,
        approved_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.quote_mut(quote_id, |quote| {
            quote.status = QuoteStatus::Approved;
            quote.approved_at = Some(approved_at);
            quote.audit.touch(updated_by.as_deref());
            quote.clone()
        })
    }

    async fn mark_rejected(
        &self,
        quote_id: i64,
        rejected_at: NaiveDateTime,
        updated_by: Option<String>,
    ) -> Result<Quote> {
        self.quote_mut(quote_id, |quote| {
            quote.status = QuoteStatus::Rejected;
            quote.rejected_at = Some(rejected_at);
            quote.audit.touch(updated_by.as_deref());
            quote.clone()
        })
    }

    async fn soft_delete(&self, quote_id: i64, deleted_by: Option<String>) -> Result<()> {
        self.quote_mut(quote_id, |quote| {
            quote.audit.tombstone(deleted_by.as_deref());
        })
    }

    async fn insert_clone(&self, new_quote: NewQuote, items: Vec<NewQuoteItem>) -> Result<Quote> {
        let quote = self.create(new_quote).await?;
        for mut item in items {
            item.quote_id = quote.id;
            self.insert_item(item).await?;
        }
        Ok(quote)
    }
}

// --- Mock batch repository (frozen pricing fixtures) ---

#[derive(Default)]
struct MockBatchRepository {
    sets: Mutex<Vec<BatchSet>>,
    batches: Mutex<Vec<Batch>>,
}

impl MockBatchRepository {
    fn add_frozen_pricing(&self, part_id: i64, quantity: i32, unit_price: Decimal) {
        let mut sets = self.sets.lock().unwrap();
        let set_id = sets.len() as i64 + 1;
        sets.push(BatchSet {
            id: set_id,
            set_number: format!("3500{set_id:04}"),
            part_id: Some(part_id),
            name: "pricing".to_string(),
            status: BatchSetStatus::Frozen,
            frozen_at: Some(chrono::Utc::now().naive_utc()),
            frozen_by: None,
            audit: Audit::default(),
        });
        let mut batches = self.batches.lock().unwrap();
        let batch_id = batches.len() as i64 + 1;
        batches.push(Batch {
            id: batch_id,
            batch_number: format!("3000{batch_id:04}"),
            part_id,
            batch_set_id: Some(set_id),
            quantity,
            is_default: false,
            unit_time_min: 0.0,
            material_cost: Decimal::ZERO,
            machining_cost: Decimal::ZERO,
            setup_cost: Decimal::ZERO,
            overhead_cost: Decimal::ZERO,
            margin_cost: Decimal::ZERO,
            coop_cost: Decimal::ZERO,
            unit_cost: unit_price,
            total_cost: unit_price * Decimal::from(quantity),
            material_weight_kg: None,
            material_price_per_kg: None,
            is_frozen: true,
            frozen_at: None,
            frozen_by: None,
            snapshot_data: None,
            unit_price_frozen: Some(unit_price),
            total_price_frozen: None,
            audit: Audit::default(),
        });
    }
}

#[async_trait]
impl BatchRepositoryTrait for MockBatchRepository {
    async fn create_set(&self, _new_set: NewBatchSet) -> Result<BatchSet> {
        unimplemented!()
    }
    async fn create(&self, _new_batch: NewBatch) -> Result<Batch> {
        unimplemented!()
    }
    fn get_set_by_id(&self, set_id: i64) -> Result<BatchSet> {
        self.sets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == set_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("set {set_id}"))))
    }
    fn get_by_id(&self, batch_id: i64) -> Result<Batch> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == batch_id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("batch {batch_id}"))))
    }
    fn list_for_set(&self, set_id: i64) -> Result<Vec<Batch>> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.batch_set_id == Some(set_id))
            .cloned()
            .collect())
    }
    fn latest_frozen_set_for_part(&self, part_id: i64) -> Result<Option<BatchSet>> {
        let sets = self.sets.lock().unwrap();
        let mut frozen: Vec<&BatchSet> = sets
            .iter()
            .filter(|s| s.part_id == Some(part_id) && s.status == BatchSetStatus::Frozen)
            .collect();
        frozen.sort_by_key(|s| std::cmp::Reverse(s.audit.updated_at));
        Ok(frozen.first().map(|s| (*s).clone()))
    }
    fn first_batch_in_set(&self, set_id: i64) -> Result<Option<Batch>> {
        Ok(self.list_for_set(set_id)?.into_iter().next())
    }
    fn list_frozen_for_part(&self, part_id: i64) -> Result<Vec<Batch>> {
        let frozen_sets: Vec<i64> = self
            .sets
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == BatchSetStatus::Frozen)
            .map(|s| s.id)
            .collect();
        let mut result: Vec<Batch> = self
            .batches
            .lock()
            .unwrap()
            .iter()
            .filter(|b| {
                b.part_id == part_id
                    && b.batch_set_id
                        .map(|id| frozen_sets.contains(&id))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        result.sort_by_key(|b| b.quantity);
        Ok(result)
    }
    async fn apply_freeze(
        &self,
        _set_id: i64,
        _frozen_at: NaiveDateTime,
        _frozen_by: Option<String>,
        _batches: Vec<BatchFreeze>,
    ) -> Result<()> {
        unimplemented!()
    }
    async fn soft_delete_set(&self, _set_id: i64, _deleted_by: Option<String>) -> Result<()> {
        unimplemented!()
    }
}

// --- Mock part and partner repositories ---

#[derive(Default)]
struct MockPartRepository {
    parts: Mutex<Vec<Part>>,
}

impl MockPartRepository {
    fn add_part(&self, id: i64, article_number: Option<&str>, name: &str) {
        self.parts.lock().unwrap().push(Part {
            id,
            part_number: format!("1000{id:04}"),
            article_number: article_number.map(str::to_string),
            name: Some(name.to_string()),
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
        });
    }
}

#[async_trait]
impl PartRepositoryTrait for MockPartRepository {
    async fn create(&self, _new_part: NewPart) -> Result<Part> {
        unimplemented!()
    }
    async fn update(&self, _update: PartUpdate) -> Result<Part> {
        unimplemented!()
    }
    async fn soft_delete(&self, _id: i64, _deleted_by: Option<String>) -> Result<()> {
        unimplemented!()
    }
    fn get_by_id(&self, id: i64) -> Result<Part> {
        self.parts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("part {id}"))))
    }
    fn get_by_article_number(&self, article_number: &str) -> Result<Option<Part>> {
        Ok(self
            .parts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.article_number.as_deref() == Some(article_number))
            .cloned())
    }
    fn list_active(&self) -> Result<Vec<Part>> {
        Ok(self.parts.lock().unwrap().clone())
    }
    fn list_by_article_numbers(&self, article_numbers: &[String]) -> Result<Vec<Part>> {
        Ok(self
            .parts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                p.article_number
                    .as_ref()
                    .map(|a| article_numbers.contains(a))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
    async fn set_primary_file(
        &self,
        _part_id: i64,
        _file_id: i64,
        _updated_by: Option<String>,
    ) -> Result<()> {
        Ok(())
    }
    async fn apply_import(
        &self,
        _creates: Vec<NewPart>,
        _updates: Vec<PartImportUpdate>,
    ) -> Result<(usize, usize)> {
        unimplemented!()
    }
}

#[derive(Default)]
struct MockPartnerRepository {
    partners: Mutex<Vec<Partner>>,
}

impl MockPartnerRepository {
    fn add_partner(&self, id: i64, company_name: &str) {
        self.partners.lock().unwrap().push(Partner {
            id,
            partner_number: format!("7000{id:04}"),
            company_name: company_name.to_string(),
            ico: Some("25596641".to_string()),
            dic: Some("CZ25596641".to_string()),
            email: None,
            phone: None,
            contact_person: None,
            street: None,
            city: Some("Brno".to_string()),
            postal_code: None,
            country: "CZ".to_string(),
            is_customer: true,
            is_supplier: false,
            notes: None,
            audit: Audit::default(),
        });
    }
}

#[async_trait]
impl PartnerRepositoryTrait for MockPartnerRepository {
    async fn create(&self, _new_partner: NewPartner) -> Result<Partner> {
        unimplemented!()
    }
    fn get_by_id(&self, id: i64) -> Result<Partner> {
        self.partners
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("partner {id}"))))
    }
    fn list_active(&self) -> Result<Vec<Partner>> {
        Ok(self.partners.lock().unwrap().clone())
    }
}

struct NoopNumberingRepository;

impl NumberingRepositoryTrait for NoopNumberingRepository {
    fn count(&self, _class: NumberClass) -> Result<i64> {
        Ok(0)
    }
    fn existing_in(&self, _class: NumberClass, _candidates: &[String]) -> Result<Vec<String>> {
        Ok(vec![])
    }
    fn max_work_center_number(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

// --- Fixture ---

struct Fixture {
    service: QuoteService,
    quotes: Arc<MockQuoteRepository>,
    batches: Arc<MockBatchRepository>,
    parts: Arc<MockPartRepository>,
    partners: Arc<MockPartnerRepository>,
}

fn fixture() -> Fixture {
    let quotes = Arc::new(MockQuoteRepository::default());
    let batches = Arc::new(MockBatchRepository::default());
    let parts = Arc::new(MockPartRepository::default());
    let partners = Arc::new(MockPartnerRepository::default());
    let numbering = Arc::new(NumberingService::new(
        Arc::new(NoopNumberingRepository),
        QuoteNumberRange::default(),
    ));
    let batch_service = Arc::new(BatchService::new(batches.clone(), numbering.clone()));

    Fixture {
        service: QuoteService::new(
            quotes.clone(),
            batches.clone(),
            batch_service,
            parts.clone(),
            partners.clone(),
            numbering,
        ),
        quotes,
        batches,
        parts,
        partners,
    }
}

fn new_quote(partner_id: Option<i64>, discount: Decimal, tax: Decimal) -> NewQuote {
    NewQuote {
        quote_number: String::new(),
        partner_id,
        title: "Frame order".to_string(),
        description: None,
        valid_until: None,
        discount_percent: discount,
        tax_percent: tax,
        notes: None,
        created_by: Some("karel".to_string()),
    }
}

/// Builds the §8 workflow fixture: partner P1, two parts with frozen
/// pricing 100 and 200, a draft quote with 10% discount and 21% tax.
async fn workflow_quote(f: &Fixture) -> Quote {
    f.partners.add_partner(1, "Strojírny P1");
    f.parts.add_part(1, Some("ART-1"), "Flange");
    f.parts.add_part(2, Some("ART-2"), "Shaft");
    f.batches.add_frozen_pricing(1, 5, dec!(100));
    f.batches.add_frozen_pricing(2, 3, dec!(200));

    let quote = f
        .service
        .create_quote(new_quote(Some(1), dec!(10), dec!(21)))
        .await
        .unwrap();

    f.service
        .add_item(quote.id, 1, 5, None, Some("karel"))
        .await
        .unwrap();
    f.service
        .add_item(quote.id, 2, 3, None, Some("karel"))
        .await
        .unwrap();

    f.quotes.get_by_id(quote.id).unwrap()
}

#[tokio::test]
async fn test_workflow_totals() {
    let f = fixture();
    let quote = workflow_quote(&f).await;

    // qty 5 @ 100 + qty 3 @ 200 with 10% discount, 21% tax
    assert_eq!(quote.subtotal, dec!(1100));
    assert_eq!(quote.discount_amount, dec!(110));
    assert_eq!(quote.tax_amount, dec!(207.90));
    assert_eq!(quote.total, dec!(1197.90));
}

#[tokio::test]
async fn test_send_locks_editing() {
    let f = fixture();
    let quote = workflow_quote(&f).await;

    let sent = f.service.send(quote.id, "karel").await.unwrap();
    assert_eq!(sent.status, QuoteStatus::Sent);
    assert!(sent.snapshot_data.is_some());

    // Any mutation on a SENT quote fails with the edit lock.
    let result = f
        .service
        .update_quote(QuoteHeaderUpdate {
            id: quote.id,
            partner_id: None,
            title: Some("edited".to_string()),
            description: None,
            valid_until: None,
            discount_percent: None,
            tax_percent: None,
            notes: None,
            version: sent.audit.version,
            updated_by: Some("karel".to_string()),
        })
        .await;
    assert!(matches!(result, Err(Error::Quote(QuoteError::EditLocked(_)))));

    let items = f.quotes.list_items(quote.id).unwrap();
    let result = f
        .service
        .update_item(items[0].id, Some(9), None, None, items[0].audit.version, None)
        .await;
    assert!(matches!(result, Err(Error::Quote(QuoteError::EditLocked(_)))));

    let result = f.service.add_item(quote.id, 1, 2, None, None).await;
    assert!(matches!(result, Err(Error::Quote(QuoteError::EditLocked(_)))));
}

#[tokio::test]
async fn test_clone_preserves_totals_and_resets_state() {
    let f = fixture();
    let quote = workflow_quote(&f).await;
    f.service.send(quote.id, "karel").await.unwrap();

    let clone = f.service.clone_quote(quote.id, "karel").await.unwrap();
    assert_eq!(clone.status, QuoteStatus::Draft);
    assert_ne!(clone.quote_number, quote.quote_number);
    assert!(clone.title.ends_with("(Copy)"));
    assert_eq!(clone.subtotal, dec!(1100));
    assert_eq!(clone.total, dec!(1197.90));
    assert!(clone.snapshot_data.is_none());

    // Items duplicated with fresh ids.
    let cloned_items = f.quotes.list_items(clone.id).unwrap();
    assert_eq!(cloned_items.len(), 2);
}

#[tokio::test]
async fn test_snapshot_content_is_decoupled_from_live_data() {
    let f = fixture();
    let quote = workflow_quote(&f).await;
    let sent = f.service.send(quote.id, "karel").await.unwrap();

    let snapshot: QuoteSnapshot =
        serde_json::from_value(sent.snapshot_data.unwrap()).unwrap();
    assert_eq!(snapshot.total, dec!(1197.90));
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.partner.as_ref().unwrap().company_name, "Strojírny P1");
    assert_eq!(snapshot.sent_by.as_deref(), Some("karel"));
    assert_eq!(snapshot.items[0].part_number.as_deref(), Some("10000001"));
}

#[tokio::test]
async fn test_sent_quote_cannot_be_deleted() {
    let f = fixture();
    let quote = workflow_quote(&f).await;
    f.service.send(quote.id, "karel").await.unwrap();

    // SENT holds the legal snapshot - refusal cites it.
    let result = f.service.delete_quote(quote.id, Some("karel")).await;
    match result {
        Err(Error::Quote(QuoteError::DeleteForbidden(message))) => {
            assert!(message.contains("legally binding snapshot"));
        }
        other => panic!("expected DeleteForbidden, got {other:?}"),
    }

    // After rejection the quote may go.
    f.service.reject(quote.id, "karel").await.unwrap();
    f.service.delete_quote(quote.id, Some("karel")).await.unwrap();
    assert!(f.quotes.get_by_id(quote.id).is_err());
}

#[tokio::test]
async fn test_draft_quote_can_be_deleted() {
    let f = fixture();
    let quote = workflow_quote(&f).await;
    f.service.delete_quote(quote.id, Some("karel")).await.unwrap();
    assert!(f.quotes.get_by_id(quote.id).is_err());
}

#[tokio::test]
async fn test_invalid_transitions() {
    let f = fixture();
    let quote = workflow_quote(&f).await;

    // DRAFT cannot be approved or rejected directly.
    assert!(matches!(
        f.service.approve(quote.id, "karel").await,
        Err(Error::Quote(QuoteError::InvalidStateTransition { .. }))
    ));
    assert!(matches!(
        f.service.reject(quote.id, "karel").await,
        Err(Error::Quote(QuoteError::InvalidStateTransition { .. }))
    ));

    f.service.send(quote.id, "karel").await.unwrap();

    // SENT cannot be sent again.
    assert!(matches!(
        f.service.send(quote.id, "karel").await,
        Err(Error::Quote(QuoteError::InvalidStateTransition { .. }))
    ));

    // APPROVED is terminal.
    f.service.approve(quote.id, "karel").await.unwrap();
    assert!(matches!(
        f.service.reject(quote.id, "karel").await,
        Err(Error::Quote(QuoteError::InvalidStateTransition { .. }))
    ));
}

#[tokio::test]
async fn test_add_item_without_frozen_pricing_is_refused() {
    let f = fixture();
    f.partners.add_partner(1, "P1");
    f.parts.add_part(1, Some("ART-1"), "Flange");

    let quote = f
        .service
        .create_quote(new_quote(Some(1), Decimal::ZERO, dec!(21)))
        .await
        .unwrap();

    let result = f.service.add_item(quote.id, 1, 5, None, None).await;
    assert!(matches!(
        result,
        Err(Error::Quote(QuoteError::NoFrozenPricing { part_id: 1 }))
    ));
    assert!(f.quotes.list_items(quote.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_item_update_recalculates_totals() {
    let f = fixture();
    let quote = workflow_quote(&f).await;

    let items = f.quotes.list_items(quote.id).unwrap();
    f.service
        .update_item(
            items[0].id,
            Some(10),
            None,
            None,
            items[0].audit.version,
            Some("karel"),
        )
        .await
        .unwrap();

    let quote = f.quotes.get_by_id(quote.id).unwrap();
    // 10 @ 100 + 3 @ 200 = 1600
    assert_eq!(quote.subtotal, dec!(1600));

    f.service
        .delete_item(items[1].id, Some("karel"))
        .await
        .unwrap();
    let quote = f.quotes.get_by_id(quote.id).unwrap();
    assert_eq!(quote.subtotal, dec!(1000));
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let f = fixture();
    let quote = workflow_quote(&f).await;
    let items = f.quotes.list_items(quote.id).unwrap();

    let result = f
        .service
        .update_item(items[0].id, Some(7), None, None, items[0].audit.version + 5, None)
        .await;
    assert!(matches!(result, Err(Error::VersionConflict { .. })));
}

#[tokio::test]
async fn test_corrupted_line_total_aborts_recalculation() {
    let f = fixture();
    let quote = workflow_quote(&f).await;

    // Corrupt a stored line total behind the service's back.
    f.quotes.items.lock().unwrap()[0].line_total = dec!(999.99);

    let result = f.service.recalculate_totals(quote.id, None).await;
    assert!(matches!(
        result,
        Err(Error::Quote(QuoteError::InvariantViolation(_)))
    ));
}

#[tokio::test]
async fn test_match_item_with_existing_part_and_pricing() {
    let f = fixture();
    f.parts.add_part(1, Some("90057637"), "Flange");
    f.batches.add_frozen_pricing(1, 10, dec!(50));

    // Revision suffix is normalized away; the base matches.
    let matched = f
        .service
        .match_item("90057637-00", None, "Flange", 10, None)
        .unwrap();
    assert!(matched.part_exists);
    assert_eq!(matched.part_id, Some(1));
    assert_eq!(matched.batch_match.unit_price, dec!(50));
    assert_eq!(matched.batch_match.line_total, dec!(500));

    // Unknown article: flagged for creation, no pricing.
    let missing = f
        .service
        .match_item("UNKNOWN-1", None, "New part", 5, None)
        .unwrap();
    assert!(!missing.part_exists);
    assert_eq!(missing.batch_match.unit_price, Decimal::ZERO);
}
