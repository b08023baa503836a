//! Quote repository behavior against a real SQLite database.

mod common;

use rust_decimal_macros::dec;

use gestima_core::errors::Error;
use gestima_core::quotes::{
    NewQuote, NewQuoteItem, QuoteHeaderUpdate, QuoteItemUpdate, QuoteRepositoryTrait, QuoteStatus,
    QuoteTotals,
};
use gestima_storage_sqlite::QuoteRepository;

fn new_quote(number: &str) -> NewQuote {
    NewQuote {
        quote_number: number.to_string(),
        partner_id: None,
        title: "Bracket order".to_string(),
        description: None,
        valid_until: None,
        discount_percent: dec!(10),
        tax_percent: dec!(21),
        notes: None,
        created_by: Some("tester".to_string()),
    }
}

fn new_item(quote_id: i64, quantity: i32, unit_price: rust_decimal::Decimal) -> NewQuoteItem {
    NewQuoteItem {
        quote_id,
        part_id: None,
        part_number: Some("10000001".to_string()),
        part_name: Some("Bracket".to_string()),
        quantity,
        unit_price,
        line_total: rust_decimal::Decimal::from(quantity) * unit_price,
        notes: None,
        created_by: Some("tester".to_string()),
    }
}

#[tokio::test]
async fn test_totals_round_trip_exact_decimals() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let quote = repo.create(new_quote("85000001")).await.unwrap();
    repo.insert_item(new_item(quote.id, 5, dec!(100))).await.unwrap();
    repo.insert_item(new_item(quote.id, 3, dec!(200))).await.unwrap();

    repo.save_totals(
        quote.id,
        QuoteTotals {
            subtotal: dec!(1100),
            discount_amount: dec!(110),
            tax_amount: dec!(207.90),
            total: dec!(1197.90),
        },
        None,
    )
    .await
    .unwrap();

    let reloaded = repo.get_by_id(quote.id).unwrap();
    assert_eq!(reloaded.subtotal, dec!(1100));
    assert_eq!(reloaded.tax_amount, dec!(207.90));
    assert_eq!(reloaded.total, dec!(1197.90));
    assert_eq!(repo.list_items(quote.id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_stale_header_version_conflicts() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let quote = repo.create(new_quote("85000002")).await.unwrap();

    let stale = QuoteHeaderUpdate {
        id: quote.id,
        partner_id: None,
        title: Some("renamed".to_string()),
        description: None,
        valid_until: None,
        discount_percent: None,
        tax_percent: None,
        notes: None,
        version: quote.audit.version + 3,
        updated_by: None,
    };
    assert!(matches!(
        repo.update_header(stale).await,
        Err(Error::VersionConflict { .. })
    ));

    // The correct version goes through and bumps the counter.
    let fresh = QuoteHeaderUpdate {
        id: quote.id,
        partner_id: None,
        title: Some("renamed".to_string()),
        description: None,
        valid_until: None,
        discount_percent: None,
        tax_percent: None,
        notes: None,
        version: quote.audit.version,
        updated_by: Some("tester".to_string()),
    };
    let updated = repo.update_header(fresh).await.unwrap();
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.audit.version, quote.audit.version + 1);
}

#[tokio::test]
async fn test_stale_item_version_conflicts() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let quote = repo.create(new_quote("85000003")).await.unwrap();
    let item = repo.insert_item(new_item(quote.id, 5, dec!(100))).await.unwrap();

    let result = repo
        .update_item(QuoteItemUpdate {
            id: item.id,
            quantity: 7,
            unit_price: dec!(100),
            line_total: dec!(700),
            notes: None,
            version: item.audit.version + 1,
            updated_by: None,
        })
        .await;
    assert!(matches!(result, Err(Error::VersionConflict { .. })));
}

#[tokio::test]
async fn test_mark_sent_persists_snapshot() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let quote = repo.create(new_quote("85000004")).await.unwrap();
    let snapshot = serde_json::json!({"quoteNumber": "85000004", "total": "1197.90"});

    let sent = repo
        .mark_sent(
            quote.id,
            snapshot.clone(),
            chrono::Utc::now().naive_utc(),
            Some("tester".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(sent.status, QuoteStatus::Sent);
    assert!(sent.sent_at.is_some());
    assert_eq!(sent.snapshot_data.unwrap(), snapshot);
}

#[tokio::test]
async fn test_soft_delete_cascades_to_items() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let quote = repo.create(new_quote("85000005")).await.unwrap();
    repo.insert_item(new_item(quote.id, 1, dec!(10))).await.unwrap();

    repo.soft_delete(quote.id, Some("tester".to_string())).await.unwrap();

    assert!(repo.get_by_id(quote.id).is_err());
    assert!(repo.list_items(quote.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_clone_copies_items() {
    let (pool, writer, _dir) = common::test_db();
    let repo = QuoteRepository::new(pool, writer);

    let original = repo.create(new_quote("85000006")).await.unwrap();
    repo.insert_item(new_item(original.id, 2, dec!(50))).await.unwrap();
    let items = repo.list_items(original.id).unwrap();

    let clone = repo
        .insert_clone(
            new_quote("85000007"),
            items
                .iter()
                .map(|item| NewQuoteItem {
                    quote_id: 0,
                    part_id: item.part_id,
                    part_number: item.part_number.clone(),
                    part_name: item.part_name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total,
                    notes: item.notes.clone(),
                    created_by: Some("tester".to_string()),
                })
                .collect(),
        )
        .await
        .unwrap();

    let cloned_items = repo.list_items(clone.id).unwrap();
    assert_eq!(cloned_items.len(), 1);
    assert_eq!(cloned_items[0].line_total, dec!(100));
    assert_ne!(cloned_items[0].id, items[0].id);
}
