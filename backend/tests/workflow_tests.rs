//! Database-backed workflow tests
//!
//! Drive the transactional services against a real Postgres database (one
//! per test, schema from ./migrations) to cover the invariants that live
//! in SQL: idempotent stock application keyed by the inventory log, the
//! one-batch-per-purchase-per-day rule under concurrency, and closing
//! windows chaining checkpoint to checkpoint.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use retail_backoffice_backend::services::deliveries::{CreateDeliveryInput, DeliveryItemInput};
use retail_backoffice_backend::services::{DayClosingService, DeliveryService, ReceivingService};
use shared::types::ClosingSource;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_product(pool: &PgPool, stock: i32) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO products (item_code, name, stock, avg_cost) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(format!("P-{}", Uuid::new_v4()))
    .bind("Test product")
    .bind(stock)
    .bind(dec("5.0"))
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_sale(pool: &PgPool, source: &str, total: &str, is_paid: bool) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO sales (sale_no, source, status, is_paid, payment_method, total)
        VALUES ($1, $2, 'confirmed', $3, 'cash', $4)
        RETURNING id
        "#,
    )
    .bind(format!("S-{}", Uuid::new_v4()))
    .bind(source)
    .bind(is_paid)
    .bind(dec(total))
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn product_stock(pool: &PgPool, product_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn delivery_log_total(pool: &PgPool, delivery_id: Uuid, product_id: Uuid) -> (i64, i64) {
    sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(qty_change), 0)::bigint
        FROM inventory_logs
        WHERE ref_type = 'delivery' AND ref_id = $1 AND product_id = $2
        "#,
    )
    .bind(delivery_id)
    .bind(product_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Two lines of the same product must both leave stock; the log carries
/// their merged quantity as a single delivery-keyed event
#[sqlx::test(migrations = "./migrations")]
async fn confirm_debits_every_line_of_same_product(pool: PgPool) {
    let product = seed_product(&pool, 10).await;
    let sale = seed_sale(&pool, "pos", "60", true).await;

    let service = DeliveryService::new(pool.clone());
    let delivery = service
        .create(CreateDeliveryInput {
            sale_id: sale,
            items: vec![
                DeliveryItemInput {
                    product_id: product,
                    quantity: 3,
                },
                DeliveryItemInput {
                    product_id: product,
                    quantity: 3,
                },
            ],
            method: None,
            note: None,
            auto_confirm: false,
        })
        .await
        .unwrap();

    service.confirm(delivery.id).await.unwrap();

    assert_eq!(product_stock(&pool, product).await, 4);
    let (log_rows, logged_qty) = delivery_log_total(&pool, delivery.id, product).await;
    assert_eq!(log_rows, 1);
    assert_eq!(logged_qty, -6);
}

/// Re-confirming a delivery applies nothing a second time
#[sqlx::test(migrations = "./migrations")]
async fn reconfirm_is_a_no_op(pool: PgPool) {
    let product = seed_product(&pool, 10).await;
    let sale = seed_sale(&pool, "pos", "40", true).await;

    let service = DeliveryService::new(pool.clone());
    let delivery = service
        .create(CreateDeliveryInput {
            sale_id: sale,
            items: vec![DeliveryItemInput {
                product_id: product,
                quantity: 4,
            }],
            method: None,
            note: None,
            auto_confirm: false,
        })
        .await
        .unwrap();

    service.confirm(delivery.id).await.unwrap();
    assert_eq!(product_stock(&pool, product).await, 6);

    let again = service.confirm(delivery.id).await.unwrap();
    assert_eq!(again.status, "confirmed");
    assert_eq!(product_stock(&pool, product).await, 6);
    let (log_rows, logged_qty) = delivery_log_total(&pool, delivery.id, product).await;
    assert_eq!(log_rows, 1);
    assert_eq!(logged_qty, -4);
}

/// Concurrent receipts against sibling lines of one purchase share a
/// single receiving batch for the day
#[sqlx::test(migrations = "./migrations")]
async fn concurrent_receipts_share_one_daily_batch(pool: PgPool) {
    let product_a = seed_product(&pool, 0).await;
    let product_b = seed_product(&pool, 0).await;

    let purchase_id: Uuid = sqlx::query_scalar(
        "INSERT INTO purchases (purchase_no) VALUES ($1) RETURNING id",
    )
    .bind(format!("PO-{}", Uuid::new_v4()))
    .fetch_one(&pool)
    .await
    .unwrap();

    let mut line_ids = Vec::new();
    for product in [product_a, product_b] {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_items (purchase_id, product_id, quantity, cost)
            VALUES ($1, $2, 5, $3)
            RETURNING id
            "#,
        )
        .bind(purchase_id)
        .bind(product)
        .bind(dec("2.0"))
        .fetch_one(&pool)
        .await
        .unwrap();
        line_ids.push(id);
    }

    let service = ReceivingService::new(pool.clone());
    let (first, second) = tokio::join!(
        service.receive_line(line_ids[0], 5),
        service.receive_line(line_ids[1], 5)
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.receiving_no, second.receiving_no);
    let batches: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM purchase_receivings WHERE purchase_id = $1",
    )
    .bind(purchase_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(batches, 1);

    let status: String = sqlx::query_scalar("SELECT receiving_status FROM purchases WHERE id = $1")
        .bind(purchase_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "completed");
    assert_eq!(product_stock(&pool, product_a).await, 5);
    assert_eq!(product_stock(&pool, product_b).await, 5);
}

/// Each checkpoint's window starts where the previous one closed
#[sqlx::test(migrations = "./migrations")]
async fn closing_windows_chain(pool: PgPool) {
    let service = DayClosingService::new(pool.clone(), 8);

    seed_sale(&pool, "pos", "100", true).await;
    let first = service.close(ClosingSource::Pos, None).await.unwrap();
    assert_eq!(first.sales_count, 1);
    assert_eq!(first.total_sales, dec("100"));

    seed_sale(&pool, "pos", "30", false).await;
    let preview = service.preview(ClosingSource::Pos).await.unwrap();
    assert_eq!(preview.since, first.closing_time);
    assert_eq!(preview.last_closing_time, Some(first.closing_time));
    assert_eq!(preview.current_stats.sales_count, 1);

    let second = service.close(ClosingSource::Pos, None).await.unwrap();
    assert_eq!(second.sales_count, 1);
    assert_eq!(second.total_sales, dec("30"));
    assert_eq!(second.unpaid_count, 1);
}
