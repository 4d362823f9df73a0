//! Postgres-backed implementation of the order store.
//!
//! # Data model
//! Four tables: `orders` (root row plus the stored JSON payload in `raw`),
//! `deliveries` and `payments` (1:1, keyed by `order_uid`) and `items`
//! (1:N, replaced wholesale on every write).
//!
//! # Consistency / atomicity
//! `save_order` runs all sub-writes in a single transaction and commits only
//! after every step succeeded. An error at any step returns early and drops
//! the transaction, which rolls it back. Dropping the future mid-flight
//! (cancellation, timeout) rolls back the same way, so a cancelled save
//! leaves either the previous or the new order, never a mix.
//!
//! Concurrent saves of the same `order_uid` race at the row level; the last
//! transaction to commit wins.
//!
//! # Operational notes
//! - Migrations are embedded with `sqlx::migrate!` and applied by `ensure_schema`.
//! - Database URLs may contain credentials; avoid logging them.

use super::{parse_date_created, OrderStore, StoreResult};
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use normalizer::Order;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for [`PostgresStore`].
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

/// Durable order store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Open a connection pool.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        info!(
            "Connected to Postgres (max_connections: {})",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn ensure_schema(&self) -> StoreResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Order schema ready");
        Ok(())
    }

    async fn save_order(&self, order: &Order, raw: &[u8]) -> StoreResult<()> {
        let raw = std::str::from_utf8(raw).context("order payload is not valid UTF-8")?;
        let date_created = parse_date_created(&order.date_created);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO orders (
                order_uid, track_number, entry, locale, internal_signature, customer_id,
                delivery_service, shardkey, sm_id, date_created, oof_shard, raw
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12::jsonb)
            ON CONFLICT (order_uid) DO UPDATE SET
                track_number = EXCLUDED.track_number,
                entry = EXCLUDED.entry,
                locale = EXCLUDED.locale,
                internal_signature = EXCLUDED.internal_signature,
                customer_id = EXCLUDED.customer_id,
                delivery_service = EXCLUDED.delivery_service,
                shardkey = EXCLUDED.shardkey,
                sm_id = EXCLUDED.sm_id,
                date_created = EXCLUDED.date_created,
                oof_shard = EXCLUDED.oof_shard,
                raw = EXCLUDED.raw"#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shard_key)
        .bind(order.sm_id)
        .bind(date_created)
        .bind(&order.oof_shard)
        .bind(raw)
        .execute(&mut *tx)
        .await?;

        save_delivery(&mut tx, order).await?;
        save_payment(&mut tx, order).await?;
        save_items(&mut tx, order).await?;

        tx.commit().await?;
        debug!(
            "Saved order {} ({} items)",
            order.order_uid,
            order.items.len()
        );
        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> StoreResult<Option<Bytes>> {
        let raw = sqlx::query_scalar::<_, String>(
            r#"SELECT raw::text FROM orders WHERE order_uid = $1"#,
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(raw.map(Bytes::from))
    }

    async fn get_all_orders(&self) -> StoreResult<HashMap<String, Bytes>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"SELECT order_uid, raw::text FROM orders"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, raw)| (id, Bytes::from(raw)))
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

async fn save_delivery(conn: &mut PgConnection, order: &Order) -> StoreResult<()> {
    let d = &order.delivery;
    sqlx::query(
        r#"INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           ON CONFLICT (order_uid) DO UPDATE SET
               name = EXCLUDED.name,
               phone = EXCLUDED.phone,
               zip = EXCLUDED.zip,
               city = EXCLUDED.city,
               address = EXCLUDED.address,
               region = EXCLUDED.region,
               email = EXCLUDED.email"#,
    )
    .bind(&order.order_uid)
    .bind(&d.name)
    .bind(&d.phone)
    .bind(&d.zip)
    .bind(&d.city)
    .bind(&d.address)
    .bind(&d.region)
    .bind(&d.email)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_payment(conn: &mut PgConnection, order: &Order) -> StoreResult<()> {
    let p = &order.payment;
    sqlx::query(
        r#"INSERT INTO payments (
               order_uid, transaction, request_id, currency, provider, amount,
               payment_dt, bank, delivery_cost, goods_total, custom_fee
           ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
           ON CONFLICT (order_uid) DO UPDATE SET
               transaction = EXCLUDED.transaction,
               request_id = EXCLUDED.request_id,
               currency = EXCLUDED.currency,
               provider = EXCLUDED.provider,
               amount = EXCLUDED.amount,
               payment_dt = EXCLUDED.payment_dt,
               bank = EXCLUDED.bank,
               delivery_cost = EXCLUDED.delivery_cost,
               goods_total = EXCLUDED.goods_total,
               custom_fee = EXCLUDED.custom_fee"#,
    )
    .bind(&order.order_uid)
    .bind(&p.transaction)
    .bind(&p.request_id)
    .bind(&p.currency)
    .bind(&p.provider)
    .bind(p.amount)
    .bind(p.payment_dt)
    .bind(&p.bank)
    .bind(p.delivery_cost)
    .bind(p.goods_total)
    .bind(p.custom_fee)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_items(conn: &mut PgConnection, order: &Order) -> StoreResult<()> {
    sqlx::query(r#"DELETE FROM items WHERE order_uid = $1"#)
        .bind(&order.order_uid)
        .execute(&mut *conn)
        .await?;

    for item in &order.items {
        sqlx::query(
            r#"INSERT INTO items (
                   order_uid, chrt_id, track_number, price, rid, name,
                   sale, size, total_price, nm_id, brand, status
               ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(&order.order_uid)
        .bind(item.chrt_id)
        .bind(&item.track_number)
        .bind(item.price)
        .bind(&item.rid)
        .bind(&item.name)
        .bind(item.sale)
        .bind(&item.size)
        .bind(item.total_price)
        .bind(item.nm_id)
        .bind(&item.brand)
        .bind(item.status)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
