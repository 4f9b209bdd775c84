use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ReservationRecord, ReservationStatus, StockRecord};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    ItemId, RecordId, ReservationToken, Result, StoreError, Version,
    store::{LookupStore, StockWrite, WriteOptions, validate_write},
};

/// PostgreSQL-backed lookup store implementation.
///
/// Conditional writes run as `UPDATE ... WHERE version = $expected` inside a
/// transaction that also upserts the accompanying reservation row, so the
/// stock change and the reservation change commit or roll back together.
#[derive(Clone)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Creates a new PostgreSQL lookup store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and returns a store on that pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        tracing::info!("PostgresStockStore connected");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_stock(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord::restore(
            RecordId::from_uuid(row.try_get::<Uuid, _>("id")?),
            ItemId::new(row.try_get("item_id")?),
            row.try_get::<String, _>("name")?,
            quantity_column(&row, "total_quantity")?,
            quantity_column(&row, "reserved_quantity")?,
            Version::new(row.try_get("version")?),
        ))
    }

    fn row_to_reservation(row: PgRow) -> Result<ReservationRecord> {
        let status: String = row.try_get("status")?;

        Ok(ReservationRecord::restore(
            ReservationToken::new(row.try_get::<String, _>("token")?),
            ItemId::new(row.try_get("item_id")?),
            quantity_column(&row, "quantity")?,
            status.parse::<ReservationStatus>()?,
            row.try_get::<String, _>("reserved_by")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
            row.try_get::<Option<DateTime<Utc>>, _>("cancelled_at")?,
        ))
    }

    /// Writes the stock row and returns its new version, or None if the
    /// version condition did not hold.
    async fn write_stock(
        tx: &mut Transaction<'_, Postgres>,
        stock: &StockRecord,
        expected: Option<Version>,
    ) -> Result<Option<i64>> {
        let version = match expected {
            Some(expected) if expected.is_initial() => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO stock_items (id, item_id, name, total_quantity, reserved_quantity, version)
                    VALUES ($1, $2, $3, $4, $5, 1)
                    ON CONFLICT (item_id) DO NOTHING
                    RETURNING version
                    "#,
                )
                .bind(stock.id().as_uuid())
                .bind(stock.item_id().as_i64())
                .bind(stock.name())
                .bind(i64::from(stock.total_quantity()))
                .bind(i64::from(stock.reserved_quantity()))
                .fetch_optional(&mut **tx)
                .await?
            }
            Some(expected) => {
                sqlx::query_scalar(
                    r#"
                    UPDATE stock_items
                    SET total_quantity = $2, reserved_quantity = $3, version = version + 1
                    WHERE item_id = $1 AND version = $4
                    RETURNING version
                    "#,
                )
                .bind(stock.item_id().as_i64())
                .bind(i64::from(stock.total_quantity()))
                .bind(i64::from(stock.reserved_quantity()))
                .bind(expected.as_i64())
                .fetch_optional(&mut **tx)
                .await?
            }
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO stock_items (id, item_id, name, total_quantity, reserved_quantity, version)
                    VALUES ($1, $2, $3, $4, $5, 1)
                    ON CONFLICT (item_id) DO UPDATE SET
                        total_quantity = EXCLUDED.total_quantity,
                        reserved_quantity = EXCLUDED.reserved_quantity,
                        version = stock_items.version + 1
                    RETURNING version
                    "#,
                )
                .bind(stock.id().as_uuid())
                .bind(stock.item_id().as_i64())
                .bind(stock.name())
                .bind(i64::from(stock.total_quantity()))
                .bind(i64::from(stock.reserved_quantity()))
                .fetch_optional(&mut **tx)
                .await?
            }
        };

        Ok(version)
    }

    async fn write_reservation(
        tx: &mut Transaction<'_, Postgres>,
        reservation: &ReservationRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (token, item_id, quantity, status, reserved_by, created_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (token) DO UPDATE SET
                status = EXCLUDED.status,
                cancelled_at = EXCLUDED.cancelled_at
            "#,
        )
        .bind(reservation.token().as_str())
        .bind(reservation.item_id().as_i64())
        .bind(i64::from(reservation.quantity()))
        .bind(reservation.status().as_str())
        .bind(reservation.reserved_by())
        .bind(reservation.created_at())
        .bind(reservation.cancelled_at())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

fn quantity_column(row: &PgRow, column: &str) -> Result<u32> {
    let raw: i64 = row.try_get(column)?;
    u32::try_from(raw)
        .map_err(|_| StoreError::InvalidRow(format!("{column} out of range: {raw}")))
}

#[async_trait]
impl LookupStore for PostgresStockStore {
    async fn get_stock(&self, item_id: ItemId) -> Result<Option<StockRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, item_id, name, total_quantity, reserved_quantity, version
            FROM stock_items
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_stock).transpose()
    }

    async fn get_reservation(&self, token: &ReservationToken) -> Result<Option<ReservationRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT token, item_id, quantity, status, reserved_by, created_at, cancelled_at
            FROM reservations
            WHERE token = $1
            "#,
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reservation).transpose()
    }

    async fn commit(&self, write: StockWrite, options: WriteOptions) -> Result<StockRecord> {
        validate_write(&write)?;

        let item_id = write.item_id();
        let mut tx = self.pool.begin().await?;

        let Some(new_version) =
            Self::write_stock(&mut tx, &write.stock, options.expected_version).await?
        else {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM stock_items WHERE item_id = $1")
                    .bind(item_id.as_i64())
                    .fetch_optional(&mut *tx)
                    .await?;

            metrics::counter!("inventory_store_conflicts_total").increment(1);
            // Dropping the transaction rolls it back.
            return Err(StoreError::VersionConflict {
                item_id,
                expected: options.expected_version.unwrap_or_default(),
                actual: Version::new(actual.unwrap_or(0)),
            });
        };

        if let Some(reservation) = &write.reservation {
            Self::write_reservation(&mut tx, reservation).await?;
        }

        tx.commit().await?;

        let mut stock = write.stock;
        stock.set_version(Version::new(new_version));
        Ok(stock)
    }

    async fn reservations_for_item(&self, item_id: ItemId) -> Result<Vec<ReservationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT token, item_id, quantity, status, reserved_by, created_at, cancelled_at
            FROM reservations
            WHERE item_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(item_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }
}
