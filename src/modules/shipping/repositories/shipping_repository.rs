// Shipping persistence
//
// The daily accumulator is read and written under a row lock held by the
// unit of work. The row is created on first use so that two first orders of
// the day serialize on the same row instead of both seeing an empty total.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::shipping::models::{DailyShippingAccumulator, ShippingProfile, ShippingType};

#[async_trait]
pub trait ShippingProfileRepository: Send + Sync {
    /// Shipping profile of a client; `None` when the client has none
    async fn get_shipping_profile(&self, client_id: &str) -> Result<Option<ShippingProfile>>;

    async fn save_shipping_profile(&self, profile: &ShippingProfile) -> Result<()>;
}

#[async_trait]
pub trait AccumulatorRepository: Send + Sync {
    /// Start a transactional unit of work
    async fn begin(&self) -> Result<Box<dyn AccumulatorUnitOfWork>>;

    /// Read-only lookup, no lock taken
    async fn find_accumulator(
        &self,
        client_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyShippingAccumulator>>;
}

#[async_trait]
pub trait AccumulatorUnitOfWork: Send {
    /// Today's accumulator of a client, created empty if missing, locked for update
    async fn get_or_create_today_accumulator(
        &mut self,
        client_id: &str,
        date: NaiveDate,
    ) -> Result<DailyShippingAccumulator>;

    async fn persist_accumulator(&mut self, accumulator: &DailyShippingAccumulator) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;
}

pub struct MySqlShippingRepository {
    pool: MySqlPool,
}

impl MySqlShippingRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShippingProfileRepository for MySqlShippingRepository {
    async fn get_shipping_profile(&self, client_id: &str) -> Result<Option<ShippingProfile>> {
        let row = sqlx::query_as::<_, ShippingProfileRow>(
            r#"
            SELECT client_id, shipping_type, free_shipping_threshold
            FROM shipping_profiles
            WHERE client_id = ?
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn save_shipping_profile(&self, profile: &ShippingProfile) -> Result<()> {
        profile.validate()?;

        sqlx::query(
            r#"
            INSERT INTO shipping_profiles (client_id, shipping_type, free_shipping_threshold)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE
                shipping_type = VALUES(shipping_type),
                free_shipping_threshold = VALUES(free_shipping_threshold)
            "#,
        )
        .bind(&profile.client_id)
        .bind(profile.shipping_type.as_str())
        .bind(profile.free_shipping_threshold)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl AccumulatorRepository for MySqlShippingRepository {
    async fn begin(&self) -> Result<Box<dyn AccumulatorUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlAccumulatorUnitOfWork { tx: Some(tx) }))
    }

    async fn find_accumulator(
        &self,
        client_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyShippingAccumulator>> {
        let row = sqlx::query_as::<_, AccumulatorRow>(
            r#"
            SELECT client_id, business_date, cumulative_subtotal, cumulative_shipping_charged,
                   pending_adjustment_amount, free_shipping_refunded, updated_at
            FROM daily_shipping_accumulators
            WHERE client_id = ? AND business_date = ?
            "#,
        )
        .bind(client_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

pub struct MySqlAccumulatorUnitOfWork {
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlAccumulatorUnitOfWork {
    fn tx(&mut self) -> Result<&mut Transaction<'static, MySql>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::internal("Accumulator unit of work already committed"))
    }
}

#[async_trait]
impl AccumulatorUnitOfWork for MySqlAccumulatorUnitOfWork {
    async fn get_or_create_today_accumulator(
        &mut self,
        client_id: &str,
        date: NaiveDate,
    ) -> Result<DailyShippingAccumulator> {
        let fresh = DailyShippingAccumulator::new(client_id, date);
        let tx = self.tx()?;

        sqlx::query(
            r#"
            INSERT IGNORE INTO daily_shipping_accumulators (
                client_id, business_date, cumulative_subtotal, cumulative_shipping_charged,
                pending_adjustment_amount, free_shipping_refunded, updated_at
            ) VALUES (?, ?, 0, 0, 0, FALSE, ?)
            "#,
        )
        .bind(&fresh.client_id)
        .bind(fresh.date)
        .bind(fresh.updated_at)
        .execute(&mut **tx)
        .await?;

        let row = sqlx::query_as::<_, AccumulatorRow>(
            r#"
            SELECT client_id, business_date, cumulative_subtotal, cumulative_shipping_charged,
                   pending_adjustment_amount, free_shipping_refunded, updated_at
            FROM daily_shipping_accumulators
            WHERE client_id = ? AND business_date = ?
            FOR UPDATE
            "#,
        )
        .bind(client_id)
        .bind(date)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }

    async fn persist_accumulator(&mut self, accumulator: &DailyShippingAccumulator) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE daily_shipping_accumulators
            SET cumulative_subtotal = ?, cumulative_shipping_charged = ?,
                pending_adjustment_amount = ?, free_shipping_refunded = ?, updated_at = ?
            WHERE client_id = ? AND business_date = ?
            "#,
        )
        .bind(accumulator.cumulative_subtotal)
        .bind(accumulator.cumulative_shipping_charged)
        .bind(accumulator.pending_adjustment_amount)
        .bind(accumulator.free_shipping_refunded)
        .bind(accumulator.updated_at)
        .bind(&accumulator.client_id)
        .bind(accumulator.date)
        .execute(&mut **self.tx()?)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::conflict(format!(
                "Shipping accumulator for {} on {} disappeared",
                accumulator.client_id, accumulator.date
            )));
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::internal("Accumulator unit of work already committed"))?;
        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ShippingProfileRow {
    client_id: String,
    shipping_type: String,
    free_shipping_threshold: Decimal,
}

impl TryFrom<ShippingProfileRow> for ShippingProfile {
    type Error = AppError;

    fn try_from(row: ShippingProfileRow) -> Result<Self> {
        let shipping_type = ShippingType::try_from(row.shipping_type)
            .map_err(AppError::InvalidShippingProfile)?;

        Ok(ShippingProfile {
            client_id: row.client_id,
            shipping_type,
            free_shipping_threshold: row.free_shipping_threshold,
        })
    }
}

/// Database row representation for daily_shipping_accumulators table
#[derive(sqlx::FromRow)]
struct AccumulatorRow {
    client_id: String,
    business_date: NaiveDate,
    cumulative_subtotal: Decimal,
    cumulative_shipping_charged: Decimal,
    pending_adjustment_amount: Decimal,
    free_shipping_refunded: bool,
    updated_at: NaiveDateTime,
}

impl From<AccumulatorRow> for DailyShippingAccumulator {
    fn from(row: AccumulatorRow) -> Self {
        DailyShippingAccumulator {
            client_id: row.client_id,
            date: row.business_date,
            cumulative_subtotal: row.cumulative_subtotal,
            cumulative_shipping_charged: row.cumulative_shipping_charged,
            pending_adjustment_amount: row.pending_adjustment_amount,
            free_shipping_refunded: row.free_shipping_refunded,
            updated_at: row.updated_at,
        }
    }
}
