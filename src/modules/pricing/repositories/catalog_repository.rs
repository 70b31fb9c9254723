use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::pricing::models::{
    DiscountTier, OptionSurcharge, PriceProfile, SpecificationSurcharge,
};

/// Read access to catalog price profiles
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Load the price profile of a product or half-product
    ///
    /// # Errors
    /// * `NotFound` - no profile for `sellable_id`
    async fn get_price_profile(&self, sellable_id: &str) -> Result<PriceProfile>;

    /// Store a profile, replacing surcharges and tiers. Validates first.
    async fn save_price_profile(&self, profile: &PriceProfile) -> Result<()>;
}

pub struct MySqlCatalogRepository {
    pool: MySqlPool,
}

impl MySqlCatalogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SpecificationRow {
    specification_id: String,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    option_id: String,
    value_name: String,
    price: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct TierRow {
    min_quantity: i64,
    max_quantity: Option<i64>,
    discount_rate: Decimal,
}

#[async_trait]
impl CatalogRepository for MySqlCatalogRepository {
    async fn get_price_profile(&self, sellable_id: &str) -> Result<PriceProfile> {
        // Shared lock on the parent row holds off a concurrent save, which
        // writes the parent before replacing the children
        let mut tx = self.pool.begin().await?;

        let base_price: Option<Decimal> = sqlx::query_scalar(
            "SELECT base_price FROM price_profiles WHERE sellable_id = ? FOR SHARE",
        )
        .bind(sellable_id)
        .fetch_optional(&mut *tx)
        .await?;

        let base_price = base_price
            .ok_or_else(|| AppError::not_found(format!("Price profile '{}'", sellable_id)))?;

        let specifications = sqlx::query_as::<_, SpecificationRow>(
            r#"
            SELECT specification_id, price
            FROM specification_surcharges
            WHERE sellable_id = ?
            ORDER BY sort_order ASC
            "#,
        )
        .bind(sellable_id)
        .fetch_all(&mut *tx)
        .await?;

        let options = sqlx::query_as::<_, OptionRow>(
            r#"
            SELECT option_id, value_name, price
            FROM option_surcharges
            WHERE sellable_id = ?
            ORDER BY sort_order ASC
            "#,
        )
        .bind(sellable_id)
        .fetch_all(&mut *tx)
        .await?;

        let tiers = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT min_quantity, max_quantity, discount_rate
            FROM discount_tiers
            WHERE sellable_id = ?
            ORDER BY sort_order ASC
            "#,
        )
        .bind(sellable_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PriceProfile {
            sellable_id: sellable_id.to_string(),
            base_price,
            specification_surcharges: specifications
                .into_iter()
                .map(|r| SpecificationSurcharge {
                    specification_id: r.specification_id,
                    price: r.price,
                })
                .collect(),
            option_surcharges: options
                .into_iter()
                .map(|r| OptionSurcharge {
                    option_id: r.option_id,
                    value_name: r.value_name,
                    price: r.price,
                })
                .collect(),
            discount_tiers: tiers
                .into_iter()
                .map(|r| DiscountTier::new(r.min_quantity, r.max_quantity, r.discount_rate))
                .collect(),
        })
    }

    async fn save_price_profile(&self, profile: &PriceProfile) -> Result<()> {
        profile.validate()?;

        let mut tx = self.pool.begin().await?;
        let id = profile.sellable_id.as_str();

        sqlx::query(
            r#"
            INSERT INTO price_profiles (sellable_id, base_price, updated_at)
            VALUES (?, ?, NOW())
            ON DUPLICATE KEY UPDATE base_price = VALUES(base_price), updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(profile.base_price)
        .execute(&mut *tx)
        .await?;

        for table in ["specification_surcharges", "option_surcharges", "discount_tiers"] {
            sqlx::query(&format!("DELETE FROM {} WHERE sellable_id = ?", table))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        for (order, s) in profile.specification_surcharges.iter().enumerate() {
            sqlx::query(
                "INSERT INTO specification_surcharges (sellable_id, specification_id, price, sort_order) VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&s.specification_id)
            .bind(s.price)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        for (order, o) in profile.option_surcharges.iter().enumerate() {
            sqlx::query(
                "INSERT INTO option_surcharges (sellable_id, option_id, value_name, price, sort_order) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&o.option_id)
            .bind(&o.value_name)
            .bind(o.price)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        for (order, t) in profile.discount_tiers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO discount_tiers (sellable_id, min_quantity, max_quantity, discount_rate, sort_order) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(t.min_quantity)
            .bind(t.max_quantity)
            .bind(t.discount_rate)
            .bind(order as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
