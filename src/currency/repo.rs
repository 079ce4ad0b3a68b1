use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Exchange rate record for an ordered currency pair. (USD,EUR) and
/// (EUR,USD) are independent rows; neither is ever derived from the other.
#[derive(Debug, Clone, FromRow)]
pub struct CurrencyPair {
    pub id: Uuid,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: f64,
    pub last_updated: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CurrencyPair {
    /// All pairs, base code ascending. The target code is a tiebreaker so
    /// repeated listings come back in the same order.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<CurrencyPair>> {
        let rows = sqlx::query_as::<_, CurrencyPair>(
            r#"
            SELECT id, base_currency, target_currency, rate, last_updated, created_at, updated_at
            FROM currency_pairs
            ORDER BY base_currency ASC, target_currency ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CurrencyPair>> {
        let pair = sqlx::query_as::<_, CurrencyPair>(
            r#"
            SELECT id, base_currency, target_currency, rate, last_updated, created_at, updated_at
            FROM currency_pairs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(pair)
    }

    /// Exact-match lookup on the ordered pair. No inverse fallback.
    pub async fn find_by_codes(
        db: &PgPool,
        base: &str,
        target: &str,
    ) -> anyhow::Result<Option<CurrencyPair>> {
        let pair = sqlx::query_as::<_, CurrencyPair>(
            r#"
            SELECT id, base_currency, target_currency, rate, last_updated, created_at, updated_at
            FROM currency_pairs
            WHERE base_currency = $1 AND target_currency = $2
            "#,
        )
        .bind(base)
        .bind(target)
        .fetch_optional(db)
        .await?;
        Ok(pair)
    }

    pub async fn create(
        db: &PgPool,
        base: &str,
        target: &str,
        rate: f64,
    ) -> sqlx::Result<CurrencyPair> {
        let pair = sqlx::query_as::<_, CurrencyPair>(
            r#"
            INSERT INTO currency_pairs (base_currency, target_currency, rate)
            VALUES ($1, $2, $3)
            RETURNING id, base_currency, target_currency, rate, last_updated, created_at, updated_at
            "#,
        )
        .bind(base)
        .bind(target)
        .bind(rate)
        .fetch_one(db)
        .await?;
        Ok(pair)
    }

    /// Persists a resolved update. `last_updated` is passed through as-is:
    /// the caller refreshes it only when the rate actually changed.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        base: &str,
        target: &str,
        rate: f64,
        last_updated: OffsetDateTime,
    ) -> sqlx::Result<CurrencyPair> {
        let pair = sqlx::query_as::<_, CurrencyPair>(
            r#"
            UPDATE currency_pairs
            SET base_currency = $2,
                target_currency = $3,
                rate = $4,
                last_updated = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, base_currency, target_currency, rate, last_updated, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(base)
        .bind(target)
        .bind(rate)
        .bind(last_updated)
        .fetch_one(db)
        .await?;
        Ok(pair)
    }

    /// Returns false when the id did not resolve to a row.
    pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM currency_pairs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
