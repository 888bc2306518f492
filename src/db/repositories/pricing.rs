//! Pricing repository
//!
//! Training plans with their benefits and session tariffs with their prices.

use crate::db::DynDatabasePool;
use crate::models::{
    category_str, parse_category, Money, PlanBenefit, PlanInput, PriceListFilter, SessionTariff,
    TariffInput, TariffPrice, TrainingPlan,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use super::push_id_list;

/// Pricing repository trait
#[async_trait]
pub trait PricingRepository: Send + Sync {
    /// Plans ordered by category, order and price
    async fn list_plans(&self, filter: &PriceListFilter) -> Result<Vec<TrainingPlan>>;
    async fn get_plan(&self, id: i64) -> Result<Option<TrainingPlan>>;
    async fn create_plan(&self, input: &PlanInput) -> Result<TrainingPlan>;
    async fn update_plan(&self, id: i64, input: &PlanInput) -> Result<Option<TrainingPlan>>;
    async fn delete_plan(&self, id: i64) -> Result<bool>;

    /// Tariffs ordered by category, order and id
    async fn list_tariffs(&self, filter: &PriceListFilter) -> Result<Vec<SessionTariff>>;
    async fn get_tariff(&self, id: i64) -> Result<Option<SessionTariff>>;
    async fn create_tariff(&self, input: &TariffInput) -> Result<SessionTariff>;
    async fn update_tariff(&self, id: i64, input: &TariffInput) -> Result<Option<SessionTariff>>;
    async fn delete_tariff(&self, id: i64) -> Result<bool>;
}

/// SQLx-based pricing repository implementation
pub struct SqlxPricingRepository {
    pool: DynDatabasePool,
}

impl SqlxPricingRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PricingRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.sqlite()
    }

    async fn query_plans(
        &self,
        filter: &PriceListFilter,
        id: Option<i64>,
    ) -> Result<Vec<TrainingPlan>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, category, icon, description, price, period, buy_link, buy_label, \
             is_featured, sort_order, created_at FROM training_plans WHERE 1 = 1",
        );
        push_price_list_filter(&mut qb, filter, id);
        qb.push(" ORDER BY category, sort_order, price, id");

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to list plans")?;
        let mut plans = rows.iter().map(row_to_plan).collect::<Result<Vec<_>>>()?;

        let ids: Vec<i64> = plans.iter().map(|p| p.id).collect();
        if !ids.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT plan_id, id, text, sort_order FROM training_plan_benefits WHERE plan_id",
            );
            push_id_list(&mut qb, &ids);
            qb.push(" ORDER BY sort_order, id");

            let rows = qb
                .build()
                .fetch_all(self.db())
                .await
                .context("Failed to load plan benefits")?;

            let mut by_plan: HashMap<i64, Vec<PlanBenefit>> = HashMap::new();
            for row in rows {
                let plan_id: i64 = row.try_get("plan_id")?;
                by_plan.entry(plan_id).or_default().push(PlanBenefit {
                    id: row.try_get("id")?,
                    text: row.try_get("text")?,
                    order: row.try_get("sort_order")?,
                });
            }
            for plan in &mut plans {
                plan.benefits = by_plan.remove(&plan.id).unwrap_or_default();
            }
        }

        Ok(plans)
    }

    async fn query_tariffs(
        &self,
        filter: &PriceListFilter,
        id: Option<i64>,
    ) -> Result<Vec<SessionTariff>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, title, category, description, is_featured, sort_order \
             FROM session_tariffs WHERE 1 = 1",
        );
        push_price_list_filter(&mut qb, filter, id);
        qb.push(" ORDER BY category, sort_order, id");

        let rows = qb
            .build()
            .fetch_all(self.db())
            .await
            .context("Failed to list tariffs")?;
        let mut tariffs = rows.iter().map(row_to_tariff).collect::<Result<Vec<_>>>()?;

        let ids: Vec<i64> = tariffs.iter().map(|t| t.id).collect();
        if !ids.is_empty() {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT tariff_id, id, label, price, sort_order FROM session_tariff_prices \
                 WHERE tariff_id",
            );
            push_id_list(&mut qb, &ids);
            qb.push(" ORDER BY sort_order, id");

            let rows = qb
                .build()
                .fetch_all(self.db())
                .await
                .context("Failed to load tariff prices")?;

            let mut by_tariff: HashMap<i64, Vec<TariffPrice>> = HashMap::new();
            for row in rows {
                let tariff_id: i64 = row.try_get("tariff_id")?;
                by_tariff.entry(tariff_id).or_default().push(TariffPrice {
                    id: row.try_get("id")?,
                    label: row.try_get("label")?,
                    price: Money::from_minor(row.try_get("price")?),
                    order: row.try_get("sort_order")?,
                });
            }
            for tariff in &mut tariffs {
                tariff.prices = by_tariff.remove(&tariff.id).unwrap_or_default();
            }
        }

        Ok(tariffs)
    }
}

fn push_price_list_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PriceListFilter, id: Option<i64>) {
    if let Some(id) = id {
        qb.push(" AND id = ").push_bind(id);
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND is_featured = ").push_bind(featured);
    }
}

#[async_trait]
impl PricingRepository for SqlxPricingRepository {
    async fn list_plans(&self, filter: &PriceListFilter) -> Result<Vec<TrainingPlan>> {
        self.query_plans(filter, None).await
    }

    async fn get_plan(&self, id: i64) -> Result<Option<TrainingPlan>> {
        Ok(self
            .query_plans(&PriceListFilter::default(), Some(id))
            .await?
            .into_iter()
            .next())
    }

    async fn create_plan(&self, input: &PlanInput) -> Result<TrainingPlan> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO training_plans (title, category, icon, description, price, period,
                buy_link, buy_label, is_featured, sort_order, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(category_str(input.category))
        .bind(&input.icon)
        .bind(&input.description)
        .bind(input.price.minor())
        .bind(&input.period)
        .bind(&input.buy_link)
        .bind(&input.buy_label)
        .bind(input.is_featured)
        .bind(input.order)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .context("Failed to create plan")?;

        let id = result.last_insert_rowid();
        write_benefits(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_plan(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Plan not found after insert"))
    }

    async fn update_plan(&self, id: i64, input: &PlanInput) -> Result<Option<TrainingPlan>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE training_plans
            SET title = ?, category = ?, icon = ?, description = ?, price = ?, period = ?,
                buy_link = ?, buy_label = ?, is_featured = ?, sort_order = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(category_str(input.category))
        .bind(&input.icon)
        .bind(&input.description)
        .bind(input.price.minor())
        .bind(&input.period)
        .bind(&input.buy_link)
        .bind(&input.buy_label)
        .bind(input.is_featured)
        .bind(input.order)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update plan")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM training_plan_benefits WHERE plan_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear plan benefits")?;
        write_benefits(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_plan(id).await
    }

    async fn delete_plan(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM training_plans WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete plan")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tariffs(&self, filter: &PriceListFilter) -> Result<Vec<SessionTariff>> {
        self.query_tariffs(filter, None).await
    }

    async fn get_tariff(&self, id: i64) -> Result<Option<SessionTariff>> {
        Ok(self
            .query_tariffs(&PriceListFilter::default(), Some(id))
            .await?
            .into_iter()
            .next())
    }

    async fn create_tariff(&self, input: &TariffInput) -> Result<SessionTariff> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO session_tariffs (title, category, description, is_featured, sort_order)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(category_str(input.category))
        .bind(&input.description)
        .bind(input.is_featured)
        .bind(input.order)
        .execute(&mut *tx)
        .await
        .context("Failed to create tariff")?;

        let id = result.last_insert_rowid();
        write_prices(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_tariff(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Tariff not found after insert"))
    }

    async fn update_tariff(&self, id: i64, input: &TariffInput) -> Result<Option<SessionTariff>> {
        let mut tx = self.db().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE session_tariffs
            SET title = ?, category = ?, description = ?, is_featured = ?, sort_order = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.title)
        .bind(category_str(input.category))
        .bind(&input.description)
        .bind(input.is_featured)
        .bind(input.order)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update tariff")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM session_tariff_prices WHERE tariff_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear tariff prices")?;
        write_prices(&mut tx, id, input).await?;
        tx.commit().await?;

        self.get_tariff(id).await
    }

    async fn delete_tariff(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session_tariffs WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete tariff")?;

        Ok(result.rows_affected() > 0)
    }
}

async fn write_benefits(conn: &mut SqliteConnection, plan_id: i64, input: &PlanInput) -> Result<()> {
    for benefit in &input.benefits {
        sqlx::query("INSERT INTO training_plan_benefits (plan_id, text, sort_order) VALUES (?, ?, ?)")
            .bind(plan_id)
            .bind(&benefit.text)
            .bind(benefit.order)
            .execute(&mut *conn)
            .await
            .context("Failed to insert plan benefit")?;
    }
    Ok(())
}

async fn write_prices(conn: &mut SqliteConnection, tariff_id: i64, input: &TariffInput) -> Result<()> {
    for price in &input.prices {
        sqlx::query(
            "INSERT INTO session_tariff_prices (tariff_id, label, price, sort_order) VALUES (?, ?, ?, ?)",
        )
        .bind(tariff_id)
        .bind(&price.label)
        .bind(price.price.minor())
        .bind(price.order)
        .execute(&mut *conn)
        .await
        .context("Failed to insert tariff price")?;
    }
    Ok(())
}

fn row_to_plan(row: &sqlx::sqlite::SqliteRow) -> Result<TrainingPlan> {
    let category: String = row.try_get("category")?;
    Ok(TrainingPlan {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        category: parse_category(&category),
        icon: row.try_get("icon")?,
        description: row.try_get("description")?,
        price: Money::from_minor(row.try_get("price")?),
        period: row.try_get("period")?,
        buy_link: row.try_get("buy_link")?,
        buy_label: row.try_get("buy_label")?,
        is_featured: row.try_get("is_featured")?,
        order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        benefits: Vec::new(),
    })
}

fn row_to_tariff(row: &sqlx::sqlite::SqliteRow) -> Result<SessionTariff> {
    let category: String = row.try_get("category")?;
    Ok(SessionTariff {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        category: parse_category(&category),
        description: row.try_get("description")?,
        is_featured: row.try_get("is_featured")?,
        order: row.try_get("sort_order")?,
        prices: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::PlanCategory;

    async fn setup_test_repo() -> SqlxPricingRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxPricingRepository::new(pool)
    }

    fn plan(title: &str, category: &str, price: &str, order: i64) -> PlanInput {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "category": category,
            "price": price,
            "order": order,
            "benefits": [{"text": "Второе", "order": 2}, {"text": "Первое", "order": 1}],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_plan_ordering_and_filters() {
        let repo = setup_test_repo().await;
        repo.create_plan(&plan("Дети", "kids", "3000", 0)).await.unwrap();
        repo.create_plan(&plan("Личный дорогой", "personal", "9000", 0)).await.unwrap();
        repo.create_plan(&plan("Личный дешевый", "personal", "5000", 0)).await.unwrap();
        repo.create_plan(&plan("Без категории", "", "100", 0)).await.unwrap();

        let all = repo.list_plans(&PriceListFilter::default()).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Без категории", "Дети", "Личный дешевый", "Личный дорогой"]
        );
        assert_eq!(all[1].benefits[0].text, "Первое");
        assert_eq!(all[0].category, None);

        let personal = repo
            .list_plans(&PriceListFilter {
                category: Some(PlanCategory::Personal),
                featured: None,
            })
            .await
            .unwrap();
        assert_eq!(personal.len(), 2);
        assert_eq!(personal[0].price.to_string(), "5000.00");
    }

    #[tokio::test]
    async fn test_plan_update_and_delete() {
        let repo = setup_test_repo().await;
        let created = repo.create_plan(&plan("A", "kids", "10", 0)).await.unwrap();

        let mut change = plan("B", "athlete", "20.50", 3);
        change.benefits.clear();
        let updated = repo.update_plan(created.id, &change).await.unwrap().unwrap();
        assert_eq!(updated.title, "B");
        assert_eq!(updated.price.minor(), 2050);
        assert!(updated.benefits.is_empty());

        assert!(repo.delete_plan(created.id).await.unwrap());
        assert!(repo.get_plan(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tariffs() {
        let repo = setup_test_repo().await;
        let input: TariffInput = serde_json::from_value(serde_json::json!({
            "title": "Разовые занятия",
            "category": "mini_group",
            "is_featured": true,
            "prices": [
                {"label": "1 занятие", "price": "1500", "order": 0},
                {"label": "Пробное", "price": 0, "order": 1}
            ]
        }))
        .unwrap();
        let tariff = repo.create_tariff(&input).await.unwrap();
        assert_eq!(tariff.prices.len(), 2);
        assert_eq!(tariff.prices[0].price.to_string(), "1500.00");

        let featured = repo
            .list_tariffs(&PriceListFilter {
                category: None,
                featured: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(featured.len(), 1);

        let none = repo
            .list_tariffs(&PriceListFilter {
                category: Some(PlanCategory::Kids),
                featured: None,
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        assert!(repo.update_tariff(999, &input).await.unwrap().is_none());
        assert!(repo.delete_tariff(tariff.id).await.unwrap());
    }
}
