use crate::domain::profile::UserProfile;
use crate::domain::stack::{Stack, StackItem};
use crate::domain::supplement::EvidenceLevel;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StoredStack {
    pub stack_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub catalog_source: String,
    pub stack: Stack,
}

type ItemRow = (
    i32,
    String,
    String,
    String,
    String,
    f64,
    String,
    i32,
    Vec<String>,
    String,
);

pub async fn persist_stack(
    pool: &sqlx::PgPool,
    profile: &UserProfile,
    catalog_source: &str,
    stack: &Stack,
) -> anyhow::Result<Uuid> {
    anyhow::ensure!(
        stack.total_monthly_cost <= stack.budget,
        "stack total {} exceeds budget {}",
        stack.total_monthly_cost,
        stack.budget
    );

    let profile_json = serde_json::to_value(profile).context("serialize profile failed")?;

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let stack_id: Uuid = sqlx::query_scalar(
        "INSERT INTO supplement_stacks (generated_at, catalog_source, profile, budget, total_monthly_cost, evidence_score) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(Utc::now())
    .bind(catalog_source)
    .bind(profile_json)
    .bind(stack.budget)
    .bind(stack.total_monthly_cost)
    .bind(stack.evidence_score)
    .fetch_one(&mut *tx)
    .await
    .context("insert supplement_stacks failed")?;

    for item in &stack.supplements {
        insert_item(&mut tx, stack_id, item).await?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(stack_id)
}

async fn insert_item(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    stack_id: Uuid,
    item: &StackItem,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO supplement_stack_items (stack_id, rank, name, category, dosage, timing, monthly_price, \
         evidence_level, study_count, matched_tags, reasoning) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(stack_id)
    .bind(item.rank)
    .bind(&item.name)
    .bind(&item.category)
    .bind(&item.dosage)
    .bind(&item.timing)
    .bind(item.monthly_price)
    .bind(item.evidence_level.as_str())
    .bind(i32::try_from(item.study_count).unwrap_or(i32::MAX))
    .bind(&item.matched_tags)
    .bind(&item.reasoning)
    .execute(&mut **tx)
    .await
    .context("insert supplement_stack_items failed")?;

    Ok(())
}

/// Fetches one stack by id, or the most recent one when `stack_id` is `None`.
pub async fn fetch_stack(
    pool: &sqlx::PgPool,
    stack_id: Option<Uuid>,
) -> anyhow::Result<Option<StoredStack>> {
    let row = match stack_id {
        Some(id) => {
            sqlx::query_as::<_, (Uuid, DateTime<Utc>, String, f64, f64, f64)>(
                "SELECT id, generated_at, catalog_source, budget, total_monthly_cost, evidence_score \
                 FROM supplement_stacks \
                 WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, (Uuid, DateTime<Utc>, String, f64, f64, f64)>(
                "SELECT id, generated_at, catalog_source, budget, total_monthly_cost, evidence_score \
                 FROM supplement_stacks \
                 ORDER BY generated_at DESC \
                 LIMIT 1",
            )
            .fetch_optional(pool)
            .await?
        }
    };

    let Some((id, generated_at, catalog_source, budget, total_monthly_cost, evidence_score)) = row
    else {
        return Ok(None);
    };

    let supplements = fetch_items(pool, id).await?;

    Ok(Some(StoredStack {
        stack_id: id,
        generated_at,
        catalog_source,
        stack: Stack {
            supplements,
            total_monthly_cost,
            evidence_score,
            budget,
        },
    }))
}

async fn fetch_items(pool: &sqlx::PgPool, stack_id: Uuid) -> anyhow::Result<Vec<StackItem>> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT rank, name, category, dosage, timing, monthly_price, evidence_level, study_count, \
                matched_tags, reasoning \
         FROM supplement_stack_items \
         WHERE stack_id = $1 \
         ORDER BY rank ASC",
    )
    .bind(stack_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| row_to_item(stack_id, row))
        .collect()
}

fn row_to_item(stack_id: Uuid, row: ItemRow) -> anyhow::Result<StackItem> {
    let (
        rank,
        name,
        category,
        dosage,
        timing,
        monthly_price,
        evidence_level,
        study_count,
        matched_tags,
        reasoning,
    ) = row;

    let evidence_level = evidence_level.parse::<EvidenceLevel>().with_context(|| {
        format!("invalid evidence_level in DB for stack_id={stack_id}, name={name}")
    })?;
    let study_count = u32::try_from(study_count).with_context(|| {
        format!("invalid study_count in DB for stack_id={stack_id}, name={name}")
    })?;

    Ok(StackItem {
        rank,
        name,
        category,
        dosage,
        timing,
        monthly_price,
        evidence_level,
        study_count,
        matched_tags,
        reasoning,
    })
}
