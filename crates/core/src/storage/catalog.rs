use crate::catalog::CatalogStore;
use crate::domain::contract::validate_and_normalize_candidate;
use crate::domain::supplement::{EvidenceLevel, SupplementCandidate};
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

type CandidateRow = (
    String,
    String,
    f64,
    String,
    i32,
    Vec<String>,
    String,
    String,
    String,
    Vec<String>,
);

/// Replaces the stored catalog with `items` in one transaction: upserts by
/// name, keeps the given order, and removes supplements no longer listed.
pub async fn upsert_candidates_atomic(
    pool: &sqlx::PgPool,
    items: &[SupplementCandidate],
) -> anyhow::Result<u64> {
    anyhow::ensure!(!items.is_empty(), "items must be non-empty");

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let mut affected: u64 = 0;
    let chunk_size: usize = std::env::var("CATALOG_UPSERT_BATCH")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(200);

    anyhow::ensure!(chunk_size >= 1, "CATALOG_UPSERT_BATCH must be >= 1");

    for (batch_idx, chunk) in items.chunks(chunk_size).enumerate() {
        let offset = batch_idx * chunk_size;
        let t0 = std::time::Instant::now();
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO supplement_candidates (name, category, monthly_price, evidence_level, study_count, \
             target_tags, reasoning_template, dosage, timing, incompatible_diets, sort_order, updated_at) ",
        );
        qb.push_values(chunk.iter().enumerate(), |mut b, (i, c)| {
            b.push_bind(c.name.trim().to_string())
                .push_bind(c.category.trim().to_string())
                .push_bind(c.monthly_price)
                .push_bind(c.evidence_level.as_str())
                .push_bind(i32::try_from(c.study_count).unwrap_or(i32::MAX))
                .push_bind(c.target_tags.iter().cloned().collect::<Vec<String>>())
                .push_bind(c.reasoning_template.clone())
                .push_bind(c.dosage.clone())
                .push_bind(c.timing.clone())
                .push_bind(c.incompatible_diets.iter().cloned().collect::<Vec<String>>())
                .push_bind(i32::try_from(offset + i).unwrap_or(i32::MAX))
                .push_bind(Utc::now());
        });
        qb.push(
            " ON CONFLICT (name) DO UPDATE \
               SET category = EXCLUDED.category, monthly_price = EXCLUDED.monthly_price, \
                   evidence_level = EXCLUDED.evidence_level, study_count = EXCLUDED.study_count, \
                   target_tags = EXCLUDED.target_tags, reasoning_template = EXCLUDED.reasoning_template, \
                   dosage = EXCLUDED.dosage, timing = EXCLUDED.timing, \
                   incompatible_diets = EXCLUDED.incompatible_diets, sort_order = EXCLUDED.sort_order, \
                   updated_at = EXCLUDED.updated_at",
        );

        let res = qb
            .build()
            .persistent(false)
            .execute(&mut *tx)
            .await
            .context("batch upsert supplement_candidates failed")?;
        affected += res.rows_affected();

        tracing::debug!(
            batch_idx,
            batch_size = chunk.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "supplement_candidates batch upsert"
        );
    }

    let names: Vec<String> = items.iter().map(|c| c.name.trim().to_string()).collect();
    let removed = sqlx::query("DELETE FROM supplement_candidates WHERE NOT (name = ANY($1))")
        .persistent(false)
        .bind(names)
        .execute(&mut *tx)
        .await
        .context("prune supplement_candidates failed")?
        .rows_affected();
    if removed > 0 {
        tracing::info!(removed, "pruned supplements missing from catalog");
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(affected)
}

pub async fn list_candidates(pool: &sqlx::PgPool) -> anyhow::Result<Vec<SupplementCandidate>> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        "SELECT name, category, monthly_price, evidence_level, study_count, target_tags, \
                reasoning_template, dosage, timing, incompatible_diets \
         FROM supplement_candidates \
         ORDER BY sort_order ASC, name ASC",
    )
    .persistent(false)
    .fetch_all(pool)
    .await
    .context("select supplement_candidates failed")?;

    rows.into_iter().map(row_to_candidate).collect()
}

fn row_to_candidate(row: CandidateRow) -> anyhow::Result<SupplementCandidate> {
    let (
        name,
        category,
        monthly_price,
        evidence_level,
        study_count,
        target_tags,
        reasoning_template,
        dosage,
        timing,
        incompatible_diets,
    ) = row;

    let evidence_level = evidence_level
        .parse::<EvidenceLevel>()
        .with_context(|| format!("invalid evidence_level in DB for {name}"))?;
    let study_count = u32::try_from(study_count)
        .with_context(|| format!("invalid study_count in DB for {name}: {study_count}"))?;

    let candidate = SupplementCandidate {
        name,
        category,
        monthly_price,
        evidence_level,
        study_count,
        target_tags: target_tags.into_iter().collect(),
        reasoning_template,
        dosage,
        timing,
        incompatible_diets: incompatible_diets.into_iter().collect(),
    };
    validate_and_normalize_candidate(candidate).context("invalid supplement row in DB")
}

pub async fn record_sync_run(
    pool: &sqlx::PgPool,
    source: &str,
    status: &str,
    error: Option<&str>,
    candidate_count: usize,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let generated_at: DateTime<Utc> = Utc::now();

    sqlx::query(
        "INSERT INTO catalog_sync_runs (id, generated_at, source, status, error, candidate_count) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(id)
    .bind(generated_at)
    .bind(source)
    .bind(status)
    .bind(error)
    .bind(i32::try_from(candidate_count).unwrap_or(i32::MAX))
    .execute(pool)
    .await
    .context("insert catalog_sync_runs failed")?;

    Ok(id)
}

/// Catalog backed by the `supplement_candidates` table.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: sqlx::PgPool,
}

impl PgCatalog {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalog {
    fn store_name(&self) -> &'static str {
        "postgres"
    }

    async fn list_candidates(&self) -> anyhow::Result<Vec<SupplementCandidate>> {
        list_candidates(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(evidence_level: &str, study_count: i32) -> CandidateRow {
        (
            "Melatonin".to_string(),
            "sleep aid".to_string(),
            8.0,
            evidence_level.to_string(),
            study_count,
            vec!["sleep".to_string()],
            "{name} helps with {goals}.".to_string(),
            "0.5-3 mg".to_string(),
            "before bed".to_string(),
            vec![],
        )
    }

    #[test]
    fn decodes_row() {
        let c = row_to_candidate(row("moderate", 120)).unwrap();
        assert_eq!(c.evidence_level, EvidenceLevel::Moderate);
        assert_eq!(c.study_count, 120);
        assert!(c.target_tags.contains("sleep"));
    }

    #[test]
    fn rejects_corrupt_row() {
        assert!(row_to_candidate(row("excellent", 1)).is_err());
        assert!(row_to_candidate(row("high", -1)).is_err());
    }

    #[test]
    fn normalizes_legacy_row_tags() {
        let mut r = row("high", 40);
        r.5 = vec!["Sleep Quality".to_string(), "Muscle Gain".to_string()];
        r.9 = vec!["Vegan".to_string()];
        let c = row_to_candidate(r).unwrap();
        assert!(c.target_tags.contains("sleep"));
        assert!(c.target_tags.contains("muscle-building"));
        assert!(c.incompatible_diets.contains("vegan"));
    }
}
