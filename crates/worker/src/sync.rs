use nutriwise_core::catalog::http::normalize_catalog;
use nutriwise_core::catalog::{CatalogStore, HttpJsonCatalog, StaticCatalog};
use nutriwise_core::config::Settings;
use nutriwise_core::domain::supplement::SupplementCandidate;
use nutriwise_core::storage::lock::CatalogSyncLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Seed,
    Http,
}

impl CatalogSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Http => "http_json",
        }
    }
}

pub async fn fetch_catalog(
    settings: &Settings,
    source: CatalogSource,
) -> anyhow::Result<Vec<SupplementCandidate>> {
    let candidates = match source {
        CatalogSource::Seed => StaticCatalog::default().candidates().to_vec(),
        CatalogSource::Http => {
            HttpJsonCatalog::from_settings(settings)?
                .list_candidates()
                .await?
        }
    };

    prepare_catalog(candidates)
}

/// Validates and normalizes every record; rejects empty catalogs and
/// duplicate names (case-insensitive).
pub fn prepare_catalog(
    candidates: Vec<SupplementCandidate>,
) -> anyhow::Result<Vec<SupplementCandidate>> {
    anyhow::ensure!(!candidates.is_empty(), "catalog must be non-empty");
    normalize_catalog(candidates)
}

pub async fn sync_catalog(
    pool: &sqlx::PgPool,
    settings: &Settings,
    source: CatalogSource,
) -> anyhow::Result<()> {
    let Some(lock) = CatalogSyncLock::try_acquire(pool).await? else {
        tracing::warn!("catalog sync lock not acquired; another sync in progress");
        return Ok(());
    };

    let res = run_locked(pool, settings, source).await;

    if let Err(err) = lock.release().await {
        tracing::warn!(error = %format!("{err:#}"), "catalog sync lock release failed");
    }
    res
}

async fn run_locked(
    pool: &sqlx::PgPool,
    settings: &Settings,
    source: CatalogSource,
) -> anyhow::Result<()> {
    let result = match fetch_catalog(settings, source).await {
        Ok(candidates) => {
            nutriwise_core::storage::catalog::upsert_candidates_atomic(pool, &candidates)
                .await
                .map(|affected| (candidates.len(), affected))
        }
        Err(err) => Err(err),
    };

    match result {
        Ok((count, affected)) => {
            let run_id = nutriwise_core::storage::catalog::record_sync_run(
                pool,
                source.as_str(),
                "success",
                None,
                count,
            )
            .await?;
            tracing::info!(%run_id, source = source.as_str(), count, affected, "catalog synced");
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let run_id = nutriwise_core::storage::catalog::record_sync_run(
                pool,
                source.as_str(),
                "error",
                Some(&format!("{:#}", err)),
                0,
            )
            .await?;
            tracing::error!(%run_id, source = source.as_str(), error = %err, "catalog sync failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutriwise_core::domain::profile::UserProfile;
    use nutriwise_core::stack::{build_stack, StackOptions};

    #[test]
    fn seed_catalog_passes_validation() {
        let seed = StaticCatalog::default().candidates().to_vec();
        let n = seed.len();
        assert_eq!(prepare_catalog(seed).unwrap().len(), n);
    }

    #[test]
    fn rejects_empty_and_duplicate_catalogs() {
        assert!(prepare_catalog(Vec::new()).is_err());

        let mut seed = StaticCatalog::default().candidates().to_vec();
        let mut dup = seed[0].clone();
        dup.name = dup.name.to_uppercase();
        seed.push(dup);
        assert!(prepare_catalog(seed).is_err());
    }

    #[test]
    fn external_tags_match_synonym_goals() {
        let mut record = StaticCatalog::default()
            .candidates()
            .iter()
            .find(|c| c.target_tags.contains("muscle-building"))
            .cloned()
            .unwrap();
        record.name = "Partner Creatine".to_string();
        record.target_tags = ["Muscle_Building".to_string()].into_iter().collect();
        record.incompatible_diets = ["Keto".to_string()].into_iter().collect();

        let catalog = prepare_catalog(vec![record]).unwrap();
        assert!(catalog[0].incompatible_diets.contains("keto"));

        let profile = UserProfile {
            monthly_budget: 200.0,
            fitness_goals: ["muscle gain".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let stack = build_stack(&profile, &catalog, &StackOptions::default());
        assert_eq!(stack.names(), vec!["Partner Creatine"]);
        assert_eq!(
            stack.supplements[0].matched_tags,
            vec!["muscle-building".to_string()]
        );

        let keto = UserProfile {
            diet_type: Some("keto".to_string()),
            ..profile
        };
        assert!(build_stack(&keto, &catalog, &StackOptions::default()).is_empty());
    }
}
