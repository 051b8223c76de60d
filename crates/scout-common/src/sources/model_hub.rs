//! Model-hub adapter: authors of regional-language models.
//!
//! There is no profile endpoint behind this source, so records are synthesized
//! from the model listing and the aggregator applies the region filter.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{
    ListingTally, RegionPolicy, SourceAdapter, SourceContext, SourceError, PIONEER_SAMPLE,
    RECENT_ACTIVITY_DAYS,
};
use crate::{
    http::{FetchRequest, HUGGINGFACE_API_BASE, HUGGINGFACE_WEB_BASE},
    keywords::KeywordSet,
    ActivitySignals, CandidateRecord, Discovery, DiscoveryMethod,
};

pub const MODEL_SEARCH_TERMS: &[&str] = &["india", "hindi", "bengali", "tamil", "indic"];
pub const DEFAULT_MAX_AUTHORS: usize = 20;
pub const HUB_LOCATION: &str = "India (HuggingFace)";
const SEARCH_LIMIT: u32 = 20;
const AUTHOR_MODELS_LIMIT: u32 = 50;
const TOP_MODELS: usize = 3;
const PACE_PER_TERM: f64 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct HubModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "modelId")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "lastModified")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl HubModel {
    pub fn name(&self) -> &str {
        self.model_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }

    /// Declared author, else the namespace part of `author/model`.
    pub fn author_name(&self) -> Option<String> {
        if let Some(author) = self.author.as_deref().filter(|a| !a.trim().is_empty()) {
            return Some(author.trim().to_string());
        }
        self.name()
            .split_once('/')
            .map(|(namespace, _)| namespace.to_string())
            .filter(|namespace| !namespace.is_empty())
    }
}

pub fn hub_record(author: &str, model: &HubModel) -> CandidateRecord {
    let model_id = model.name().to_string();
    let mut record = CandidateRecord::new(
        author,
        Discovery::Huggingface {
            model_id: model_id.clone(),
            downloads: model.downloads,
        },
    );
    record.bio = format!("ML Builder - {model_id}");
    record.location = HUB_LOCATION.to_string();
    record.follower_count = model.downloads;
    record.avatar_url = format!("{HUGGINGFACE_WEB_BASE}/avatars/{author}");
    record.profile_url = format!("{HUGGINGFACE_WEB_BASE}/{author}");
    record
}

/// Activity signals over an author's model list.
pub fn model_activity(models: &[HubModel], pioneer: &KeywordSet, now: DateTime<Utc>) -> ActivitySignals {
    let recent_cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);

    // recency is unknown when the listing carries no timestamps
    let recent = models.iter().any(|m| m.last_modified.is_some()).then(|| {
        models
            .iter()
            .filter(|m| m.last_modified.is_some_and(|at| at >= recent_cutoff))
            .count() as u32
    });
    let pioneer_hits = models
        .iter()
        .take(PIONEER_SAMPLE)
        .filter(|m| pioneer.matches(&format!("{} {}", m.name(), m.tags.join(" "))))
        .count() as u32;

    let mut by_downloads: Vec<&HubModel> = models.iter().collect();
    by_downloads.sort_by(|a, b| b.downloads.cmp(&a.downloads));

    ActivitySignals {
        total_stars: Some(models.iter().map(|m| m.downloads).sum()),
        account_age_days: None,
        recent_artifacts: recent,
        pioneer_hits,
        top_repos: by_downloads
            .into_iter()
            .take(TOP_MODELS)
            .map(|m| m.name().to_string())
            .collect(),
        languages: Vec::new(),
    }
}

pub struct ModelHubSource {
    ctx: SourceContext,
    max_authors: usize,
}

impl ModelHubSource {
    pub fn new(ctx: SourceContext, max_authors: usize) -> Self {
        Self { ctx, max_authors }
    }

    async fn enrich(&self, record: &mut CandidateRecord) {
        let request = FetchRequest::public_json(format!("{HUGGINGFACE_API_BASE}/models"))
            .param("author", &record.identity)
            .param("limit", AUTHOR_MODELS_LIMIT)
            .param("full", "true");
        match self.ctx.client.get_json::<Vec<HubModel>>(&request).await {
            Ok(models) => {
                record.public_artifact_count = models.len() as u64;
                record.activity = model_activity(&models, &self.ctx.keywords.pioneer, self.ctx.now);
            }
            Err(err) => {
                debug!(author = %record.identity, error = %err, "author model list unavailable");
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for ModelHubSource {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Huggingface
    }

    fn region_policy(&self) -> RegionPolicy {
        RegionPolicy::Unfiltered
    }

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut tally = ListingTally::default();

        'terms: for &term in MODEL_SEARCH_TERMS {
            let request = FetchRequest::public_json(format!("{HUGGINGFACE_API_BASE}/models"))
                .param("search", term)
                .param("limit", SEARCH_LIMIT);
            let listing = self.ctx.client.get_json::<Vec<HubModel>>(&request).await;
            tally.record(&listing);

            match listing {
                Ok(models) => {
                    for model in models {
                        if records.len() >= self.max_authors {
                            break 'terms;
                        }
                        let Some(author) = model.author_name() else {
                            continue;
                        };
                        if !seen.insert(author.clone()) {
                            continue;
                        }

                        let mut record = hub_record(&author, &model);
                        if self.ctx.enrich_activity {
                            self.enrich(&mut record).await;
                        }
                        info!(author = %author, model = model.name(), downloads = model.downloads, "model author candidate");
                        records.push(record);
                    }
                }
                Err(err) => warn!(term, error = %err, "model search failed"),
            }

            self.ctx.client.pace(PACE_PER_TERM).await;
        }

        tally.finish(self.method(), records)
    }
}
