//! Source adapters: one per upstream endpoint family.
//!
//! Every adapter re-queries upstream in full on each `fetch` and returns
//! normalized [`CandidateRecord`]s. Per-call failures are logged and skipped;
//! an adapter only returns an error when none of its listing calls succeeded.

pub mod contributors;
pub mod github;
pub mod keyword;
pub mod model_hub;
pub mod star_velocity;
pub mod trending;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{http::ApiClient, keywords::Keywords, CandidateRecord, DiscoveryMethod};

pub use contributors::ContributorSource;
pub use keyword::KeywordSource;
pub use model_hub::ModelHubSource;
pub use star_velocity::StarVelocitySource;
pub use trending::TrendingSource;

/// Window used for "recently active" artifact counts.
pub const RECENT_ACTIVITY_DAYS: i64 = 90;
/// Number of artifacts inspected for emerging-technology keywords.
pub const PIONEER_SAMPLE: usize = 10;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{}: all {attempted} listing calls failed", .method.as_ref())]
    AllCallsFailed {
        method: DiscoveryMethod,
        attempted: usize,
    },
}

/// How an adapter's results relate to the region filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPolicy {
    /// The adapter already dropped candidates outside the region.
    Prefiltered,
    /// The upstream query carries a location qualifier and is trusted.
    QueryQualified,
    /// The aggregator applies the region filter.
    Unfiltered,
}

/// State shared by all adapters of one run.
#[derive(Clone)]
pub struct SourceContext {
    pub client: ApiClient,
    pub keywords: Arc<Keywords>,
    pub now: DateTime<Utc>,
    /// Fetch per-candidate artifact lists for activity signals.
    pub enrich_activity: bool,
}

impl SourceContext {
    pub fn new(client: ApiClient, keywords: Arc<Keywords>) -> Self {
        Self {
            client,
            keywords,
            now: Utc::now(),
            enrich_activity: true,
        }
    }
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn method(&self) -> DiscoveryMethod;

    fn region_policy(&self) -> RegionPolicy;

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError>;
}

/// Tracks listing-call outcomes so an adapter can tell "nothing found" from "upstream down".
#[derive(Debug, Default)]
pub(crate) struct ListingTally {
    attempted: usize,
    succeeded: usize,
}

impl ListingTally {
    pub(crate) fn record<T, E>(&mut self, result: &Result<T, E>) {
        self.attempted += 1;
        if result.is_ok() {
            self.succeeded += 1;
        }
    }

    pub(crate) fn finish(
        self,
        method: DiscoveryMethod,
        records: Vec<CandidateRecord>,
    ) -> Result<Vec<CandidateRecord>, SourceError> {
        if self.attempted > 0 && self.succeeded == 0 {
            return Err(SourceError::AllCallsFailed {
                method,
                attempted: self.attempted,
            });
        }
        Ok(records)
    }
}

/// Location the keyword queries and model-hub records are pinned to.
const PINNED_REGION: &str = "India";

/// Selected methods whose results ignore the configured region list.
///
/// The keyword queries carry a fixed `location:India` qualifier and model-hub
/// records carry a fixed location, so a region override that no longer covers
/// those values makes their output inconsistent with the other adapters.
pub fn region_override_conflicts(
    methods: &[DiscoveryMethod],
    keywords: &Keywords,
) -> Vec<DiscoveryMethod> {
    methods
        .iter()
        .copied()
        .filter(|method| match method {
            DiscoveryMethod::Keyword => !keywords.region.matches(PINNED_REGION),
            DiscoveryMethod::Huggingface => !keywords.region.matches(model_hub::HUB_LOCATION),
            _ => false,
        })
        .collect()
}

/// Builds the adapters for `methods`, always in the fixed aggregation order.
pub fn build_sources(
    ctx: &SourceContext,
    methods: &[DiscoveryMethod],
    max_model_authors: usize,
    recency_days: i64,
) -> Vec<Box<dyn SourceAdapter>> {
    DiscoveryMethod::ALL
        .into_iter()
        .filter(|method| methods.contains(method))
        .map(|method| -> Box<dyn SourceAdapter> {
            match method {
                DiscoveryMethod::Trending => Box::new(TrendingSource::new(ctx.clone())),
                DiscoveryMethod::StarVelocity => {
                    Box::new(StarVelocitySource::new(ctx.clone(), recency_days))
                }
                DiscoveryMethod::Contributor => Box::new(ContributorSource::new(ctx.clone())),
                DiscoveryMethod::Keyword => Box::new(KeywordSource::new(ctx.clone())),
                DiscoveryMethod::Huggingface => {
                    Box::new(ModelHubSource::new(ctx.clone(), max_model_authors))
                }
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::TimeZone;

    use super::*;
    use crate::http::{stub::StubFetch, ClientConfig};

    pub fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    pub fn context(stub: StubFetch) -> (SourceContext, Arc<StubFetch>) {
        let stub = Arc::new(stub);
        let client = ApiClient::new(stub.clone(), ClientConfig::immediate());
        let ctx = SourceContext {
            client,
            keywords: Arc::new(Keywords::default()),
            now: fixed_now(),
            enrich_activity: false,
        };
        (ctx, stub)
    }
}
