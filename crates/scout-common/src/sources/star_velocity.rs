use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{info, warn};

use super::{
    github::{candidate_from_profile, fetch_profile, in_region, GithubRepo, SearchPage},
    ListingTally, RegionPolicy, SourceAdapter, SourceContext, SourceError,
};
use crate::{
    http::{FetchRequest, GITHUB_API_BASE},
    CandidateRecord, Discovery, DiscoveryMethod,
};

pub const DEFAULT_RECENCY_DAYS: i64 = 14;
const SEARCH_PAGE_SIZE: u32 = 20;
const PACE_PER_OWNER: f64 = 0.3;
const PACE_PER_QUERY: f64 = 1.0;

/// Repository searches for fast-rising projects created or pushed after `cutoff` (YYYY-MM-DD).
pub fn rising_queries(cutoff: &str) -> Vec<String> {
    vec![
        format!("created:>{cutoff} stars:>50 language:python"),
        format!("pushed:>{cutoff} stars:>100 language:python topic:llm"),
        format!("pushed:>{cutoff} stars:>100 language:python topic:ai"),
        format!("pushed:>{cutoff} stars:>50 topic:langchain"),
        format!("pushed:>{cutoff} stars:>50 topic:agents"),
    ]
}

/// Owners of recently created/pushed repositories gaining stars quickly.
pub struct StarVelocitySource {
    ctx: SourceContext,
    recency_days: i64,
}

impl StarVelocitySource {
    pub fn new(ctx: SourceContext, recency_days: i64) -> Self {
        Self { ctx, recency_days }
    }

    fn cutoff(&self) -> String {
        (self.ctx.now - Duration::days(self.recency_days))
            .format("%Y-%m-%d")
            .to_string()
    }

    async fn owner_candidate(&self, repo: GithubRepo) -> Option<CandidateRecord> {
        let owner = repo.owner.as_ref()?.login.clone();
        let user = fetch_profile(&self.ctx, &owner).await?;
        if !in_region(&user, &self.ctx.keywords.region) {
            return None;
        }

        let stars = repo.stargazers_count;
        let discovery = Discovery::StarVelocity {
            repo: repo.full_name,
            repo_stars: stars,
            repo_description: repo.description.filter(|d| !d.is_empty()),
        };
        let record = candidate_from_profile(&self.ctx, user, discovery).await;
        info!(login = %record.identity, stars, "rising candidate");
        Some(record)
    }
}

#[async_trait]
impl SourceAdapter for StarVelocitySource {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::StarVelocity
    }

    fn region_policy(&self) -> RegionPolicy {
        RegionPolicy::Prefiltered
    }

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records = Vec::new();
        let mut seen_owners: HashSet<String> = HashSet::new();
        let mut tally = ListingTally::default();

        for query in rising_queries(&self.cutoff()) {
            let request = FetchRequest::github(format!("{GITHUB_API_BASE}/search/repositories"))
                .param("q", &query)
                .param("sort", "stars")
                .param("per_page", SEARCH_PAGE_SIZE);
            let page = self
                .ctx
                .client
                .get_json::<SearchPage<GithubRepo>>(&request)
                .await;
            tally.record(&page);

            match page {
                Ok(page) => {
                    for repo in page.items {
                        let Some(owner) = repo.owner.as_ref().map(|o| o.login.clone()) else {
                            continue;
                        };
                        if !seen_owners.insert(owner) {
                            continue;
                        }

                        if let Some(record) = self.owner_candidate(repo).await {
                            records.push(record);
                        }
                        self.ctx.client.pace(PACE_PER_OWNER).await;
                    }
                }
                Err(err) => warn!(query = %query, error = %err, "repository search failed"),
            }

            self.ctx.client.pace(PACE_PER_QUERY).await;
        }

        tally.finish(self.method(), records)
    }
}
