use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    github::{candidate_from_profile, fetch_profile, in_region, repo_url, ContributorEntry},
    ListingTally, RegionPolicy, SourceAdapter, SourceContext, SourceError,
};
use crate::{http::FetchRequest, CandidateRecord, Discovery, DiscoveryMethod};

pub const HOT_PROJECTS: &[&str] = &[
    "langchain-ai/langchain",
    "langchain-ai/langgraph",
    "huggingface/transformers",
    "run-llama/llama_index",
    "chroma-core/chroma",
    "microsoft/autogen",
    "crewAIInc/crewAI",
];
pub const MIN_CONTRIBUTIONS: u64 = 5;
const CONTRIBUTOR_PAGE_SIZE: u32 = 30;
const PACE_PER_CONTRIBUTOR: f64 = 0.3;
const PACE_PER_PROJECT: f64 = 1.0;

/// Regular contributors to a fixed list of popular AI projects.
pub struct ContributorSource {
    ctx: SourceContext,
    projects: Vec<String>,
}

impl ContributorSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self::with_projects(ctx, HOT_PROJECTS.iter().map(|p| p.to_string()).collect())
    }

    pub fn with_projects(ctx: SourceContext, projects: Vec<String>) -> Self {
        Self { ctx, projects }
    }
}

#[async_trait]
impl SourceAdapter for ContributorSource {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Contributor
    }

    fn region_policy(&self) -> RegionPolicy {
        RegionPolicy::Prefiltered
    }

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut tally = ListingTally::default();

        for project in &self.projects {
            let request = FetchRequest::github(format!("{}/contributors", repo_url(project)))
                .param("per_page", CONTRIBUTOR_PAGE_SIZE);
            let listing = self
                .ctx
                .client
                .get_json::<Vec<ContributorEntry>>(&request)
                .await;
            tally.record(&listing);

            let contributors = match listing {
                Ok(contributors) => contributors,
                Err(err) => {
                    warn!(project = %project, error = %err, "contributor list unavailable");
                    self.ctx.client.pace(PACE_PER_PROJECT).await;
                    continue;
                }
            };

            for contributor in contributors {
                if contributor.contributions < MIN_CONTRIBUTIONS || seen.contains(&contributor.login) {
                    continue;
                }
                seen.insert(contributor.login.clone());

                if let Some(user) = fetch_profile(&self.ctx, &contributor.login).await {
                    if in_region(&user, &self.ctx.keywords.region) {
                        let discovery = Discovery::Contributor {
                            project: project.clone(),
                            contributions: contributor.contributions,
                        };
                        let record = candidate_from_profile(&self.ctx, user, discovery).await;
                        info!(
                            login = %record.identity,
                            contributions = contributor.contributions,
                            project = %project,
                            "contributor candidate"
                        );
                        records.push(record);
                    }
                }
                self.ctx.client.pace(PACE_PER_CONTRIBUTOR).await;
            }

            self.ctx.client.pace(PACE_PER_PROJECT).await;
        }

        tally.finish(self.method(), records)
    }
}
