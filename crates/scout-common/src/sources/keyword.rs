use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    github::{candidate_from_profile, fetch_profile, SearchPage, SearchUserHit},
    ListingTally, RegionPolicy, SourceAdapter, SourceContext, SourceError,
};
use crate::{
    http::{FetchRequest, GITHUB_API_BASE},
    CandidateRecord, Discovery, DiscoveryMethod,
};

/// User searches whose `location:` qualifier already scopes results to the region.
pub const FOUNDER_QUERIES: &[&str] = &[
    r#""Founder" "Building" "agentic" location:India"#,
    r#""Co-founder" OR "CTO" "Agentic" location:India"#,
    r#""Building" "langgraph" location:India"#,
    r#""Founder" "langchain" location:India"#,
    r#""Founder" OR "CTO" "LLM" location:India"#,
    r#""Stealth" AND "agentic" location:India"#,
    "location:india followers:>100 repos:>10",
    r#"location:bangalore followers:>50 "founder""#,
    r#"location:india "YC" OR "Y Combinator""#,
];
const USER_PAGE_SIZE: u32 = 15;
const PACE_PER_USER: f64 = 0.3;
const PACE_PER_QUERY: f64 = 1.0;

pub struct KeywordSource {
    ctx: SourceContext,
    queries: Vec<String>,
}

impl KeywordSource {
    pub fn new(ctx: SourceContext) -> Self {
        Self::with_queries(ctx, FOUNDER_QUERIES.iter().map(|q| q.to_string()).collect())
    }

    pub fn with_queries(ctx: SourceContext, queries: Vec<String>) -> Self {
        Self { ctx, queries }
    }
}

#[async_trait]
impl SourceAdapter for KeywordSource {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::Keyword
    }

    fn region_policy(&self) -> RegionPolicy {
        RegionPolicy::QueryQualified
    }

    async fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut tally = ListingTally::default();

        for query in &self.queries {
            let request = FetchRequest::github(format!("{GITHUB_API_BASE}/search/users"))
                .param("q", query)
                .param("per_page", USER_PAGE_SIZE);
            let page = self
                .ctx
                .client
                .get_json::<SearchPage<SearchUserHit>>(&request)
                .await;
            tally.record(&page);

            match page {
                Ok(page) => {
                    for hit in page.items {
                        if !seen.insert(hit.login.clone()) {
                            continue;
                        }
                        if let Some(user) = fetch_profile(&self.ctx, &hit.login).await {
                            let record =
                                candidate_from_profile(&self.ctx, user, Discovery::Keyword).await;
                            info!(login = %record.identity, query = %query, "keyword candidate");
                            records.push(record);
                        }
                        self.ctx.client.pace(PACE_PER_USER).await;
                    }
                }
                Err(err) => warn!(query = %query, error = %err, "user search failed"),
            }

            self.ctx.client.pace(PACE_PER_QUERY).await;
        }

        tally.finish(self.method(), records)
    }
}
