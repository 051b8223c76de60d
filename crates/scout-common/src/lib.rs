pub mod aggregate;
pub mod http;
pub mod keywords;
pub mod logging;
pub mod matching;
pub mod output;
pub mod run_id;
pub mod sources;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Which adapter produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscoveryMethod {
    Trending,
    StarVelocity,
    Contributor,
    Keyword,
    Huggingface,
}

impl DiscoveryMethod {
    /// Fixed adapter order used by the aggregator.
    pub const ALL: [DiscoveryMethod; 5] = [
        DiscoveryMethod::Trending,
        DiscoveryMethod::StarVelocity,
        DiscoveryMethod::Contributor,
        DiscoveryMethod::Keyword,
        DiscoveryMethod::Huggingface,
    ];

    pub fn source(self) -> Platform {
        match self {
            DiscoveryMethod::Huggingface => Platform::Huggingface,
            _ => Platform::Github,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Github,
    Huggingface,
}

/// Method-specific fields attached by the adapter that found the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "discovery_method", rename_all = "snake_case")]
pub enum Discovery {
    Trending {
        repo: String,
        repo_stars: u64,
        repo_description: Option<String>,
    },
    StarVelocity {
        repo: String,
        repo_stars: u64,
        repo_description: Option<String>,
    },
    Contributor {
        project: String,
        contributions: u64,
    },
    Keyword,
    Huggingface {
        model_id: String,
        downloads: u64,
    },
}

impl Discovery {
    pub fn method(&self) -> DiscoveryMethod {
        match self {
            Discovery::Trending { .. } => DiscoveryMethod::Trending,
            Discovery::StarVelocity { .. } => DiscoveryMethod::StarVelocity,
            Discovery::Contributor { .. } => DiscoveryMethod::Contributor,
            Discovery::Keyword => DiscoveryMethod::Keyword,
            Discovery::Huggingface { .. } => DiscoveryMethod::Huggingface,
        }
    }

    /// Stars (or downloads) of the artifact the candidate was found through.
    pub fn attributed_stars(&self) -> Option<u64> {
        match self {
            Discovery::Trending { repo_stars, .. } | Discovery::StarVelocity { repo_stars, .. } => {
                Some(*repo_stars)
            }
            Discovery::Huggingface { downloads, .. } => Some(*downloads),
            Discovery::Contributor { .. } | Discovery::Keyword => None,
        }
    }

    pub fn contributions(&self) -> Option<u64> {
        match self {
            Discovery::Contributor { contributions, .. } => Some(*contributions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub count: u32,
}

/// Signals gathered from the candidate's own artifacts at fetch time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivitySignals {
    pub total_stars: Option<u64>,
    pub account_age_days: Option<i64>,
    pub recent_artifacts: Option<u32>,
    pub pioneer_hits: u32,
    pub top_repos: Vec<String>,
    pub languages: Vec<LanguageShare>,
}

/// One normalized profile discovered by any adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub identity: String,
    pub display_name: String,
    pub bio: String,
    pub location: String,
    pub company: String,
    pub blog: String,
    pub twitter: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub follower_count: u64,
    pub public_artifact_count: u64,
    pub discovery: Discovery,
    pub activity: ActivitySignals,
}

impl CandidateRecord {
    /// Minimal record; display name falls back to the identity.
    pub fn new(identity: impl Into<String>, discovery: Discovery) -> Self {
        let identity = identity.into();
        Self {
            display_name: identity.clone(),
            identity,
            bio: String::new(),
            location: String::new(),
            company: String::new(),
            blog: String::new(),
            twitter: String::new(),
            avatar_url: String::new(),
            profile_url: String::new(),
            follower_count: 0,
            public_artifact_count: 0,
            discovery,
            activity: ActivitySignals::default(),
        }
    }

    pub fn method(&self) -> DiscoveryMethod {
        self.discovery.method()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_are_snake_case() {
        assert_eq!(DiscoveryMethod::StarVelocity.as_ref(), "star_velocity");
        assert_eq!(DiscoveryMethod::Huggingface.as_ref(), "huggingface");
        assert_eq!(Platform::Github.as_ref(), "github");
    }

    #[test]
    fn only_model_hub_maps_to_huggingface_source() {
        for method in DiscoveryMethod::ALL {
            let expected = if method == DiscoveryMethod::Huggingface {
                Platform::Huggingface
            } else {
                Platform::Github
            };
            assert_eq!(method.source(), expected);
        }
    }

    #[test]
    fn new_record_defaults_display_name_to_identity() {
        let record = CandidateRecord::new("octo", Discovery::Keyword);
        assert_eq!(record.display_name, "octo");
        assert_eq!(record.follower_count, 0);
        assert_eq!(record.method(), DiscoveryMethod::Keyword);
    }

    #[test]
    fn discovery_exposes_attributed_signals() {
        let trending = Discovery::Trending {
            repo: "a/b".into(),
            repo_stars: 42,
            repo_description: None,
        };
        assert_eq!(trending.attributed_stars(), Some(42));
        assert_eq!(trending.contributions(), None);

        let contributor = Discovery::Contributor {
            project: "x/y".into(),
            contributions: 7,
        };
        assert_eq!(contributor.attributed_stars(), None);
        assert_eq!(contributor.contributions(), Some(7));
    }
}
