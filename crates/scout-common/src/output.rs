//! JSON rendering of the ranked candidate list.

use std::{fs, io, path::Path};

use serde::Serialize;
use thiserror::Error;

use crate::{aggregate::ScoredCandidate, matching::ScoreSet, Discovery, LanguageShare};

pub const DEFAULT_OUTPUT_FILE: &str = "developers.json";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize candidates: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    pub growth: f64,
    pub velocity: f64,
    pub hidden_gem: f64,
    pub pioneer: f64,
    pub overall_score: f64,
}

impl From<&ScoreSet> for ScoreView {
    fn from(scores: &ScoreSet) -> Self {
        Self {
            growth: one_decimal(scores.growth),
            velocity: one_decimal(scores.velocity),
            hidden_gem: one_decimal(scores.hidden_gem),
            pioneer: one_decimal(scores.pioneer),
            overall_score: one_decimal(scores.overall),
        }
    }
}

/// One element of the output array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperEntry {
    pub name: String,
    pub username: String,
    pub bio: String,
    pub location: String,
    pub avatar_url: String,
    pub html_url: String,
    pub followers: u64,
    pub public_repos: u64,
    pub company: String,
    pub blog: String,
    pub twitter: String,
    pub discovery_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trending_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributed_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hf_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hf_downloads: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_repos: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<LanguageShare>,
    pub scores: ScoreView,
    pub overall_score: f64,
    pub source: String,
}

impl From<&ScoredCandidate> for DeveloperEntry {
    fn from(candidate: &ScoredCandidate) -> Self {
        let record = &candidate.record;
        let scores = ScoreView::from(&candidate.scores);

        let mut entry = Self {
            name: record.display_name.clone(),
            username: record.identity.clone(),
            bio: record.bio.clone(),
            location: record.location.clone(),
            avatar_url: record.avatar_url.clone(),
            html_url: record.profile_url.clone(),
            followers: record.follower_count,
            public_repos: record.public_artifact_count,
            company: record.company.clone(),
            blog: record.blog.clone(),
            twitter: record.twitter.clone(),
            discovery_method: record.method().as_ref().to_string(),
            trending_repo: None,
            contributed_to: None,
            contributions: None,
            hf_model: None,
            hf_downloads: None,
            top_repos: record.activity.top_repos.clone(),
            languages: record.activity.languages.clone(),
            overall_score: scores.overall_score,
            scores,
            source: record.method().source().as_ref().to_string(),
        };

        match &record.discovery {
            Discovery::Trending { repo, .. } | Discovery::StarVelocity { repo, .. } => {
                entry.trending_repo = Some(repo.clone());
            }
            Discovery::Contributor {
                project,
                contributions,
            } => {
                entry.contributed_to = Some(project.clone());
                entry.contributions = Some(*contributions);
            }
            Discovery::Huggingface {
                model_id,
                downloads,
            } => {
                entry.hf_model = Some(model_id.clone());
                entry.hf_downloads = Some(*downloads);
            }
            Discovery::Keyword => {}
        }

        entry
    }
}

pub fn render(candidates: &[ScoredCandidate]) -> Result<String, OutputError> {
    let entries: Vec<DeveloperEntry> = candidates.iter().map(DeveloperEntry::from).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Writes the whole ranked list in one go.
pub fn write_output(path: &Path, candidates: &[ScoredCandidate]) -> Result<(), OutputError> {
    let json = render(candidates)?;
    fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })
}
