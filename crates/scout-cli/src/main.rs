use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use scout_common::{
    aggregate::{AggregateReport, Aggregator, AggregatorConfig},
    http::{ApiClient, CallError, ClientConfig, ReqwestFetch},
    keywords::{Keywords, KeywordsError},
    logging::{init_tracing_subscriber, install_tracing_panic_hook},
    matching::ScoreEngine,
    output::{write_output, OutputError, DEFAULT_OUTPUT_FILE},
    run_id,
    sources::{build_sources, region_override_conflicts, SourceContext},
    DiscoveryMethod,
};
use tracing::{info, info_span, warn, Instrument};

const APP_NAME: &str = "founder-scout";

#[derive(Debug, Parser)]
#[command(
    name = "founder-scout",
    about = "Discover early-stage founder candidates on GitHub and Hugging Face"
)]
struct Cli {
    /// Personal access token for the GitHub REST API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Where the ranked JSON list is written
    #[arg(long, env = "SCOUT_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Discovery methods to run, comma separated (default: all)
    #[arg(long, env = "SCOUT_SOURCES", value_enum, value_delimiter = ',')]
    sources: Vec<SourceSelection>,

    /// Look-back window for the rising-repository searches
    #[arg(
        long,
        env = "SCOUT_RECENCY_DAYS",
        default_value_t = 14,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    recency_days: i64,

    /// Pause before the single retry of a rate-limited call
    #[arg(long, env = "SCOUT_RATE_LIMIT_PAUSE_SECS", default_value_t = 60)]
    rate_limit_pause_secs: u64,

    #[arg(long, env = "SCOUT_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Cap on model-hub authors per run
    #[arg(long, env = "SCOUT_MAX_MODEL_AUTHORS", default_value_t = 20)]
    max_model_authors: usize,

    /// Keep candidates whose company or bio names a large employer
    #[arg(long, env = "SCOUT_INCLUDE_AFFILIATED")]
    include_affiliated: bool,

    /// Skip the per-candidate repository/model listing
    #[arg(long, env = "SCOUT_SKIP_ACTIVITY")]
    skip_activity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceSelection {
    Trending,
    StarVelocity,
    Contributor,
    Keyword,
    Huggingface,
}

impl From<SourceSelection> for DiscoveryMethod {
    fn from(selection: SourceSelection) -> Self {
        match selection {
            SourceSelection::Trending => DiscoveryMethod::Trending,
            SourceSelection::StarVelocity => DiscoveryMethod::StarVelocity,
            SourceSelection::Contributor => DiscoveryMethod::Contributor,
            SourceSelection::Keyword => DiscoveryMethod::Keyword,
            SourceSelection::Huggingface => DiscoveryMethod::Huggingface,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("GITHUB_TOKEN is not set; pass --github-token or export GITHUB_TOKEN")]
    MissingToken,
    #[error("invalid keyword configuration: {0}")]
    InvalidKeywords(#[from] KeywordsError),
}

#[derive(Debug, thiserror::Error)]
enum ScoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Http(#[from] CallError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

#[derive(Debug)]
struct Config {
    github_token: String,
    output: PathBuf,
    methods: Vec<DiscoveryMethod>,
    recency_days: i64,
    rate_limit_pause: Duration,
    request_timeout: Duration,
    max_model_authors: usize,
    independent_only: bool,
    enrich_activity: bool,
}

impl Config {
    fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let github_token = cli
            .github_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let methods = if cli.sources.is_empty() {
            DiscoveryMethod::ALL.to_vec()
        } else {
            cli.sources.into_iter().map(DiscoveryMethod::from).collect()
        };

        Ok(Self {
            github_token,
            output: cli.output,
            methods,
            recency_days: cli.recency_days,
            rate_limit_pause: Duration::from_secs(cli.rate_limit_pause_secs),
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            max_model_authors: cli.max_model_authors,
            independent_only: !cli.include_affiliated,
            enrich_activity: !cli.skip_activity,
        })
    }
}

fn log_summary(report: &AggregateReport, config: &Config) {
    info!(
        total = report.ranked.len(),
        trending = report.count(DiscoveryMethod::Trending),
        star_velocity = report.count(DiscoveryMethod::StarVelocity),
        contributor = report.count(DiscoveryMethod::Contributor),
        keyword = report.count(DiscoveryMethod::Keyword),
        huggingface = report.count(DiscoveryMethod::Huggingface),
        output = %config.output.display(),
        "scouting finished"
    );
    for method in &report.failed_sources {
        warn!(method = method.as_ref(), "source produced no data this run");
    }
}

async fn scout(config: Config) -> Result<(), ScoutError> {
    let keywords = Arc::new(Keywords::from_env().map_err(ConfigError::from)?);

    let fetch = ReqwestFetch::new(
        Some(config.github_token.clone()),
        Some(config.request_timeout),
    )?;
    let client = ApiClient::new(
        Arc::new(fetch),
        ClientConfig {
            rate_limit_pause: config.rate_limit_pause,
            ..ClientConfig::default()
        },
    );

    for method in region_override_conflicts(&config.methods, &keywords) {
        warn!(
            method = method.as_ref(),
            "region override does not cover this source's fixed India location; its results will be inconsistent"
        );
    }

    let mut ctx = SourceContext::new(client, keywords.clone());
    ctx.enrich_activity = config.enrich_activity;

    let sources = build_sources(
        &ctx,
        &config.methods,
        config.max_model_authors,
        config.recency_days,
    );
    info!(
        sources = sources.len(),
        independent_only = config.independent_only,
        enrich_activity = config.enrich_activity,
        "starting scouting run"
    );

    let aggregator = Aggregator::new(
        AggregatorConfig {
            independent_only: config.independent_only,
        },
        ScoreEngine::default(),
        keywords,
    );
    let report = aggregator.run(&sources).await;

    write_output(&config.output, &report.ranked)?;
    log_summary(&report, &config);
    Ok(())
}

async fn run() -> Result<(), ScoutError> {
    dotenv().ok();
    let cli = Cli::parse();
    // credentials are checked before logging or any network activity
    let config = Config::from_cli(cli)?;

    init_tracing_subscriber(APP_NAME);
    install_tracing_panic_hook(APP_NAME);

    let span = info_span!("scout_run", run_id = run_id::get());
    scout(config).instrument(span).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("founder-scout failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_KEYS: &[&str] = &[
        "GITHUB_TOKEN",
        "SCOUT_OUTPUT",
        "SCOUT_SOURCES",
        "SCOUT_RECENCY_DAYS",
        "SCOUT_RATE_LIMIT_PAUSE_SECS",
        "SCOUT_REQUEST_TIMEOUT_SECS",
        "SCOUT_MAX_MODEL_AUTHORS",
        "SCOUT_INCLUDE_AFFILIATED",
        "SCOUT_SKIP_ACTIVITY",
    ];

    fn with_env(vars: &[(&str, Option<&str>)], f: impl FnOnce()) {
        use std::sync::Mutex;
        static ENV_GUARD: Mutex<()> = Mutex::new(());
        let _guard = ENV_GUARD.lock().unwrap();

        let prev: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
                (key.to_string(), previous)
            })
            .collect();

        f();

        for (key, previous) in prev {
            match previous {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }

    /// Parses with every scout variable cleared, then applies `overrides`.
    fn parse(args: &[&str], overrides: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let mut vars: Vec<(&str, Option<&str>)> = ENV_KEYS.iter().map(|k| (*k, None)).collect();
        vars.extend(overrides.iter().map(|(k, v)| (*k, Some(*v))));

        let mut result = None;
        with_env(&vars, || {
            let cli = Cli::try_parse_from(std::iter::once(APP_NAME).chain(args.iter().copied()))
                .unwrap();
            result = Some(Config::from_cli(cli));
        });
        result.unwrap()
    }

    #[test]
    fn missing_token_is_a_config_error() {
        assert!(matches!(parse(&[], &[]), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        assert!(matches!(
            parse(&[], &[("GITHUB_TOKEN", "   ")]),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn defaults_run_every_source() {
        let config = parse(&[], &[("GITHUB_TOKEN", "ghp_test")]).unwrap();

        assert_eq!(config.github_token, "ghp_test");
        assert_eq!(config.output, PathBuf::from("developers.json"));
        assert_eq!(config.methods, DiscoveryMethod::ALL.to_vec());
        assert_eq!(config.recency_days, 14);
        assert_eq!(config.rate_limit_pause, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_model_authors, 20);
        assert!(config.independent_only);
        assert!(config.enrich_activity);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(
            &[
                "--github-token",
                "ghp_flag",
                "--sources",
                "keyword,star-velocity",
                "--include-affiliated",
                "--skip-activity",
                "--output",
                "out/list.json",
            ],
            &[],
        )
        .unwrap();

        assert_eq!(config.github_token, "ghp_flag");
        assert_eq!(
            config.methods,
            vec![DiscoveryMethod::Keyword, DiscoveryMethod::StarVelocity]
        );
        assert!(!config.independent_only);
        assert!(!config.enrich_activity);
        assert_eq!(config.output, PathBuf::from("out/list.json"));
    }

    #[test]
    fn environment_supplies_values() {
        let config = parse(
            &[],
            &[
                ("GITHUB_TOKEN", "ghp_env"),
                ("SCOUT_SOURCES", "huggingface"),
                ("SCOUT_RATE_LIMIT_PAUSE_SECS", "5"),
                ("SCOUT_MAX_MODEL_AUTHORS", "7"),
            ],
        )
        .unwrap();

        assert_eq!(config.methods, vec![DiscoveryMethod::Huggingface]);
        assert_eq!(config.rate_limit_pause, Duration::from_secs(5));
        assert_eq!(config.max_model_authors, 7);
    }

    #[test]
    fn zero_recency_window_is_rejected() {
        with_env(&[("SCOUT_RECENCY_DAYS", None)], || {
            let parsed = Cli::try_parse_from([APP_NAME, "--recency-days", "0"]);
            assert!(parsed.is_err());
        });
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
