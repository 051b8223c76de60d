use thiserror::Error;

/// Location keywords for the region filter (lowercase, substring match).
pub const DEFAULT_REGION_KEYWORDS: &[&str] = &[
    "india",
    "bangalore",
    "bengaluru",
    "mumbai",
    "delhi",
    "hyderabad",
    "chennai",
    "pune",
    "kolkata",
    "gurgaon",
    "noida",
    "ahmedabad",
    "jaipur",
    "kochi",
    "indore",
];

/// Large employers whose staff are not treated as independent builders.
pub const DEFAULT_CORPORATE_KEYWORDS: &[&str] = &[
    "google",
    "microsoft",
    "amazon",
    "meta platforms",
    "facebook",
    "apple",
    "netflix",
    "nvidia",
    "oracle",
    "ibm",
    "adobe",
    "salesforce",
    "flipkart",
    "infosys",
    "wipro",
    "tcs",
    "accenture",
];

pub const DEFAULT_INDIE_KEYWORDS: &[&str] = &[
    "founder",
    "co-founder",
    "cofounder",
    "ceo",
    "cto",
    "building",
    "stealth",
    "indie",
    "freelance",
    "self-employed",
    "yc",
];

/// Emerging-technology keywords matched against artifact descriptions/topics.
pub const DEFAULT_PIONEER_KEYWORDS: &[&str] = &[
    "llm",
    "agent",
    "agentic",
    "langchain",
    "langgraph",
    "rag",
    "gpt",
    "transformer",
    "diffusion",
    "multimodal",
    "embedding",
    "vector",
    "fine-tun",
    "inference",
];

pub const REGION_KEYWORDS_ENV: &str = "SCOUT_REGION_KEYWORDS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeywordsError {
    #[error("{0} is set but contains no keywords")]
    Empty(&'static str),
}

/// Lowercased keyword list matched by case-insensitive substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|kw| kw.as_ref().trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect();
        Self { keywords }
    }

    /// Comma separated list, e.g. from an environment variable.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    /// Empty text never matches.
    pub fn matches(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.keywords.iter().any(|kw| haystack.contains(kw.as_str()))
    }
}

/// Keyword configuration built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub region: KeywordSet,
    pub corporate: KeywordSet,
    pub indie: KeywordSet,
    pub pioneer: KeywordSet,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            region: KeywordSet::new(DEFAULT_REGION_KEYWORDS),
            corporate: KeywordSet::new(DEFAULT_CORPORATE_KEYWORDS),
            indie: KeywordSet::new(DEFAULT_INDIE_KEYWORDS),
            pioneer: KeywordSet::new(DEFAULT_PIONEER_KEYWORDS),
        }
    }
}

impl Keywords {
    /// Defaults, with the region list replaced by `SCOUT_REGION_KEYWORDS` when set.
    pub fn from_env() -> Result<Self, KeywordsError> {
        let mut keywords = Self::default();
        if let Ok(raw) = std::env::var(REGION_KEYWORDS_ENV) {
            let region = KeywordSet::parse_list(&raw);
            if region.is_empty() {
                return Err(KeywordsError::Empty(REGION_KEYWORDS_ENV));
            }
            keywords.region = region;
        }
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn keyword_sets_are_lowercased_and_trimmed() {
        let set = KeywordSet::parse_list(" Pune , ,MUMBAI");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["pune", "mumbai"]);
        assert!(set.matches("Based in mumbai"));
        assert!(!set.matches("   "));
    }

    #[test]
    fn defaults_cover_major_cities() {
        let keywords = Keywords::default();
        assert!(keywords.region.matches("Bengaluru, Karnataka"));
        assert!(keywords.corporate.matches("@Google"));
        assert!(keywords.pioneer.matches("An agentic workflow engine"));
    }

    #[test]
    fn region_list_can_be_overridden() {
        with_env(&[(REGION_KEYWORDS_ENV, Some("lagos,nairobi"))], || {
            let keywords = Keywords::from_env().unwrap();
            assert_eq!(keywords.region.len(), 2);
            assert!(keywords.region.matches("Nairobi, Kenya"));
            assert!(!keywords.region.matches("Pune"));
        });
    }

    #[test]
    fn empty_override_is_rejected() {
        with_env(&[(REGION_KEYWORDS_ENV, Some(" , "))], || {
            assert_eq!(
                Keywords::from_env(),
                Err(KeywordsError::Empty(REGION_KEYWORDS_ENV))
            );
        });
    }

    #[test]
    fn unset_override_keeps_defaults() {
        with_env(&[(REGION_KEYWORDS_ENV, None)], || {
            assert_eq!(Keywords::from_env().unwrap(), Keywords::default());
        });
    }
}
