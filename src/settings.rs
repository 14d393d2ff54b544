use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ScrapeError;
use crate::search::{quantize_radius, SearchQuery};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keywords: Vec<String>,
    pub city: String,
    /// Region suffix of the Glassdoor host, e.g. `ca` or `co.uk`.
    pub domain: String,
    /// Search radius in km, before quantizing.
    pub radius: u32,
    pub page_size: usize,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub db_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            keywords: Vec::new(),
            city: String::new(),
            domain: "ca".into(),
            radius: 25,
            page_size: 30,
            max_concurrency: 10,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.into(),
            db_path: PathBuf::from("data/jobs.sqlite"),
        }
    }
}

/// Command-line values; each one that is set wins over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub keywords: Vec<String>,
    pub city: Option<String>,
    pub domain: Option<String>,
    pub radius: Option<u32>,
    pub max_concurrency: Option<usize>,
    pub db_path: Option<PathBuf>,
}

/// `FUNNEL_*` variables, read from `vars` instead of the process environment
/// when given. `FUNNEL_KEYWORDS` is a comma-separated list.
fn env_source(vars: Option<config::Map<String, String>>) -> Environment {
    Environment::with_prefix("FUNNEL")
        .source(vars)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("keywords")
}

impl Settings {
    /// `funnel.toml` (optional) overlaid with `FUNNEL_*` environment variables.
    pub fn load() -> Result<Self> {
        let cfg = Config::builder()
            .add_source(File::with_name("funnel").required(false))
            .add_source(env_source(None))
            .build()
            .context("Failed to read configuration")?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: Config) -> Result<Self> {
        cfg.try_deserialize().context("Failed to parse configuration")
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.keywords.is_empty() {
            self.keywords = overrides.keywords;
        }
        if let Some(city) = overrides.city {
            self.city = city;
        }
        if let Some(domain) = overrides.domain {
            self.domain = domain;
        }
        if let Some(radius) = overrides.radius {
            self.radius = radius;
        }
        if let Some(n) = overrides.max_concurrency {
            self.max_concurrency = n;
        }
        if let Some(path) = overrides.db_path {
            self.db_path = path;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_query(&self) -> Result<SearchQuery, ScrapeError> {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(ScrapeError::InvalidConfig("no search keywords".into()));
        }
        if self.city.trim().is_empty() {
            return Err(ScrapeError::InvalidConfig("no search city".into()));
        }
        if self.domain.trim().is_empty() {
            return Err(ScrapeError::InvalidConfig("no region domain".into()));
        }
        if self.page_size == 0 {
            return Err(ScrapeError::InvalidConfig("page_size must be positive".into()));
        }

        Ok(SearchQuery {
            keywords,
            city: self.city.trim().to_string(),
            domain: self.domain.trim().trim_start_matches('.').to_string(),
            radius_code: quantize_radius(self.radius),
            page_size: self.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        let cfg = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap();
        Settings::from_config(cfg).unwrap()
    }

    #[test]
    fn defaults_fill_gaps() {
        let s = from_toml("city = \"Toronto\"\nkeywords = [\"python\"]");
        assert_eq!(s.page_size, 30);
        assert_eq!(s.max_concurrency, 10);
        assert_eq!(s.domain, "ca");
        assert_eq!(s.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn query_quantizes_radius() {
        let s = from_toml("city = \"Toronto\"\nkeywords = [\"python\", \"django\"]\nradius = 55");
        let q = s.search_query().unwrap();
        assert_eq!(q.radius_code, 31);
        assert_eq!(q.keyword_query(), "python-django");
    }

    #[test]
    fn query_requires_keywords_and_city() {
        let s = Settings {
            city: "Toronto".into(),
            ..Settings::default()
        };
        assert!(matches!(s.search_query(), Err(ScrapeError::InvalidConfig(_))));

        let s = Settings {
            keywords: vec!["python".into()],
            ..Settings::default()
        };
        assert!(matches!(s.search_query(), Err(ScrapeError::InvalidConfig(_))));
    }

    #[test]
    fn environment_beats_file() {
        let vars: config::Map<String, String> = [
            ("FUNNEL_CITY", "Ottawa"),
            ("FUNNEL_KEYWORDS", "rust,python"),
            ("FUNNEL_PAGE_SIZE", "25"),
            ("OTHER_CITY", "Calgary"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg = Config::builder()
            .add_source(File::from_str(
                "city = \"Toronto\"\nkeywords = [\"java\"]\nradius = 40",
                FileFormat::Toml,
            ))
            .add_source(env_source(Some(vars)))
            .build()
            .unwrap();
        let s = Settings::from_config(cfg).unwrap();

        assert_eq!(s.city, "Ottawa");
        assert_eq!(s.keywords, ["rust", "python"]);
        assert_eq!(s.page_size, 25);
        assert_eq!(s.radius, 40);
    }

    #[test]
    fn flags_override_only_what_is_set() {
        let mut s = from_toml("city = \"Toronto\"\nkeywords = [\"python\"]\nradius = 40");
        s.apply(Overrides {
            city: Some("Vancouver".into()),
            max_concurrency: Some(2),
            db_path: Some(PathBuf::from("/tmp/jobs.sqlite")),
            ..Overrides::default()
        });

        assert_eq!(s.city, "Vancouver");
        assert_eq!(s.keywords, ["python"]);
        assert_eq!(s.radius, 40);
        assert_eq!(s.domain, "ca");
        assert_eq!(s.max_concurrency, 2);
        assert_eq!(s.db_path, PathBuf::from("/tmp/jobs.sqlite"));

        s.apply(Overrides {
            keywords: vec!["rust".into(), "go".into()],
            radius: Some(100),
            ..Overrides::default()
        });
        assert_eq!(s.keywords, ["rust", "go"]);
        assert_eq!(s.radius, 100);
        assert_eq!(s.city, "Vancouver");
    }
}
