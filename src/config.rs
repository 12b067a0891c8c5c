use anyhow::Context;
use serde::Deserialize;
use validator::Validate;

/// User agent announced by both the HTTP client and the browser tab.
/// Recent enough that the job board serves its regular frontend instead of
/// a bot interstitial.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

const CONFIG_PATH: &str = "config.toml";

/// Runtime knobs read from `config.toml` in the working directory.
///
/// The file is optional and every field has a default. What gets extracted
/// and how links are matched is fixed at build time; only the ambient
/// identity of the run is configurable.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    #[validate(length(min = 1))]
    pub(crate) user_agent: String,
    /// Site locale segment of the search URL, e.g. the `fr` in `/fr/jobs`.
    #[validate(length(min = 1))]
    pub(crate) locale: String,
    /// Country code for the office refinement filter.
    #[validate(length(min = 1))]
    pub(crate) country_code: String,
    /// Set to false to watch the browser while debugging a scrape.
    pub(crate) headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "fr".to_string(),
            country_code: "FR".to_string(),
            headless: true,
        }
    }
}

impl Config {
    fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}

/// Reads `config.toml` when present, falls back to the defaults otherwise.
pub(crate) fn load() -> anyhow::Result<Config> {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(raw) => Config::from_toml(&raw).context("config.toml is invalid"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(err) => Err(err).context("could not read config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scraper_identity() {
        let config = Config::default();
        assert!(config.user_agent.contains("Chrome/111"));
        assert_eq!(config.locale, "fr");
        assert_eq!(config.country_code, "FR");
        assert!(config.headless);
    }

    #[test]
    fn partial_file_keeps_the_remaining_defaults() {
        let config = Config::from_toml("locale = \"en\"").expect("valid config");
        assert_eq!(config.locale, "en");
        assert_eq!(config.country_code, "FR");
        assert!(config.headless);
    }

    #[test]
    fn empty_strings_are_rejected() {
        assert!(Config::from_toml("country_code = \"\"").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("max_pages = 3").is_err());
    }
}
