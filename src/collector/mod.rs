use log::{error, info, warn};
use regex::Regex;
use url::Url;

use crate::config::Config;

mod browser;

/// Organization endpoints are derived against this API root.
const ORGANIZATIONS_API: &str = "https://api.welcometothejungle.com/api/v1/organizations/";

const SEARCH_BASE: &str = "https://www.welcometothejungle.com";

/// Why the pagination loop ended.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// Every page up to the budget was visited.
    PageBudget,
    /// A page rendered without a single offer link, so later pages are
    /// assumed empty as well.
    Exhausted { page: u32 },
    /// A page failed to load or render; earlier results are kept.
    PageError { page: u32 },
    /// No browser session could be opened at all.
    BrowserUnavailable,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageBudget => write!(f, "all requested pages visited"),
            Self::Exhausted { page } => write!(f, "no offers on page {page}"),
            Self::PageError { page } => write!(f, "aborted on page {page}"),
            Self::BrowserUnavailable => write!(f, "browser session unavailable"),
        }
    }
}

/// Everything the loop accumulated before it stopped.
pub(crate) struct CollectedEndpoints {
    pub(crate) endpoints: Vec<String>,
    pub(crate) stop: StopReason,
}

/// One search results page at a time. The browser implements this; tests
/// script it.
trait SearchPages {
    fn hrefs_on_page(&mut self, page: u32) -> anyhow::Result<Vec<String>>;
}

struct LinkRules {
    job_offer: Regex,
}

impl Default for LinkRules {
    fn default() -> Self {
        Self {
            job_offer: Regex::new(r"/companies/[^/]+/jobs/[^/]+").unwrap(),
        }
    }
}

/// Builds the search URL for one results page, with the country refinement
/// the site expects.
fn search_url(locale: &str, country_code: &str, job_title: &str, page: u32) -> Url {
    let mut url = Url::parse(SEARCH_BASE).expect("search base URL is well formed");
    url.set_path(&format!("/{locale}/jobs"));
    url.query_pairs_mut()
        .append_pair("refinementList[offices.country_code][]", country_code)
        .append_pair("query", job_title)
        .append_pair("page", &page.to_string());
    url
}

/// Turns one offer link into its organization API endpoint. The company
/// identifier is the path segment right after `/companies/`; links where
/// that marker is absent, repeated, or followed by nothing derive nothing.
fn derive_endpoint(link: &str) -> Option<String> {
    let parts: Vec<&str> = link.split("/companies/").collect();
    if parts.len() != 2 {
        return None;
    }
    let company_id = parts[1].split('/').next().filter(|id| !id.is_empty())?;
    Some(format!("{ORGANIZATIONS_API}{company_id}"))
}

/// Walks pages `1..=max_pages`, keeping every endpoint derived so far. An
/// empty page or a page error ends the walk early; both keep what was
/// already accumulated.
fn collect_endpoints(pages: &mut dyn SearchPages, max_pages: u32) -> CollectedEndpoints {
    let rules = LinkRules::default();
    let mut endpoints = Vec::new();
    for page in 1..=max_pages {
        let hrefs = match pages.hrefs_on_page(page) {
            Ok(hrefs) => hrefs,
            Err(err) => {
                warn!("page {page} failed: {err:#}");
                return CollectedEndpoints { endpoints, stop: StopReason::PageError { page } };
            }
        };
        let offer_links: Vec<&String> = hrefs
            .iter()
            .filter(|href| rules.job_offer.is_match(href))
            .collect();
        if offer_links.is_empty() {
            info!("page {page} has no offers, stopping");
            return CollectedEndpoints { endpoints, stop: StopReason::Exhausted { page } };
        }
        info!("page {page}: {} offer links", offer_links.len());
        endpoints.extend(offer_links.into_iter().filter_map(|link| derive_endpoint(link)));
    }
    CollectedEndpoints { endpoints, stop: StopReason::PageBudget }
}

/// Opens a headless browser and collects organization endpoints for the
/// given search. A zero page budget returns immediately without launching
/// anything.
pub(crate) fn run(config: &Config, job_title: &str, max_pages: u32) -> CollectedEndpoints {
    if max_pages == 0 {
        return CollectedEndpoints { endpoints: Vec::new(), stop: StopReason::PageBudget };
    }
    match browser::BrowserPages::open(config, job_title) {
        Ok(mut pages) => collect_endpoints(&mut pages, max_pages),
        Err(err) => {
            error!("could not open a browser session: {err:#}");
            CollectedEndpoints { endpoints: Vec::new(), stop: StopReason::BrowserUnavailable }
        }
    }
}
