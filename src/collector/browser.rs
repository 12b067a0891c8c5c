use std::sync::Arc;

use anyhow::Context;
use fxhash::FxHashSet;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{info, warn};
use scraper::{Html, Selector};
use url::Url;

use crate::config::Config;

use super::{search_url, SearchPages};

/// One browser session driving the search result pages. Dropping it closes
/// the browser, so the session lives exactly as long as the collection run.
pub(super) struct BrowserPages {
    _browser: Browser,
    tab: Arc<Tab>,
    locale: String,
    country_code: String,
    job_title: String,
}

impl BrowserPages {
    pub(super) fn open(config: &Config, job_title: &str) -> anyhow::Result<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(config.headless)
            .window_size(Some((1080, 1024)))
            .build()
            .map_err(|err| anyhow::anyhow!("browser launch options: {err}"))?;
        let browser = Browser::new(options).context("could not launch the browser")?;
        let tab = browser.new_tab().context("could not open a tab")?;
        tab.set_user_agent(&config.user_agent, None, None)
            .context("could not set the user agent")?;
        Ok(Self {
            _browser: browser,
            tab,
            locale: config.locale.clone(),
            country_code: config.country_code.clone(),
            job_title: job_title.to_string(),
        })
    }

    fn load_and_scan(&self, url: &Url) -> anyhow::Result<Vec<String>> {
        self.tab
            .navigate_to(url.as_str())
            .with_context(|| format!("navigation to {url} failed"))?
            .wait_until_navigated()
            .with_context(|| format!("{url} did not finish loading"))?;
        let html = self.tab.get_content().context("could not read the page content")?;
        Ok(page_hrefs(&html, url))
    }

    /// Saves a screenshot of whatever the tab shows right now, named after
    /// the page that failed. Best effort; a failed capture is only logged.
    fn capture_failure(&self, page: u32) {
        let path = format!("error_page{page}.png");
        let captured = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .and_then(|png| std::fs::write(&path, png).map_err(Into::into));
        match captured {
            Ok(()) => info!("saved {path}"),
            Err(err) => warn!("could not save {path}: {err:#}"),
        }
    }
}

impl SearchPages for BrowserPages {
    fn hrefs_on_page(&mut self, page: u32) -> anyhow::Result<Vec<String>> {
        let url = search_url(&self.locale, &self.country_code, &self.job_title, page);
        info!("visiting {url}");
        match self.load_and_scan(&url) {
            Ok(hrefs) => Ok(hrefs),
            Err(err) => {
                self.capture_failure(page);
                Err(err)
            }
        }
    }
}

/// Every distinct href in the document, absolutized against the page URL,
/// in document order.
fn page_hrefs(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").unwrap();
    let mut seen = FxHashSet::default();
    let mut hrefs = Vec::new();
    for anchor in document.select(&anchors) {
        if let Some(href) = anchor.value().attr("href") {
            if let Ok(absolute) = base.join(href) {
                let absolute = absolute.to_string();
                if seen.insert(absolute.clone()) {
                    hrefs.push(absolute);
                }
            }
        }
    }
    hrefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_absolutized_hrefs_in_document_order() {
        let html = r#"
            <html><body>
                <a href="/fr/companies/acme/jobs/data-engineer">offer</a>
                <a href="https://www.welcometothejungle.com/fr/about">about</a>
                <a href="/fr/companies/acme/jobs/data-engineer">duplicate</a>
                <a>no href</a>
                <a href="mailto:jobs@acme.test">mail</a>
            </body></html>
        "#;
        let base = Url::parse("https://www.welcometothejungle.com/fr/jobs?page=1").unwrap();
        assert_eq!(
            page_hrefs(html, &base),
            [
                "https://www.welcometothejungle.com/fr/companies/acme/jobs/data-engineer",
                "https://www.welcometothejungle.com/fr/about",
                "mailto:jobs@acme.test",
            ]
        );
    }
}
