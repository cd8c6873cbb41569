//! Scraped-page source.
//!
//! A [`PageFetcher`] returns the raw HTML for one jurisdiction. The page is
//! split into heading-led sections and each section goes through the record
//! builder, which keeps only sections naming at least one candidate.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ElectionSource, PartialMap, SourceError};
use crate::constants::SCRAPED_PAGES_SOURCE;
use crate::domain::Jurisdiction;
use crate::observability::metrics;
use crate::pipeline::processing::builder::{ElectionRecordBuilder, ScrapedSection};
use crate::registry::JurisdictionRegistry;

const SECTION_HEADINGS: &str = "h2, h3";

/// Fetches the page describing one jurisdiction's races.
///
/// `Ok(None)` means there is no page for that jurisdiction.
pub trait PageFetcher {
    fn fetch(&self, code: &str, state_name: &str) -> Result<Option<String>, SourceError>;
}

/// Reads pre-downloaded pages from `<dir>/<CODE>.html`
#[derive(Debug, Clone)]
pub struct FilePageFetcher {
    dir: PathBuf,
}

impl FilePageFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PageFetcher for FilePageFetcher {
    fn fetch(&self, code: &str, _state_name: &str) -> Result<Option<String>, SourceError> {
        let path = self.dir.join(format!("{}.html", code));
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fetches pages over HTTP from a URL template.
///
/// The template may contain `{code}` (two-letter code) and `{state}` (state
/// name with spaces replaced by underscores).
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    url_template: String,
}

impl HttpPageFetcher {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("elections_to_watch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn url_for(&self, code: &str, state_name: &str) -> String {
        self.url_template
            .replace("{code}", code)
            .replace("{state}", &state_name.replace(' ', "_"))
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, code: &str, state_name: &str) -> Result<Option<String>, SourceError> {
        let url = self.url_for(code, state_name);
        debug!(url = %url, "Fetching page");

        let response = self.client.get(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.text()?;
        Ok(Some(body))
    }
}

/// Split a page into sections: each `h2`/`h3` heading starts one, and the
/// text of its following siblings up to the next heading is the body.
/// Whitespace is collapsed so patterns see single spaces.
pub fn split_sections(html: &str) -> Result<Vec<ScrapedSection>, SourceError> {
    let document = Html::parse_document(html);
    let headings = Selector::parse(SECTION_HEADINGS)
        .map_err(|e| SourceError::Content(format!("invalid heading selector: {:?}", e)))?;

    let mut sections = Vec::new();
    for heading in document.select(&headings) {
        let title = collapse_whitespace(heading.text());
        if title.is_empty() {
            continue;
        }

        let mut parts: Vec<String> = Vec::new();
        for sibling in heading.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if is_heading(element) {
                    break;
                }
                parts.push(collapse_whitespace(element.text()));
            } else if let Some(text) = sibling.value().as_text() {
                parts.push(collapse_whitespace(std::iter::once(&**text)));
            }
        }

        let text = parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        sections.push(ScrapedSection { title, text });
    }
    Ok(sections)
}

fn is_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h2" | "h3")
}

fn collapse_whitespace<'t>(text: impl Iterator<Item = &'t str>) -> String {
    text.flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One page per registry jurisdiction, turned into elections section by section
pub struct ScrapedPageSource<'a, F> {
    fetcher: F,
    registry: &'a JurisdictionRegistry,
    builder: ElectionRecordBuilder<'a>,
}

impl<'a, F: PageFetcher> ScrapedPageSource<'a, F> {
    pub fn new(fetcher: F, registry: &'a JurisdictionRegistry, builder: ElectionRecordBuilder<'a>) -> Self {
        Self {
            fetcher,
            registry,
            builder,
        }
    }
}

impl<F: PageFetcher> ElectionSource for ScrapedPageSource<'_, F> {
    fn name(&self) -> &str {
        SCRAPED_PAGES_SOURCE
    }

    /// Per-page failures are logged and skipped. The source as a whole fails
    /// only when every attempted fetch failed.
    fn collect(&self) -> Result<PartialMap, SourceError> {
        let mut partial = PartialMap::new();
        let mut failed = 0usize;
        let mut last_error = None;

        for entry in self.registry.entries() {
            let page = match self.fetcher.fetch(entry.code, entry.name) {
                Ok(Some(page)) => page,
                Ok(None) => continue,
                Err(e) => {
                    warn!(code = %entry.code, error = %e, "Page fetch failed; skipping jurisdiction");
                    failed += 1;
                    last_error = Some(e);
                    continue;
                }
            };
            metrics::sources::pages_fetched();

            let sections = match split_sections(&page) {
                Ok(sections) => sections,
                Err(e) => {
                    warn!(code = %entry.code, error = %e, "Could not split page into sections");
                    continue;
                }
            };

            let elections: Vec<_> = sections
                .iter()
                .flat_map(|section| self.builder.build_from_section(section, entry.name))
                .collect();
            let candidates: usize = elections.iter().map(|e| e.candidates.len()).sum();
            metrics::builder::elections_built(elections.len());
            metrics::builder::candidates_extracted(candidates);
            debug!(
                code = %entry.code,
                sections = sections.len(),
                elections = elections.len(),
                candidates = candidates,
                "Processed page"
            );

            if elections.is_empty() {
                continue;
            }
            let mut jurisdiction = Jurisdiction::empty(entry.name);
            jurisdiction.elections = elections;
            partial.insert(entry.code.to_string(), jurisdiction);
        }

        match last_error {
            Some(e) if failed == self.registry.len() => Err(e),
            _ => Ok(partial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ElectionCalendar;
    use crate::domain::{ChamberImpact, Party};
    use crate::pipeline::processing::extract::CandidateExtractor;
    use std::collections::HashMap;

    const VIRGINIA_PAGE: &str = r#"
        <html><body>
          <h1>Virginia 2025</h1>
          <h2>Governor</h2>
          <p>Abigail Spanberger (D) faces
             Winsome Earle Sears (R).</p>
          <h3>Lieutenant Governor</h3>
          <p>No candidates announced yet.</p>
          <h2>U.S. House District 11</h2>
          <p>James Walkinshaw (D), running for re-election</p>
        </body></html>
    "#;

    struct MapFetcher(HashMap<&'static str, &'static str>);

    impl PageFetcher for MapFetcher {
        fn fetch(&self, code: &str, _state_name: &str) -> Result<Option<String>, SourceError> {
            Ok(self.0.get(code).map(|p| p.to_string()))
        }
    }

    struct FailingFetcher;

    impl PageFetcher for FailingFetcher {
        fn fetch(&self, _code: &str, _state_name: &str) -> Result<Option<String>, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }
    }

    #[test]
    fn test_split_sections_groups_text_under_headings() {
        let sections = split_sections(VIRGINIA_PAGE).unwrap();
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Governor", "Lieutenant Governor", "U.S. House District 11"]);
        assert_eq!(
            sections[0].text,
            "Abigail Spanberger (D) faces Winsome Earle Sears (R)."
        );
    }

    #[test]
    fn test_page_source_keeps_only_sections_with_candidates() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let extractor = CandidateExtractor::default();
        let builder = ElectionRecordBuilder::new(&calendar, &extractor);
        let fetcher = MapFetcher(HashMap::from([("VA", VIRGINIA_PAGE)]));

        let partial = ScrapedPageSource::new(fetcher, &registry, builder)
            .collect()
            .unwrap();

        assert_eq!(partial.len(), 1);
        let elections = &partial["VA"].elections;
        assert_eq!(elections.len(), 2);
        assert_eq!(elections[0].title, "Governor");
        assert_eq!(elections[0].chamber_impact, ChamberImpact::State);
        assert_eq!(elections[0].stakes, "Key race in Virginia");
        assert_eq!(elections[0].candidates.len(), 2);
        assert_eq!(elections[0].candidates[1].party, Party::Republican);
        assert_eq!(elections[1].chamber_impact, ChamberImpact::House);
        assert!(elections[1].candidates[0].incumbent);
    }

    #[test]
    fn test_every_fetch_failing_fails_the_source() {
        let registry = JurisdictionRegistry::new();
        let calendar = ElectionCalendar::default();
        let extractor = CandidateExtractor::default();
        let builder = ElectionRecordBuilder::new(&calendar, &extractor);

        let result = ScrapedPageSource::new(FailingFetcher, &registry, builder).collect();
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_file_fetcher_treats_missing_page_as_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("VA.html"), VIRGINIA_PAGE).unwrap();
        let fetcher = FilePageFetcher::new(dir.path());

        assert!(fetcher.fetch("VA", "Virginia").unwrap().is_some());
        assert!(fetcher.fetch("NJ", "New Jersey").unwrap().is_none());
    }

    #[test]
    fn test_http_url_template_substitution() {
        let fetcher = HttpPageFetcher::new(
            "https://example.org/{state}/{code}",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            fetcher.url_for("NH", "New Hampshire"),
            "https://example.org/New_Hampshire/NH"
        );
    }
}
