//! Extraction collaborator seam
//!
//! The core never understands page semantics. After a successful fetch it
//! hands the decoded document to an [`Extractor`], which may yield the next
//! URL of a chain and/or structured content for ledger labels. Site-specific
//! knowledge lives in selector configuration, not in code.

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Structured content pulled from a fetched document
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    /// Item title (used as the chapter label in ledger records)
    pub title: Option<String>,

    /// Item body text
    pub body: String,

    /// Book label, when the page exposes one
    pub book: Option<String>,
}

/// Extraction collaborator consumed by the crawl controllers
pub trait Extractor: Send + Sync {
    /// Returns the next URL of a chain, if the document links one
    fn next_link(&self, document: &str, current_url: &str) -> Option<String>;

    /// Returns structured content, or None when the document yields nothing
    fn content(&self, document: &str) -> Option<ExtractedContent>;
}

/// CSS-selector-driven extractor configured per site
///
/// Selectors are parsed once at construction; an unparsable selector is a
/// configuration error, not a runtime surprise.
pub struct SelectorExtractor {
    next_link: Option<Selector>,
    title: Option<Selector>,
    content: Option<Selector>,
    book: Option<Selector>,
}

impl SelectorExtractor {
    /// Builds an extractor from configured selectors
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            next_link: parse_selector(config.next_link.as_deref(), "next-link")?,
            title: parse_selector(config.title.as_deref(), "title")?,
            content: parse_selector(config.content.as_deref(), "content")?,
            book: parse_selector(config.book.as_deref(), "book")?,
        })
    }

    /// Collects the joined text of the first element matching `selector`
    fn select_text(document: &Html, selector: &Selector) -> Option<String> {
        document.select(selector).next().map(|element| {
            element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
    }
}

impl Extractor for SelectorExtractor {
    fn next_link(&self, document: &str, current_url: &str) -> Option<String> {
        let selector = self.next_link.as_ref()?;
        let document = Html::parse_document(document);

        let href = document
            .select(selector)
            .next()
            .and_then(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())?;

        // Resolve relative links against the page they came from
        let base = Url::parse(current_url).ok()?;
        let resolved = base.join(href).ok()?;

        if resolved.scheme() == "http" || resolved.scheme() == "https" {
            Some(resolved.to_string())
        } else {
            None
        }
    }

    fn content(&self, document: &str) -> Option<ExtractedContent> {
        let content_selector = self.content.as_ref()?;
        let document = Html::parse_document(document);

        let body = Self::select_text(&document, content_selector)?;

        let title = self
            .title
            .as_ref()
            .and_then(|s| Self::select_text(&document, s))
            .filter(|t| !t.is_empty());

        let book = self
            .book
            .as_ref()
            .and_then(|s| Self::select_text(&document, s))
            .filter(|b| !b.is_empty());

        Some(ExtractedContent { title, body, book })
    }
}

fn parse_selector(raw: Option<&str>, name: &str) -> Result<Option<Selector>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => Selector::parse(raw).map(Some).map_err(|e| {
            ConfigError::Validation(format!("invalid {} selector '{}': {}", name, raw, e))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(config: SelectorConfig) -> SelectorExtractor {
        SelectorExtractor::new(&config).unwrap()
    }

    fn chain_config() -> SelectorConfig {
        SelectorConfig {
            next_link: Some("a#pt_next".to_string()),
            title: Some("h1".to_string()),
            content: Some("div#chaptercontent".to_string()),
            book: None,
        }
    }

    #[test]
    fn test_next_link_absolute() {
        let html = r#"<a id="pt_next" href="https://example.com/2.html">next</a>"#;
        let ex = extractor(chain_config());
        assert_eq!(
            ex.next_link(html, "https://example.com/1.html"),
            Some("https://example.com/2.html".to_string())
        );
    }

    #[test]
    fn test_next_link_relative_is_resolved() {
        let html = r#"<a id="pt_next" href="/biqu5403/5419629.html">next</a>"#;
        let ex = extractor(chain_config());
        assert_eq!(
            ex.next_link(html, "https://m.example.com/biqu5403/5419628.html"),
            Some("https://m.example.com/biqu5403/5419629.html".to_string())
        );
    }

    #[test]
    fn test_next_link_missing() {
        let html = r#"<a href="/elsewhere">other</a>"#;
        let ex = extractor(chain_config());
        assert_eq!(ex.next_link(html, "https://example.com/1.html"), None);
    }

    #[test]
    fn test_next_link_without_selector() {
        let ex = extractor(SelectorConfig::default());
        assert_eq!(
            ex.next_link("<a href=\"/x\">x</a>", "https://example.com/"),
            None
        );
    }

    #[test]
    fn test_content_extraction() {
        let html = r#"
            <html><body>
            <h1>第一章</h1>
            <div id="chaptercontent"><p>line one</p><p>line two</p></div>
            </body></html>
        "#;
        let ex = extractor(chain_config());
        let content = ex.content(html).unwrap();
        assert_eq!(content.title.as_deref(), Some("第一章"));
        assert!(content.body.contains("line one"));
        assert!(content.body.contains("line two"));
    }

    #[test]
    fn test_content_none_when_selector_misses() {
        let ex = extractor(chain_config());
        assert!(ex.content("<html><body>nothing here</body></html>").is_none());
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let config = SelectorConfig {
            next_link: Some(":::not-a-selector".to_string()),
            ..Default::default()
        };
        assert!(SelectorExtractor::new(&config).is_err());
    }
}
