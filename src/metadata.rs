//! Page-level metadata extraction for live pages.
//!
//! The precedence rules are small pure functions over [`PropertyLookup`], so they
//! work against any document representation. [`HtmlDocument`] is the `scraper`
//! backed implementation used for fetched pages.

use scraper::{Html, Selector};

/// Read access to named page properties.
pub trait PropertyLookup {
    /// Content of the first `<meta property="{name}">` tag, trimmed.
    fn property(&self, name: &str) -> Option<String>;

    /// Text of the document's own `<title>` element, trimmed.
    fn title_text(&self) -> Option<String>;
}

/// Metadata chosen from a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl PageMetadata {
    /// Apply every precedence chain against `doc`.
    #[must_use]
    pub fn from_lookup(doc: &impl PropertyLookup) -> Self {
        Self {
            title: title_candidate(doc),
            description: description_candidate(doc),
            image: image_candidate(doc),
        }
    }

    /// Best available caption: description, else title, else empty.
    #[must_use]
    pub fn text(&self) -> String {
        self.description
            .as_ref()
            .or(self.title.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn image_list(&self) -> Vec<String> {
        self.image.iter().cloned().collect()
    }
}

/// `og:title`, else the `<title>` element.
pub fn title_candidate(doc: &impl PropertyLookup) -> Option<String> {
    doc.property("og:title").or_else(|| doc.title_text())
}

/// `og:description`.
pub fn description_candidate(doc: &impl PropertyLookup) -> Option<String> {
    doc.property("og:description")
}

/// `og:image`.
pub fn image_candidate(doc: &impl PropertyLookup) -> Option<String> {
    doc.property("og:image")
}

/// A parsed HTML document.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

impl PropertyLookup for HtmlDocument {
    fn property(&self, name: &str) -> Option<String> {
        // Escape quotes so the property name can't break out of the attribute selector
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        let selector = Selector::parse(&format!(r#"meta[property="{escaped}"]"#)).ok()?;

        self.html
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
            .and_then(non_empty)
    }

    fn title_text(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let element = self.html.select(&selector).next()?;
        let text: String = element.text().collect();
        non_empty(&text)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// In-memory lookup for exercising the precedence rules without HTML.
    #[derive(Default)]
    struct FakeDoc {
        properties: HashMap<&'static str, &'static str>,
        title: Option<&'static str>,
    }

    impl PropertyLookup for FakeDoc {
        fn property(&self, name: &str) -> Option<String> {
            self.properties.get(name).map(ToString::to_string)
        }

        fn title_text(&self) -> Option<String> {
            self.title.map(ToString::to_string)
        }
    }

    #[test]
    fn test_title_prefers_og_title() {
        let doc = FakeDoc {
            properties: HashMap::from([("og:title", "OG")]),
            title: Some("Plain"),
        };
        assert_eq!(title_candidate(&doc), Some("OG".to_string()));
    }

    #[test]
    fn test_title_falls_back_to_title_element() {
        let doc = FakeDoc {
            title: Some("Plain"),
            ..Default::default()
        };
        assert_eq!(title_candidate(&doc), Some("Plain".to_string()));
        assert_eq!(title_candidate(&FakeDoc::default()), None);
    }

    #[test]
    fn test_text_precedence() {
        let full = PageMetadata {
            title: Some("T".to_string()),
            description: Some("D".to_string()),
            image: None,
        };
        assert_eq!(full.text(), "D");

        let title_only = PageMetadata {
            title: Some("T".to_string()),
            ..Default::default()
        };
        assert_eq!(title_only.text(), "T");

        assert_eq!(PageMetadata::default().text(), "");
    }

    #[test]
    fn test_image_list() {
        let with_image = PageMetadata {
            image: Some("http://x/i.png".to_string()),
            ..Default::default()
        };
        assert_eq!(with_image.image_list(), vec!["http://x/i.png".to_string()]);
        assert!(PageMetadata::default().image_list().is_empty());
    }

    #[test]
    fn test_extract_basic_og_metadata() {
        let html = r#"
            <html>
                <head>
                    <title>Page Title</title>
                    <meta property="og:title" content="T">
                    <meta property="og:description" content="D">
                    <meta property="og:image" content="http://x/i.png">
                </head>
            </html>
        "#;

        let metadata = PageMetadata::from_lookup(&HtmlDocument::parse(html));

        assert_eq!(metadata.title, Some("T".to_string()));
        assert_eq!(metadata.description, Some("D".to_string()));
        assert_eq!(metadata.image, Some("http://x/i.png".to_string()));
        assert_eq!(metadata.text(), "D");
    }

    #[test]
    fn test_extract_no_og_metadata() {
        let html = r#"
            <html>
                <head>
                    <title>Hello</title>
                    <meta name="description" content="Regular meta description">
                </head>
            </html>
        "#;

        let metadata = PageMetadata::from_lookup(&HtmlDocument::parse(html));

        assert_eq!(metadata.title, Some("Hello".to_string()));
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.image, None);
        assert_eq!(metadata.text(), "Hello");
    }

    #[test]
    fn test_extract_empty_og_content() {
        let html = r#"
            <html>
                <head>
                    <title>Fallback</title>
                    <meta property="og:title" content="">
                    <meta property="og:description" content="  ">
                    <meta property="og:image">
                </head>
            </html>
        "#;

        let metadata = PageMetadata::from_lookup(&HtmlDocument::parse(html));

        // Empty strings count as absent
        assert_eq!(metadata.title, Some("Fallback".to_string()));
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.image, None);
    }

    #[test]
    fn test_first_tag_wins() {
        let html = r#"
            <html>
                <head>
                    <meta property="og:image" content="http://x/first.png">
                    <meta property="og:image" content="http://x/second.png">
                </head>
            </html>
        "#;

        let doc = HtmlDocument::parse(html);
        assert_eq!(
            image_candidate(&doc),
            Some("http://x/first.png".to_string())
        );
    }

    #[test]
    fn test_ignores_name_attribute_meta() {
        let html = r#"
            <html>
                <head>
                    <meta name="og:title" content="Wrong attribute">
                    <meta name="twitter:title" content="Twitter">
                </head>
            </html>
        "#;

        let doc = HtmlDocument::parse(html);
        assert_eq!(title_candidate(&doc), None);
    }

    #[test]
    fn test_extract_trims_whitespace() {
        let html = r#"
            <html>
                <head>
                    <title>
                        Spaced Title
                    </title>
                    <meta property="og:description" content="  Trimmed  ">
                </head>
            </html>
        "#;

        let doc = HtmlDocument::parse(html);
        assert_eq!(doc.title_text(), Some("Spaced Title".to_string()));
        assert_eq!(description_candidate(&doc), Some("Trimmed".to_string()));
    }

    #[test]
    fn test_non_ascii_content() {
        let html = r#"<html><head><meta property="og:description" content="Café ☕ 日本"></head></html>"#;

        let doc = HtmlDocument::parse(html);
        assert_eq!(description_candidate(&doc), Some("Café ☕ 日本".to_string()));
    }
}
