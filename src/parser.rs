//! Link and content parsers.
//!
//! Parsing is synchronous and pure: document text in, links or a record out.
//! The shipped implementations use CSS selectors via the `scraper` crate; the
//! traits are the seam for anything else (XPath, JSON APIs, regex scraping).

use crate::error::CrawlError;
use crate::schema::{FieldKind, Record, Schema};
use scraper::{Html, Selector};
use serde_json::{Map, Value};

/// Extracts candidate link targets from a document, in document order.
///
/// Returned strings may be relative or absolute; the worker resolves them
/// against the crawl's base URL.
pub trait LinkParser: Send + Sync {
    fn links(&self, document: &str, selector: &str) -> Result<Vec<String>, CrawlError>;
}

/// Extracts one structured record from a target document.
pub trait ContentParser: Send + Sync {
    fn parse(&self, document: &str, schema: &Schema) -> Result<Record, CrawlError>;
}

fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// CSS-selector link extraction: collects `href` attributes of every element
/// matched by the selector (or of matched `<a>` descendants when the matched
/// element is not itself an anchor).
#[derive(Debug, Default, Clone, Copy)]
pub struct CssLinkParser;

impl LinkParser for CssLinkParser {
    fn links(&self, document: &str, selector: &str) -> Result<Vec<String>, CrawlError> {
        let compiled = compile(selector)?;
        let anchors = compile("a[href]")?;
        let doc = Html::parse_document(document);

        let mut links = Vec::new();
        for element in doc.select(&compiled) {
            if let Some(href) = element.value().attr("href") {
                links.push(href.to_string());
            } else {
                for anchor in element.select(&anchors) {
                    if let Some(href) = anchor.value().attr("href") {
                        links.push(href.to_string());
                    }
                }
            }
        }
        Ok(links)
    }
}

/// CSS-selector record extraction driven by a [`Schema`].
///
/// Every field is required: a selector that matches no element fails the
/// whole parse, which the worker treats like any other per-job failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct CssContentParser;

impl ContentParser for CssContentParser {
    fn parse(&self, document: &str, schema: &Schema) -> Result<Record, CrawlError> {
        let doc = Html::parse_document(document);
        let mut record = Map::with_capacity(schema.fields.len());

        for field in &schema.fields {
            let compiled = compile(&field.selector)?;
            let element =
                doc.select(&compiled)
                    .next()
                    .ok_or_else(|| CrawlError::SelectorNotFound {
                        selector: field.selector.clone(),
                    })?;

            let value = match &field.kind {
                FieldKind::Text => {
                    element.text().collect::<String>().trim().to_string()
                }
                FieldKind::Html => element.inner_html(),
                FieldKind::Attribute(name) => element
                    .value()
                    .attr(name)
                    .ok_or_else(|| CrawlError::SelectorNotFound {
                        selector: format!("{}[{}]", field.selector, name),
                    })?
                    .to_string(),
            };

            record.insert(field.name.clone(), Value::String(value));
        }

        Ok(Value::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="item"><a href="/item/1">one</a></div>
          <div class="item"><a href="/item/2">two</a></div>
          <a class="next" href="/list?page=2">next</a>
        </body></html>
    "#;

    #[test]
    fn collects_hrefs_in_document_order() {
        let links = CssLinkParser.links(LISTING, ".item a").unwrap();
        assert_eq!(links, vec!["/item/1", "/item/2"]);
    }

    #[test]
    fn descends_into_anchors_when_selector_matches_a_container() {
        let links = CssLinkParser.links(LISTING, ".item").unwrap();
        assert_eq!(links, vec!["/item/1", "/item/2"]);
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = CssLinkParser.links(LISTING, ":::nope").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidSelector { .. }));
    }

    #[test]
    fn extracts_a_record_per_schema() {
        let doc = r#"<html><body>
            <h1>  A Title  </h1>
            <article><p>body</p></article>
            <img class="cover" src="/cover.png">
        </body></html>"#;

        let schema = Schema::new()
            .field("title", "h1")
            .html_field("body", "article")
            .attr_field("image", "img.cover", "src");

        let record = CssContentParser.parse(doc, &schema).unwrap();
        assert_eq!(record["title"], "A Title");
        assert_eq!(record["body"], "<p>body</p>");
        assert_eq!(record["image"], "/cover.png");
    }

    #[test]
    fn missing_required_field_fails_the_parse() {
        let schema = Schema::new().field("title", "h1.absent");
        let err = CssContentParser.parse("<html></html>", &schema).unwrap_err();
        assert!(matches!(
            err,
            CrawlError::SelectorNotFound { selector } if selector == "h1.absent"
        ));
    }
}
