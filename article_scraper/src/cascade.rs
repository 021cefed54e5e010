//! Ordered fallback extraction over parsed documents.
//!
//! A field is described by a list of rules. [`extract_field`] walks them in
//! order and keeps the first non-empty trimmed value; later rules are never
//! consulted. [`extract_blocks`] does the same for the multi-valued body
//! field, where a tier wins as soon as it yields one non-empty block.
//!
//! The algorithm is shared; only rule matching differs per document kind
//! (CSS selectors for HTML, JSON pointers for API responses).

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::error::ScrapeError;
use crate::ContentBlock;

/// A parsed upstream document that can answer rule lookups.
pub trait Document {
    type Rule;

    /// Value of the first node matching `rule`, in document order.
    fn first_value(&self, rule: &Self::Rule) -> Option<String>;

    /// Values of every node matching `rule`, in document order.
    fn all_values(&self, rule: &Self::Rule) -> Vec<String>;
}

pub fn extract_field<D: Document>(doc: &D, strategy: &[D::Rule]) -> Option<String> {
    strategy.iter().enumerate().find_map(|(tier, rule)| {
        let value = doc.first_value(rule)?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        tracing::trace!(tier, "field rule matched");
        Some(value.to_string())
    })
}

pub fn extract_blocks<D: Document>(doc: &D, strategy: &[D::Rule]) -> Vec<ContentBlock> {
    for (tier, rule) in strategy.iter().enumerate() {
        let blocks = into_blocks(doc.all_values(rule));
        if !blocks.is_empty() {
            tracing::debug!(tier, blocks = blocks.len(), "body rule matched");
            return blocks;
        }
    }
    Vec::new()
}

/// Trims, drops empty fragments and collapses runs of identical text.
fn into_blocks(values: Vec<String>) -> Vec<ContentBlock> {
    let mut blocks: Vec<ContentBlock> = Vec::new();
    for (position, value) in values.into_iter().enumerate() {
        let text = value.trim();
        if text.is_empty() {
            continue;
        }
        if blocks.last().is_some_and(|prev| prev.text == text) {
            continue;
        }
        blocks.push(ContentBlock {
            position,
            text: text.to_string(),
        });
    }
    blocks
}

/// Where a matched HTML node keeps its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Text,
    Attr(&'static str),
}

#[derive(Debug, Clone)]
pub enum HtmlRule {
    /// First element matching `selector`, searched inside the first `scope`
    /// match when there is one and in the whole document otherwise.
    Select {
        scope: Option<Selector>,
        selector: Selector,
        value: ValueSource,
    },
    /// First anchor whose link target host contains one of `hosts`.
    LinkHost { anchors: Selector, hosts: Vec<String> },
}

impl HtmlRule {
    pub fn select(css: &str, value: ValueSource) -> Result<Self, ScrapeError> {
        Ok(HtmlRule::Select {
            scope: None,
            selector: parse_selector(css)?,
            value,
        })
    }

    pub fn scoped(scope: &str, css: &str, value: ValueSource) -> Result<Self, ScrapeError> {
        Ok(HtmlRule::Select {
            scope: Some(parse_selector(scope)?),
            selector: parse_selector(css)?,
            value,
        })
    }

    pub fn link_host(hosts: &[String]) -> Result<Self, ScrapeError> {
        Ok(HtmlRule::LinkHost {
            anchors: parse_selector("a[href]")?,
            hosts: hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect(),
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::InvalidRule(format!("{css}: {e}")))
}

pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    fn root<'a>(&'a self, scope: &Option<Selector>) -> ElementRef<'a> {
        scope
            .as_ref()
            .and_then(|s| self.html.select(s).next())
            .unwrap_or_else(|| self.html.root_element())
    }
}

fn read(el: ElementRef<'_>, value: ValueSource) -> Option<String> {
    match value {
        ValueSource::Text => Some(el.text().collect::<String>()),
        ValueSource::Attr(name) => el.value().attr(name).map(str::to_string),
    }
}

impl Document for HtmlDocument {
    type Rule = HtmlRule;

    fn first_value(&self, rule: &HtmlRule) -> Option<String> {
        match rule {
            HtmlRule::Select {
                scope,
                selector,
                value,
            } => {
                let el = self.root(scope).select(selector).next()?;
                read(el, *value)
            }
            HtmlRule::LinkHost { anchors, hosts } => self
                .html
                .select(anchors)
                .filter_map(|a| a.value().attr("href"))
                .find(|href| {
                    link_host(href).is_some_and(|host| hosts.iter().any(|h| host.contains(h.as_str())))
                })
                .map(str::to_string),
        }
    }

    fn all_values(&self, rule: &HtmlRule) -> Vec<String> {
        match rule {
            HtmlRule::Select {
                scope,
                selector,
                value,
            } => self
                .root(scope)
                .select(selector)
                .filter_map(|el| read(el, *value))
                .collect(),
            HtmlRule::LinkHost { .. } => self.first_value(rule).into_iter().collect(),
        }
    }
}

/// Host of an absolute or protocol-relative link target. Relative links
/// have none.
fn link_host(href: &str) -> Option<String> {
    let href = href.trim();
    let url = match href.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => Url::parse(href),
    }
    .ok()?;
    url.host_str().map(str::to_ascii_lowercase)
}

/// A JSON pointer (RFC 6901) into an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRule {
    pointer: String,
}

impl JsonRule {
    pub fn new(pointer: impl Into<String>) -> Result<Self, ScrapeError> {
        let pointer = pointer.into();
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(ScrapeError::InvalidRule(format!(
                "{pointer}: json pointer must start with '/'"
            )));
        }
        Ok(Self { pointer })
    }
}

#[derive(Debug, Clone)]
pub struct JsonDocument {
    value: Value,
}

impl JsonDocument {
    pub fn parse(body: &[u8]) -> Result<Self, ScrapeError> {
        let value = serde_json::from_slice(body).map_err(|e| ScrapeError::Malformed(e.to_string()))?;
        Ok(Self { value })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Document for JsonDocument {
    type Rule = JsonRule;

    fn first_value(&self, rule: &JsonRule) -> Option<String> {
        match self.value.pointer(&rule.pointer)? {
            Value::Array(items) => items.iter().find_map(scalar),
            other => scalar(other),
        }
    }

    fn all_values(&self, rule: &JsonRule) -> Vec<String> {
        match self.value.pointer(&rule.pointer) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
            Some(other) => scalar(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}
