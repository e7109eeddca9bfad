//! Page rendering: fetch a page and hand back either its visible text lines
//! or the "buy tickets" anchors with their surrounding block text.
//!
//! [`HtmlPage`] works on static HTML and does not execute scripts.

use std::ops::Deref;

use regex::Regex;
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{debug, error, info, info_span, instrument};
use url::Url;

use crate::config::RenderConfig;
use crate::model::TicketBlock;
use crate::tickets::TICKET_LINK_PATTERN;

/// How many ancestors of a ticket anchor are inspected for its block.
pub const MAX_ANCESTOR_DEPTH: usize = 6;
/// An ancestor qualifies as the block once its trimmed text is longer than this.
pub const MIN_BLOCK_CHARS: usize = 40;

const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "iframe", "svg"];
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "tfoot", "thead", "tr", "ul",
];
const CELL_TAGS: &[&str] = &["td", "th"];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Navigation timeout of {timeout_secs}s exceeded for {url}")]
    Timeout { url: String, timeout_secs: u64 },
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    #[error("Navigation to {url} returned HTTP {code}")]
    Status { url: String, code: u16 },
    #[error("Failed to read page body from {url}: {message}")]
    Body { url: String, message: String },
    #[error("Renderer worker failed: {0}")]
    Worker(String),
    #[error("Rendering cancelled: caller went away")]
    Cancelled,
}

/// A live connection used to render the pages of one request.
/// Dropping the session releases everything it holds.
pub trait RenderSession: Send {
    /// Flattened visible text of the page: trimmed, non-empty lines in document order.
    fn visible_lines(&mut self, url: &str) -> Result<Vec<String>, RenderError>;

    /// Ticket-purchase anchors with the text of their enclosing block.
    fn ticket_blocks(&mut self, url: &str) -> Result<Vec<TicketBlock>, RenderError>;
}

/// Opens a fresh [`RenderSession`] per request.
pub trait Renderer: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// Minimal view of a rendered tree node needed to locate a ticket block.
pub trait RenderNode: Sized {
    /// Visible text of the node and its descendants.
    fn text(&self) -> String;
    fn parent(&self) -> Option<Self>;
}

/// Text of the nearest ancestor (at most [`MAX_ANCESTOR_DEPTH`] levels up) whose
/// trimmed text exceeds [`MIN_BLOCK_CHARS`] characters, or the anchor's own text.
pub fn enclosing_block_text<N: RenderNode>(anchor: &N) -> String {
    let mut current = anchor.parent();
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some(node) = current else {
            break;
        };
        let text = node.text();
        let trimmed = text.trim();
        if trimmed.chars().count() > MIN_BLOCK_CHARS {
            return trimmed.to_string();
        }
        current = node.parent();
    }
    anchor.text().trim().to_string()
}

impl RenderNode for ElementRef<'_> {
    fn text(&self) -> String {
        inner_text(*self)
    }

    fn parent(&self) -> Option<Self> {
        // NodeRef::parent; `self.parent()` would resolve back to this method.
        Deref::deref(self).parent().and_then(ElementRef::wrap)
    }
}

/// Approximates the browser's `innerText`: hidden elements dropped, whitespace
/// collapsed, line breaks at block boundaries, blank lines removed.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(out, text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_el.value().name();
        if HIDDEN_TAGS.contains(&name) {
            continue;
        }
        if name == "br" {
            out.push('\n');
        } else if BLOCK_TAGS.contains(&name) {
            out.push('\n');
            collect_text(child_el, out);
            out.push('\n');
        } else if CELL_TAGS.contains(&name) {
            push_collapsed(out, " ");
            collect_text(child_el, out);
            push_collapsed(out, " ");
        } else {
            collect_text(child_el, out);
        }
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
}

/// A parsed HTML document plus the URL it was loaded from.
pub struct HtmlPage {
    document: Html,
    base_url: Option<Url>,
}

impl HtmlPage {
    pub fn parse(base_url: &str, body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
            base_url: Url::parse(base_url).ok(),
        }
    }

    pub fn visible_lines(&self) -> Vec<String> {
        inner_text(self.document.root_element())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Anchors whose visible text passes `is_ticket_link`, each with its block text.
    pub fn ticket_blocks<F>(&self, is_ticket_link: F) -> Vec<TicketBlock>
    where
        F: Fn(&str) -> bool,
    {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "a")
            .filter(|a| is_ticket_link(&inner_text(*a)))
            .map(|a| TicketBlock::new(self.resolve_href(a), enclosing_block_text(&a)))
            .collect()
    }

    fn resolve_href(&self, anchor: ElementRef<'_>) -> String {
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if href.is_empty() {
            return String::new();
        }
        self.base_url
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| href.to_string())
    }
}

/// Renders pages by fetching their HTML over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    config: RenderConfig,
    ticket_link: Regex,
}

impl HttpRenderer {
    pub fn new(config: RenderConfig) -> Result<Self, regex::Error> {
        Ok(Self { config, ticket_link: Regex::new(TICKET_LINK_PATTERN)? })
    }
}

impl Renderer for HttpRenderer {
    fn open_session(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.config.navigation_timeout))
            .build()
            .into();
        debug!("Opened renderer session");
        Ok(Box::new(HttpSession {
            agent,
            config: self.config.clone(),
            ticket_link: self.ticket_link.clone(),
        }))
    }
}

struct HttpSession {
    agent: ureq::Agent,
    config: RenderConfig,
    ticket_link: Regex,
}

impl HttpSession {
    #[instrument(level = "info", skip(self))]
    fn navigate(&self, url: &str) -> Result<HtmlPage, RenderError> {
        let response_result = {
            let _span = info_span!("render_fetch", url = %url).entered();
            self.agent
                .get(url)
                .header("User-Agent", self.config.user_agent.as_str())
                .header("Accept-Language", self.config.accept_language.as_str())
                .call()
        };
        let response = response_result.map_err(|e| {
            error!(error = %e, url = %url, "Navigation failed");
            self.navigation_error(url, e)
        })?;

        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string().map_err(|e| {
            error!(error = %e, url = %url, "Failed to read page body");
            RenderError::Body { url: url.to_string(), message: e.to_string() }
        })?;
        info!(bytes = body.len(), "Fetched page");
        Ok(HtmlPage::parse(url, &body))
    }

    fn navigation_error(&self, url: &str, err: ureq::Error) -> RenderError {
        match err {
            ureq::Error::Timeout(_) => RenderError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.navigation_timeout.as_secs(),
            },
            ureq::Error::StatusCode(code) => RenderError::Status { url: url.to_string(), code },
            other => RenderError::Navigation { url: url.to_string(), message: other.to_string() },
        }
    }
}

impl RenderSession for HttpSession {
    fn visible_lines(&mut self, url: &str) -> Result<Vec<String>, RenderError> {
        let lines = self.navigate(url)?.visible_lines();
        info!(lines = lines.len(), "Rendered visible text");
        Ok(lines)
    }

    fn ticket_blocks(&mut self, url: &str) -> Result<Vec<TicketBlock>, RenderError> {
        let ticket_link = &self.ticket_link;
        let blocks = self.navigate(url)?.ticket_blocks(|text| ticket_link.is_match(text));
        info!(blocks = blocks.len(), "Collected ticket blocks");
        Ok(blocks)
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!("Closed renderer session");
    }
}
