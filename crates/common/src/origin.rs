//! Page and frame provenance for the outbound payload.
//!
//! The ad server uses the referer and the chain of ancestor origins to detect
//! spoofed inventory. Browsers only expose part of that chain to nested
//! frames, so the chain is best effort: authoritative ancestor origins when the
//! platform provides them, otherwise whatever can be inferred from the
//! referrer plus [`UNKNOWN_ANCESTOR_ORIGIN`] when more frames sit above.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::UNKNOWN_ANCESTOR_ORIGIN;

/// Capabilities the adapter needs from the page it runs in.
pub trait PageContext {
    /// Full URL of the frame the adapter runs in.
    fn current_url(&self) -> &str;

    /// Origin (`scheme://host[:port]`) of the current frame.
    fn current_origin(&self) -> String;

    /// Number of frames between the current frame and the top frame.
    /// `0` means the adapter runs in the top frame.
    fn frame_depth(&self) -> usize;

    /// Ancestor origins, nearest first, when the platform reports them.
    fn ancestor_origins(&self) -> Option<Vec<String>>;

    /// The document referrer, if any.
    fn referrer(&self) -> Option<&str>;

    fn is_top_frame(&self) -> bool {
        self.frame_depth() == 0
    }
}

/// A snapshot of the page context captured by the host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticPageContext {
    pub current_url: String,
    #[serde(default)]
    pub frame_depth: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestor_origins: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl StaticPageContext {
    /// Context for a page loaded directly in the top frame.
    pub fn top_frame(url: impl Into<String>) -> Self {
        Self {
            current_url: url.into(),
            ..Self::default()
        }
    }
}

impl PageContext for StaticPageContext {
    fn current_url(&self) -> &str {
        &self.current_url
    }

    fn current_origin(&self) -> String {
        Url::parse(&self.current_url)
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|_| "null".to_string())
    }

    fn frame_depth(&self) -> usize {
        self.frame_depth
    }

    fn ancestor_origins(&self) -> Option<Vec<String>> {
        self.ancestor_origins.clone()
    }

    fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }
}

/// Referer and origin chain reported to the ad server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginChain {
    pub referer: Option<String>,
    pub origins: Vec<String>,
}

/// Derive the referer and ancestor origin chain for `page`.
pub fn derive_origin_chain<P: PageContext + ?Sized>(page: &P) -> OriginChain {
    OriginChain {
        referer: derive_referer(page),
        origins: derive_origins(page),
    }
}

fn derive_referer<P: PageContext + ?Sized>(page: &P) -> Option<String> {
    match page.frame_depth() {
        0 => Some(page.current_url().to_string()),
        1 => page.referrer().map(str::to_string),
        _ => None,
    }
}

fn derive_origins<P: PageContext + ?Sized>(page: &P) -> Vec<String> {
    let mut origins = vec![page.current_origin()];

    if let Some(ancestors) = page.ancestor_origins() {
        origins.extend(ancestors);
        return origins;
    }

    let depth = page.frame_depth();
    if depth == 0 {
        return origins;
    }

    match page.referrer().and_then(origin_from_referrer) {
        Some(parent) => origins.push(parent),
        None => log::debug!("Nested frame without a usable referrer; parent origin unknown"),
    }

    if depth > 1 {
        origins.push(UNKNOWN_ANCESTOR_ORIGIN.to_string());
    }

    origins
}

/// Origin of a referrer URL: its scheme plus the authority segment, verbatim.
///
/// Host case and explicit ports are kept as reported.
fn origin_from_referrer(referrer: &str) -> Option<String> {
    let referrer = referrer.trim();
    if referrer.is_empty() {
        return None;
    }

    // The first three `/` pieces are `scheme:`, the empty piece and the host.
    let segments: Vec<&str> = referrer.splitn(4, '/').take(3).collect();
    (segments.len() == 3 && !segments[2].is_empty()).then(|| segments.join("/"))
}
