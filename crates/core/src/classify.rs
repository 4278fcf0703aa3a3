//! Request path classification for strategy routing.
//!
//! Pure functions over path strings. Classification decides which cache
//! generation and retrieval strategy a request is routed to; the checks
//! run in a fixed order, so every path maps to exactly one class.

use serde::{Deserialize, Serialize};

const CORE_EXTENSIONS: [&str; 5] = [".css", ".js", ".woff2", ".woff", ".ttf"];
const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".webp", ".svg", ".gif", ".ico"];

/// Resource class assigned to an intercepted request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    /// Stylesheets, scripts, fonts, the app manifest.
    CoreAsset,
    Image,
    Html,
    Api,
    Other,
}

impl ResourceClass {
    /// Classify a request path.
    ///
    /// Checks run in order: core asset, image, html, api. The manifest is
    /// a core asset even though its path contains "json".
    pub fn classify(pathname: &str) -> Self {
        if is_core_asset(pathname) {
            ResourceClass::CoreAsset
        } else if is_image(pathname) {
            ResourceClass::Image
        } else if is_html(pathname) {
            ResourceClass::Html
        } else if is_api(pathname) {
            ResourceClass::Api
        } else {
            ResourceClass::Other
        }
    }
}

fn is_core_asset(pathname: &str) -> bool {
    CORE_EXTENSIONS.iter().any(|ext| pathname.ends_with(ext))
        || pathname == "/manifest.json"
        || pathname.contains("/fonts/")
}

fn is_image(pathname: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| pathname.ends_with(ext))
}

fn is_html(pathname: &str) -> bool {
    pathname.ends_with(".html") || pathname == "/" || !pathname.contains('.')
}

fn is_api(pathname: &str) -> bool {
    pathname.starts_with("/api/") || pathname.contains("json")
}
