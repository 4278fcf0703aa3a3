//! Stored response model, security-header stamping, and the offline
//! fallback document.
//!
//! A [`StoredResponse`] is the unit the cache stores and the worker
//! serves. Stamping always happens on an outgoing copy; the cached entry
//! itself is never mutated.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Security headers stamped on every served response, added only when
/// the response does not already carry them.
pub const SECURITY_HEADERS: [(&str, &str); 7] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("cross-origin-opener-policy", "same-origin"),
];

/// Long-lived cache directive for served responses without one.
const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000";

/// A response as held in a named store and served to the page.
///
/// Header names are normalized to lowercase on construction so lookups
/// and stamping are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl StoredResponse {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Bytes) -> Self {
        let headers = headers.into_iter().map(|(k, v)| (k.to_ascii_lowercase(), v)).collect();
        Self { status, headers, body }
    }

    /// Header lookup by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// HTTP 200-class status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return an outgoing copy with security headers and a default
    /// cache-control directive added where absent.
    pub fn with_security_headers(&self) -> StoredResponse {
        let mut out = self.clone();
        for (name, value) in SECURITY_HEADERS {
            out.headers.entry(name.to_string()).or_insert_with(|| value.to_string());
        }
        out.headers
            .entry("cache-control".to_string())
            .or_insert_with(|| DEFAULT_CACHE_CONTROL.to_string());
        out
    }
}

/// Self-contained page served when both network and cache fail.
///
/// Served with status 200 so the page renders instead of surfacing a
/// navigation error.
pub fn offline_response() -> StoredResponse {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
    StoredResponse::new(200, headers, Bytes::from_static(OFFLINE_HTML.as_bytes())).with_security_headers()
}

const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>You're Offline</title>
    <style>
        body {
            font-family: 'Inter', sans-serif;
            background: #0a0a0a;
            color: #fff;
            text-align: center;
            padding: 2rem;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
        }
        .error-container { max-width: 400px; }
        h1 { color: #ff4444; margin-bottom: 1rem; }
        p { margin: 0.5rem 0; color: #999; }
        .retry-btn {
            background: #ff4444;
            color: white;
            border: none;
            padding: 12px 24px;
            border-radius: 8px;
            cursor: pointer;
            margin-top: 1rem;
            font-weight: 500;
        }
        .retry-btn:hover { background: #ff3333; }
    </style>
</head>
<body>
    <div class="error-container">
        <h1>You're Offline</h1>
        <p>This page isn't available offline. Please check your internet connection and try again.</p>
        <button class="retry-btn" onclick="window.location.reload()">Retry</button>
    </div>
</body>
</html>
"#;
