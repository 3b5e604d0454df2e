//! Outbound link sanitization for delivered responses.

use log::{debug, warn};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Replacement for a disallowed bare URL.
pub const LINK_REMOVED: &str = "[link removed]";

/// Rewrites links in a final response before delivery.
pub trait LinkSanitizer: Send + Sync {
    fn sanitize(&self, text: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinkSanitizer;

impl LinkSanitizer for NoopLinkSanitizer {
    fn sanitize(&self, text: &str) -> String {
        text.to_string()
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|err| warn!("link pattern rejected (pattern={pattern}, error={err})"))
        .ok()
}

static MARKDOWN_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"!?\[([^\]\n]*)\]\(([^)\s]+)\)"));
static BARE_URL: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"https?://[^\s<>()\[\]]+"));

/// Keeps links whose host is an allowed host or one of its subdomains.
///
/// Disallowed markdown links are replaced by their label and disallowed bare
/// URLs by [`LINK_REMOVED`]. Only `http(s)` and protocol-relative links are
/// judged; relative paths and other schemes are kept. An empty allow-list
/// keeps every link.
#[derive(Debug, Clone, Default)]
pub struct AllowedHostsSanitizer {
    allowed_hosts: Vec<String>,
}

impl AllowedHostsSanitizer {
    pub fn new<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_hosts = allowed_hosts
            .into_iter()
            .map(|host| normalize_host(host.as_ref()))
            .filter(|host| !host.is_empty())
            .collect();
        Self { allowed_hosts }
    }

    fn is_allowed(&self, url: &str) -> bool {
        let Some(host) = url_host(url) else {
            return true;
        };
        self.allowed_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
    }
}

impl LinkSanitizer for AllowedHostsSanitizer {
    fn sanitize(&self, text: &str) -> String {
        if self.allowed_hosts.is_empty() {
            return text.to_string();
        }
        let mut output = text.to_string();
        if let Some(markdown) = MARKDOWN_LINK.as_ref() {
            output = markdown
                .replace_all(&output, |captures: &Captures<'_>| {
                    let url = captures.get(2).map_or("", |m| m.as_str());
                    if self.is_allowed(url) {
                        captures[0].to_string()
                    } else {
                        debug!("removing markdown link (url={url})");
                        captures.get(1).map_or("", |m| m.as_str()).to_string()
                    }
                })
                .into_owned();
        }
        if let Some(bare) = BARE_URL.as_ref() {
            output = bare
                .replace_all(&output, |captures: &Captures<'_>| {
                    let matched = &captures[0];
                    let url = matched.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
                    let trailing = &matched[url.len()..];
                    if self.is_allowed(url) {
                        matched.to_string()
                    } else {
                        debug!("removing bare url (url={url})");
                        format!("{LINK_REMOVED}{trailing}")
                    }
                })
                .into_owned();
        }
        output
    }
}

/// Host of an absolute or protocol-relative URL; `None` for anything else.
fn url_host(url: &str) -> Option<String> {
    let lowered = url.trim().to_ascii_lowercase();
    let rest = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .or_else(|| lowered.strip_prefix("//"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    Some(normalize_host(host))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}
