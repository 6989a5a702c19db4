//! Address-bar input interpretation used by the in-memory backend.
//!
//! Resolution order: empty input opens a blank page, `@command` enters
//! command mode, anything that parses as a URL (with or without scheme) is
//! navigated to, and everything else becomes a search.

use std::net::IpAddr;

use url::Url;

use crate::types::navigation::{CommandKind, InputResolution};

const DEFAULT_SEARCH_TEMPLATE: &str = "https://duckduckgo.com/?q=%s";

/// Turns free-form address-bar text into an [`InputResolution`].
#[derive(Debug, Clone)]
pub struct InputResolver {
    search_template: String,
}

impl InputResolver {
    pub fn new() -> Self {
        Self {
            search_template: DEFAULT_SEARCH_TEMPLATE.to_string(),
        }
    }

    /// Uses `template` for searches; `%s` is replaced by the encoded query.
    pub fn with_search_engine(template: impl Into<String>) -> Self {
        Self {
            search_template: template.into(),
        }
    }

    pub fn search_template(&self) -> &str {
        &self.search_template
    }

    pub fn resolve(&self, input: &str) -> InputResolution {
        let input = input.trim();

        if input.is_empty() {
            return InputResolution::Navigate("about:blank".to_string());
        }

        if let Some(resolution) = parse_command(input) {
            return resolution;
        }

        if let Some(url) = try_parse_url(input) {
            return InputResolution::Navigate(url);
        }

        InputResolution::Search(self.search_url(input))
    }

    fn search_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.search_template.replace("%s", &encoded)
    }
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_command(input: &str) -> Option<InputResolution> {
    let body = input.strip_prefix('@')?;
    let mut parts = body.splitn(2, ' ');
    let name = parts.next()?.to_lowercase();
    let query = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let command_type = match name.as_str() {
        "tabs" | "tab" | "t" => CommandKind::Tabs,
        "history" | "hist" | "h" => CommandKind::History,
        "sessions" | "session" | "s" => CommandKind::Sessions,
        _ => return None,
    };

    Some(InputResolution::Command {
        command_type,
        query,
    })
}

fn try_parse_url(input: &str) -> Option<String> {
    if (input.starts_with("http://") || input.starts_with("https://")) && Url::parse(input).is_ok()
    {
        return Some(input.to_string());
    }

    if looks_like_url(input) {
        let (host, rest) = split_host_and_rest(input);
        let candidate = match parse_ip_host(host) {
            Some(IpAddr::V6(_)) if !host.starts_with('[') => format!("https://[{}]{}", host, rest),
            _ => format!("https://{}{}", host, rest),
        };
        if Url::parse(&candidate).is_ok() {
            return Some(candidate);
        }
    }

    if input.starts_with("file://") || input.starts_with("about:") || input.starts_with("data:") {
        return Some(input.to_string());
    }

    None
}

fn looks_like_url(input: &str) -> bool {
    if input.contains(' ') {
        return false;
    }

    let (host, _) = split_host_and_rest(input);
    if host.starts_with("localhost") || parse_ip_host(host).is_some() {
        return true;
    }

    // Domain-like: a dot and an alphabetic TLD of 2..=6 chars.
    let Some((_, tld)) = host.rsplit_once('.') else {
        return false;
    };
    let tld = tld.split(':').next().unwrap_or(tld);
    (2..=6).contains(&tld.len()) && tld.chars().all(|c| c.is_alphabetic())
}

fn parse_ip_host(host: &str) -> Option<IpAddr> {
    let host = host.trim();
    if host.is_empty() {
        return None;
    }

    let bare = if let Some(stripped) = host.strip_prefix('[') {
        stripped.split(']').next().unwrap_or(stripped)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };

    bare.parse().ok()
}

fn split_host_and_rest(input: &str) -> (&str, &str) {
    let cut = input
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(input.len());
    input.split_at(cut)
}
