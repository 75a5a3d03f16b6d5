//! README content handling: envelope decoding, placeholder documents and
//! rewriting of relative links to absolute raw-content URLs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Deserialize;

/// Text cached when a base64 envelope cannot be decoded
pub const DECODE_ERROR_TEXT: &str = "Error decoding README content";

lazy_static! {
    /// `src="..."` / `href='...'` attributes
    static ref HTML_LINK: Regex =
        Regex::new(r#"(src|href)=["']([^"']+)["']"#).expect("valid HTML link regex");

    /// `[text](url "title")` and `![alt](url)`
    static ref MARKDOWN_LINK: Regex =
        Regex::new(r#"(!?\[[^\]]*\])\(([^)\s]+)(\s+[^)]*)?\)"#).expect("valid markdown link regex");

    /// URI scheme prefix such as `https:` or `mailto:`
    static ref SCHEME: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid scheme regex");
}

/// JSON envelope returned by the README endpoint without raw negotiation
#[derive(Debug, Deserialize)]
pub(crate) struct ReadmeEnvelope {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

pub(crate) fn no_readme(repo: &str) -> String {
    format!("# {}\n\nNo README available for this repository.", repo)
}

pub(crate) fn empty_readme(repo: &str) -> String {
    format!("# {}\n\nNo README content available for this repository.", repo)
}

pub(crate) fn missing_content(repo: &str) -> String {
    format!("# {}\n\nRepository exists but no README content found.", repo)
}

pub(crate) fn rate_limited(repo: &str) -> String {
    format!(
        "# {}\n\nGitHub API rate limit exceeded. Please try again later or use an authentication token.",
        repo
    )
}

pub(crate) fn unparseable(repo: &str, error: &dyn std::fmt::Display) -> String {
    format!("# {}\n\nUnable to parse README content: {}", repo, error)
}

pub(crate) fn load_error(repo: &str, error: &dyn std::fmt::Display) -> String {
    format!("# {}\n\nError loading README: {}", repo, error)
}

/// Heuristic for bodies that failed JSON parsing but are plainly markdown
pub(crate) fn looks_like_markdown(body: &str) -> bool {
    body.contains("# ")
}

/// Decode GitHub's line-wrapped base64 into UTF-8 text
pub fn decode_base64_content(content: &str) -> Result<String, String> {
    let cleaned: String = content.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let bytes = STANDARD.decode(cleaned.as_bytes()).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Rewrite relative links in `content` to `{raw_base}/{owner}/{repo}/raw/main/{path}`.
///
/// Links that carry a scheme, are root-relative, or are in-page anchors stay as they are.
pub fn rewrite_relative_links(content: &str, raw_base: &str, owner: &str, repo: &str) -> String {
    let prefix = format!("{}/{}/{}/raw/main", raw_base.trim_end_matches('/'), owner, repo);

    let html = HTML_LINK.replace_all(content, |caps: &Captures| {
        let path = &caps[2];
        if is_absolute(path) {
            caps[0].to_string()
        } else {
            format!(r#"{}="{}/{}""#, &caps[1], prefix, strip_dot_slash(path))
        }
    });

    MARKDOWN_LINK
        .replace_all(&html, |caps: &Captures| {
            let path = &caps[2];
            if is_absolute(path) {
                caps[0].to_string()
            } else {
                let title = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{}({}/{}{})", &caps[1], prefix, strip_dot_slash(path), title)
            }
        })
        .into_owned()
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('#') || SCHEME.is_match(path)
}

fn strip_dot_slash(path: &str) -> &str {
    path.trim_start_matches("./")
}
