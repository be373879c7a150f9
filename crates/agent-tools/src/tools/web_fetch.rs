//! Page preview tool for links mentioned in a conversation.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Largest body read from a page.
const MAX_BODY_BYTES: usize = 500 * 1024;

/// Characters of page text handed to the agent.
const PREVIEW_CHARS: usize = 2000;

/// Wrap width for rendered HTML.
const RENDER_WIDTH: usize = 80;

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\'', '>'];

/// First http(s) URL in a message.
fn find_url(text: &str) -> Option<Url> {
    text.split_whitespace()
        .map(|word| word.trim_start_matches(&['(', '<', '"', '\''][..]))
        .map(|word| word.trim_end_matches(TRAILING_PUNCTUATION))
        .filter_map(|word| Url::parse(word).ok())
        .find(|url| matches!(url.scheme(), "http" | "https"))
}

/// Whether an address belongs to a loopback, private, link-local or
/// metadata network.
fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || (a == 100 && (b & 0xC0) == 64)
                || v4 == Ipv4Addr::new(169, 254, 169, 254)
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal(IpAddr::V4(v4)),
            None => {
                let first = v6.segments()[0];
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (first & 0xFE00) == 0xFC00
                    || (first & 0xFFC0) == 0xFE80
            }
        },
    }
}

/// Parse and vet a URL before any request is made.
fn parse_public_url(raw: &str) -> Result<Url, ToolError> {
    let invalid = |reason: String| ToolError::InvalidParameter {
        name: "url".to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(format!("not a URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(url)
}

/// Resolve the host and refuse internal addresses.
async fn ensure_public_host(url: &Url) -> Result<(), ToolError> {
    let target = url.clone();
    let addrs = tokio::task::spawn_blocking(move || target.socket_addrs(|| None))
        .await
        .map_err(|e| ToolError::ExecutionFailed(format!("address lookup task failed: {}", e)))?
        .map_err(|e| ToolError::ExecutionFailed(format!("cannot resolve host: {}", e)))?;

    match addrs.iter().map(|addr| addr.ip()).find(|ip| is_internal(*ip)) {
        Some(ip) => Err(ToolError::InvalidParameter {
            name: "url".to_string(),
            reason: format!("host resolves to internal address {}", ip),
        }),
        None => Ok(()),
    }
}

/// Contents of the `<title>` element, if any.
fn page_title(html: &str) -> Option<String> {
    let lowered = html.to_ascii_lowercase();
    let open = lowered.find("<title")?;
    let start = open + lowered[open..].find('>')? + 1;
    let end = start + lowered[start..].find("</title")?;
    let title = html[start..end].split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// At most `max` characters of `text`, with a marker when cut.
fn preview(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!(
            "{}...\n[{} of {} characters]",
            &text[..cut],
            max,
            text.chars().count()
        ),
        None => text.to_string(),
    }
}

/// A fetched page reduced to text.
#[derive(Debug, Clone, PartialEq)]
struct PagePreview {
    title: Option<String>,
    text: String,
}

/// Looks at a page the user linked to: its title and opening text.
///
/// Triggers on the first http(s) URL in a message. Hosts that resolve to
/// internal networks are refused, and bodies are capped at 500 KiB.
///
/// # Parameters
///
/// - `url` (required): page to preview.
pub struct WebFetch {
    client: reqwest::Client,
}

impl WebFetch {
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent("SwitchboardBot/1.0 (+page preview)")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    async fn load(&self, url: &Url) -> Result<PagePreview, ToolError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!("{} returned {}", url, status)));
        }
        if let Some(length) = response.content_length() {
            if length as usize > MAX_BODY_BYTES {
                return Err(ToolError::ExecutionFailed(format!(
                    "page is {} bytes, limit is {}",
                    length, MAX_BODY_BYTES
                )));
            }
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(true, |value| value.contains("html"));

        let bytes = response.bytes().await?;
        let body = &bytes[..bytes.len().min(MAX_BODY_BYTES)];

        if !is_html {
            return Ok(PagePreview {
                title: None,
                text: String::from_utf8_lossy(body).into_owned(),
            });
        }

        let title = page_title(&String::from_utf8_lossy(body));
        let text = html2text::from_read(body, RENDER_WIDTH)
            .map_err(|e| ToolError::ExecutionFailed(format!("cannot render page: {}", e)))?;
        Ok(PagePreview { title, text })
    }
}

#[async_trait]
impl Tool for WebFetch {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Previews a linked web page: title and opening text."
    }

    fn trigger(&self, text: &str) -> Option<ToolArgs> {
        find_url(text).map(|url| ToolArgs::single("url", url.as_str()))
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let url = parse_public_url(&args.get_string("url")?)?;
        ensure_public_host(&url).await?;

        debug!("Previewing {}", url);
        let page = self.load(&url).await.map_err(|e| {
            warn!("Preview of {} failed: {}", url, e);
            e
        })?;

        let heading = match &page.title {
            Some(title) => format!("{} ({})", title, url),
            None => url.to_string(),
        };
        Ok(ToolOutput::success(format!(
            "{}\n\n{}",
            heading,
            preview(&page.text, PREVIEW_CHARS)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_trigger_takes_first_web_link() {
        let fetch = WebFetch::new().unwrap();

        let args = fetch
            .trigger("Can you review (https://example.com/landing). Also http://other.test")
            .unwrap();
        assert_eq!(args.get_string("url").unwrap(), "https://example.com/landing");

        assert!(fetch.trigger("no links here").is_none());
        assert!(fetch.trigger("ftp://example.com/file").is_none());
    }

    #[tokio::test]
    async fn test_missing_url() {
        let fetch = WebFetch::new().unwrap();
        let result = fetch.execute(ToolArgs::default()).await;
        assert!(matches!(result, Err(ToolError::MissingParameter(_))));
    }

    #[tokio::test]
    async fn test_rejects_other_schemes() {
        let fetch = WebFetch::new().unwrap();
        let result = fetch.execute(ToolArgs::single("url", "ftp://example.com")).await;
        assert!(matches!(result, Err(ToolError::InvalidParameter { .. })));
    }

    #[test]
    fn test_internal_addresses() {
        let internal: [IpAddr; 7] = [
            Ipv4Addr::new(10, 0, 0, 1).into(),
            Ipv4Addr::new(192, 168, 1, 1).into(),
            Ipv4Addr::new(127, 0, 0, 1).into(),
            Ipv4Addr::new(169, 254, 169, 254).into(),
            Ipv4Addr::new(100, 64, 0, 1).into(),
            Ipv6Addr::LOCALHOST.into(),
            Ipv4Addr::new(10, 1, 2, 3).to_ipv6_mapped().into(),
        ];
        for ip in internal {
            assert!(is_internal(ip), "{} should be internal", ip);
        }

        assert!(!is_internal(Ipv4Addr::new(8, 8, 8, 8).into()));
        assert!(!is_internal(
            Ipv6Addr::new(0x2606, 0x2800, 0x220, 0x1, 0x248, 0x1893, 0x25c8, 0x1946).into()
        ));
    }

    #[tokio::test]
    async fn test_loopback_hosts_refused() {
        for raw in ["http://127.0.0.1/admin", "http://169.254.169.254/latest/meta-data/"] {
            let url = parse_public_url(raw).unwrap();
            assert!(ensure_public_host(&url).await.is_err(), "{}", raw);
        }
    }

    #[test]
    fn test_page_title() {
        let html = "<html><head><TITLE>\n  Acme  Widgets </TITLE></head><body>hi</body></html>";
        assert_eq!(page_title(html).as_deref(), Some("Acme Widgets"));
        assert_eq!(page_title("<title></title>"), None);
        assert_eq!(page_title("<p>no title</p>"), None);
    }

    #[test]
    fn test_preview_cuts_on_characters() {
        assert_eq!(preview("  short  ", 10), "short");

        let cut = preview("héllo wörld", 5);
        assert!(cut.starts_with("héllo..."));
        assert!(cut.ends_with("[5 of 11 characters]"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_preview_example_com() {
        let fetch = WebFetch::new().unwrap();
        let output = fetch
            .execute(ToolArgs::single("url", "https://example.com"))
            .await
            .unwrap();
        assert!(output.content.starts_with("Example Domain"));
    }
}
