//! Third-party relays used when a site refuses direct requests.
//!
//! Each relay is an independent [`Relay`] implementation: it knows how to
//! address the target through the relay and how to pull the page out of
//! the relay's response envelope. The pipeline treats every relay as
//! untrusted and validates what comes back.

use serde::Deserialize;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::fetch::HttpResponse;
use crate::{GleanerError, Result};

/// Accept header sent to markup relays.
pub const RELAY_ACCEPT: &str = "application/json, text/plain, text/html, */*";
/// User-Agent sent to markup relays.
pub const RELAY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
/// User-Agent sent to the text relay.
pub const TEXT_RELAY_USER_AGENT: &str = "Mozilla/5.0 (compatible; ContentExtractor/1.0)";

/// What a relay hands back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// The page's markup
    Markup,
    /// The page's rendered text
    Text,
}

/// A relay that fetches a page on the caller's behalf.
pub trait Relay: Send + Sync {
    /// Stable identifier used in logs and attempt records.
    fn id(&self) -> &'static str;

    /// The relay URL that fetches `target`.
    fn endpoint(&self, target: &Url) -> String;

    fn accept(&self) -> &'static str {
        RELAY_ACCEPT
    }

    fn user_agent(&self) -> &'static str {
        RELAY_USER_AGENT
    }

    /// Extract the page payload from a successful response.
    fn unwrap(&self, response: &HttpResponse) -> Result<String> {
        Ok(response.body.clone())
    }

    fn kind(&self) -> PayloadKind {
        PayloadKind::Markup
    }
}

fn encode(target: &Url) -> String {
    byte_serialize(target.as_str().as_bytes()).collect()
}

/// `api.allorigins.win`, which wraps the page in a JSON envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOrigins;

#[derive(Deserialize)]
struct AllOriginsEnvelope {
    contents: Option<String>,
}

impl Relay for AllOrigins {
    fn id(&self) -> &'static str {
        "allorigins"
    }

    fn endpoint(&self, target: &Url) -> String {
        format!("https://api.allorigins.win/get?url={}", encode(target))
    }

    fn unwrap(&self, response: &HttpResponse) -> Result<String> {
        let envelope: AllOriginsEnvelope = serde_json::from_str(&response.body).map_err(|e| {
            GleanerError::RelayPayload { relay: self.id().to_string(), reason: format!("invalid JSON: {e}") }
        })?;

        envelope.contents.ok_or_else(|| GleanerError::RelayPayload {
            relay: self.id().to_string(),
            reason: "missing contents field".to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorsProxy;

impl Relay for CorsProxy {
    fn id(&self) -> &'static str {
        "corsproxy"
    }

    fn endpoint(&self, target: &Url) -> String {
        format!("https://corsproxy.io/?{}", encode(target))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeTabs;

impl Relay for CodeTabs {
    fn id(&self) -> &'static str {
        "codetabs"
    }

    fn endpoint(&self, target: &Url) -> String {
        format!("https://api.codetabs.com/v1/proxy?quest={}", encode(target))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorsAnywhere;

impl Relay for CorsAnywhere {
    fn id(&self) -> &'static str {
        "cors-anywhere"
    }

    fn endpoint(&self, target: &Url) -> String {
        format!("https://cors-anywhere.herokuapp.com/{target}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThingProxy;

impl Relay for ThingProxy {
    fn id(&self) -> &'static str {
        "thingproxy"
    }

    fn endpoint(&self, target: &Url) -> String {
        format!("https://thingproxy.freeboard.io/fetch/{target}")
    }
}

/// `r.jina.ai`, which returns the rendered text of a page.
#[derive(Debug, Clone, Copy, Default)]
pub struct JinaReader;

impl Relay for JinaReader {
    fn id(&self) -> &'static str {
        "jina"
    }

    /// The relay always takes an `http://` prefix; the target's own scheme
    /// is dropped.
    fn endpoint(&self, target: &Url) -> String {
        let s = target.as_str();
        let without_scheme = s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")).unwrap_or(s);
        format!("https://r.jina.ai/http://{without_scheme}")
    }

    fn accept(&self) -> &'static str {
        "text/plain, */*"
    }

    fn user_agent(&self) -> &'static str {
        TEXT_RELAY_USER_AGENT
    }

    fn kind(&self) -> PayloadKind {
        PayloadKind::Text
    }
}

/// The markup relays, in the order they are tried.
pub fn default_relays() -> Vec<Box<dyn Relay>> {
    vec![Box::new(AllOrigins), Box::new(CorsProxy), Box::new(CodeTabs), Box::new(CorsAnywhere), Box::new(ThingProxy)]
}

/// The relay tried after every markup relay has failed.
pub fn default_text_relay() -> Box<dyn Relay> {
    Box::new(JinaReader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://example.com/a b?x=1&y=2").unwrap()
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse { status: 200, content_type: None, body: body.to_string() }
    }

    #[test]
    fn test_relay_order() {
        let ids: Vec<&str> = default_relays().iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["allorigins", "corsproxy", "codetabs", "cors-anywhere", "thingproxy"]);
        assert_eq!(default_text_relay().id(), "jina");
    }

    #[test]
    fn test_query_relays_encode_target() {
        let url = target();
        assert_eq!(
            AllOrigins.endpoint(&url),
            "https://api.allorigins.win/get?url=https%3A%2F%2Fexample.com%2Fa%2520b%3Fx%3D1%26y%3D2"
        );
        assert!(CorsProxy.endpoint(&url).starts_with("https://corsproxy.io/?https%3A%2F%2F"));
        assert!(CodeTabs.endpoint(&url).starts_with("https://api.codetabs.com/v1/proxy?quest=https%3A%2F%2F"));
    }

    #[test]
    fn test_path_relays_embed_target() {
        let url = Url::parse("https://example.com/page").unwrap();
        assert_eq!(CorsAnywhere.endpoint(&url), "https://cors-anywhere.herokuapp.com/https://example.com/page");
        assert_eq!(ThingProxy.endpoint(&url), "https://thingproxy.freeboard.io/fetch/https://example.com/page");
    }

    #[test]
    fn test_jina_endpoint_strips_scheme() {
        let https = Url::parse("https://example.com/page").unwrap();
        let http = Url::parse("http://example.com/page").unwrap();
        assert_eq!(JinaReader.endpoint(&https), "https://r.jina.ai/http://example.com/page");
        assert_eq!(JinaReader.endpoint(&http), "https://r.jina.ai/http://example.com/page");
        assert_eq!(JinaReader.kind(), PayloadKind::Text);
        assert_eq!(JinaReader.accept(), "text/plain, */*");
    }

    #[test]
    fn test_allorigins_unwraps_contents() {
        let payload = AllOrigins.unwrap(&ok(r#"{"contents":"<html>hi</html>","status":{"http_code":200}}"#));
        assert_eq!(payload.unwrap(), "<html>hi</html>");
    }

    #[test]
    fn test_allorigins_rejects_bad_envelopes() {
        assert!(matches!(AllOrigins.unwrap(&ok("not json")), Err(GleanerError::RelayPayload { .. })));
        assert!(matches!(AllOrigins.unwrap(&ok(r#"{"status":{}}"#)), Err(GleanerError::RelayPayload { .. })));
    }

    #[test]
    fn test_raw_relays_pass_body_through() {
        assert_eq!(CorsProxy.unwrap(&ok("<html></html>")).unwrap(), "<html></html>");
        assert_eq!(CorsProxy.kind(), PayloadKind::Markup);
        assert_eq!(CorsProxy.accept(), RELAY_ACCEPT);
    }
}
