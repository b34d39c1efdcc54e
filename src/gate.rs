//! Access gate: decides what happens to a request before it reaches the site.
//!
//! Every request is classified into one of three outcomes. The first
//! matching rule wins:
//!
//! ```text
//! 0. path under an exempt prefix (challenge page, assets) → Allow
//! 1. /articles/<id> and <id> bypasses verification        → Allow
//! 2. ?verified=true                                       → AllowWithCookie(cleaned url)
//! 3. verification cookie present                          → Allow
//! 4. otherwise                                            → RewriteTo(/verify?intended=<url>)
//! ```
//!
//! The challenge page sends the browser back to `intended` with
//! `verified=true` appended, which lands in rule 2: the tracking parameters
//! are stripped and the cookie is issued.
//!
//! [`AccessGate::decide`] is a pure function of the request and the supplied
//! clock reading. Replaying the same request gives the same decision.
//!
//! ## The Verification Cookie
//!
//! The cookie value is the RFC 3339 time it was issued. Whether a grant is
//! still good is up to a [`GrantPolicy`]; the stock [`PresenceOnly`] policy
//! accepts any non-empty value, parseable or not, for as long as the browser
//! keeps the session cookie.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use url::{Url, form_urlencoded};

use crate::config::{GateConfig, SiteConfig};
use crate::exceptions::ExceptionRegistry;

/// Origin used when a request carries no `Host` header.
const FALLBACK_ORIGIN: &str = "http://localhost";

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Malformed request URL '{input}': {source}")]
    MalformedUrl {
        input: String,
        source: url::ParseError,
    },
}

/// Time a verification grant was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IssuedAt(pub DateTime<Utc>);

impl IssuedAt {
    /// Parse a cookie value. Returns `None` for anything that isn't RFC 3339.
    pub fn parse(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| IssuedAt(dt.with_timezone(&Utc)))
    }
}

impl fmt::Display for IssuedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Decides whether a presented verification cookie still counts.
pub trait GrantPolicy: Send + Sync {
    /// `issued_at` is `None` when the cookie value isn't a timestamp.
    fn is_still_valid(&self, issued_at: Option<IssuedAt>, now: DateTime<Utc>) -> bool;
}

/// Any non-empty cookie counts, forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceOnly;

impl GrantPolicy for PresenceOnly {
    fn is_still_valid(&self, _issued_at: Option<IssuedAt>, _now: DateTime<Utc>) -> bool {
        true
    }
}

/// A freshly issued verification cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationGrant {
    pub issued_at: IssuedAt,
}

impl VerificationGrant {
    pub fn issue(now: DateTime<Utc>) -> Self {
        Self {
            issued_at: IssuedAt(now),
        }
    }

    /// `Set-Cookie` header value. No `Expires`/`Max-Age`: a session cookie.
    pub fn set_cookie_header(&self, cookie_name: &str) -> String {
        format!("{cookie_name}={}; Path=/; SameSite=Lax", self.issued_at)
    }
}

/// What the gate decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Pass through untouched.
    Allow,
    /// Serve `url` (tracking params removed) and set the verification cookie.
    AllowWithCookie { url: Url, grant: VerificationGrant },
    /// Serve the challenge page at this URL instead.
    RewriteTo(Url),
}

/// The parts of an HTTP request the gate looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    pub url: Url,
    pub cookies: BTreeMap<String, String>,
}

impl GateRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cookies: BTreeMap::new(),
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// Build from raw request parts: `Host` header, request target, and the
    /// `Cookie` header.
    pub fn parse(
        host: Option<&str>,
        path_and_query: &str,
        cookie_header: Option<&str>,
    ) -> Result<Self, GateError> {
        let input = match host {
            Some(host) => format!("http://{host}{path_and_query}"),
            None => format!("{FALLBACK_ORIGIN}{path_and_query}"),
        };
        if !path_and_query.starts_with('/') {
            return Err(GateError::MalformedUrl {
                input,
                source: url::ParseError::RelativeUrlWithoutBase,
            });
        }
        let url = Url::parse(&input).map_err(|source| GateError::MalformedUrl {
            input: input.clone(),
            source,
        })?;
        Ok(Self {
            url,
            cookies: cookie_header.map(parse_cookie_header).unwrap_or_default(),
        })
    }
}

/// Split a `Cookie` header into name/value pairs. The first occurrence of a
/// name wins, matching how browsers order more specific cookies first.
pub fn parse_cookie_header(header: &str) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"');
        cookies
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    cookies
}

/// Request-time access decisions for the preview server.
pub struct AccessGate {
    config: GateConfig,
    registry: ExceptionRegistry,
    policy: Box<dyn GrantPolicy>,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(config: GateConfig, registry: ExceptionRegistry) -> Self {
        Self::with_policy(config, registry, PresenceOnly)
    }

    pub fn with_policy(
        config: GateConfig,
        registry: ExceptionRegistry,
        policy: impl GrantPolicy + 'static,
    ) -> Self {
        Self {
            config,
            registry,
            policy: Box::new(policy),
        }
    }

    /// Gate settings and exceptions from a loaded site config.
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.gate.clone(),
            ExceptionRegistry::new(config.exceptions.clone()),
        )
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn decide(&self, request: &GateRequest, now: DateTime<Utc>) -> Decision {
        let url = &request.url;
        let path = url.path();

        if !self.config.enabled || self.is_exempt(path) {
            return Decision::Allow;
        }

        let article_id = self.article_id(path);
        if article_id.is_some_and(|id| self.registry.should_bypass_verification(id)) {
            return Decision::Allow;
        }

        if self.query_value(url, &self.config.verified_param).as_deref() == Some("true") {
            let intended_ok = self
                .query_value(url, &self.config.intended_param)
                .is_none_or(|intended| url.join(&intended).is_ok());
            if intended_ok {
                return Decision::AllowWithCookie {
                    url: self.strip_tracking_params(url),
                    grant: VerificationGrant::issue(now),
                };
            }
        } else if self.has_valid_grant(request, now) {
            return Decision::Allow;
        }

        Decision::RewriteTo(self.challenge_url(url, article_id))
    }

    fn is_exempt(&self, path: &str) -> bool {
        if path == self.config.challenge_path {
            return true;
        }
        self.config.exempt_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| prefix.ends_with('/') || rest.starts_with(['/', '.']))
        })
    }

    /// `<id>` when `path` is `{article_route}/<id>` or `{article_route}/<id>/`.
    pub fn article_id<'p>(&self, path: &'p str) -> Option<&'p str> {
        let rest = path
            .strip_prefix(self.config.article_route.as_str())?
            .strip_prefix('/')?;
        let id = rest.strip_suffix('/').unwrap_or(rest);
        (!id.is_empty() && !id.contains('/')).then_some(id)
    }

    fn has_valid_grant(&self, request: &GateRequest, now: DateTime<Utc>) -> bool {
        match request.cookies.get(&self.config.cookie_name) {
            Some(value) if !value.is_empty() => {
                self.policy.is_still_valid(IssuedAt::parse(value), now)
            }
            _ => false,
        }
    }

    fn query_value(&self, url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn is_tracking_param(&self, key: &str) -> bool {
        key == self.config.verified_param
            || key == self.config.intended_param
            || key == self.config.item_param
    }

    /// Remove the gate's own query parameters. Every other segment of the
    /// query is kept byte for byte, in order. An emptied query is dropped
    /// entirely.
    pub fn strip_tracking_params(&self, url: &Url) -> Url {
        let Some(query) = url.query() else {
            return url.clone();
        };
        let segments: Vec<&str> = query.split('&').collect();
        let kept: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|segment| !self.is_tracking_segment(segment))
            .collect();

        if kept.len() == segments.len() {
            return url.clone();
        }

        let mut cleaned = url.clone();
        if kept.iter().all(|segment| segment.is_empty()) {
            cleaned.set_query(None);
        } else {
            cleaned.set_query(Some(&kept.join("&")));
        }
        cleaned
    }

    /// Decode only the key of a raw `key=value` segment.
    fn is_tracking_segment(&self, segment: &str) -> bool {
        form_urlencoded::parse(segment.as_bytes())
            .next()
            .is_some_and(|(key, _)| self.is_tracking_param(&key))
    }

    /// Append the completion marker the challenge page adds.
    pub fn add_verified_marker(&self, url: &Url) -> Url {
        let mut marked = url.clone();
        marked
            .query_pairs_mut()
            .append_pair(&self.config.verified_param, "true");
        marked
    }

    /// `{origin}{challenge_path}?intended=<url>[&article=<id>]`.
    pub fn challenge_url(&self, request_url: &Url, article_id: Option<&str>) -> Url {
        let intended = self.strip_tracking_params(request_url);
        let mut challenge = request_url.clone();
        challenge.set_path(&self.config.challenge_path);
        challenge.set_fragment(None);
        challenge.set_query(None);
        {
            let mut query = challenge.query_pairs_mut();
            query.append_pair(&self.config.intended_param, intended.as_str());
            if let Some(id) = article_id {
                query.append_pair(&self.config.item_param, id);
            }
        }
        challenge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExceptionEntry;
    use chrono::TimeZone;

    const COOKIE: &str = "folio_verified";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn gate() -> AccessGate {
        let mut entries = BTreeMap::new();
        entries.insert(
            "open-letter.md".to_string(),
            ExceptionEntry {
                bypass_verification: true,
                allow_search_indexing: true,
                reason: None,
            },
        );
        entries.insert(
            "indexed-only.md".to_string(),
            ExceptionEntry {
                bypass_verification: false,
                allow_search_indexing: true,
                reason: None,
            },
        );
        AccessGate::new(GateConfig::default(), ExceptionRegistry::new(entries))
    }

    fn request(url: &str) -> GateRequest {
        GateRequest::new(Url::parse(url).unwrap())
    }

    fn rewrite_target(decision: Decision) -> Url {
        match decision {
            Decision::RewriteTo(url) => url,
            other => panic!("expected RewriteTo, got {other:?}"),
        }
    }

    #[test]
    fn bypass_article_allowed_without_cookie() {
        let gate = gate();
        for path in ["/articles/open-letter", "/articles/open-letter/"] {
            let decision = gate.decide(&request(&format!("http://site.test{path}")), now());
            assert_eq!(decision, Decision::Allow, "{path}");
        }
    }

    #[test]
    fn bypass_only_applies_under_article_route() {
        let gate = gate();
        let decision = gate.decide(&request("http://site.test/blogs/open-letter"), now());
        assert!(matches!(decision, Decision::RewriteTo(_)));
    }

    #[test]
    fn indexing_exception_does_not_bypass() {
        let gate = gate();
        let decision = gate.decide(&request("http://site.test/articles/indexed-only"), now());
        assert!(matches!(decision, Decision::RewriteTo(_)));
    }

    #[test]
    fn unverified_request_rewrites_to_challenge() {
        let gate = gate();
        let target = rewrite_target(gate.decide(&request("http://site.test/about?x=1"), now()));
        assert_eq!(target.path(), "/verify");
        let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![(
                "intended".to_string(),
                "http://site.test/about?x=1".to_string()
            )]
        );
    }

    #[test]
    fn challenge_carries_article_id() {
        let gate = gate();
        let target = rewrite_target(gate.decide(&request("http://site.test/articles/secret"), now()));
        let article = target
            .query_pairs()
            .find(|(k, _)| k == "article")
            .map(|(_, v)| v.into_owned());
        assert_eq!(article.as_deref(), Some("secret"));
    }

    #[test]
    fn verified_marker_sets_cookie_and_cleans_url() {
        let gate = gate();
        let decision = gate.decide(
            &request("http://site.test/articles/secret?verified=true&article=secret&ref=mail"),
            now(),
        );
        match decision {
            Decision::AllowWithCookie { url, grant } => {
                assert_eq!(url.as_str(), "http://site.test/articles/secret?ref=mail");
                assert_eq!(grant.issued_at, IssuedAt(now()));
            }
            other => panic!("expected AllowWithCookie, got {other:?}"),
        }
    }

    #[test]
    fn verified_marker_must_be_true() {
        let gate = gate();
        let decision = gate.decide(&request("http://site.test/about?verified=yes"), now());
        assert!(matches!(decision, Decision::RewriteTo(_)));
    }

    #[test]
    fn malformed_intended_falls_back_to_challenge() {
        let gate = gate();
        let decision = gate.decide(
            &request("http://site.test/about?verified=true&intended=http%3A%2F%2F%5Bbad"),
            now(),
        );
        let target = rewrite_target(decision);
        assert_eq!(target.path(), "/verify");
        // The broken intended value is not carried into the new challenge
        let intended = target
            .query_pairs()
            .find(|(k, _)| k == "intended")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(intended, "http://site.test/about");
    }

    #[test]
    fn cookie_present_allows() {
        let gate = gate();
        let req = request("http://site.test/articles/secret").with_cookie(COOKIE, "2026-10-01T08:00:00Z");
        assert_eq!(gate.decide(&req, now()), Decision::Allow);
    }

    #[test]
    fn any_non_empty_cookie_value_counts() {
        let gate = gate();
        for value in ["not a date", "Sat Oct 18 2026", "1"] {
            let req = request("http://site.test/").with_cookie(COOKIE, value);
            assert_eq!(gate.decide(&req, now()), Decision::Allow, "{value}");
        }
    }

    #[test]
    fn empty_cookie_value_does_not_count() {
        let gate = gate();
        let req = request("http://site.test/").with_cookie(COOKIE, "");
        assert!(matches!(gate.decide(&req, now()), Decision::RewriteTo(_)));
    }

    #[test]
    fn other_cookies_do_not_count() {
        let gate = gate();
        let req = request("http://site.test/").with_cookie("session", "abc");
        assert!(matches!(gate.decide(&req, now()), Decision::RewriteTo(_)));
    }

    #[test]
    fn policy_can_reject_grants() {
        struct Expired;
        impl GrantPolicy for Expired {
            fn is_still_valid(&self, _: Option<IssuedAt>, _: DateTime<Utc>) -> bool {
                false
            }
        }
        let gate = AccessGate::with_policy(GateConfig::default(), ExceptionRegistry::default(), Expired);
        let req = request("http://site.test/").with_cookie(COOKIE, "2026-10-01T08:00:00Z");
        assert!(matches!(gate.decide(&req, now()), Decision::RewriteTo(_)));
    }

    #[test]
    fn exempt_paths_pass() {
        let gate = gate();
        for path in ["/verify", "/verify.html", "/assets/site.png", "/favicon.ico", "/robots.txt"] {
            let decision = gate.decide(&request(&format!("http://site.test{path}")), now());
            assert_eq!(decision, Decision::Allow, "{path}");
        }
    }

    #[test]
    fn exempt_prefix_matches_whole_segments() {
        let gate = gate();
        let decision = gate.decide(&request("http://site.test/verifyx"), now());
        assert!(matches!(decision, Decision::RewriteTo(_)));
        let decision = gate.decide(&request("http://site.test/assetsy/x"), now());
        assert!(matches!(decision, Decision::RewriteTo(_)));
    }

    #[test]
    fn challenge_path_exempt_without_prefixes() {
        let config = GateConfig {
            exempt_prefixes: Vec::new(),
            ..GateConfig::default()
        };
        let gate = AccessGate::new(config, ExceptionRegistry::default());
        assert_eq!(gate.decide(&request("http://site.test/verify"), now()), Decision::Allow);
        assert!(matches!(
            gate.decide(&request("http://site.test/assets/a.png"), now()),
            Decision::RewriteTo(_)
        ));
    }

    #[test]
    fn disabled_gate_allows_everything() {
        let config = GateConfig {
            enabled: false,
            ..GateConfig::default()
        };
        let gate = AccessGate::new(config, ExceptionRegistry::default());
        assert_eq!(
            gate.decide(&request("http://site.test/articles/x"), now()),
            Decision::Allow
        );
    }

    #[test]
    fn decisions_are_idempotent() {
        let gate = gate();
        let requests = [
            request("http://site.test/"),
            request("http://site.test/articles/open-letter"),
            request("http://site.test/articles/x?verified=true&intended=%2Farticles%2Fx"),
            request("http://site.test/blogs/y").with_cookie(COOKIE, "2026-10-01T08:00:00Z"),
            request("http://site.test/verify?intended=http%3A%2F%2Fsite.test%2F"),
        ];
        for req in &requests {
            assert_eq!(gate.decide(req, now()), gate.decide(req, now()), "{}", req.url);
        }
    }

    #[test]
    fn strip_after_marker_round_trips() {
        let gate = gate();
        for raw in [
            "http://site.test/articles/x",
            "http://site.test/articles/x?ref=mail",
            "http://site.test/a?b=1&c=2",
            "https://site.test/deep/path/",
            "http://site.test/a?q=hello%20world",
            "http://site.test/a?flag",
            "http://site.test/a?flag&q=a+b&r=%2Fx",
        ] {
            let url = Url::parse(raw).unwrap();
            let restored = gate.strip_tracking_params(&gate.add_verified_marker(&url));
            assert_eq!(restored, url, "{raw}");
        }
    }

    #[test]
    fn strip_keeps_other_segments_verbatim() {
        let gate = gate();
        let url =
            Url::parse("http://site.test/a?q=hello%20world&verified=true&flag&article=x").unwrap();
        assert_eq!(
            gate.strip_tracking_params(&url).as_str(),
            "http://site.test/a?q=hello%20world&flag"
        );

        let encoded_key = Url::parse("http://site.test/a?verifie%64=true&b=1").unwrap();
        assert_eq!(gate.strip_tracking_params(&encoded_key).as_str(), "http://site.test/a?b=1");
    }

    #[test]
    fn strip_leaves_unrelated_urls_alone() {
        let gate = gate();
        let url = Url::parse("http://site.test/a?b=hello%20world").unwrap();
        assert_eq!(gate.strip_tracking_params(&url), url);
    }

    #[test]
    fn article_id_matching() {
        let gate = gate();
        assert_eq!(gate.article_id("/articles/foo"), Some("foo"));
        assert_eq!(gate.article_id("/articles/foo/"), Some("foo"));
        assert_eq!(gate.article_id("/articles/"), None);
        assert_eq!(gate.article_id("/articles"), None);
        assert_eq!(gate.article_id("/articles/foo/bar"), None);
        assert_eq!(gate.article_id("/articlesfoo"), None);
    }

    #[test]
    fn grant_cookie_header() {
        let grant = VerificationGrant::issue(now());
        assert_eq!(
            grant.set_cookie_header(COOKIE),
            "folio_verified=2026-10-18T09:30:00Z; Path=/; SameSite=Lax"
        );
        assert_eq!(IssuedAt::parse("2026-10-18T09:30:00Z"), Some(grant.issued_at));
        assert_eq!(IssuedAt::parse("yesterday"), None);
    }

    #[test]
    fn parse_request_parts() {
        let req = GateRequest::parse(
            Some("site.test:8080"),
            "/articles/x?verified=true",
            Some("a=1; folio_verified=2026-10-18T09:30:00Z; a=2"),
        )
        .unwrap();
        assert_eq!(req.url.as_str(), "http://site.test:8080/articles/x?verified=true");
        assert_eq!(req.cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(
            req.cookies.get(COOKIE).map(String::as_str),
            Some("2026-10-18T09:30:00Z")
        );
    }

    #[test]
    fn parse_request_without_host() {
        let req = GateRequest::parse(None, "/", None).unwrap();
        assert_eq!(req.url.as_str(), "http://localhost/");
        assert!(req.cookies.is_empty());
    }

    #[test]
    fn parse_malformed_request() {
        assert!(GateRequest::parse(Some("bad host"), "/", None).is_err());
        assert!(GateRequest::parse(Some("site.test"), "no-slash", None).is_err());
    }
}
