use std::fmt;

use serde::Serialize;

/// Policy tier a request path falls under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// No session needed, never touches the authority
    Public,
    /// Needs a session
    Protected,
    /// Needs a session holding admin or super-admin
    Privileged,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteClass::Public => "public",
            RouteClass::Protected => "protected",
            RouteClass::Privileged => "privileged",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches one path exactly
    Exact(String),
    /// Matches a path and everything below it, on segment boundaries
    Prefix(String),
}

impl RoutePattern {
    pub fn exact(path: impl Into<String>) -> Self {
        RoutePattern::Exact(path.into())
    }

    pub fn prefix(path: impl Into<String>) -> Self {
        RoutePattern::Prefix(path.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            RoutePattern::Exact(exact) => path == exact,
            RoutePattern::Prefix(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
                None => false,
            },
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Exact(exact) => f.write_str(exact),
            RoutePattern::Prefix(prefix) => write!(f, "{}/**", prefix.trim_end_matches('/')),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: RoutePattern,
    pub class: RouteClass,
}

impl RouteRule {
    pub fn new(pattern: RoutePattern, class: RouteClass) -> Self {
        Self { pattern, class }
    }
}

/// Ordered rule table; the first matching rule wins, otherwise the fallback applies
#[derive(Clone, Debug)]
pub struct RoutePolicy {
    rules: Vec<RouteRule>,
    fallback: RouteClass,
}

impl RoutePolicy {
    pub fn new(rules: Vec<RouteRule>, fallback: RouteClass) -> Self {
        Self { rules, fallback }
    }

    /// The Persuasion Academy table. Public carve-outs come before the admin
    /// prefix; everything unlisted needs a session.
    pub fn academy() -> Self {
        use RouteClass::*;

        Self::new(
            vec![
                RouteRule::new(RoutePattern::prefix("/api/webhooks"), Public),
                RouteRule::new(RoutePattern::exact("/api/support/callback"), Public),
                RouteRule::new(RoutePattern::prefix("/_next/static"), Public),
                RouteRule::new(RoutePattern::prefix("/_next/image"), Public),
                RouteRule::new(RoutePattern::exact("/favicon.ico"), Public),
                RouteRule::new(RoutePattern::prefix("/public"), Public),
                // Sign-in, callback and auth-error pages are redirect targets
                RouteRule::new(RoutePattern::prefix("/auth"), Public),
                RouteRule::new(RoutePattern::prefix("/admin"), Privileged),
            ],
            Protected,
        )
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn fallback(&self) -> RouteClass {
        self.fallback
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        let path = path.split(|c| c == '?' || c == '#').next().unwrap_or_default();
        let path = if path.is_empty() { "/" } else { path };

        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.class)
            .unwrap_or(self.fallback)
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::academy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_allow_list() {
        let policy = RoutePolicy::academy();
        for path in [
            "/api/webhooks/stripe",
            "/api/webhooks",
            "/api/support/callback",
            "/_next/static/chunks/main.js",
            "/_next/image",
            "/favicon.ico",
            "/public/logo.svg",
            "/auth/signin",
            "/auth/callback",
            "/auth/auth-code-error",
        ] {
            assert_eq!(policy.classify(path), RouteClass::Public, "{}", path);
        }
    }

    #[test]
    fn test_admin_prefix_is_privileged() {
        let policy = RoutePolicy::academy();
        assert_eq!(policy.classify("/admin"), RouteClass::Privileged);
        assert_eq!(policy.classify("/admin/"), RouteClass::Privileged);
        assert_eq!(policy.classify("/admin/reports"), RouteClass::Privileged);
        assert_eq!(policy.classify("/admin/users/42/credits"), RouteClass::Privileged);
    }

    #[test]
    fn test_everything_else_is_protected() {
        let policy = RoutePolicy::academy();
        for path in ["/", "/profile", "/tools/run", "/api/credits", "/api/support/callback/extra"] {
            assert_eq!(policy.classify(path), RouteClass::Protected, "{}", path);
        }
    }

    #[test]
    fn test_prefixes_respect_segment_boundaries() {
        let policy = RoutePolicy::academy();
        assert_eq!(policy.classify("/administrator"), RouteClass::Protected);
        assert_eq!(policy.classify("/publicity"), RouteClass::Protected);
        assert_eq!(policy.classify("/authors"), RouteClass::Protected);
        assert_eq!(policy.classify("/favicon.ico.bak"), RouteClass::Protected);
    }

    #[test]
    fn test_query_string_is_ignored() {
        let policy = RoutePolicy::academy();
        assert_eq!(policy.classify("/admin/reports?tab=credits"), RouteClass::Privileged);
        assert_eq!(policy.classify("/api/webhooks/stripe?x=1"), RouteClass::Public);
        assert_eq!(policy.classify(""), RouteClass::Protected);
    }

    #[test]
    fn test_first_match_wins() {
        let policy = RoutePolicy::new(
            vec![
                RouteRule::new(RoutePattern::exact("/admin/status"), RouteClass::Public),
                RouteRule::new(RoutePattern::prefix("/admin"), RouteClass::Privileged),
            ],
            RouteClass::Protected,
        );
        assert_eq!(policy.classify("/admin/status"), RouteClass::Public);
        assert_eq!(policy.classify("/admin/status/deep"), RouteClass::Privileged);
    }

    #[test]
    fn test_pattern_display() {
        assert_eq!(RoutePattern::prefix("/admin").to_string(), "/admin/**");
        assert_eq!(RoutePattern::exact("/favicon.ico").to_string(), "/favicon.ico");
    }
}
