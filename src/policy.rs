use crate::models::Role;

/// RouteClass
///
/// The access category a request path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a session.
    Public,
    /// Staff area, `/admin...`.
    AdminOnly,
    /// Client portal, `/home...`.
    ClientOnly,
    /// Legacy unified dashboard; always sent to the caller's role home.
    NeedsRedirect,
    /// Any signed-in role.
    Authenticated,
}

/// PrefixRule
///
/// One row of the ordered role-prefix table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
    pub prefix: String,
    pub class: RouteClass,
}

impl PrefixRule {
    pub fn new(prefix: &str, class: RouteClass) -> Self {
        Self {
            prefix: prefix.to_string(),
            class,
        }
    }
}

/// AccessPolicy
///
/// Route classification table. Built once at start-up (see `AppConfig::load`)
/// and only ever read afterwards.
///
/// Evaluation order:
/// 1. public exact paths and public prefixes,
/// 2. the role-prefix rules, first match wins,
/// 3. the legacy dashboard paths,
/// 4. everything else is `Authenticated`.
///
/// Prefixes are matched as raw string prefixes, so `/adminx` is admin-only.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_paths: Vec<String>,
    public_prefixes: Vec<String>,
    rules: Vec<PrefixRule>,
    legacy_paths: Vec<String>,
    sign_in_path: String,
    admin_home: String,
    client_home: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            public_paths: strings(&[
                "/",
                "/auth/signin",
                "/auth/signout",
                "/auth/error",
                "/onboarding",
                "/favicon.ico",
                "/sitemap.xml",
                "/health",
            ]),
            public_prefixes: strings(&[
                // Framework assets and the identity provider callbacks.
                "/_next",
                "/api/auth",
                "/images",
                // Marketing pages.
                "/pricing",
                "/portfolio",
                "/contact",
                // API documentation.
                "/swagger-ui",
                "/api-docs",
            ]),
            rules: vec![
                PrefixRule::new("/admin", RouteClass::AdminOnly),
                PrefixRule::new("/home", RouteClass::ClientOnly),
            ],
            legacy_paths: strings(&["/dashboard"]),
            sign_in_path: "/auth/signin".to_string(),
            admin_home: "/admin".to_string(),
            client_home: "/home".to_string(),
        }
    }
}

impl AccessPolicy {
    /// Adds public prefixes on top of the built-in allow-list.
    pub fn with_public_prefixes<I>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.public_prefixes.extend(prefixes);
        self
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.is_public(path) {
            return RouteClass::Public;
        }

        if let Some(rule) = self.rules.iter().find(|rule| path.starts_with(&rule.prefix)) {
            return rule.class;
        }

        // TODO: confirm with the frontend whether anything still links to /dashboard and drop it if not.
        if self.legacy_paths.iter().any(|legacy| legacy == path) {
            return RouteClass::NeedsRedirect;
        }

        RouteClass::Authenticated
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
            || self.public_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// The landing page for a role.
    pub fn home_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin_home,
            Role::Client => &self.client_home,
        }
    }

    /// Sign-in location carrying the original path as a percent-encoded `callbackUrl`.
    pub fn sign_in_location(&self, original_path: &str) -> String {
        format!(
            "{}?callbackUrl={}",
            self.sign_in_path,
            urlencoding::encode(original_path)
        )
    }
}
