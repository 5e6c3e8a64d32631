//! Static route table.
//!
//! Routes are fixed metadata consulted by the guard pipeline and never
//! mutated at runtime. Any path that matches no route resolves to the
//! catch-all `not-found` route.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteName {
    Root,
    Home,
    Public,
    Login,
    Signup,
    Logout,
    About,
    NotFound,
}

impl RouteName {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Home => "home",
            Self::Public => "public",
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Logout => "logout",
            Self::About => "about",
            Self::NotFound => "not-found",
        }
    }
}

impl std::fmt::Display for RouteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route-specific guard attached to a single route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeEnter {
    /// Send already-authenticated users to `home`.
    RedirectIfLoggedIn,
    /// End the session, then go to `public`.
    EndSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: RouteName,
    pub path: &'static str,
    pub requires_auth: bool,
    /// Static redirect applied before any guard runs.
    pub redirect: Option<&'static str>,
    pub before_enter: Option<BeforeEnter>,
}

impl RouteDescriptor {
    fn page(name: RouteName, path: &'static str) -> Self {
        Self { name, path, requires_auth: false, redirect: None, before_enter: None }
    }

    fn guarded(mut self, guard: BeforeEnter) -> Self {
        self.before_enter = Some(guard);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    not_found: RouteDescriptor,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    /// The application's route table.
    #[must_use]
    pub fn standard() -> Self {
        let mut root = RouteDescriptor::page(RouteName::Root, "/");
        root.redirect = Some("/public");
        let mut home = RouteDescriptor::page(RouteName::Home, "/home");
        home.requires_auth = true;

        Self {
            routes: vec![
                root,
                home,
                RouteDescriptor::page(RouteName::Public, "/public").guarded(BeforeEnter::RedirectIfLoggedIn),
                RouteDescriptor::page(RouteName::Login, "/login").guarded(BeforeEnter::RedirectIfLoggedIn),
                RouteDescriptor::page(RouteName::Logout, "/logout").guarded(BeforeEnter::EndSession),
                RouteDescriptor::page(RouteName::Signup, "/signup").guarded(BeforeEnter::RedirectIfLoggedIn),
                RouteDescriptor::page(RouteName::About, "/about"),
            ],
            not_found: RouteDescriptor::page(RouteName::NotFound, "/:notFoundPathMatch(.*)"),
        }
    }

    #[must_use]
    pub fn by_name(&self, name: RouteName) -> &RouteDescriptor {
        self.routes
            .iter()
            .find(|r| r.name == name)
            .unwrap_or(&self.not_found)
    }

    /// Match a full path (query and fragment ignored) against the table.
    #[must_use]
    pub fn resolve(&self, full_path: &str) -> &RouteDescriptor {
        let path = path_only(full_path);
        self.routes
            .iter()
            .find(|r| r.path == path)
            .unwrap_or(&self.not_found)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().chain(std::iter::once(&self.not_found))
    }
}

/// Ensure a leading `/` so relative input still resolves.
#[must_use]
pub fn normalize_full_path(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") }
}

/// The path component of a full path, without query, fragment, or trailing `/`.
fn path_only(full_path: &str) -> &str {
    let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
    let path = &full_path[..end];
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
