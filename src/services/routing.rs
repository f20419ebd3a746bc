//! Role-gated page routing
//!
//! Every page declares who may see it. The gate only ever looks at the
//! identity held by the [`SessionManager`], never at the raw token, and never
//! fails: a caller who may not see a page is redirected.
//!
//! - No identity: redirect to `/login`
//! - Wrong role: redirect to the caller's own dashboard
//! - Unknown path: redirect to `/`

use std::fmt;
use std::sync::Arc;

use crate::models::{Identity, UserRole};
use crate::services::session::SessionManager;

/// Path of the login page
pub const LOGIN_PATH: &str = "/login";
/// Path of the landing page
pub const HOME_PATH: &str = "/";

/// Pages of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Login,
    Register,
    DriverDashboard,
    CreateRide,
    PassengerDashboard,
    SearchRides,
    MyBookings,
    Notifications,
}

impl Page {
    /// Every page, in menu order
    pub const ALL: [Page; 9] = [
        Page::Home,
        Page::Login,
        Page::Register,
        Page::DriverDashboard,
        Page::CreateRide,
        Page::PassengerDashboard,
        Page::SearchRides,
        Page::MyBookings,
        Page::Notifications,
    ];

    /// Canonical path
    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => HOME_PATH,
            Page::Login => LOGIN_PATH,
            Page::Register => "/register",
            Page::DriverDashboard => "/driver-dashboard",
            Page::CreateRide => "/create-ride",
            Page::PassengerDashboard => "/passenger-dashboard",
            Page::SearchRides => "/search-rides",
            Page::MyBookings => "/my-bookings",
            Page::Notifications => "/notifications",
        }
    }

    /// Alternative paths that reach the same page
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Page::CreateRide => &["/publish-ride"],
            _ => &[],
        }
    }

    /// Who may view the page
    pub fn access(&self) -> Access {
        match self {
            Page::Home | Page::Login | Page::Register => Access::Public,
            Page::DriverDashboard | Page::CreateRide => Access::Roles(&[UserRole::Driver]),
            Page::PassengerDashboard | Page::SearchRides | Page::MyBookings => {
                Access::Roles(&[UserRole::Passenger])
            }
            Page::Notifications => Access::Authenticated,
        }
    }

    /// Dashboard for a role
    pub fn home_for(role: UserRole) -> Page {
        match role {
            UserRole::Driver => Page::DriverDashboard,
            UserRole::Passenger => Page::PassengerDashboard,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Access requirement of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone
    Public,
    /// Any logged-in user
    Authenticated,
    /// Logged-in users with one of these roles
    Roles(&'static [UserRole]),
}

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show the requested page
    Admit,
    /// Go to this path instead
    Redirect(&'static str),
}

impl GateDecision {
    /// Check if the page was admitted
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admit)
    }
}

/// Decide whether `identity` may see a page with the given access.
pub fn gate(access: Access, identity: Option<&Identity>) -> GateDecision {
    match (access, identity) {
        (Access::Public, _) => GateDecision::Admit,
        (_, None) => GateDecision::Redirect(LOGIN_PATH),
        (Access::Authenticated, Some(_)) => GateDecision::Admit,
        (Access::Roles(roles), Some(identity)) => {
            if roles.contains(&identity.role) {
                GateDecision::Admit
            } else {
                GateDecision::Redirect(identity.role.home_path())
            }
        }
    }
}

/// Path-to-page lookup
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(&'static str, Page)>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let routes = Page::ALL
            .iter()
            .flat_map(|page| {
                std::iter::once((page.path(), *page))
                    .chain(page.aliases().iter().map(move |alias| (*alias, *page)))
            })
            .collect();
        Self { routes }
    }
}

impl RouteTable {
    /// Find the page for a path.
    ///
    /// Query strings, fragments and a trailing slash are ignored; matching
    /// is case-sensitive like the browser router.
    pub fn resolve(&self, path: &str) -> Option<Page> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|(route, _)| *route == path)
            .map(|(_, page)| *page)
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default().trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH
    } else {
        trimmed
    }
}

/// Result of a navigation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Path the caller asked for
    pub requested: String,
    /// Page the path resolved to, if any
    pub page: Option<Page>,
    /// Gate outcome
    pub decision: GateDecision,
}

impl Navigation {
    /// Where the caller ends up
    pub fn destination(&self) -> &str {
        match self.decision {
            GateDecision::Admit => self.page.map(|p| p.path()).unwrap_or(HOME_PATH),
            GateDecision::Redirect(path) => path,
        }
    }
}

/// Gatekeeper in front of every page
pub struct Navigator {
    session: Arc<SessionManager>,
    routes: RouteTable,
}

impl Navigator {
    /// Create a navigator over the shared session
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            routes: RouteTable::default(),
        }
    }

    /// Decide where a request for `path` ends up
    pub async fn navigate(&self, path: &str) -> Navigation {
        let identity = self.session.current_identity().await;
        let page = self.routes.resolve(path);

        let decision = match page {
            None => GateDecision::Redirect(HOME_PATH),
            Some(Page::Login) => match &identity {
                Some(identity) => GateDecision::Redirect(identity.role.home_path()),
                None => GateDecision::Admit,
            },
            Some(page) => gate(page.access(), identity.as_ref()),
        };

        if let GateDecision::Redirect(target) = decision {
            tracing::debug!("Redirecting {} to {}", path, target);
        }

        Navigation {
            requested: path.to_string(),
            page,
            decision,
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn role() -> impl Strategy<Value = UserRole> {
        prop_oneof![Just(UserRole::Driver), Just(UserRole::Passenger)]
    }

    fn page() -> impl Strategy<Value = Page> {
        proptest::sample::select(Page::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A single-role page admits exactly that role and sends others home.
        #[test]
        fn single_role_gate(required in role(), actual in role(), casing in 0usize..3) {
            let raw = match casing {
                0 => actual.to_string(),
                1 => actual.to_string().to_uppercase(),
                _ => actual.to_string().to_lowercase(),
            };
            let identity = Identity::new(1, "x@y.com", raw.parse().unwrap());
            let roles: &'static [UserRole] = match required {
                UserRole::Driver => &[UserRole::Driver],
                UserRole::Passenger => &[UserRole::Passenger],
            };

            let decision = gate(Access::Roles(roles), Some(&identity));

            if required == actual {
                prop_assert_eq!(decision, GateDecision::Admit);
            } else {
                prop_assert_eq!(decision, GateDecision::Redirect(actual.home_path()));
            }
        }

        /// Without an identity, only public pages are admitted.
        #[test]
        fn anonymous_only_sees_public_pages(page in page()) {
            let decision = gate(page.access(), None);
            if page.access() == Access::Public {
                prop_assert_eq!(decision, GateDecision::Admit);
            } else {
                prop_assert_eq!(decision, GateDecision::Redirect(LOGIN_PATH));
            }
        }

        /// Redirects for authenticated users always land on an admitted page.
        #[test]
        fn redirect_target_is_admitted(page in page(), actual in role()) {
            let identity = Identity::new(1, "x@y.com", actual);
            if let GateDecision::Redirect(target) = gate(page.access(), Some(&identity)) {
                let landing = RouteTable::default().resolve(target).unwrap();
                prop_assert!(gate(landing.access(), Some(&identity)).is_admitted());
            }
        }
    }
}
