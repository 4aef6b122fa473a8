//! Route guard for the role-scoped page tree.
//!
//! Maps a path to the page it renders and decides whether the current
//! session may see it. Protected pages require an active session whose role
//! owns the page; anything else is sent to the login entry point.

use radapos_core::Role;

use crate::session::Identity;

/// Login entry point.
pub const LOGIN_PATH: &str = "/login";

/// Every page in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    // Public
    Landing,
    Login,
    Register,
    ForgotPassword,
    ResetPassword,

    // Admin
    AdminDashboard,
    AdminEvents,
    AdminUsers,
    AdminVendors,
    AdminReports,
    AdminWallet,
    AdminSettings,

    // Vendor
    VendorDashboard,
    VendorInventory,
    VendorStaff,
    VendorSales,
    VendorWallet,
    VendorSettings,

    // Cashier
    PosTerminal,
    PosHistory,
    PosDashboard,
    PosSettings,
}

impl Page {
    /// Role that owns this page, or `None` for public pages.
    #[must_use]
    pub const fn required_role(self) -> Option<Role> {
        match self {
            Self::Landing | Self::Login | Self::Register | Self::ForgotPassword | Self::ResetPassword => None,
            Self::AdminDashboard
            | Self::AdminEvents
            | Self::AdminUsers
            | Self::AdminVendors
            | Self::AdminReports
            | Self::AdminWallet
            | Self::AdminSettings => Some(Role::Admin),
            Self::VendorDashboard
            | Self::VendorInventory
            | Self::VendorStaff
            | Self::VendorSales
            | Self::VendorWallet
            | Self::VendorSettings => Some(Role::Vendor),
            Self::PosTerminal | Self::PosHistory | Self::PosDashboard | Self::PosSettings => {
                Some(Role::Cashier)
            }
        }
    }
}

/// Outcome of guarding a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the page.
    Render(Page),
    /// Navigate elsewhere instead.
    Redirect(String),
    /// No page at this path.
    NotFound,
}

/// Landing page path for a role.
#[must_use]
pub const fn landing_path(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Vendor => "/vendor/dashboard",
        Role::Cashier => "/pos/terminal",
    }
}

enum Resolved {
    Page(Page),
    Index(&'static str),
}

fn resolve(path: &str) -> Option<Resolved> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };

    let resolved = match path {
        "/" => Resolved::Page(Page::Landing),
        "/login" => Resolved::Page(Page::Login),
        "/register" => Resolved::Page(Page::Register),
        "/forgot-password" => Resolved::Page(Page::ForgotPassword),
        "/reset-password" => Resolved::Page(Page::ResetPassword),

        "/admin" => Resolved::Index("/admin/dashboard"),
        "/admin/dashboard" => Resolved::Page(Page::AdminDashboard),
        "/admin/events" => Resolved::Page(Page::AdminEvents),
        "/admin/users" => Resolved::Page(Page::AdminUsers),
        "/admin/vendors" => Resolved::Page(Page::AdminVendors),
        "/admin/reports" => Resolved::Page(Page::AdminReports),
        "/admin/wallet" => Resolved::Page(Page::AdminWallet),
        "/admin/settings" => Resolved::Page(Page::AdminSettings),

        "/vendor" => Resolved::Index("/vendor/dashboard"),
        "/vendor/dashboard" => Resolved::Page(Page::VendorDashboard),
        "/vendor/inventory" => Resolved::Page(Page::VendorInventory),
        "/vendor/staff" => Resolved::Page(Page::VendorStaff),
        "/vendor/sales" => Resolved::Page(Page::VendorSales),
        "/vendor/wallet" => Resolved::Page(Page::VendorWallet),
        "/vendor/settings" => Resolved::Page(Page::VendorSettings),

        "/pos" => Resolved::Index("/pos/terminal"),
        "/pos/terminal" => Resolved::Page(Page::PosTerminal),
        "/pos/history" => Resolved::Page(Page::PosHistory),
        "/pos/dashboard" => Resolved::Page(Page::PosDashboard),
        "/pos/settings" => Resolved::Page(Page::PosSettings),

        _ => return None,
    };
    Some(resolved)
}

/// Decide what to do with a navigation to `path`.
///
/// Pass the active identity, or `None` when logged out.
#[must_use]
pub fn guard(path: &str, identity: Option<&Identity>) -> RouteDecision {
    let page = match resolve(path) {
        None => return RouteDecision::NotFound,
        Some(Resolved::Index(target)) => return RouteDecision::Redirect(target.to_owned()),
        Some(Resolved::Page(page)) => page,
    };

    let Some(required) = page.required_role() else {
        return RouteDecision::Render(page);
    };

    match identity {
        Some(identity) if identity.role == required => RouteDecision::Render(page),
        _ => RouteDecision::Redirect(LOGIN_PATH.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::identity;

    #[test]
    fn test_public_pages_render_without_session() {
        assert_eq!(guard("/login", None), RouteDecision::Render(Page::Login));
        assert_eq!(guard("/", None), RouteDecision::Render(Page::Landing));
    }

    #[test]
    fn test_protected_page_without_session_redirects_to_login() {
        assert_eq!(
            guard("/vendor/wallet", None),
            RouteDecision::Redirect(LOGIN_PATH.to_owned())
        );
    }

    #[test]
    fn test_wrong_role_redirects_to_login() {
        let cashier = identity(Role::Cashier);
        assert_eq!(
            guard("/admin/events", Some(&cashier)),
            RouteDecision::Redirect(LOGIN_PATH.to_owned())
        );
    }

    #[test]
    fn test_matching_role_renders() {
        let admin = identity(Role::Admin);
        assert_eq!(
            guard("/admin/vendors/?tab=pending", Some(&admin)),
            RouteDecision::Render(Page::AdminVendors)
        );
    }

    #[test]
    fn test_index_paths_redirect_to_default_child() {
        assert_eq!(
            guard("/admin", None),
            RouteDecision::Redirect("/admin/dashboard".to_owned())
        );
        assert_eq!(
            guard("/pos/", None),
            RouteDecision::Redirect("/pos/terminal".to_owned())
        );
    }

    #[test]
    fn test_unknown_path() {
        assert_eq!(guard("/nowhere", None), RouteDecision::NotFound);
    }

    #[test]
    fn test_landing_paths_resolve_for_their_role() {
        for role in [Role::Admin, Role::Vendor, Role::Cashier] {
            let who = identity(role);
            assert!(matches!(
                guard(landing_path(role), Some(&who)),
                RouteDecision::Render(_)
            ));
        }
    }
}
