//! Page routes and the admin guard.

pub mod guard;

pub use guard::{check, require_auth, Navigation, SESSION_COOKIE};

/// Navigable pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Admin,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Home, Route::Login, Route::Admin];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Admin => "/admin",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Admin)
    }

    /// Page a request path belongs to. Everything under `/admin` is the
    /// admin page.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim_end_matches('/');
        if path == "/admin" || path.starts_with("/admin/") {
            return Some(Route::Admin);
        }
        match path {
            "" => Some(Route::Home),
            "/login" => Some(Route::Login),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Some(Route::Home));
        assert_eq!(Route::from_path("/login"), Some(Route::Login));
        assert_eq!(Route::from_path("/admin"), Some(Route::Admin));
        assert_eq!(Route::from_path("/admin/items/empanadas/0"), Some(Route::Admin));
        assert_eq!(Route::from_path("/administrador"), None);
    }

    #[test]
    fn test_only_admin_requires_auth() {
        for route in Route::ALL {
            assert_eq!(route.requires_auth(), route == Route::Admin);
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}
