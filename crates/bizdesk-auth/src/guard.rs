//! Route guard: decides whether a view may render for the current session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the guard needs to know about a session.
pub trait SessionView {
    /// True while persisted state is still being read.
    fn is_loading(&self) -> bool;
    /// True when an identity and credential are held.
    fn is_authenticated(&self) -> bool;
}

/// The application's views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Clients,
    Tasks,
    Finance,
    Advice,
    Profile,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Dashboard,
        Route::Clients,
        Route::Tasks,
        Route::Finance,
        Route::Advice,
        Route::Profile,
    ];

    /// Every view except the login view requires a session.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Dashboard => "dashboard",
            Route::Clients => "clients",
            Route::Tasks => "tasks",
            Route::Finance => "finance",
            Route::Advice => "advice",
            Route::Profile => "profile",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "route", rename_all = "snake_case")]
pub enum Navigation {
    /// Show the requested view.
    Render(Route),
    /// Go to `to` instead, remembering where the user was headed.
    Redirect { to: Route, from: Route },
    /// Session is still loading; show nothing yet.
    Pending,
}

impl Navigation {
    pub fn is_render(&self) -> bool {
        matches!(self, Navigation::Render(_))
    }
}

/// Stateless guard over any [`SessionView`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    /// Decide what to show for `route`.
    pub fn resolve<S: SessionView + ?Sized>(route: Route, session: &S) -> Navigation {
        if session.is_loading() {
            return Navigation::Pending;
        }

        let authenticated = session.is_authenticated();
        if route.requires_session() && !authenticated {
            tracing::debug!(route = %route, "Guarded route without session, redirecting to login");
            return Navigation::Redirect {
                to: Route::Login,
                from: route,
            };
        }

        if route == Route::Login && authenticated {
            return Navigation::Redirect {
                to: Route::Dashboard,
                from: Route::Login,
            };
        }

        Navigation::Render(route)
    }

    /// A view saw its API call rejected as unauthorized.
    pub fn on_rejected(route: Route) -> Navigation {
        tracing::debug!(route = %route, "Request rejected, redirecting to login");
        Navigation::Redirect {
            to: Route::Login,
            from: route,
        }
    }
}
