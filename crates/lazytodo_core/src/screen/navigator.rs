//! Stack navigator between the task list and the login form.
//!
//! # Invariants
//! - The stack is never empty; `Home` is the root.
//! - A route appears at most once in the stack.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
}

impl Route {
    pub fn name(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Login => "Login",
        }
    }

    /// Inverse of `name`; matching ignores case and surrounding spaces.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Self::Home),
            "login" => Some(Self::Login),
            _ => None,
        }
    }
}

/// Header button that navigates elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderAction {
    pub label: &'static str,
    pub target: Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOptions {
    pub title: &'static str,
    pub right_action: Option<HeaderAction>,
}

/// Header configuration for `route`.
pub fn header_for(route: Route) -> HeaderOptions {
    match route {
        Route::Home => HeaderOptions {
            title: "To-Do List",
            right_action: Some(HeaderAction {
                label: "Logout",
                target: Route::Login,
            }),
        },
        Route::Login => HeaderOptions {
            title: "Login",
            right_action: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }

    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Home)
    }

    pub fn stack(&self) -> &[Route] {
        &self.stack
    }

    pub fn header(&self) -> HeaderOptions {
        header_for(self.current())
    }

    /// Pops back to `route` when already stacked, otherwise pushes it.
    pub fn navigate(&mut self, route: Route) {
        match self.stack.iter().position(|stacked| *stacked == route) {
            Some(index) => self.stack.truncate(index + 1),
            None => self.stack.push(route),
        }
        debug!(
            "event=navigate module=screen status=ok route={} depth={}",
            route.name(),
            self.stack.len()
        );
    }

    /// Pops the top route; the root is never popped.
    pub fn go_back(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        true
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
