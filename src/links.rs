use crate::query::{QueryPairs, QueryState};

pub const PASSWORD_PARAM: &str = "password";

/// A same-origin anchor whose query follows the page's query state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub id: &'static str,
    pub label: &'static str,
    pub path: String,
    pub query: QueryPairs,
}

impl NavLink {
    pub fn new(id: &'static str, label: &'static str, href: &str) -> Self {
        let (path, query) = match href.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (href, None),
        };
        Self {
            id,
            label,
            path: path.to_string(),
            query: QueryPairs::parse(query),
        }
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.encode())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Copy every parameter of the current page onto the link.
    FullQuery,
    /// Only re-attach the username.
    UsernameOnly,
}

/// Brings every link in line with the current page. Parameters a link
/// already carries are overwritten, never removed. The password never
/// travels, and the resolved username wins over whatever the page URL held.
pub fn propagate(links: &mut [NavLink], current: &QueryPairs, state: &QueryState, mode: Propagation) {
    for link in links.iter_mut() {
        if mode == Propagation::FullQuery {
            for (key, value) in current.iter().filter(|(key, _)| *key != PASSWORD_PARAM) {
                link.query.set(key, value);
            }
        }
        if let Some(username) = &state.username {
            link.query.set("username", username);
        }
    }
}

/// Drops the password carried over from the login form. Returns whether the
/// query changed, i.e. whether the page must replace its own URL.
pub fn strip_password(query: &mut QueryPairs) -> bool {
    query.remove(PASSWORD_PARAM)
}
