use url::form_urlencoded;

pub const DEFAULT_LIMIT: usize = 100;
pub const STATIC_DEFAULT_LIMIT: usize = 5;

/// Ordered query parameters, with the lookup and update rules of the
/// browser's `URLSearchParams`: `get` returns the first value, `set`
/// replaces the first occurrence and drops the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default();
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        Self(
            form_urlencoded::parse(raw.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.0.iter().position(|(name, _)| name == key) {
            Some(index) => {
                self.0[index].1 = value.to_string();
                let mut seen = 0;
                self.0.retain(|(name, _)| {
                    if name != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.0.push((key.to_string(), value.to_string())),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|(name, _)| name != key);
        before != self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes without the leading `?`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// Where the last known username lives between page loads.
pub trait SessionFallback {
    fn username(&self) -> Option<&str>;
    fn remember_username(&mut self, username: &str);
    fn forget_username(&mut self);
}

/// Default and upper bound applied to the `limit` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: usize,
    pub ceiling: Option<usize>,
}

impl LimitPolicy {
    pub const fn api() -> Self {
        Self {
            default: DEFAULT_LIMIT,
            ceiling: None,
        }
    }

    /// Limits for pages backed by a fixed local list of `assets` entries.
    pub const fn static_assets(assets: usize) -> Self {
        Self {
            default: STATIC_DEFAULT_LIMIT,
            ceiling: Some(assets),
        }
    }

    pub fn resolve(&self, raw: Option<&str>) -> usize {
        let requested = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .and_then(|value| usize::try_from(value).ok())
            .unwrap_or(self.default);

        match self.ceiling {
            Some(ceiling) => requested.min(ceiling).max(1),
            None => requested,
        }
    }
}

/// Navigation parameters resolved for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    pub username: Option<String>,
    /// Always at least 1.
    pub limit: usize,
    pub category: Option<String>,
}

impl QueryState {
    pub fn resolve(
        query: &QueryPairs,
        policy: LimitPolicy,
        session: &mut impl SessionFallback,
    ) -> Self {
        let username = match non_blank(query.get("username")) {
            Some(username) => {
                if session.username() != Some(username) {
                    session.remember_username(username);
                }
                Some(username.to_string())
            }
            None => session.username().map(str::to_string),
        };

        Self {
            username,
            limit: policy.resolve(query.get("limit")),
            category: query.get("category").map(str::to_string),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
