//! Authenticated session state
//!
//! The browser owns the cookie jar during login. Once login is confirmed the
//! jar is captured into a [`Session`], and [`Session::snapshot`] produces the
//! two shapes the API client needs: a `Cookie` header string and a lookup map.

mod browser;
mod login;

pub use browser::{BrowserSession, STEALTH_SCRIPT};
pub use login::{Bootstrapper, LoginSelectors, LoginSurface};

use std::collections::HashMap;

/// Cookie state captured from a browsing context
///
/// Cookie order is preserved so the header string matches what the browser sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<(String, String)>,
}

impl Session {
    /// Builds a session from (name, value) pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut session = Self::default();
        for (name, value) in pairs {
            session.set(name.into(), value.into());
        }
        session
    }

    /// Parses a raw `a=b; c=d` cookie string
    ///
    /// Segments without `=` or with an empty name are ignored.
    pub fn parse(raw: &str) -> Self {
        Self::from_pairs(raw.split(';').filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        }))
    }

    fn set(&mut self, name: String, value: String) {
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.cookies.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Freezes the session into the representation handed to the API client
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            cookie_header: self
                .cookies
                .iter()
                .map(|(n, v)| format!("{}={}", n, v))
                .collect::<Vec<_>>()
                .join("; "),
            cookies: self.cookies.iter().cloned().collect(),
        }
    }
}

/// Immutable cookie state consumed by the API client and the signer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Header-ready `name=value; name=value` string
    pub cookie_header: String,

    pub cookies: HashMap<String, String>,
}

impl SessionSnapshot {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}
