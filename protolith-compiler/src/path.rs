//! Utilities for matching Protobuf paths against user-supplied patterns.
//!
//! A [`PathMap`] associates a value with every pattern that a caller registers through one of
//! `Config`'s `*_attribute`/`boxed`/`btree_map`-style builder methods. Patterns are matched
//! against fully-qualified Protobuf paths the same way `protoc`'s own `--proto_path` suffix
//! matching works: a leading `.` anchors the pattern to the start of the path, otherwise it is
//! matched as a suffix.

use std::collections::HashMap;
use std::fmt;

use crate::ident::match_ident;

/// Maps Protobuf path patterns to values of type `T`.
#[derive(Clone)]
pub(crate) struct PathMap<T> {
    matchers: HashMap<String, T>,
}

impl<T> PathMap<T> {
    pub fn insert(&mut self, pattern: String, value: T) {
        self.matchers.insert(pattern, value);
    }

    pub fn clear(&mut self) {
        self.matchers.clear();
    }

    /// Values whose pattern matches the fully-qualified type or package path `item_path`.
    pub fn get<'a>(&'a self, item_path: &'a str) -> impl Iterator<Item = &'a T> {
        self.matchers
            .iter()
            .filter(move |(pattern, _)| match_ident(pattern, item_path, None))
            .map(|(_, value)| value)
    }

    /// Values whose pattern matches the field `field_name` nested in message `message_path`.
    pub fn get_field<'a>(
        &'a self,
        message_path: &'a str,
        field_name: &'a str,
    ) -> impl Iterator<Item = &'a T> {
        self.matchers
            .iter()
            .filter(move |(pattern, _)| match_ident(pattern, message_path, Some(field_name)))
            .map(|(_, value)| value)
    }
}

impl<T> Default for PathMap<T> {
    fn default() -> Self {
        PathMap {
            matchers: HashMap::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PathMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.matchers.iter()).finish()
    }
}
