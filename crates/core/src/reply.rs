// crates/core/src/reply.rs
use serde::{Deserialize, Serialize};

/// Number of reply options produced for every request.
pub const REPLY_COUNT: usize = 3;

/// Exactly three reply options, in the order the model produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplySet([String; REPLY_COUNT]);

impl ReplySet {
    pub fn new(replies: [String; REPLY_COUNT]) -> Self {
        Self(replies)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_inner(self) -> [String; REPLY_COUNT] {
        self.0
    }
}

impl<'a> IntoIterator for &'a ReplySet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
