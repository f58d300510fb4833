//! Conversation identity and the addressable location that carries it.

use std::fmt;
use url::Url;

pub const CONVERSATION_PARAM: &str = "conversation_id";

/// Opaque server-issued conversation identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// `None` for an empty or whitespace-only id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The page address a conversation lives at, e.g.
/// `http://localhost:8000/chat/?conversation_id=abc123`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    url: Url,
}

impl PageLocation {
    pub fn parse(location: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(location)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == CONVERSATION_PARAM)
            .and_then(|(_, v)| ConversationId::new(v.into_owned()))
    }

    /// Same path, query replaced by `conversation_id=<id>`.
    pub fn with_conversation(&self, id: &ConversationId) -> Self {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.query_pairs_mut()
            .clear()
            .append_pair(CONVERSATION_PARAM, id.as_str());
        Self { url }
    }

    /// Same path with no query, i.e. a page that starts a new conversation.
    pub fn without_query(&self) -> Self {
        let mut url = self.url.clone();
        url.set_query(None);
        url.set_fragment(None);
        Self { url }
    }

    /// Resolve an endpoint path (e.g. `/openai_integration/api/stt/`) against
    /// this page.
    pub fn join(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join(path)
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_conversation_from_query() {
        let loc = PageLocation::parse("http://localhost:8000/chat/?conversation_id=abc123").unwrap();
        assert_eq!(loc.conversation_id().unwrap().as_str(), "abc123");
    }

    #[test]
    fn test_missing_or_blank_conversation() {
        let loc = PageLocation::parse("http://localhost:8000/chat/").unwrap();
        assert!(loc.conversation_id().is_none());
        let loc = PageLocation::parse("http://localhost:8000/chat/?conversation_id=").unwrap();
        assert!(loc.conversation_id().is_none());
    }

    #[test]
    fn test_with_conversation_replaces_query() {
        let loc = PageLocation::parse("http://localhost:8000/chat/?tool=7#bottom").unwrap();
        let id = ConversationId::new("xyz").unwrap();
        let next = loc.with_conversation(&id);
        assert_eq!(next.as_str(), "http://localhost:8000/chat/?conversation_id=xyz");
        assert_eq!(next.conversation_id(), Some(id));
    }

    #[test]
    fn test_without_query_forgets_conversation() {
        let loc = PageLocation::parse("http://localhost:8000/chat/?conversation_id=a").unwrap();
        let fresh = loc.without_query();
        assert_eq!(fresh.as_str(), "http://localhost:8000/chat/");
        assert!(fresh.conversation_id().is_none());
    }

    #[test]
    fn test_join_endpoint() {
        let loc = PageLocation::parse("http://localhost:8000/chat/?conversation_id=a").unwrap();
        let url = loc.join("/openai_integration/api/stt/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/openai_integration/api/stt/");
    }
}
