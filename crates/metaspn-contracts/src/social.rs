//! Social observation events.

use serde_json::Value;

use metaspn_core::prelude::*;
use time::OffsetDateTime;

/// A post observed on a social platform.
///
/// `topics` is set-like: sorted ascending at construction, so two records
/// built from differently-ordered inputs encode identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPostSeen {
    pub post_id: String,
    pub platform: String,
    pub author_handle: String,
    pub content: String,
    pub seen_at: OffsetDateTime,
    pub url: Option<String>,
    pub topics: Vec<String>,
    pub schema_version: String,
}

static SOCIAL_POST_SEEN_SHAPE: RecordShape = RecordShape {
    name: "SocialPostSeen",
    fields: &[
        FieldSpec::required("post_id", Kind::Str),
        FieldSpec::required("platform", Kind::Str),
        FieldSpec::required("author_handle", Kind::Str),
        FieldSpec::required("content", Kind::Str),
        FieldSpec::required("seen_at", Kind::Timestamp),
        FieldSpec::optional("url", Kind::Str),
        FieldSpec::defaulted("topics", Kind::SortedSeq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::schema_version(),
    ],
};

impl SocialPostSeen {
    pub fn new(
        post_id: impl Into<String>,
        platform: impl Into<String>,
        author_handle: impl Into<String>,
        content: impl Into<String>,
        seen_at: OffsetDateTime,
    ) -> Self {
        Self {
            post_id: post_id.into(),
            platform: platform.into(),
            author_handle: author_handle.into(),
            content: content.into(),
            seen_at: ensure_utc(seen_at),
            url: None,
            topics: Vec::new(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_topics(mut self, mut topics: Vec<String>) -> Self {
        topics.sort();
        self.topics = topics;
        self
    }
}

impl SchemaRecord for SocialPostSeen {
    const SHAPE: &'static RecordShape = &SOCIAL_POST_SEEN_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("post_id", &self.post_id);
        b.str("platform", &self.platform);
        b.str("author_handle", &self.author_handle);
        b.str("content", &self.content);
        b.timestamp("seen_at", self.seen_at);
        b.opt_str("url", &self.url);
        b.str_seq("topics", &self.topics);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            post_id: f.str("post_id")?,
            platform: f.str("platform")?,
            author_handle: f.str("author_handle")?,
            content: f.str("content")?,
            seen_at: f.timestamp("seen_at")?,
            url: f.opt_str("url")?,
            topics: f.str_seq("topics")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

/// A profile snapshot observed on a social platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSnapshotSeen {
    pub profile_id: String,
    pub platform: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub seen_at: OffsetDateTime,
    pub followers_count: Option<i64>,
    pub topics: Vec<String>,
    pub schema_version: String,
}

static PROFILE_SNAPSHOT_SEEN_SHAPE: RecordShape = RecordShape {
    name: "ProfileSnapshotSeen",
    fields: &[
        FieldSpec::required("profile_id", Kind::Str),
        FieldSpec::required("platform", Kind::Str),
        FieldSpec::required("handle", Kind::Str),
        FieldSpec::optional("display_name", Kind::Str),
        FieldSpec::optional("bio", Kind::Str),
        FieldSpec::required("seen_at", Kind::Timestamp),
        FieldSpec::optional("followers_count", Kind::Int),
        FieldSpec::defaulted("topics", Kind::SortedSeq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::schema_version(),
    ],
};

impl ProfileSnapshotSeen {
    pub fn new(
        profile_id: impl Into<String>,
        platform: impl Into<String>,
        handle: impl Into<String>,
        seen_at: OffsetDateTime,
    ) -> Self {
        Self {
            profile_id: profile_id.into(),
            platform: platform.into(),
            handle: handle.into(),
            display_name: None,
            bio: None,
            seen_at: ensure_utc(seen_at),
            followers_count: None,
            topics: Vec::new(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_topics(mut self, mut topics: Vec<String>) -> Self {
        topics.sort();
        self.topics = topics;
        self
    }
}

impl SchemaRecord for ProfileSnapshotSeen {
    const SHAPE: &'static RecordShape = &PROFILE_SNAPSHOT_SEEN_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("profile_id", &self.profile_id);
        b.str("platform", &self.platform);
        b.str("handle", &self.handle);
        b.opt_str("display_name", &self.display_name);
        b.opt_str("bio", &self.bio);
        b.timestamp("seen_at", self.seen_at);
        b.opt_int("followers_count", &self.followers_count);
        b.str_seq("topics", &self.topics);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            profile_id: f.str("profile_id")?,
            platform: f.str("platform")?,
            handle: f.str("handle")?,
            display_name: f.opt_str("display_name")?,
            bio: f.opt_str("bio")?,
            seen_at: f.timestamp("seen_at")?,
            followers_count: f.opt_int("followers_count")?,
            topics: f.str_seq("topics")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn topics_sorted_at_construction() {
        let post = SocialPostSeen::new("p1", "x", "@a", "hi", datetime!(2026-02-06 12:00:00 UTC))
            .with_topics(vec!["ml".into(), "ai".into(), "defi".into()]);
        assert_eq!(post.topics, vec!["ai", "defi", "ml"]);
    }

    #[test]
    fn topics_sorted_on_decode() {
        let post = SocialPostSeen::from_tree(&json!({
            "post_id": "p1",
            "platform": "x",
            "author_handle": "@a",
            "content": "hi",
            "seen_at": "2026-02-06T12:00:00Z",
            "topics": ["ml", "ai"]
        }))
        .unwrap();
        assert_eq!(post.topics, vec!["ai", "ml"]);
    }

    #[test]
    fn profile_round_trips_with_nulls() {
        let p = ProfileSnapshotSeen::new("pr1", "x", "@a", datetime!(2026-02-06 12:00:00 UTC));
        let tree = p.to_tree(false);
        assert_eq!(tree["display_name"], json!(null));
        assert_eq!(ProfileSnapshotSeen::from_tree(&tree).unwrap(), p);
    }
}
