//! Recommendation and draft-message outputs.

use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use metaspn_core::prelude::*;

/// A scored playbook recommendation for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub recommendation_id: String,
    pub entity_id: String,
    pub playbook: String,
    pub score: f64,
    pub rationale: String,
    pub priority: i64,
    pub created_at: OffsetDateTime,
    pub schema_version: String,
    pub metadata: BTreeMap<String, String>,
}

static RECOMMENDATION_SHAPE: RecordShape = RecordShape {
    name: "Recommendation",
    fields: &[
        FieldSpec::required("recommendation_id", Kind::Str),
        FieldSpec::required("entity_id", Kind::Str),
        FieldSpec::required("playbook", Kind::Str),
        FieldSpec::required("score", Kind::Float),
        FieldSpec::required("rationale", Kind::Str),
        FieldSpec::required("priority", Kind::Int),
        FieldSpec::required("created_at", Kind::Timestamp),
        FieldSpec::schema_version(),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl Recommendation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        recommendation_id: impl Into<String>,
        entity_id: impl Into<String>,
        playbook: impl Into<String>,
        score: f64,
        rationale: impl Into<String>,
        priority: i64,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            recommendation_id: recommendation_id.into(),
            entity_id: entity_id.into(),
            playbook: playbook.into(),
            score,
            rationale: rationale.into(),
            priority,
            created_at: ensure_utc(created_at),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

impl SchemaRecord for Recommendation {
    const SHAPE: &'static RecordShape = &RECOMMENDATION_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("recommendation_id", &self.recommendation_id);
        b.str("entity_id", &self.entity_id);
        b.str("playbook", &self.playbook);
        b.float("score", self.score);
        b.str("rationale", &self.rationale);
        b.int("priority", self.priority);
        b.timestamp("created_at", self.created_at);
        b.str("schema_version", &self.schema_version);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            recommendation_id: f.str("recommendation_id")?,
            entity_id: f.str("entity_id")?,
            playbook: f.str("playbook")?,
            score: f.float("score")?,
            rationale: f.str("rationale")?,
            priority: f.int("priority")?,
            created_at: f.timestamp("created_at")?,
            schema_version: f.str("schema_version")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// A drafted outbound message awaiting review.
///
/// `constraints` is set-like: sorted ascending at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftMessage {
    pub draft_id: String,
    pub entity_id: String,
    pub channel: String,
    pub body: String,
    pub tone: String,
    pub created_at: OffsetDateTime,
    pub schema_version: String,
    pub subject: Option<String>,
    pub constraints: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

static DRAFT_MESSAGE_SHAPE: RecordShape = RecordShape {
    name: "DraftMessage",
    fields: &[
        FieldSpec::required("draft_id", Kind::Str),
        FieldSpec::required("entity_id", Kind::Str),
        FieldSpec::required("channel", Kind::Str),
        FieldSpec::required("body", Kind::Str),
        FieldSpec::required("tone", Kind::Str),
        FieldSpec::required("created_at", Kind::Timestamp),
        FieldSpec::schema_version(),
        FieldSpec::optional("subject", Kind::Str),
        FieldSpec::defaulted("constraints", Kind::SortedSeq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl DraftMessage {
    pub fn new(
        draft_id: impl Into<String>,
        entity_id: impl Into<String>,
        channel: impl Into<String>,
        body: impl Into<String>,
        tone: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            draft_id: draft_id.into(),
            entity_id: entity_id.into(),
            channel: channel.into(),
            body: body.into(),
            tone: tone.into(),
            created_at: ensure_utc(created_at),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            subject: None,
            constraints: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_constraints(mut self, mut constraints: Vec<String>) -> Self {
        constraints.sort();
        self.constraints = constraints;
        self
    }
}

impl SchemaRecord for DraftMessage {
    const SHAPE: &'static RecordShape = &DRAFT_MESSAGE_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("draft_id", &self.draft_id);
        b.str("entity_id", &self.entity_id);
        b.str("channel", &self.channel);
        b.str("body", &self.body);
        b.str("tone", &self.tone);
        b.timestamp("created_at", self.created_at);
        b.str("schema_version", &self.schema_version);
        b.opt_str("subject", &self.subject);
        b.str_seq("constraints", &self.constraints);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            draft_id: f.str("draft_id")?,
            entity_id: f.str("entity_id")?,
            channel: f.str("channel")?,
            body: f.str("body")?,
            tone: f.str("tone")?,
            created_at: f.timestamp("created_at")?,
            schema_version: f.str("schema_version")?,
            subject: f.opt_str("subject")?,
            constraints: f.str_seq("constraints")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn recommendation_normalizes_created_at() {
        let rec = Recommendation::new(
            "rec_1",
            "ent_1",
            "warm_intro",
            0.82,
            "high topical overlap",
            2,
            datetime!(2026-02-06 04:00:00 -08:00),
        );
        assert_eq!(rec.to_tree(false)["created_at"], json!("2026-02-06T12:00:00Z"));
    }

    #[test]
    fn draft_constraints_sorted_and_round_trip() {
        let draft = DraftMessage::new(
            "d_1",
            "ent_1",
            "dm",
            "hello",
            "casual",
            datetime!(2026-02-06 12:00:00 UTC),
        )
        .with_constraints(vec!["no_links".into(), "max_280".into()]);
        assert_eq!(draft.constraints, vec!["max_280", "no_links"]);
        assert_eq!(DraftMessage::from_tree(&draft.to_tree(false)).unwrap(), draft);
    }
}
