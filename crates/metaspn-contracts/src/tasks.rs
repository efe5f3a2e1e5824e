//! Work items flowing between pipeline stages and their results.

use serde_json::{Map, Value};
use time::OffsetDateTime;

use metaspn_core::prelude::*;

use crate::envelope::EntityRef;

/// A unit of work targeting one entity.
///
/// `inputs` and `context` are free-form string-keyed mappings; their values
/// pass through the engine unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub task_id: String,
    pub task_type: String,
    pub created_at: OffsetDateTime,
    pub priority: i64,
    pub entity_ref: EntityRef,
    pub inputs: Map<String, Value>,
    pub context: Map<String, Value>,
    pub schema_version: String,
}

static TASK_SHAPE: RecordShape = RecordShape {
    name: "Task",
    fields: &[
        FieldSpec::required("task_id", Kind::Str),
        FieldSpec::required("task_type", Kind::Str),
        FieldSpec::required("created_at", Kind::Timestamp),
        FieldSpec::required("priority", Kind::Int),
        FieldSpec::required("entity_ref", Kind::Record(EntityRef::SHAPE)),
        FieldSpec::defaulted("inputs", Kind::Map(&Kind::Any), FieldDefault::EmptyMap),
        FieldSpec::defaulted("context", Kind::Map(&Kind::Any), FieldDefault::EmptyMap),
        FieldSpec::schema_version(),
    ],
};

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        created_at: OffsetDateTime,
        priority: i64,
        entity_ref: EntityRef,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: task_type.into(),
            created_at: ensure_utc(created_at),
            priority,
            entity_ref,
            inputs: Map::new(),
            context: Map::new(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_inputs(mut self, inputs: Map<String, Value>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

impl SchemaRecord for Task {
    const SHAPE: &'static RecordShape = &TASK_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("task_id", &self.task_id);
        b.str("task_type", &self.task_type);
        b.timestamp("created_at", self.created_at);
        b.int("priority", self.priority);
        b.record("entity_ref", &self.entity_ref);
        b.any_map("inputs", &self.inputs);
        b.any_map("context", &self.context);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            task_id: f.str("task_id")?,
            task_type: f.str("task_type")?,
            created_at: f.timestamp("created_at")?,
            priority: f.int("priority")?,
            entity_ref: f.record("entity_ref")?,
            inputs: f.any_map("inputs")?,
            context: f.any_map("context")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

/// The outcome of a completed task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub result_id: String,
    pub task_id: String,
    pub status: String,
    pub completed_at: OffsetDateTime,
    pub outputs: Map<String, Value>,
    pub errors: Vec<String>,
    pub schema_version: String,
}

static TASK_RESULT_SHAPE: RecordShape = RecordShape {
    name: "TaskResult",
    fields: &[
        FieldSpec::required("result_id", Kind::Str),
        FieldSpec::required("task_id", Kind::Str),
        FieldSpec::required("status", Kind::Str),
        FieldSpec::required("completed_at", Kind::Timestamp),
        FieldSpec::defaulted("outputs", Kind::Map(&Kind::Any), FieldDefault::EmptyMap),
        FieldSpec::defaulted("errors", Kind::Seq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::schema_version(),
    ],
};

impl TaskResult {
    pub fn new(
        result_id: impl Into<String>,
        task_id: impl Into<String>,
        status: impl Into<String>,
        completed_at: OffsetDateTime,
    ) -> Self {
        Self {
            result_id: result_id.into(),
            task_id: task_id.into(),
            status: status.into(),
            completed_at: ensure_utc(completed_at),
            outputs: Map::new(),
            errors: Vec::new(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_outputs(mut self, outputs: Map<String, Value>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

impl SchemaRecord for TaskResult {
    const SHAPE: &'static RecordShape = &TASK_RESULT_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("result_id", &self.result_id);
        b.str("task_id", &self.task_id);
        b.str("status", &self.status);
        b.timestamp("completed_at", self.completed_at);
        b.any_map("outputs", &self.outputs);
        b.str_seq("errors", &self.errors);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            result_id: f.str("result_id")?,
            task_id: f.str("task_id")?,
            status: f.str("status")?,
            completed_at: f.timestamp("completed_at")?,
            outputs: f.any_map("outputs")?,
            errors: f.str_seq("errors")?,
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
    fn task_round_trips_with_nested_entity_ref() {
        let mut inputs = Map::new();
        inputs.insert("query".to_string(), json!("latest posts"));
        let task = Task::new(
            "t_1",
            "profile_review",
            datetime!(2026-02-06 12:00:00 UTC),
            5,
            EntityRef::new("handle", "@a").with_platform("x"),
        )
        .with_inputs(inputs);
        assert_eq!(Task::from_tree(&task.to_tree(false)).unwrap(), task);
    }

    #[test]
    fn errors_order_is_preserved() {
        let result = TaskResult::new("r_1", "t_1", "failed", datetime!(2026-02-06 12:00:00 UTC))
            .with_errors(vec!["timeout".into(), "api_limit".into()]);
        let tree = result.to_tree(false);
        assert_eq!(tree["errors"], json!(["timeout", "api_limit"]));
    }
}
