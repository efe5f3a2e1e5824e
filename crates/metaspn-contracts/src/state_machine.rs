//! State-machine configuration records, legacy-alias normalization, and
//! structural validation.
//!
//! Configurations arrive from older producers under several historical field
//! names (`machine_id`, `start_state`, per-transition `from`/`to`/
//! `event_name`, …). [`normalize_state_machine_payload`] maps those onto the
//! canonical names before decoding; a legacy payload and its canonical
//! equivalent therefore produce identical configs.
//!
//! Validation is structural only: state membership, non-emptiness, and
//! duplicate edges. Reachability, cycle, and guard-determinism analysis are
//! out of scope here.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use time::OffsetDateTime;

use metaspn_core::prelude::*;

/// One transition edge: `from_state --event--> to_state`, optionally gated
/// by a named guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransitionRule {
    pub from_state: String,
    pub to_state: String,
    pub event: String,
    pub guard: Option<String>,
    pub schema_version: String,
}

static STATE_TRANSITION_RULE_SHAPE: RecordShape = RecordShape {
    name: "StateTransitionRule",
    fields: &[
        FieldSpec::required("from_state", Kind::Str),
        FieldSpec::required("to_state", Kind::Str),
        FieldSpec::required("event", Kind::Str),
        FieldSpec::optional("guard", Kind::Str),
        FieldSpec::schema_version(),
    ],
};

impl StateTransitionRule {
    pub fn new(
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        Self {
            from_state: from_state.into(),
            to_state: to_state.into(),
            event: event.into(),
            guard: None,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    fn sort_key(&self) -> (&str, &str, &str, &str) {
        (
            &self.from_state,
            &self.event,
            &self.to_state,
            self.guard.as_deref().unwrap_or(""),
        )
    }
}

impl SchemaRecord for StateTransitionRule {
    const SHAPE: &'static RecordShape = &STATE_TRANSITION_RULE_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("from_state", &self.from_state);
        b.str("to_state", &self.to_state);
        b.str("event", &self.event);
        b.opt_str("guard", &self.guard);
        b.str("schema_version", &self.schema_version);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            from_state: f.str("from_state")?,
            to_state: f.str("to_state")?,
            event: f.str("event")?,
            guard: f.opt_str("guard")?,
            schema_version: f.str("schema_version")?,
        })
    }
}

static STATE_TRANSITION_RULE_KIND: Kind = Kind::Record(&STATE_TRANSITION_RULE_SHAPE);

/// A complete state-machine configuration.
///
/// Invariants held at all times: `states` and `terminal_states` are sorted
/// ascending; `transitions` are sorted by `(from_state, event, to_state,
/// guard)`. Both the constructor and the decode path enforce them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineConfig {
    pub config_id: String,
    pub machine_type: String,
    pub initial_state: String,
    pub states: Vec<String>,
    pub transitions: Vec<StateTransitionRule>,
    pub schema_version: String,
    pub terminal_states: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

static STATE_MACHINE_CONFIG_SHAPE: RecordShape = RecordShape {
    name: "StateMachineConfig",
    fields: &[
        FieldSpec::required("config_id", Kind::Str),
        FieldSpec::required("machine_type", Kind::Str),
        FieldSpec::required("initial_state", Kind::Str),
        FieldSpec::required("states", Kind::SortedSeq(&Kind::Str)),
        FieldSpec::required("transitions", Kind::Seq(&STATE_TRANSITION_RULE_KIND)),
        FieldSpec::schema_version(),
        FieldSpec::defaulted(
            "terminal_states",
            Kind::SortedSeq(&Kind::Str),
            FieldDefault::EmptySeq,
        ),
        FieldSpec::defaulted("metadata", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl StateMachineConfig {
    pub fn new(
        config_id: impl Into<String>,
        machine_type: impl Into<String>,
        initial_state: impl Into<String>,
        mut states: Vec<String>,
        mut transitions: Vec<StateTransitionRule>,
    ) -> Self {
        states.sort();
        Self::sort_transitions(&mut transitions);
        Self {
            config_id: config_id.into(),
            machine_type: machine_type.into(),
            initial_state: initial_state.into(),
            states,
            transitions,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            terminal_states: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_terminal_states(mut self, mut terminal_states: Vec<String>) -> Self {
        terminal_states.sort();
        self.terminal_states = terminal_states;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    fn sort_transitions(rules: &mut [StateTransitionRule]) {
        rules.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}

impl SchemaRecord for StateMachineConfig {
    const SHAPE: &'static RecordShape = &STATE_MACHINE_CONFIG_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("config_id", &self.config_id);
        b.str("machine_type", &self.machine_type);
        b.str("initial_state", &self.initial_state);
        b.str_seq("states", &self.states);
        b.record_seq("transitions", &self.transitions);
        b.str("schema_version", &self.schema_version);
        b.str_seq("terminal_states", &self.terminal_states);
        b.str_map("metadata", &self.metadata);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        // Transition order is keyed on rule fields, which the element-wise
        // sequence sort cannot see; re-sort after decoding.
        let mut transitions: Vec<StateTransitionRule> = f.record_seq("transitions")?;
        Self::sort_transitions(&mut transitions);
        Ok(Self {
            config_id: f.str("config_id")?,
            machine_type: f.str("machine_type")?,
            initial_state: f.str("initial_state")?,
            states: f.str_seq("states")?,
            transitions,
            schema_version: f.str("schema_version")?,
            terminal_states: f.str_seq("terminal_states")?,
            metadata: f.str_map("metadata")?,
        })
    }
}

/// One attempted transition through a gate, allowed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTransitionAttempt {
    pub attempt_id: String,
    pub gate_name: String,
    pub entity_id: String,
    pub from_state: String,
    pub to_state: String,
    pub attempted_at: OffsetDateTime,
    pub allowed: bool,
    pub schema_version: String,
    pub reason_code: Option<String>,
    pub caused_by: Vec<String>,
    pub context: BTreeMap<String, String>,
}

static GATE_TRANSITION_ATTEMPT_SHAPE: RecordShape = RecordShape {
    name: "GateTransitionAttempt",
    fields: &[
        FieldSpec::required("attempt_id", Kind::Str),
        FieldSpec::required("gate_name", Kind::Str),
        FieldSpec::required("entity_id", Kind::Str),
        FieldSpec::required("from_state", Kind::Str),
        FieldSpec::required("to_state", Kind::Str),
        FieldSpec::required("attempted_at", Kind::Timestamp),
        FieldSpec::required("allowed", Kind::Bool),
        FieldSpec::schema_version(),
        FieldSpec::optional("reason_code", Kind::Str),
        FieldSpec::defaulted("caused_by", Kind::Seq(&Kind::Str), FieldDefault::EmptySeq),
        FieldSpec::defaulted("context", Kind::Map(&Kind::Str), FieldDefault::EmptyMap),
    ],
};

impl GateTransitionAttempt {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        attempt_id: impl Into<String>,
        gate_name: impl Into<String>,
        entity_id: impl Into<String>,
        from_state: impl Into<String>,
        to_state: impl Into<String>,
        attempted_at: OffsetDateTime,
        allowed: bool,
    ) -> Self {
        Self {
            attempt_id: attempt_id.into(),
            gate_name: gate_name.into(),
            entity_id: entity_id.into(),
            from_state: from_state.into(),
            to_state: to_state.into(),
            attempted_at: ensure_utc(attempted_at),
            allowed,
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            reason_code: None,
            caused_by: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    pub fn with_reason_code(mut self, reason_code: impl Into<String>) -> Self {
        self.reason_code = Some(reason_code.into());
        self
    }
}

impl SchemaRecord for GateTransitionAttempt {
    const SHAPE: &'static RecordShape = &GATE_TRANSITION_ATTEMPT_SHAPE;

    fn to_tree(&self, privacy_mode: bool) -> Value {
        let mut b = TreeBuilder::new(Self::SHAPE, privacy_mode);
        b.str("attempt_id", &self.attempt_id);
        b.str("gate_name", &self.gate_name);
        b.str("entity_id", &self.entity_id);
        b.str("from_state", &self.from_state);
        b.str("to_state", &self.to_state);
        b.timestamp("attempted_at", self.attempted_at);
        b.bool("allowed", self.allowed);
        b.str("schema_version", &self.schema_version);
        b.opt_str("reason_code", &self.reason_code);
        b.str_seq("caused_by", &self.caused_by);
        b.str_map("context", &self.context);
        b.finish()
    }

    fn from_tree(tree: &Value) -> SchemaResult<Self> {
        let f = FieldValues::decode(tree, Self::SHAPE)?;
        Ok(Self {
            attempt_id: f.str("attempt_id")?,
            gate_name: f.str("gate_name")?,
            entity_id: f.str("entity_id")?,
            from_state: f.str("from_state")?,
            to_state: f.str("to_state")?,
            attempted_at: f.timestamp("attempted_at")?,
            allowed: f.bool("allowed")?,
            schema_version: f.str("schema_version")?,
            reason_code: f.opt_str("reason_code")?,
            caused_by: f.str_seq("caused_by")?,
            context: f.str_map("context")?,
        })
    }
}

/// Map legacy field aliases onto the canonical names, without overwriting a
/// canonical field that is already present.
///
/// Top-level: `machine_id→config_id`, `machine_name→machine_type`,
/// `start_state→initial_state`, `state_nodes→states`,
/// `end_states→terminal_states`. Per transition row: `from→from_state`,
/// `to→to_state`, `event_name→event`. A missing `transitions` key becomes an
/// empty list; a present non-list value is left for the decode to reject. A
/// missing `schema_version` takes the shared default.
pub fn normalize_state_machine_payload(tree: &Value) -> Value {
    let Some(obj) = tree.as_object() else {
        return tree.clone();
    };
    let mut normalized = obj.clone();

    for (canonical, legacy) in [
        ("config_id", "machine_id"),
        ("machine_type", "machine_name"),
        ("initial_state", "start_state"),
        ("states", "state_nodes"),
        ("terminal_states", "end_states"),
    ] {
        if !normalized.contains_key(canonical) {
            if let Some(value) = normalized.get(legacy) {
                let value = value.clone();
                normalized.insert(canonical.to_string(), value);
            }
        }
    }

    match normalized.get("transitions") {
        None => {
            normalized.insert("transitions".to_string(), Value::Array(Vec::new()));
        }
        Some(Value::Array(rows)) => {
            let rows = rows.clone();
            let mut transitions = Vec::with_capacity(rows.len());
            for row in rows {
                let Some(row) = row.as_object() else {
                    // Non-mapping rows pass through and fail the decode with a
                    // transition-shaped coercion error.
                    transitions.push(row);
                    continue;
                };
                let mut out = Map::new();
                out.insert(
                    "from_state".to_string(),
                    first_of(row, &["from_state", "from"]),
                );
                out.insert("to_state".to_string(), first_of(row, &["to_state", "to"]));
                out.insert("event".to_string(), first_of(row, &["event", "event_name"]));
                out.insert(
                    "guard".to_string(),
                    row.get("guard").cloned().unwrap_or(Value::Null),
                );
                out.insert(
                    "schema_version".to_string(),
                    row.get("schema_version")
                        .cloned()
                        .unwrap_or_else(|| Value::String(DEFAULT_SCHEMA_VERSION.to_string())),
                );
                transitions.push(Value::Object(out));
            }
            normalized.insert("transitions".to_string(), Value::Array(transitions));
        }
        // A present but non-array value passes through unchanged and fails
        // the decode with a sequence-shaped coercion error.
        Some(_) => {}
    }

    if !normalized.contains_key("schema_version") {
        normalized.insert(
            "schema_version".to_string(),
            Value::String(DEFAULT_SCHEMA_VERSION.to_string()),
        );
    }

    Value::Object(normalized)
}

fn first_of(row: &Map<String, Value>, keys: &[&str]) -> Value {
    keys.iter()
        .find_map(|key| row.get(*key))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Normalize legacy aliases and decode a configuration.
pub fn parse_state_machine_config(tree: &Value) -> SchemaResult<StateMachineConfig> {
    StateMachineConfig::from_tree(&normalize_state_machine_payload(tree))
}

/// Structurally validate an already-parsed configuration, accumulating every
/// violation.
pub fn validate_state_machine_config(config: &StateMachineConfig) -> Verdict {
    let mut reasons = Vec::new();

    if config.states.is_empty() {
        reasons.push("states must contain at least one value".to_string());
    }

    let state_set: BTreeSet<&str> = config.states.iter().map(String::as_str).collect();

    if !state_set.contains(config.initial_state.as_str()) {
        reasons.push("initial_state must exist in states".to_string());
    }

    let unknown_terminal: BTreeSet<&str> = config
        .terminal_states
        .iter()
        .map(String::as_str)
        .filter(|s| !state_set.contains(s))
        .collect();
    if !unknown_terminal.is_empty() {
        let joined: Vec<&str> = unknown_terminal.into_iter().collect();
        reasons.push(format!(
            "terminal_states must be a subset of states: {}",
            joined.join(",")
        ));
    }

    if config.transitions.is_empty() {
        reasons.push("transitions must contain at least one rule".to_string());
    }

    // Duplicate detection ignores the guard on purpose: two rules for the
    // same edge are ambiguous even when their guards differ.
    let mut seen_edges: BTreeSet<(&str, &str, &str)> = BTreeSet::new();
    for rule in &config.transitions {
        if !state_set.contains(rule.from_state.as_str()) {
            reasons.push(format!(
                "transition from_state not in states: {}",
                rule.from_state
            ));
        }
        if !state_set.contains(rule.to_state.as_str()) {
            reasons.push(format!("transition to_state not in states: {}", rule.to_state));
        }

        let edge = (
            rule.from_state.as_str(),
            rule.event.as_str(),
            rule.to_state.as_str(),
        );
        if !seen_edges.insert(edge) {
            reasons.push(format!(
                "duplicate transition rule: {}|{}|{}",
                rule.from_state, rule.event, rule.to_state
            ));
        }
    }

    Verdict::from_reasons(reasons)
}

/// Normalize, decode, and validate a raw configuration payload. A payload
/// that fails to decode yields a failing verdict with a `parse_error` reason
/// rather than an error.
pub fn validate_state_machine_payload(tree: &Value) -> Verdict {
    match parse_state_machine_config(tree) {
        Ok(config) => validate_state_machine_config(&config),
        Err(err) => Verdict::parse_error(err),
    }
}
