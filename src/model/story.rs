use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Result, TrackerError};
use crate::model::field::{
    format_timestamp, read_field, read_i64, read_string, read_timestamp, read_u64, FieldState,
};
use crate::wire::{WirePayload, WireValue};

/// Story classification. The accepted set is closed: the service rejects
/// anything else, and so does this client, at assignment time rather than
/// at the server round-trip.
///
/// A story type this enum does not know makes ingestion fail outright,
/// which also means a future server-introduced type breaks `from_wire`.
/// That is the historical contract of this API surface; widen the enum
/// deliberately rather than passing unknown values through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryType {
    Bug,
    Chore,
    Release,
    Feature,
}

impl StoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Bug => "bug",
            StoryType::Chore => "chore",
            StoryType::Release => "release",
            StoryType::Feature => "feature",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StoryType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bug" => Ok(StoryType::Bug),
            "chore" => Ok(StoryType::Chore),
            "release" => Ok(StoryType::Release),
            "feature" => Ok(StoryType::Feature),
            other => Err(TrackerError::invalid_field("story_type", other)),
        }
    }
}

/// A work item in the tracking service.
///
/// A `Story` is either a complete snapshot ingested from a server response
/// via [`Story::from_wire`], or a partial record built from scratch to
/// describe a create or update. Fields the caller never touched stay
/// `Absent` and are omitted from serialized payloads, so a partial record
/// can be sent without clobbering other server-side fields.
///
/// Labels are the one exception to safe partial updates: every historical
/// wire shape replaces the whole label set on write, never a delta. Calling
/// [`Story::add_label`] or [`Story::remove_label`] on a record that was not
/// populated from a fetched story only affects the locally-held set, and
/// any server-side labels not already loaded are dropped on the next write.
/// Fetch the story first, then mutate labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Story {
    id: FieldState<u64>,
    url: FieldState<String>,
    created_at: FieldState<i64>,
    iteration_number: FieldState<u64>,
    deadline: FieldState<i64>,
    requested_by: FieldState<String>,
    owned_by: FieldState<String>,
    story_type: FieldState<StoryType>,
    current_state: FieldState<String>,
    name: FieldState<String>,
    description: FieldState<String>,
    estimate: FieldState<i64>,
    labels: Option<BTreeSet<String>>,
}

impl Story {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a story from a decoded wire payload.
    ///
    /// Malformed input fails the whole call; no partially-populated record
    /// is ever returned. Missing members are normal and stay `Absent`;
    /// present-but-empty members stay `Empty`.
    pub fn from_wire(payload: &Value) -> Result<Story> {
        let obj = payload
            .as_object()
            .ok_or_else(|| TrackerError::parse("story payload is not an object"))?;

        let mut story = Story::new();
        story.id = read_u64(obj, "id")?;
        story.url = read_string(obj, "url")?;
        // Only present once the story has been scheduled into an iteration.
        story.iteration_number = read_u64(obj, "number")?;
        story.requested_by = read_string(obj, "requested_by")?;
        story.owned_by = read_string(obj, "owned_by")?;
        story.current_state = read_string(obj, "current_state")?;
        story.name = read_string(obj, "name")?;
        story.description = read_string(obj, "description")?;
        story.estimate = read_i64(obj, "estimate")?;

        story.story_type = match read_string(obj, "story_type")? {
            FieldState::Value(raw) => FieldState::Value(raw.parse()?),
            FieldState::Empty => FieldState::Empty,
            FieldState::Absent => FieldState::Absent,
        };

        story.created_at = read_timestamp(obj, "created_at")?;
        story.deadline = read_timestamp(obj, "deadline")?;

        match read_field(obj, "labels") {
            FieldState::Value(raw) => story.labels = Some(parse_labels(raw)?),
            FieldState::Empty => story.labels = Some(BTreeSet::new()),
            FieldState::Absent => {}
        }

        Ok(story)
    }

    // Immutable, server-assigned fields: readable, never emitted.

    pub fn id(&self) -> &FieldState<u64> {
        &self.id
    }

    pub fn url(&self) -> &FieldState<String> {
        &self.url
    }

    pub fn created_at(&self) -> &FieldState<i64> {
        &self.created_at
    }

    pub fn iteration_number(&self) -> &FieldState<u64> {
        &self.iteration_number
    }

    // Mutable fields.

    pub fn deadline(&self) -> &FieldState<i64> {
        &self.deadline
    }

    pub fn set_deadline(&mut self, secs_since_epoch: i64) {
        self.deadline = FieldState::Value(secs_since_epoch);
    }

    pub fn requested_by(&self) -> &FieldState<String> {
        &self.requested_by
    }

    pub fn set_requested_by(&mut self, requested_by: &str) {
        self.requested_by = string_state(requested_by);
    }

    pub fn owned_by(&self) -> &FieldState<String> {
        &self.owned_by
    }

    pub fn set_owned_by(&mut self, owned_by: &str) {
        self.owned_by = string_state(owned_by);
    }

    pub fn story_type(&self) -> &FieldState<StoryType> {
        &self.story_type
    }

    /// Assigning via the enum cannot fail; parsing a string into a
    /// [`StoryType`] is where out-of-enum values are rejected.
    pub fn set_story_type(&mut self, story_type: StoryType) {
        self.story_type = FieldState::Value(story_type);
    }

    pub fn current_state(&self) -> &FieldState<String> {
        &self.current_state
    }

    pub fn set_current_state(&mut self, current_state: &str) {
        self.current_state = string_state(current_state);
    }

    pub fn name(&self) -> &FieldState<String> {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = string_state(name);
    }

    pub fn description(&self) -> &FieldState<String> {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = string_state(description);
    }

    pub fn estimate(&self) -> &FieldState<i64> {
        &self.estimate
    }

    pub fn set_estimate(&mut self, estimate: i64) {
        self.estimate = FieldState::Value(estimate);
    }

    // Labels. See the caveat in the type docs.

    /// The label set, or `None` if labels were never touched.
    pub fn labels(&self) -> Option<&BTreeSet<String>> {
        self.labels.as_ref()
    }

    /// Insert a label. Idempotent.
    pub fn add_label(&mut self, label: &str) {
        self.labels
            .get_or_insert_with(BTreeSet::new)
            .insert(label.trim().to_string());
    }

    /// Remove a label. Removing one that is not present is a no-op.
    pub fn remove_label(&mut self, label: &str) {
        self.labels.get_or_insert_with(BTreeSet::new).remove(label.trim());
    }

    /// Union labels from a comma-delimited string into the set.
    pub fn add_labels_from_string(&mut self, labels: &str) {
        let set = self.labels.get_or_insert_with(BTreeSet::new);
        for label in labels.split(',') {
            let label = label.trim();
            if !label.is_empty() {
                set.insert(label.to_string());
            }
        }
    }

    /// Labels joined by comma in lexicographic order, or `None` if labels
    /// were never touched. The sort order is part of the wire contract.
    pub fn labels_as_sorted_string(&self) -> Option<String> {
        self.labels.as_ref().map(|labels| {
            labels
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",")
        })
    }

    /// Serialize the touched fields for a create or update request.
    ///
    /// Absent fields are omitted entirely; fields explicitly set to empty
    /// are emitted with empty content. Server-assigned fields (id, url,
    /// created_at, iteration number) never appear here: they are read-only
    /// on the client. The deadline is rendered in the canonical wire
    /// datetime shape.
    pub fn to_wire(&self) -> Result<WirePayload> {
        let mut payload = WirePayload::new();

        match &self.story_type {
            FieldState::Value(t) => {
                payload.push("story_type", WireValue::Str(t.as_str().to_string()));
            }
            FieldState::Empty => payload.push("story_type", WireValue::Str(String::new())),
            FieldState::Absent => {}
        }
        push_string(&mut payload, "current_state", &self.current_state);
        push_string(&mut payload, "name", &self.name);
        push_string(&mut payload, "description", &self.description);
        match &self.estimate {
            FieldState::Value(n) => payload.push("estimate", WireValue::Int(*n)),
            FieldState::Empty => payload.push("estimate", WireValue::Str(String::new())),
            FieldState::Absent => {}
        }
        push_string(&mut payload, "requested_by", &self.requested_by);
        push_string(&mut payload, "owned_by", &self.owned_by);

        if let Some(labels) = &self.labels {
            if !labels.is_empty() {
                let joined = labels.iter().map(String::as_str).collect::<Vec<_>>().join(",");
                payload.push("labels", WireValue::Str(joined));
            }
        }

        if let FieldState::Value(secs) = &self.deadline {
            payload.push("deadline", WireValue::Datetime(format_timestamp(*secs)?));
        }

        Ok(payload)
    }
}

fn string_state(value: &str) -> FieldState<String> {
    if value.is_empty() {
        FieldState::Empty
    } else {
        FieldState::Value(value.to_string())
    }
}

fn push_string(payload: &mut WirePayload, key: &'static str, field: &FieldState<String>) {
    match field {
        FieldState::Value(v) => payload.push(key, WireValue::Str(v.clone())),
        FieldState::Empty => payload.push(key, WireValue::Str(String::new())),
        FieldState::Absent => {}
    }
}

/// Labels arrive either as an array of `{name}` objects or as a
/// comma-joined string, depending on API generation. Both normalize to a
/// set of trimmed names.
fn parse_labels(value: &Value) -> Result<BTreeSet<String>> {
    match value {
        Value::String(joined) => Ok(joined
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(String::from)
            .collect()),
        Value::Array(entries) => {
            let mut labels = BTreeSet::new();
            for entry in entries {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| TrackerError::parse("label entry has no name"))?;
                let name = name.trim();
                if !name.is_empty() {
                    labels.insert(name.to_string());
                }
            }
            Ok(labels)
        }
        other => Err(TrackerError::parse(format!(
            "labels must be an array or a comma-joined string: {other}"
        ))),
    }
}
