//! Event classification.
//!
//! An [`EventClassifier`] turns an event's attributes into an [`EventLabel`]
//! by joining the activity name and lifecycle transition with a delimiter:
//! `{"concept:name": "A", "lifecycle:transition": "complete"}` becomes
//! `A+complete`. Classification is pure; the same attributes always give the
//! same label.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClassifierConfig;
use crate::logging::{event_names, Stage};
use dfdrift_common::{Error, EventLabel, Result};

/// Default attribute holding the activity name.
pub const DEFAULT_ACTIVITY_KEY: &str = "concept:name";
/// Default attribute holding the lifecycle transition.
pub const DEFAULT_LIFECYCLE_KEY: &str = "lifecycle:transition";
/// Default separator between activity and transition.
pub const DEFAULT_DELIMITER: &str = "+";

/// Read access to an event's named attributes.
pub trait AttributeSource {
    /// The attribute's value as text, if present.
    fn attribute(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl AttributeSource for HashMap<String, String> {
    fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl AttributeSource for BTreeMap<String, String> {
    fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl<T: AttributeSource + ?Sized> AttributeSource for &T {
    fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        (**self).attribute(key)
    }
}

/// One event as read from trace input: a flat JSON object of attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    pub attributes: serde_json::Map<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Event with the default activity and lifecycle attributes set.
    pub fn activity(name: &str, transition: &str) -> Self {
        Self::new()
            .with(DEFAULT_ACTIVITY_KEY, name)
            .with(DEFAULT_LIFECYCLE_KEY, transition)
    }
}

impl AttributeSource for Event {
    /// Strings are returned as-is. `null` counts as absent; any other value
    /// is rendered as its JSON text.
    fn attribute(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }
}

/// Maps events to labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventClassifier {
    activity_key: String,
    lifecycle_key: String,
    delimiter: String,
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_KEY, DEFAULT_LIFECYCLE_KEY, DEFAULT_DELIMITER)
    }
}

impl EventClassifier {
    pub fn new(
        activity_key: impl Into<String>,
        lifecycle_key: impl Into<String>,
        delimiter: impl Into<String>,
    ) -> Self {
        Self {
            activity_key: activity_key.into(),
            lifecycle_key: lifecycle_key.into(),
            delimiter: delimiter.into(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(
            config.activity_key.clone(),
            config.lifecycle_key.clone(),
            config.delimiter.clone(),
        )
    }

    pub fn activity_key(&self) -> &str {
        &self.activity_key
    }

    pub fn lifecycle_key(&self) -> &str {
        &self.lifecycle_key
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Label for a single event outside any trace.
    ///
    /// A missing attribute is reported with `event_index` 0.
    pub fn classify<E: AttributeSource + ?Sized>(&self, event: &E) -> Result<EventLabel> {
        self.classify_at(event, 0)
    }

    /// Label for the event at position `index` of its trace.
    pub fn classify_at<E: AttributeSource + ?Sized>(
        &self,
        event: &E,
        index: usize,
    ) -> Result<EventLabel> {
        let missing = |attribute: &str| {
            crate::log_event!(
                DEBUG,
                event_names::EVENT_UNCLASSIFIED,
                Stage::Classify,
                "event lacks a classifier attribute",
                attribute = attribute,
                event_index = index
            );
            Error::MissingAttribute {
                attribute: attribute.to_string(),
                event_index: index,
            }
        };
        let activity = event
            .attribute(&self.activity_key)
            .ok_or_else(|| missing(&self.activity_key))?;
        let transition = event
            .attribute(&self.lifecycle_key)
            .ok_or_else(|| missing(&self.lifecycle_key))?;

        let mut label =
            String::with_capacity(activity.len() + self.delimiter.len() + transition.len());
        label.push_str(&activity);
        label.push_str(&self.delimiter);
        label.push_str(&transition);
        Ok(EventLabel(label))
    }

    /// Labels for a whole trace, failing on the first unclassifiable event.
    pub fn classify_trace<E: AttributeSource>(&self, trace: &[E]) -> Result<Vec<EventLabel>> {
        trace
            .iter()
            .enumerate()
            .map(|(i, event)| self.classify_at(event, i))
            .collect()
    }
}
