//! Deployment descriptor
//!
//! Uses serde_yaml to hold the whole document as a [`Value`] tree, so fields
//! the engine does not understand survive parse → edit → serialize verbatim.
//! Mapping key order is kept on output; equality ignores it.

use crate::error::{HealError, ParseError, SerializeError};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Path of the container list inside a deployment
pub const CONTAINERS_PATH: &str = "spec.template.spec.containers";

/// Path of the first container's resource block
pub const FIRST_CONTAINER_RESOURCES_PATH: &str = "spec.template.spec.containers[0].resources";

/// Parsed workload descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    root: Value,
}

impl Descriptor {
    /// Parse descriptor text
    ///
    /// Fails fast on invalid YAML, on empty input and on multi-document
    /// streams; a partial structure is never returned.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut documents = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(doc).map_err(|e| ParseError::syntax(e.to_string()))?;
            documents.push(value);
        }

        if documents.iter().all(Value::is_null) {
            return Err(ParseError::Empty);
        }
        if documents.len() > 1 {
            return Err(ParseError::MultipleDocuments(documents.len()));
        }

        let root = documents.pop().ok_or(ParseError::Empty)?;
        Ok(Self { root })
    }

    /// Wrap an already-built value
    #[inline]
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Serialize back to YAML text
    pub fn to_yaml(&self) -> Result<String, SerializeError> {
        serde_yaml::to_string(&self.root).map_err(|e| SerializeError::SerializationFailed(e.to_string()))
    }

    /// Root value
    #[inline]
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Consume into root value
    #[inline]
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Get value at a dotted path
    ///
    /// Segments may carry a sequence index: `spec.template.spec.containers[0].image`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            let (key, index) = split_segment(segment)?;
            if !key.is_empty() {
                current = current.as_mapping()?.get(key)?;
            }
            if let Some(index) = index {
                current = current.as_sequence()?.get(index)?;
            }
        }
        Some(current)
    }

    /// Get scalar at a dotted path rendered as text
    #[must_use]
    pub fn get_text(&self, path: &str) -> Option<String> {
        self.get_path(path).and_then(scalar_text)
    }

    /// Containers of the pod template
    pub fn containers(&self) -> Result<&[Value], HealError> {
        self.get_path(CONTAINERS_PATH)
            .ok_or_else(|| HealError::MissingField(CONTAINERS_PATH.to_string()))?
            .as_sequence()
            .map(Vec::as_slice)
            .ok_or_else(|| HealError::NotASequence(CONTAINERS_PATH.to_string()))
    }

    /// Mutable containers of the pod template
    pub fn containers_mut(&mut self) -> Result<&mut Vec<Value>, HealError> {
        let mut current = &mut self.root;
        let mut walked = String::new();
        for segment in CONTAINERS_PATH.split('.') {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
            current = current
                .as_mapping_mut()
                .ok_or_else(|| HealError::NotAMapping(walked.clone()))?
                .get_mut(segment)
                .ok_or_else(|| HealError::MissingField(walked.clone()))?;
        }
        current
            .as_sequence_mut()
            .ok_or_else(|| HealError::NotASequence(CONTAINERS_PATH.to_string()))
    }

    /// Number of containers, zero if the list is absent
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers().map_or(0, <[Value]>::len)
    }
}

/// Split `name[3]` into (`name`, `Some(3)`)
fn split_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.split_once('[') {
        None => Some((segment, None)),
        Some((key, rest)) => {
            let index = rest.strip_suffix(']')?.parse().ok()?;
            Some((key, Some(index)))
        }
    }
}

/// Render a scalar as text; `None` for null, sequences and mappings
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Render any value for logs and skip markers
#[must_use]
pub fn display_value(value: &Value) -> String {
    scalar_text(value).unwrap_or_else(|| {
        serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

/// Get a child mapping by key, creating it (or replacing a null) when absent
pub(crate) fn ensure_mapping<'m>(
    map: &'m mut Mapping,
    key: &str,
    path: &str,
) -> Result<&'m mut Mapping, HealError> {
    let slot = map
        .entry(Value::from(key))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if slot.is_null() {
        *slot = Value::Mapping(Mapping::new());
    }
    slot.as_mapping_mut()
        .ok_or_else(|| HealError::NotAMapping(path.to_string()))
}
