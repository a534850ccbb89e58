//! Tamper-evident audit trail
//!
//! Every healing cycle appends one [`RemediationAction`]. Entries are chained
//! with SHA-256: each entry hashes its own action together with the previous
//! entry's hash, so editing or reordering any entry breaks
//! [`AuditTrail::verify_integrity`].

use crate::error::AuditError;
use kubeheal_core::{ActionId, RemediationAction};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash that precedes the first entry
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// One chained audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the trail, starting at 0
    pub sequence: u64,
    /// Recorded action
    pub action: RemediationAction,
    /// Hex hash of the previous entry
    pub prev_hash: String,
    /// Hex hash of this entry
    pub hash: String,
}

/// Ordered append-only log of remediation actions
#[derive(Debug, Default)]
pub struct AuditTrail {
    inner: Mutex<Vec<AuditEntry>>,
}

impl AuditTrail {
    /// Create empty trail
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action, chaining it to the last entry
    pub fn append(&self, action: RemediationAction) -> ActionId {
        let mut guard = self.inner.lock();
        // A stored hash that no longer decodes is caught by verify_integrity.
        let prev = guard
            .last()
            .and_then(|e| decode_hash(&e.hash).ok())
            .unwrap_or(GENESIS_HASH);
        let sequence = guard.len() as u64;
        let hash = compute_hash(sequence, &prev, &action);
        let id = action.id;

        guard.push(AuditEntry {
            sequence,
            action,
            prev_hash: hex::encode(prev),
            hash: hex::encode(hash),
        });
        tracing::debug!(%id, sequence, "audit entry appended");
        id
    }

    /// Snapshot of the entries
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().clone()
    }

    /// Snapshot of the recorded actions, oldest first
    #[must_use]
    pub fn actions(&self) -> Vec<RemediationAction> {
        self.inner.lock().iter().map(|e| e.action.clone()).collect()
    }

    /// Most recent action
    #[must_use]
    pub fn last(&self) -> Option<RemediationAction> {
        self.inner.lock().last().map(|e| e.action.clone())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the trail is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Recompute the hash chain
    ///
    /// # Errors
    /// Returns [`AuditError::IntegrityViolation`] naming the first entry whose
    /// link or hash does not match.
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = GENESIS_HASH;
        for (index, entry) in guard.iter().enumerate() {
            let violation = AuditError::IntegrityViolation { index };
            if entry.sequence != index as u64 || entry.prev_hash != hex::encode(prev) {
                return Err(violation);
            }
            let expected = compute_hash(entry.sequence, &prev, &entry.action);
            if entry.hash != hex::encode(expected) {
                return Err(violation);
            }
            prev = expected;
        }
        Ok(())
    }

    /// Export the entries as pretty-printed JSON
    ///
    /// # Errors
    /// Returns [`AuditError::Export`] when serialization fails.
    pub fn to_json(&self) -> Result<String, AuditError> {
        let guard = self.inner.lock();
        serde_json::to_string_pretty(&*guard).map_err(|e| AuditError::Export(e.to_string()))
    }
}

fn decode_hash(text: &str) -> Result<[u8; 32], hex::FromHexError> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(text, &mut out)?;
    Ok(out)
}

fn compute_hash(sequence: u64, prev_hash: &[u8; 32], action: &RemediationAction) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(action.id.to_string().as_bytes());
    hasher.update([0]);
    hasher.update(action.timestamp.to_rfc3339().as_bytes());
    hasher.update([0]);
    hasher.update(action.failure_type.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(action.root_cause.as_bytes());
    hasher.update([0]);
    hasher.update([action.confidence]);
    for m in &action.modifications {
        hasher.update(m.field.as_bytes());
        hasher.update([0]);
        hasher.update(m.old_value.as_bytes());
        hasher.update([0]);
        hasher.update(m.new_value.as_bytes());
        hasher.update([0]);
        hasher.update(m.container_name.as_deref().unwrap_or_default().as_bytes());
        hasher.update([1]);
    }
    for s in &action.skipped {
        hasher.update(s.field.as_bytes());
        hasher.update([0]);
        hasher.update(s.value.as_bytes());
        hasher.update([0]);
        hasher.update(s.reason.as_bytes());
        hasher.update([0]);
        hasher.update(s.container_name.as_deref().unwrap_or_default().as_bytes());
        hasher.update([2]);
    }
    hasher.update(action.rationale.as_bytes());
    hasher.update([0]);
    hasher.update(action.risk_level.as_str().as_bytes());
    hasher.update(prev_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeheal_core::{DiagnosisResult, FailureType, Modification};

    fn action(field: &str) -> RemediationAction {
        let diagnosis = DiagnosisResult::baseline(FailureType::OomKilled);
        RemediationAction::from_diagnosis(
            &diagnosis,
            vec![Modification::new(field, "512Mi", "1024Mi").in_container(Some("api".into()))],
            vec![],
        )
    }

    #[test]
    fn empty_trail_verifies() {
        let trail = AuditTrail::new();
        assert!(trail.is_empty());
        assert!(trail.verify_integrity().is_ok());
        assert_eq!(trail.to_json().unwrap(), "[]");
    }

    #[test]
    fn entries_are_chained() {
        let trail = AuditTrail::new();
        let first = trail.append(action("a"));
        let second = trail.append(action("b"));

        let entries = trail.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action.id, first);
        assert_eq!(entries[1].action.id, second);
        assert_eq!(entries[0].prev_hash, hex::encode(GENESIS_HASH));
        assert_eq!(entries[1].prev_hash, entries[0].hash);
        assert!(trail.verify_integrity().is_ok());
    }

    #[test]
    fn tampered_action_is_detected() {
        let trail = AuditTrail::new();
        trail.append(action("a"));
        trail.append(action("b"));
        trail.append(action("c"));

        trail.inner.lock()[1].action.modifications[0].new_value = "64Gi".to_string();
        assert_eq!(
            trail.verify_integrity(),
            Err(AuditError::IntegrityViolation { index: 1 })
        );
    }

    #[test]
    fn removed_entry_is_detected() {
        let trail = AuditTrail::new();
        trail.append(action("a"));
        trail.append(action("b"));
        trail.append(action("c"));

        trail.inner.lock().remove(0);
        assert_eq!(
            trail.verify_integrity(),
            Err(AuditError::IntegrityViolation { index: 0 })
        );
    }

    #[test]
    fn json_export_lists_actions() {
        let trail = AuditTrail::new();
        trail.append(action("spec.template.spec.containers[0].resources.limits.memory"));

        let json: serde_json::Value = serde_json::from_str(&trail.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["sequence"], 0);
        assert_eq!(json[0]["action"]["failure_type"], "OOMKilled");
        assert_eq!(json[0]["action"]["modifications"][0]["new_value"], "1024Mi");
        assert_eq!(json[0]["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn last_and_actions_snapshot() {
        let trail = AuditTrail::new();
        assert!(trail.last().is_none());
        trail.append(action("a"));
        let id = trail.append(action("b"));
        assert_eq!(trail.last().unwrap().id, id);
        assert_eq!(trail.actions().len(), 2);
    }
}
