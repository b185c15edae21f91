//! Part verification: the reviewer's draft and the merge rule for stored data.
//!
//! Three mappings exist per part. `scraped_data` and `enriched_data` are
//! produced by the backend and never touched here. `enriched_corrected_data`
//! holds the reviewer's corrections and is only written when the reviewer
//! actually changed something.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::{FieldMap, PartRecord, UserRef, VerifyRequest};
use crate::status::{PartStatus, UnknownStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    #[error("Part {part_id} was not found by the scraper and cannot be verified")]
    NotVerifiable { part_id: String },

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
}

/// The mapping shown to the reviewer: corrections, then enrichment, then empty.
pub fn display_data(part: &PartRecord) -> FieldMap {
    part.corrected()
        .or_else(|| part.enriched())
        .unwrap_or_default()
}

fn ensure_verifiable(part: &PartRecord) -> Result<PartStatus, VerificationError> {
    let status = part.part_status()?;
    if !status.is_verifiable() {
        return Err(VerificationError::NotVerifiable {
            part_id: part.id.clone(),
        });
    }
    Ok(status)
}

/// Editing state of one part under review.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationDraft {
    part_id: String,
    baseline: FieldMap,
    data: FieldMap,
    is_data_changed: bool,
    is_verified: bool,
}

impl VerificationDraft {
    pub fn new(part: &PartRecord) -> Result<Self, VerificationError> {
        let status = ensure_verifiable(part)?;
        let baseline = display_data(part);
        Ok(Self {
            part_id: part.id.clone(),
            data: baseline.clone(),
            baseline,
            is_data_changed: false,
            is_verified: status == PartStatus::Verified,
        })
    }

    pub fn part_id(&self) -> &str {
        &self.part_id
    }

    /// Current (possibly edited) mapping.
    pub fn data(&self) -> &FieldMap {
        &self.data
    }

    pub fn is_data_changed(&self) -> bool {
        self.is_data_changed
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    /// Sets a single field. Setting it back to its stored value clears the
    /// changed flag again.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.refresh_changed();
    }

    pub fn remove_field(&mut self, key: &str) {
        self.data.remove(key);
        self.refresh_changed();
    }

    /// Replaces the whole mapping, as a form editor submitting all fields would.
    pub fn replace_data(&mut self, data: FieldMap) {
        self.data = data;
        self.refresh_changed();
    }

    fn refresh_changed(&mut self) {
        self.is_data_changed = self.data != self.baseline;
    }

    /// Submit is offered while the part is unverified or has edits.
    pub fn can_submit(&self) -> bool {
        !self.is_verified || self.is_data_changed
    }

    /// Request body for the verify call. Unchanged data is left out so the
    /// stored corrections stay as they are.
    pub fn submission(&self) -> VerifyRequest {
        VerifyRequest {
            is_verified: true,
            enriched_corrected_data: self.is_data_changed.then(|| self.data.clone()),
        }
    }

    /// Records a successful submit: the edited mapping becomes the new
    /// baseline and the draft is verified.
    pub fn mark_verified(&mut self) {
        self.baseline = self.data.clone();
        self.is_data_changed = false;
        self.is_verified = true;
    }
}

/// Applies an accepted verification to a locally cached part.
///
/// Corrections are stored only when the request carries them; the original
/// enrichment is left untouched either way.
pub fn apply_verification(
    part: &mut PartRecord,
    request: &VerifyRequest,
    actor: &UserRef,
    at: DateTime<Utc>,
) -> Result<(), VerificationError> {
    ensure_verifiable(part)?;

    if let Some(corrected) = &request.enriched_corrected_data {
        part.enriched_corrected_data = Some(Value::Object(
            corrected
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ));
    }

    if request.is_verified {
        part.status = PartStatus::Verified.as_str().to_string();
        part.verified_by = Some(actor.clone());
        part.verified_at = Some(at);
        log::debug!("Part {} verified by {}", part.id, actor.display_name());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn part(status: &str, enriched: Value) -> PartRecord {
        serde_json::from_value(json!({
            "id": "p-1",
            "code": "AB-1",
            "status": status,
            "scraped_data": {"a": 1},
            "enriched_data": enriched,
        }))
        .unwrap()
    }

    fn reviewer() -> UserRef {
        UserRef {
            id: Some("u-1".to_string()),
            email: Some("reviewer@example.com".to_string()),
            full_name: None,
        }
    }

    #[test]
    fn test_display_data_prefers_corrections() {
        let mut p = part("enriched", json!({"a": 1}));
        assert_eq!(display_data(&p)["a"], json!(1));

        p.enriched_corrected_data = Some(json!("{\"a\": 3}"));
        assert_eq!(display_data(&p)["a"], json!(3));

        p.enriched_corrected_data = None;
        p.enriched_data = None;
        assert!(display_data(&p).is_empty());
    }

    #[test]
    fn test_not_found_part_cannot_be_drafted() {
        let p = part("not_found", Value::Null);
        assert_eq!(
            VerificationDraft::new(&p).unwrap_err(),
            VerificationError::NotVerifiable {
                part_id: "p-1".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_part_status_is_rejected() {
        let p = part("lost", Value::Null);
        assert!(matches!(
            VerificationDraft::new(&p),
            Err(VerificationError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_unchanged_submission_omits_corrections() {
        let draft = VerificationDraft::new(&part("enriched", json!({"a": 1}))).unwrap();
        assert!(draft.can_submit());
        let request = draft.submission();
        assert!(request.is_verified);
        assert!(request.enriched_corrected_data.is_none());
    }

    #[test]
    fn test_edit_back_to_original_is_unchanged() {
        let mut draft = VerificationDraft::new(&part("enriched", json!({"a": 1}))).unwrap();
        draft.set_field("a", json!(2));
        assert!(draft.is_data_changed());
        draft.set_field("a", json!(1));
        assert!(!draft.is_data_changed());
    }

    #[test]
    fn test_verified_draft_only_submits_with_changes() {
        let mut draft = VerificationDraft::new(&part("verified", json!({"a": 1}))).unwrap();
        assert!(!draft.can_submit());
        draft.set_field("b", json!("x"));
        assert!(draft.can_submit());
        draft.mark_verified();
        assert!(!draft.can_submit());
        assert_eq!(draft.data()["b"], json!("x"));
    }

    #[test]
    fn test_unchanged_verify_twice_keeps_corrections_null() {
        let mut p = part("enriched", json!({"a": 1}));
        let first = Utc::now();
        let second = first + Duration::seconds(5);

        for at in [first, second] {
            let draft = VerificationDraft::new(&p).unwrap();
            apply_verification(&mut p, &draft.submission(), &reviewer(), at).unwrap();
            assert!(p.enriched_corrected_data.is_none());
            assert_eq!(p.verified_at, Some(at));
        }

        assert!(p.verified_at.unwrap() > first);
        assert_eq!(p.part_status().unwrap(), PartStatus::Verified);
        assert_eq!(p.verified_by, Some(reviewer()));
    }

    #[test]
    fn test_edit_stores_corrections_without_touching_enrichment() {
        let mut p = part("enriched", json!({"a": 1}));
        let mut draft = VerificationDraft::new(&p).unwrap();
        draft.set_field("a", json!(2));

        apply_verification(&mut p, &draft.submission(), &reviewer(), Utc::now()).unwrap();
        draft.mark_verified();

        assert_eq!(p.corrected().unwrap()["a"], json!(2));
        assert_eq!(p.enriched().unwrap()["a"], json!(1));
        assert_eq!(p.scraped().unwrap()["a"], json!(1));
        assert!(!draft.is_data_changed());
    }

    #[test]
    fn test_apply_rejects_not_found() {
        let mut p = part("not_found", Value::Null);
        let request = VerifyRequest {
            is_verified: true,
            enriched_corrected_data: None,
        };
        assert!(apply_verification(&mut p, &request, &reviewer(), Utc::now()).is_err());
        assert!(p.verified_at.is_none());
    }
}
