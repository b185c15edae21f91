//! Review flow: load a job, edit a part, submit, mirror the result locally.

mod common;

use chrono::Utc;
use serde_json::json;

use common::{epoch, reviewed_job, BackendState, FakeBackend};
use partsdesk::models::UserRef;
use partsdesk::verification::display_data;
use partsdesk::{
    apply_verification, Action, JobDetailView, PartStatus, VerificationDraft, VerificationError,
};

async fn backend() -> FakeBackend {
    FakeBackend::start(BackendState::with_jobs(vec![]).with_detail(reviewed_job())).await
}

#[tokio::test]
async fn test_edit_submit_and_mirror() {
    let backend = backend().await;
    let client = backend.client();

    let detail = client.get_job("s-1").await.unwrap();
    let mut view = JobDetailView::new(detail, 2);
    let evaluation = view.evaluation().unwrap();
    assert!(evaluation.actions.contains(Action::ViewDetails));
    assert_eq!(view.total_pages(), 2);
    assert_eq!(view.page_parts().len(), 2);

    let mut draft = VerificationDraft::new(view.part("p-1").unwrap()).unwrap();
    assert!(!draft.is_verified());
    draft.set_field("title", json!("Centrifugal water pump"));
    draft.remove_field("price");
    assert!(draft.is_data_changed());

    let request = draft.submission();
    client.verify_part("p-1", &request).await.unwrap();
    let actor = client.current_user().await.unwrap();

    let part = view.part_mut("p-1").unwrap();
    let at = Utc::now();
    apply_verification(part, &request, &UserRef::from(&actor), at).unwrap();
    draft.mark_verified();

    let part = view.part("p-1").unwrap();
    assert_eq!(part.part_status().unwrap(), PartStatus::Verified);
    assert_eq!(part.verified_at, Some(at));
    assert_eq!(
        part.verified_by.as_ref().and_then(|u| u.id.as_deref()),
        Some("u-1")
    );
    // Corrections are stored next to the untouched enrichment
    assert_eq!(part.enriched().unwrap()["price"], json!(10));
    let shown = display_data(part);
    assert_eq!(shown["title"], json!("Centrifugal water pump"));
    assert!(!shown.contains_key("price"));

    assert!(draft.is_verified());
    assert!(!draft.can_submit());
}

#[tokio::test]
async fn test_reverify_without_edits_keeps_corrections() {
    let backend = backend().await;
    let client = backend.client();

    let detail = client.get_job("s-1").await.unwrap();
    let mut view = JobDetailView::new(detail, 10);

    let mut draft = VerificationDraft::new(view.part("p-2").unwrap()).unwrap();
    assert!(draft.is_verified());
    assert_eq!(draft.data()["title"], json!("Ball valve"));
    assert!(!draft.can_submit());

    // An edit reverted by hand is not a change
    draft.set_field("title", json!("Gate valve"));
    assert!(draft.can_submit());
    draft.set_field("title", json!("Ball valve"));
    assert!(!draft.is_data_changed());
    assert!(draft.submission().enriched_corrected_data.is_none());

    let request = draft.submission();
    client.verify_part("p-2", &request).await.unwrap();
    let part = view.part_mut("p-2").unwrap();
    apply_verification(part, &request, &UserRef::default(), epoch()).unwrap();

    let part = view.part("p-2").unwrap();
    assert_eq!(part.corrected().unwrap()["title"], json!("Ball valve"));
    assert_eq!(
        backend.state().verify_bodies[0].1,
        json!({"is_verified": true})
    );
}

#[tokio::test]
async fn test_not_found_part_stays_out_of_review() {
    let backend = backend().await;

    let detail = backend.client().get_job("s-1").await.unwrap();
    let view = JobDetailView::new(detail, 10);
    let part = view.part("p-3").unwrap();

    assert_eq!(
        VerificationDraft::new(part).unwrap_err(),
        VerificationError::NotVerifiable {
            part_id: "p-3".to_string()
        }
    );
    assert!(backend.state().verify_bodies.is_empty());
}

#[tokio::test]
async fn test_gallery_changes_are_written_back_to_the_part() {
    let backend = backend().await;
    let client = backend.client();
    let dir = tempfile::TempDir::new().unwrap();
    let image = dir.path().join("side.jpg");
    std::fs::write(&image, b"\xff\xd8\xff\xe0").unwrap();

    let detail = client.get_job("s-1").await.unwrap();
    let mut view = JobDetailView::new(detail, 10);

    let mut gallery = view.gallery("p-2").unwrap();
    assert!(gallery.is_empty());
    let added = client.add_part_image("p-2", &image).await.unwrap();
    gallery.apply_added(added);
    view.store_gallery(&gallery);

    let part = view.part("p-2").unwrap();
    assert_eq!(part.images.len(), 1);
    assert_eq!(part.images[0].part_id.as_deref(), Some("p-2"));
    assert_eq!(
        backend.state().image_uploads[0].content_type.as_deref(),
        Some("image/jpeg")
    );
}

#[tokio::test]
async fn test_unknown_part_status_is_flagged_in_detail() {
    let mut detail = reviewed_job();
    detail.parts[1].status = "lost".to_string();
    let backend = FakeBackend::start(BackendState::with_jobs(vec![]).with_detail(detail)).await;

    let view = JobDetailView::new(backend.client().get_job("s-1").await.unwrap(), 10);
    assert!(view.evaluation().unwrap().warnings.is_empty());

    let errors = view.part_integrity_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].value, "lost");
    assert_eq!(errors[0].record.as_deref(), Some("p-2"));
    assert!(VerificationDraft::new(view.part("p-2").unwrap()).is_err());
}
