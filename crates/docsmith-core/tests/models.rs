use docsmith_core::error::{PREVIEW_LIMIT, truncate_preview};
use docsmith_core::models::content::{ContentOrigin, TemplateContentVersion};
use docsmith_core::models::render::{PdfArtifact, RenderMode, RenderRequest, RenderResponseEnvelope};
use docsmith_core::models::session::{Session, WizardStep};
use docsmith_core::{ClassifiedError, ErrorKind};

#[test]
fn by_content_request_requires_non_empty_content() {
    let err = RenderRequest::by_content("standard_invoice", "  \n ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);

    let request = RenderRequest::by_content("standard_invoice", "<fo:root/>").unwrap();
    assert_eq!(request.mode(), RenderMode::ByContent);
    assert_eq!(request.content(), Some("<fo:root/>"));
}

#[test]
fn by_name_request_requires_a_valid_id() {
    assert!(RenderRequest::by_name("").is_err());
    let request = RenderRequest::by_name("oto_box_label").unwrap();
    assert_eq!(request.mode(), RenderMode::ByName);
    assert_eq!(request.content(), None);
}

#[test]
fn envelope_header_lookup_ignores_case() {
    let envelope = RenderResponseEnvelope::new(200, Vec::new(), b"x".to_vec())
        .with_header("Content-Type", "text/plain; charset=utf-8");
    assert_eq!(envelope.content_type(), Some("text/plain; charset=utf-8"));
    assert_eq!(envelope.header("CONTENT-TYPE"), envelope.content_type());
    assert_eq!(envelope.header("x-missing"), None);
}

#[test]
fn decoded_artifacts_must_carry_the_signature() {
    assert!(PdfArtifact::from_decoded(b"not a pdf".to_vec()).is_none());

    let artifact = PdfArtifact::from_decoded(b"%PDF-1.7\n".to_vec()).unwrap();
    assert!(artifact.has_signature());
    assert_eq!(artifact.size_bytes(), 9);
}

#[test]
fn declared_artifacts_keep_bytes_without_the_signature() {
    let artifact = PdfArtifact::from_declared(b"garbage".to_vec());
    assert!(!artifact.has_signature());
    assert_eq!(artifact.bytes(), b"garbage");
}

#[test]
fn session_serializes_with_camel_case_keys() {
    let session = Session {
        step: WizardStep::Customize,
        selected_template_id: Some("t1".to_string()),
        original_content: Some(TemplateContentVersion::original("t1", "<a/>")),
        modified_content: None,
        last_prompt: "add a logo".to_string(),
    };
    let json = serde_json::to_value(&session).unwrap();
    let obj = json.as_object().unwrap();
    for key in ["step", "selectedTemplateId", "originalContent", "modifiedContent", "lastPrompt"] {
        assert!(obj.contains_key(key), "missing key {key}");
    }
    assert_eq!(json["step"], "customize");
    assert_eq!(json["originalContent"]["origin"], "original");

    let back: Session = serde_json::from_value(json).unwrap();
    assert_eq!(back, session);
}

#[test]
fn fetched_flag_tracks_the_selected_template() {
    let mut session = Session {
        selected_template_id: Some("b".to_string()),
        original_content: Some(TemplateContentVersion::original("a", "<a/>")),
        ..Session::default()
    };
    assert!(!session.has_fetched_selected());

    session.original_content = Some(TemplateContentVersion::original("b", "<b/>"));
    assert!(session.has_fetched_selected());
    assert_eq!(
        session.original_content.as_ref().map(|c| c.origin()),
        Some(ContentOrigin::Original)
    );
}

#[test]
fn guidance_separates_transient_from_deterministic() {
    let transient = ClassifiedError::network("rendering service unreachable");
    let rejected = ClassifiedError::rejected(Some(500), "boom", None);
    let unavailable = ClassifiedError::rejected(Some(503), "down", None);

    assert!(transient.is_transient());
    assert!(transient.user_guidance().contains("retrying later may help"));
    assert!(!rejected.is_transient());
    assert!(rejected.user_guidance().contains("will not help"));
    assert!(unavailable.is_service_unavailable());
    assert!(!rejected.is_service_unavailable());
}

#[test]
fn preview_truncates_on_char_boundaries() {
    let long = "é".repeat(PREVIEW_LIMIT + 10);
    let preview = truncate_preview(&long, PREVIEW_LIMIT);
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), PREVIEW_LIMIT + 3);
    assert_eq!(truncate_preview("short", PREVIEW_LIMIT), "short");
}
