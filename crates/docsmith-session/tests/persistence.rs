use docsmith_core::models::session::{Session, WizardStep};
use docsmith_session::{FileSessionPersistence, SessionError, SessionPersistence, SessionStore};

#[test]
fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = FileSessionPersistence::new(dir.path().join("session.json"));
    assert!(persistence.load().unwrap().is_none());
}

#[test]
fn file_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    {
        let mut store = SessionStore::start_fresh(FileSessionPersistence::new(&path)).unwrap();
        store.select_template("invoice").unwrap();
        store.set_original_content("<fo:root/>").unwrap();
        store.advance_step().unwrap();
        store.set_modified_content("<fo:root>blue</fo:root>").unwrap();
        store.set_last_prompt("make it blue").unwrap();
    }

    let store = SessionStore::resume(FileSessionPersistence::new(&path)).unwrap();
    let session = store.session();
    assert_eq!(session.step, WizardStep::Customize);
    assert_eq!(session.last_prompt, "make it blue");
    assert_eq!(
        session.modified_content.as_ref().unwrap().text(),
        "<fo:root>blue</fo:root>"
    );
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn saved_file_uses_session_keys_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let persistence = FileSessionPersistence::new(&path);
    persistence.save(&Session::default()).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["sessionVersion"], 1);
    assert_eq!(raw["step"], "select_template");
    assert!(raw.get("selectedTemplateId").is_some());
    assert!(raw.get("originalContent").is_some());
    assert!(raw.get("modifiedContent").is_some());
    assert_eq!(raw["lastPrompt"], "");
}

#[test]
fn retreat_is_reflected_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let mut store = SessionStore::start_fresh(FileSessionPersistence::new(&path)).unwrap();
    store.select_template("invoice").unwrap();
    store.set_original_content("<fo:root/>").unwrap();
    store.advance_step().unwrap();
    store.retreat_step().unwrap();

    let on_disk = FileSessionPersistence::new(&path).load().unwrap().unwrap();
    assert_eq!(on_disk, Session::default());
}

#[test]
fn unversioned_file_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(
        &path,
        r#"{"step":"select_template","selectedTemplateId":"invoice","originalContent":null,"modifiedContent":null}"#,
    )
    .unwrap();

    let session = FileSessionPersistence::new(&path).load().unwrap().unwrap();
    assert_eq!(session.selected_template_id.as_deref(), Some("invoice"));
    assert!(session.last_prompt.is_empty());
}

#[test]
fn newer_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"sessionVersion":99,"step":"customize"}"#).unwrap();

    let err = FileSessionPersistence::new(&path).load().unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnsupportedVersion {
            found: 99,
            supported: 1
        }
    ));
}

#[test]
fn version_beyond_u32_is_refused_not_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"sessionVersion":4294967297,"step":"customize"}"#).unwrap();

    let err = FileSessionPersistence::new(&path).load().unwrap_err();
    assert!(matches!(
        err,
        SessionError::UnsupportedVersion {
            found: u32::MAX,
            supported: 1
        }
    ));
}

#[test]
fn fresh_start_replaces_a_damaged_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{").unwrap();
    assert!(matches!(
        SessionStore::resume(FileSessionPersistence::new(&path)),
        Err(SessionError::Serialization(_))
    ));

    let store = SessionStore::start_fresh(FileSessionPersistence::new(&path)).unwrap();
    assert_eq!(store.session(), &Session::default());

    let resumed = SessionStore::resume(FileSessionPersistence::new(&path)).unwrap();
    assert_eq!(resumed.session(), &Session::default());
}

#[cfg(unix)]
#[test]
fn session_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    FileSessionPersistence::new(&path)
        .save(&Session::default())
        .unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
