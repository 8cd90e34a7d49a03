//! Editor Integration Tests
//!
//! Drives the public API end to end:
//! - Portable form round trips
//! - Undo/redo over runtime mutations
//! - Property effects surviving serialization
//! - Viewport scaling leaving document coordinates alone

use invite_core::properties::{default_shadow, PropertyIntent};
use invite_core::{
    deserialize, serialize, CanvasRuntime, EditorError, EditorSession, HistoryState,
    ObjectKind, ObjectPatch, ObjectSpec, ReorderDirection, SceneDocument, SessionConfig,
    ViewportConfig, ViewportTransform,
};
use serde_json::json;

/// A session over an empty document.
fn empty_session() -> EditorSession {
    EditorSession::new(SceneDocument::new(), SessionConfig::default())
}

/// A document with one of every kind.
fn mixed_document() -> SceneDocument {
    let mut runtime = CanvasRuntime::new();
    runtime.add_object(ObjectSpec::text("Save the date").at(120.0, 80.0));
    runtime.add_object(ObjectSpec::image("https://cdn.example/flowers.png", 400.0, 300.0));
    let rect = runtime.add_object(ObjectSpec::rect(200.0, 40.0).at(10.0, 700.0));
    runtime
        .set_property(
            &rect,
            &serde_json::from_value::<ObjectPatch>(json!({
                "angle": 15.0, "flipX": true, "opacity": 0.4, "stroke": "#333333", "strokeWidth": 3
            }))
            .expect("patch"),
        )
        .expect("set");
    runtime.add_object(ObjectSpec::circle(25.0).at(300.0, 300.0));
    runtime.add_object(ObjectSpec::group(vec![
        ObjectSpec::rect(10.0, 10.0).at(50.0, 50.0),
        ObjectSpec::circle(5.0).at(70.0, 70.0),
    ]));
    runtime.document().clone()
}

// ==========================================================================
// Serialization
// ==========================================================================

#[test]
fn test_round_trip_preserves_everything() {
    let document = mixed_document();
    let restored = deserialize(&serialize(&document)).expect("round trip");
    assert_eq!(restored, document);
}

#[test]
fn test_hello_text_survives_fresh_runtime() {
    let mut runtime = CanvasRuntime::new();
    runtime.add_object(ObjectSpec::text("Hello").at(42.0, 84.0));
    let form = serialize(runtime.document());

    let fresh = CanvasRuntime::with_document(deserialize(&form).expect("load"));
    let objects = fresh.document().objects();
    assert_eq!(objects.len(), 1);
    let ObjectKind::Text(text) = &objects[0].kind else {
        panic!("expected text, got {:?}", objects[0].kind);
    };
    assert_eq!(text.text, "Hello");
    assert!((objects[0].geometry.x - 42.0).abs() < f64::EPSILON);
    assert!((objects[0].geometry.y - 84.0).abs() < f64::EPSILON);
}

#[test]
fn test_stored_shape_is_accepted_verbatim() {
    let form = json!({
        "version": "1",
        "background": "#FFF8F0",
        "objects": [
            {"id": "title", "kind": "text", "x": 10, "y": 20, "width": 300, "height": 54,
             "text": "You're invited", "fontWeight": 700, "futureField": {"a": 1}}
        ]
    });
    let document = deserialize(&form).expect("load");
    let again = serialize(&document);
    assert_eq!(again["objects"][0]["id"], "title");
    assert_eq!(again["objects"][0]["fontWeight"], 700);
    assert_eq!(again["background"], "#FFF8F0");
}

#[test]
fn test_missing_geometry_is_malformed() {
    let form = json!({"objects": [{"id": "a", "kind": "rect", "x": 1, "y": 2, "width": 3}]});
    let err = deserialize(&form).expect_err("height missing");
    assert!(matches!(err, EditorError::MalformedDocument(_)));
    assert!(err.is_document_corruption());
}

// ==========================================================================
// History
// ==========================================================================

#[test]
fn test_add_delete_undo_sequence() {
    let mut session = empty_session();
    let a = session.add(ObjectSpec::rect(50.0, 50.0));
    assert!(session.runtime_mut().remove_object(&a));
    assert_eq!(session.history_len(), 3);

    assert!(session.undo().expect("undo"));
    assert!(session.document().get(&a).is_some());

    assert!(session.undo().expect("undo"));
    assert!(session.document().is_empty());
    assert_eq!(session.history_state(), HistoryState::AtEarliest);

    assert!(!session.undo().expect("no-op undo"));
    assert!(session.document().is_empty());
}

#[test]
fn test_undo_redo_inverse() {
    let mut session = empty_session();
    let d0 = session.document().clone();

    let t = session.add(ObjectSpec::text("One"));
    let r = session.add(ObjectSpec::rect(10.0, 10.0));
    session
        .runtime_mut()
        .set_property(&t, &ObjectPatch::position(99.0, 11.0))
        .expect("move");
    session.runtime_mut().reorder(&r, ReorderDirection::Backward);
    session
        .runtime_mut()
        .set_background(invite_core::Background::Color("#E3F2FD".into()));
    let dn = session.document().clone();

    for _ in 0..5 {
        assert!(session.undo().expect("undo"));
    }
    assert_eq!(session.document(), &d0);
    for _ in 0..5 {
        assert!(session.redo().expect("redo"));
    }
    assert_eq!(session.document(), &dn);
}

#[test]
fn test_identical_property_write_adds_no_entry() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::rect(10.0, 10.0).at(5.0, 5.0));
    let before = session.history_len();
    session
        .runtime_mut()
        .set_property(&id, &ObjectPatch::position(5.0, 5.0))
        .expect("same values");
    assert_eq!(session.history_len(), before);
}

#[test]
fn test_new_edit_after_undo_discards_future() {
    let mut session = empty_session();
    session.add(ObjectSpec::rect(10.0, 10.0));
    session.add(ObjectSpec::rect(20.0, 20.0));
    session.undo().expect("undo");
    session.add(ObjectSpec::circle(4.0));

    assert!(!session.can_redo());
    assert!(!session.redo().expect("redo"));
    assert_eq!(session.history_state(), HistoryState::AtLatest);
}

#[test]
fn test_history_entry_tracks_cursor() {
    let mut session = empty_session();
    session.add(ObjectSpec::rect(10.0, 10.0));
    let entry = session.history_entry().expect("entry");
    assert_eq!(entry.index, 1);
    assert_eq!(entry.snapshot, session.serialize());

    session.undo().expect("undo");
    let entry = session.history_entry().expect("entry");
    assert_eq!(entry.index, 0);
    assert_eq!(entry.snapshot["objects"], json!([]));
}

#[test]
fn test_text_edit_ended_by_runtime_keeps_recording() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::text("Hi"));
    session.begin_text_edit(&id).expect("edit");
    session.runtime_mut().select(None);

    let before = session.history_len();
    session
        .runtime_mut()
        .set_property(&id, &ObjectPatch::position(40.0, 40.0))
        .expect("move");
    session.runtime_mut().add_object(ObjectSpec::rect(5.0, 5.0));
    assert_eq!(session.history_len(), before + 2);

    assert!(session.undo().expect("undo"));
    assert_eq!(session.document().len(), 1);
}

// ==========================================================================
// Properties
// ==========================================================================

#[test]
fn test_shadow_defaults_round_trip_then_clear() {
    let mut session = empty_session();
    session.add(ObjectSpec::text("Party"));
    session
        .apply_intent(&PropertyIntent::SetShadow(true))
        .expect("enable");

    let form = session.serialize();
    assert_eq!(
        form["objects"][0]["shadow"],
        json!({"color": "rgba(0,0,0,0.3)", "blur": 10.0, "offsetX": 5.0, "offsetY": 5.0})
    );
    let restored = deserialize(&form).expect("load");
    assert_eq!(restored.objects()[0].style.shadow, Some(default_shadow()));

    session
        .apply_intent(&PropertyIntent::SetShadow(false))
        .expect("disable");
    assert!(session.serialize()["objects"][0]["shadow"].is_null());
}

#[test]
fn test_letter_spacing_clamped_in_document() {
    let mut session = empty_session();
    session.add(ObjectSpec::text("Wide"));
    session
        .apply_intent(&PropertyIntent::SetCharSpacing(1500.0))
        .expect("set");
    assert_eq!(session.serialize()["objects"][0]["charSpacing"], json!(1000.0));
}

#[test]
fn test_raw_patch_clamps_text_metrics() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::text("Wide"));
    let patch: ObjectPatch =
        serde_json::from_value(json!({"charSpacing": 5000, "lineHeight": 9})).expect("patch");
    session.runtime_mut().set_property(&id, &patch).expect("set");

    let form = session.serialize();
    assert_eq!(form["objects"][0]["charSpacing"], json!(1000.0));
    assert_eq!(form["objects"][0]["lineHeight"], json!(3.0));
}

#[test]
fn test_non_finite_shadow_rejected_and_history_intact() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::rect(10.0, 10.0));
    let before = session.history_len();
    let patch = ObjectPatch {
        shadow: Some(Some(invite_core::Shadow {
            color: "black".to_string(),
            blur: f64::NAN,
            offset_x: 0.0,
            offset_y: 0.0,
        })),
        ..ObjectPatch::default()
    };
    assert!(matches!(
        session.runtime_mut().set_property(&id, &patch),
        Err(EditorError::InvalidOperation(_))
    ));
    assert_eq!(session.history_len(), before);

    assert!(session.undo().expect("undo"));
    assert!(session.document().is_empty());
}

#[test]
fn test_circle_resize_moves_serialized_radius() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::circle(20.0));
    let patch = ObjectPatch {
        width: Some(200.0),
        height: Some(200.0),
        ..ObjectPatch::default()
    };
    session.runtime_mut().set_property(&id, &patch).expect("resize");

    let form = session.serialize();
    assert_eq!(form["objects"][0]["radius"], json!(100.0));
    let restored = deserialize(&form).expect("load");
    assert!((restored.objects()[0].geometry.inscribed_radius() - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_set_property_unknown_id_is_an_error_but_delete_is_not() {
    let mut session = empty_session();
    let id = session.add(ObjectSpec::rect(1.0, 1.0));
    assert!(session.runtime_mut().remove_object(&id));
    assert!(!session.runtime_mut().remove_object(&id));
    assert!(matches!(
        session.runtime_mut().set_property(&id, &ObjectPatch::position(0.0, 0.0)),
        Err(EditorError::ObjectNotFound(_))
    ));
}

// ==========================================================================
// Viewport
// ==========================================================================

#[test]
fn test_resize_scale_transitions_without_touching_geometry() {
    let mut session = EditorSession::new(
        SceneDocument::new(),
        SessionConfig {
            viewport: ViewportConfig { padding: 0.0 },
            ..SessionConfig::default()
        },
    );
    let id = session.add(ObjectSpec::rect(100.0, 100.0).at(250.0, 350.0));
    let before = session.serialize();

    let wide = session.resize(1200.0, 900.0);
    assert!((wide.scale - 1.0).abs() < f64::EPSILON);
    let narrow = session.resize(300.0, 900.0);
    assert!((narrow.scale - 0.5).abs() < f64::EPSILON);

    assert_eq!(session.serialize(), before);
    let g = session.runtime().get(&id).expect("object").geometry;
    assert!((g.x - 250.0).abs() < f64::EPSILON);
    assert!((g.y - 350.0).abs() < f64::EPSILON);
}

#[test]
fn test_default_padding_applies() {
    let t = ViewportTransform::fit(640.0, 840.0, &ViewportConfig::default());
    assert!((t.scale - 1.0).abs() < f64::EPSILON);
    let t = ViewportTransform::fit(340.0, 840.0, &ViewportConfig::default());
    assert!((t.scale - 0.5).abs() < f64::EPSILON);
}
