//! Integration tests for the CLI commands.

use std::time::Duration;

use invite_cli::{parse_multiplier, thumbnail, validate, ThumbnailArgs};
use invite_renderer::{PreviewOptions, PreviewStatus};

fn sample_document() -> serde_json::Value {
    serde_json::json!({
        "version": "1",
        "background": "#fdf6e3",
        "objects": [
            { "id": "t1", "kind": "text", "text": "Save the date",
              "x": 200.0, "y": 100.0, "width": 200.0, "height": 30.0 },
            { "id": "r1", "kind": "rect", "fill": "#cc0000",
              "x": 0.0, "y": 700.0, "width": 600.0, "height": 100.0 },
            { "id": "r2", "kind": "rect",
              "x": 0.0, "y": 0.0, "width": 600.0, "height": 10.0 }
        ]
    })
}

#[test]
fn test_validate_summarizes_kinds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("card.json");
    std::fs::write(&path, sample_document().to_string()).expect("write");

    let report = validate(&path).expect("valid");
    assert_eq!(report.object_count, 3);
    assert_eq!(report.kinds.get("rect"), Some(&2));
    assert_eq!(report.to_string(), "3 objects: 2 rect, 1 text");
}

#[test]
fn test_validate_rejects_missing_geometry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"objects":[{"id":"a","kind":"rect","x":0}]}"#).expect("write");

    let err = validate(&path).expect_err("malformed");
    assert!(err.to_string().contains("invalid document"));
}

#[tokio::test]
async fn test_thumbnail_writes_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("card.json");
    let output = dir.path().join("card.png");
    std::fs::write(&input, sample_document().to_string()).expect("write");

    let outcome = thumbnail(&input, &output, &ThumbnailArgs::default())
        .await
        .expect("thumbnail");
    assert_eq!(outcome.status, PreviewStatus::Rendered);

    let png = image::open(&output).expect("open png").to_rgba8();
    assert_eq!(png.dimensions(), (300, 400));
    assert_eq!(png.get_pixel(150, 380).0, [0xcc, 0, 0, 255]);
}

#[tokio::test]
async fn test_thumbnail_of_garbage_writes_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("garbage.json");
    let output = dir.path().join("garbage.png");
    std::fs::write(&input, "not json at all").expect("write");

    let args = ThumbnailArgs {
        preview: PreviewOptions {
            multiplier: 0.25,
            timeout: Duration::from_secs(1),
        },
        asset_dir: None,
    };
    let outcome = thumbnail(&input, &output, &args).await.expect("thumbnail");
    assert!(outcome.is_placeholder());
    assert_eq!(
        image::open(&output).expect("open png").to_rgba8().dimensions(),
        (150, 200)
    );
}

#[tokio::test]
async fn test_thumbnail_missing_input_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = thumbnail(
        &dir.path().join("nope.json"),
        &dir.path().join("nope.png"),
        &ThumbnailArgs::default(),
    )
    .await;
    assert!(result.is_err());
}

#[test]
fn test_multiplier_argument_is_bounded() {
    assert_eq!(parse_multiplier("0.25"), Ok(0.25));
    assert_eq!(parse_multiplier("4"), Ok(4.0));
    assert!(parse_multiplier("4.5").is_err());
    assert!(parse_multiplier("1e9").is_err());
    assert!(parse_multiplier("0").is_err());
    assert!(parse_multiplier("NaN").is_err());
    assert!(parse_multiplier("inf").is_err());
    assert!(parse_multiplier("big").is_err());
}

#[tokio::test]
async fn test_thumbnail_with_huge_multiplier_writes_bounded_placeholder() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("card.json");
    let output = dir.path().join("card.png");
    std::fs::write(&input, sample_document().to_string()).expect("write");

    let args = ThumbnailArgs {
        preview: PreviewOptions {
            multiplier: f64::INFINITY,
            timeout: Duration::from_secs(1),
        },
        asset_dir: None,
    };
    let outcome = thumbnail(&input, &output, &args).await.expect("thumbnail");
    assert!(outcome.is_placeholder());
    assert_eq!(
        image::open(&output).expect("open png").to_rgba8().dimensions(),
        (300, 400)
    );
}
