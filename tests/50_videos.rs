mod common;

use anyhow::Result;
use serde_json::{json, Value};

use common::{data, TestApp};
use schoolhub_api::database::models::Video;
use schoolhub_api::filter::FilterData;

const FIELDS: &[(&str, &str)] = &[
    ("language", "Spanish"),
    ("category", "Grammar"),
    ("title", "Verbs"),
    ("uploadedBy", "t@x.com"),
];

async fn upload_video(app: &TestApp, fields: &[(&str, &str)]) -> Value {
    let res = app
        .upload("/teacher/videos", fields, Some(("videoFile", "verbs.mp4", "video/mp4", &b"\x00\x00\x00\x18ftyp"[..])))
        .await;
    assert_eq!(res.status_code(), 201, "upload failed: {}", res.text());
    data(&res)
}

fn stored_files(app: &TestApp) -> usize {
    std::fs::read_dir(app.uploads.join("videos"))
        .map(|dir| dir.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn non_video_upload_is_rejected_and_nothing_is_kept() -> Result<()> {
    let app = TestApp::spawn()?;

    let res = app
        .upload("/teacher/videos", FIELDS, Some(("videoFile", "notes.pdf", "application/pdf", &b"%PDF"[..])))
        .await;
    assert_eq!(res.status_code(), 400);
    assert_eq!(app.db.videos.count(FilterData::all()).await?, 0);
    assert_eq!(stored_files(&app), 0);

    let res = app.upload("/teacher/videos", FIELDS, None).await;
    assert_eq!(res.status_code(), 400);
    assert_eq!(app.db.videos.count(FilterData::all()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_metadata_is_rejected_and_nothing_is_kept() -> Result<()> {
    let app = TestApp::spawn()?;

    let res = app
        .upload(
            "/teacher/videos",
            &[("language", "Spanish")],
            Some(("videoFile", "verbs.mp4", "video/mp4", &b"data"[..])),
        )
        .await;
    assert_eq!(res.status_code(), 400);
    let body = res.json::<Value>();
    assert!(body["field_errors"]["title"].is_string());
    assert_eq!(stored_files(&app), 0);
    Ok(())
}

#[tokio::test]
async fn uploaded_videos_are_listed_and_served() -> Result<()> {
    let app = TestApp::spawn()?;
    let video = upload_video(&app, FIELDS).await;

    let url = video["videoUrl"].as_str().unwrap_or_default().to_string();
    assert!(url.starts_with("/uploads/videos/"));
    assert!(url.ends_with("-verbs.mp4"));
    assert_eq!(stored_files(&app), 1);
    assert_eq!(app.server.get(&url).await.status_code(), 200);

    let by_language = data(&app.server.get("/videos/Spanish").await);
    assert_eq!(by_language.as_array().map(Vec::len), Some(1));
    let by_category = data(&app.server.get("/videos/Spanish/Grammar").await);
    assert_eq!(by_category.as_array().map(Vec::len), Some(1));
    let other_category = data(&app.server.get("/videos/Spanish/Listening").await);
    assert_eq!(other_category, json!([]));

    let by_teacher = data(&app.server.get("/teacher/videos/t@x.com").await);
    assert_eq!(by_teacher[0]["title"], "Verbs");
    Ok(())
}

#[tokio::test]
async fn video_edit_and_delete() -> Result<()> {
    let app = TestApp::spawn()?;
    let video = upload_video(&app, FIELDS).await;
    let id = video["_id"].as_str().unwrap_or_default();

    let updated = data(
        &app.server
            .put(&format!("/teacher/videos/{}", id))
            .json(&json!({ "title": "Irregular verbs", "description": "Part 2" }))
            .await,
    );
    assert_eq!(updated["title"], "Irregular verbs");
    assert_eq!(updated["description"], "Part 2");
    assert_eq!(updated["category"], "Grammar");
    assert_eq!(updated["videoUrl"], video["videoUrl"]);

    let res = app.server.delete(&format!("/teacher/videos/{}", id)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(stored_files(&app), 0);
    assert_eq!(app.db.videos.count(FilterData::all()).await?, 0);

    let res = app.server.put("/teacher/videos/bogus").json(&json!({ "title": "x" })).await;
    assert_eq!(res.status_code(), 400);
    Ok(())
}

#[tokio::test]
async fn deleting_a_video_with_an_unresolvable_url_still_succeeds() -> Result<()> {
    let app = TestApp::spawn()?;
    let now = chrono::Utc::now();
    let legacy = Video {
        id: uuid::Uuid::new_v4(),
        language: "Spanish".to_string(),
        category: "Grammar".to_string(),
        title: "Old lesson".to_string(),
        description: None,
        uploaded_by: "t@x.com".to_string(),
        video_url: "uploads/videos/1-legacy.mp4".to_string(),
        created_at: now,
        updated_at: now,
    };
    app.db.videos.insert(&legacy).await?;

    let res = app.server.delete(&format!("/teacher/videos/{}", legacy.id)).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(data(&res)["title"], "Old lesson");
    assert_eq!(app.db.videos.count(FilterData::all()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn multipart_whitespace_in_descriptions_is_kept() -> Result<()> {
    let app = TestApp::spawn()?;
    let mut fields = FIELDS.to_vec();
    fields.push(("description", "  1. conjugation\n  2. practice"));

    let video = upload_video(&app, &fields).await;
    assert_eq!(video["description"], "  1. conjugation\n  2. practice");
    assert_eq!(video["title"], "Verbs");
    Ok(())
}

#[tokio::test]
async fn truncated_upload_leaves_nothing_on_disk() -> Result<()> {
    let app = TestApp::spawn()?;
    let (mut body, content_type) =
        common::multipart_body(FIELDS, Some(("videoFile", "verbs.mp4", "video/mp4", &b"0123456789"[..])));
    // cut the closing delimiter so the file part never ends
    body.truncate(body.len() - 31);

    let res = app
        .server
        .post("/teacher/videos")
        .content_type(&content_type)
        .bytes(axum::body::Bytes::from(body))
        .await;
    assert_eq!(res.status_code(), 400);
    assert_eq!(stored_files(&app), 0);
    assert_eq!(app.db.videos.count(FilterData::all()).await?, 0);
    Ok(())
}
