mod common;

use anyhow::Result;
use serde_json::json;

use common::{data, TestApp};
use schoolhub_api::filter::FilterData;

#[tokio::test]
async fn roll_is_one_more_than_existing_students() -> Result<()> {
    let app = TestApp::spawn()?;
    for i in 1..=4 {
        app.register(&format!("Student {}", i), &format!("s{}@x.com", i)).await;
    }

    let registered = app.register("Ana", "ana@x.com").await;
    assert_eq!(registered["student"]["roll"], 5);
    assert_eq!(registered["user"]["roll"], 5);
    assert_eq!(registered["user"]["role"], "student");
    assert_eq!(registered["user"]["email"], registered["student"]["email"]);
    assert_eq!(registered["user"]["createdAt"], registered["student"]["createdAt"]);
    assert_eq!(registered["user"]["last_login"], registered["student"]["last_login"]);

    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts_without_writing() -> Result<()> {
    let app = TestApp::spawn()?;
    app.register("Ana", "ana@x.com").await;

    let res = app
        .server
        .post("/students/register")
        .json(&json!({ "name": "Other Ana", "email": "ana@x.com" }))
        .await;
    assert_eq!(res.status_code(), 409);
    assert_eq!(res.json::<serde_json::Value>()["code"], "CONFLICT");

    assert_eq!(app.db.users.count(FilterData::all()).await?, 1);
    assert_eq!(app.db.students.count(FilterData::all()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_reported_together() -> Result<()> {
    let app = TestApp::spawn()?;

    let res = app.server.post("/students/register").json(&json!({ "name": "  " })).await;
    assert_eq!(res.status_code(), 400);
    let body = res.json::<serde_json::Value>();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["email"].is_string());
    Ok(())
}

#[tokio::test]
async fn profile_resolves_through_the_user_role() -> Result<()> {
    let app = TestApp::spawn()?;
    app.server
        .post("/students/register")
        .json(&json!({ "name": "Bo", "email": "bo@x.com", "guardianName": "Cy", "age": 14 }))
        .await;

    let res = app.server.get("/profile/bo@x.com").await;
    assert_eq!(res.status_code(), 200);
    let profile = data(&res);
    assert_eq!(profile["role"], "student");
    assert_eq!(profile["profile"]["guardianName"], "Cy");
    assert_eq!(profile["profile"]["age"], 14);

    let role = data(&app.server.get("/users/role").add_query_param("email", "bo@x.com").await);
    assert_eq!(role["role"], "student");

    let res = app.server.get("/profile/nobody@x.com").await;
    assert_eq!(res.status_code(), 404);
    Ok(())
}

#[tokio::test]
async fn last_login_refresh_requires_a_user() -> Result<()> {
    let app = TestApp::spawn()?;
    let registered = app.register("Ana", "ana@x.com").await;

    let res = app.server.put("/users/last-login/ana@x.com").await;
    assert_eq!(res.status_code(), 200);
    let user = data(&res);
    let parse = |v: &serde_json::Value| chrono::DateTime::parse_from_rfc3339(v.as_str().unwrap_or_default()).ok();
    assert!(parse(&user["last_login"]) >= parse(&registered["user"]["last_login"]));
    assert_eq!(user["email"], "ana@x.com");

    let res = app.server.put("/users/last-login/ghost@x.com").await;
    assert_eq!(res.status_code(), 404);
    Ok(())
}
