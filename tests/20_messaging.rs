mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{data, TestApp};
use schoolhub_api::database::models::Message;
use schoolhub_api::filter::FilterData;

fn message_at(from: &str, to: &str, text: &str, minutes_ago: i64) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_email: from.to_string(),
        receiver_email: to.to_string(),
        message: text.to_string(),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

fn texts(messages: &Value) -> Vec<String> {
    messages
        .as_array()
        .map(|list| list.iter().map(|m| m["message"].as_str().unwrap_or_default().to_string()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn thread_is_the_same_in_either_order() -> Result<()> {
    let app = TestApp::spawn()?;
    // Inserted out of chronological order
    app.db.messages.insert(&message_at("t@x.com", "s@x.com", "second", 5)).await?;
    app.db.messages.insert(&message_at("s@x.com", "t@x.com", "first", 10)).await?;
    app.db.messages.insert(&message_at("s@x.com", "t@x.com", "third", 1)).await?;
    app.db.messages.insert(&message_at("s@x.com", "other@x.com", "unrelated", 3)).await?;

    let forward = data(&app.server.get("/messages/s@x.com/t@x.com").await);
    let backward = data(&app.server.get("/messages/t@x.com/s@x.com").await);

    assert_eq!(texts(&forward), vec!["first", "second", "third"]);
    assert_eq!(forward, backward);
    Ok(())
}

#[tokio::test]
async fn adding_a_contact_twice_seeds_once() -> Result<()> {
    let app = TestApp::spawn()?;
    let body = json!({ "senderEmail": "s@x.com", "receiverEmail": "t@x.com" });

    let first = app.server.post("/addTeacher").json(&body).await;
    assert_eq!(first.status_code(), 201);
    assert_eq!(data(&first)["status"], "started");

    let second = app.server.post("/addTeacher").json(&body).await;
    assert_eq!(second.status_code(), 200);
    assert_eq!(data(&second)["status"], "already_added");

    // The reverse direction is the same conversation
    let reverse = app
        .server
        .post("/addStudent")
        .json(&json!({ "senderEmail": "t@x.com", "receiverEmail": "s@x.com" }))
        .await;
    assert_eq!(data(&reverse)["status"], "already_added");

    assert_eq!(app.db.messages.count(FilterData::all()).await?, 1);
    Ok(())
}

#[tokio::test]
async fn conversations_carry_the_latest_message_per_counterpart() -> Result<()> {
    let app = TestApp::spawn()?;
    app.register("Tea Cher", "t@x.com").await;

    app.db.messages.insert(&message_at("me@x.com", "t@x.com", "t-old", 30)).await?;
    app.db.messages.insert(&message_at("u@x.com", "me@x.com", "u-old", 25)).await?;
    app.db.messages.insert(&message_at("t@x.com", "me@x.com", "t-new", 10)).await?;
    app.db.messages.insert(&message_at("me@x.com", "u@x.com", "u-new", 2)).await?;
    app.db.messages.insert(&message_at("t@x.com", "u@x.com", "not mine", 1)).await?;

    let list = data(&app.server.get("/conversations/me@x.com").await);
    let list = list.as_array().cloned().unwrap_or_default();
    assert_eq!(list.len(), 2);

    assert_eq!(list[0]["email"], "u@x.com");
    assert_eq!(list[0]["lastMessage"], "u-new");
    assert!(list[0]["profile"].is_null());

    assert_eq!(list[1]["email"], "t@x.com");
    assert_eq!(list[1]["lastMessage"], "t-new");
    assert_eq!(list[1]["profile"]["name"], "Tea Cher");
    Ok(())
}

#[tokio::test]
async fn sending_requires_all_fields() -> Result<()> {
    let app = TestApp::spawn()?;

    let res = app
        .server
        .post("/messages")
        .json(&json!({ "senderEmail": "a@x.com", "receiverEmail": "b@x.com" }))
        .await;
    assert_eq!(res.status_code(), 400);

    let res = app
        .server
        .post("/messages")
        .json(&json!({ "senderEmail": "a@x.com", "receiverEmail": "b@x.com", "message": "hello" }))
        .await;
    assert_eq!(res.status_code(), 201);
    assert_eq!(data(&res)["message"], "hello");
    Ok(())
}

#[tokio::test]
async fn message_text_is_stored_exactly_as_sent() -> Result<()> {
    let app = TestApp::spawn()?;
    let text = "    fn main() {}\n";

    let res = app
        .server
        .post("/messages")
        .json(&json!({ "senderEmail": "s@x.com", "receiverEmail": "t@x.com", "message": text }))
        .await;
    assert_eq!(res.status_code(), 201);
    assert_eq!(data(&res)["message"], text);

    let thread = data(&app.server.get("/messages/t@x.com/s@x.com").await);
    assert_eq!(thread[0]["message"], text);

    let res = app
        .server
        .post("/messages")
        .json(&json!({ "senderEmail": "s@x.com", "receiverEmail": "t@x.com", "message": " \n " }))
        .await;
    assert_eq!(res.status_code(), 400);
    Ok(())
}
