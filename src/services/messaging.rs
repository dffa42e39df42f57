use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::info;

use crate::database::models::Message;
use crate::database::repositories::Repositories;
use crate::filter::FilterData;
use crate::services::error::ServiceError;
use crate::services::profile::{Profile, ProfileResolver};

/// Text of the message inserted when two people first connect
pub const SEED_MESSAGE: &str = "Conversation started";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SeedOutcome {
    Started { message: Message },
    AlreadyAdded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub email: String,
    /// `None` when the counterpart has no user record anymore
    pub profile: Option<Profile>,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
}

pub struct Messaging<'a> {
    db: &'a Repositories,
}

impl<'a> Messaging<'a> {
    pub fn new(db: &'a Repositories) -> Self {
        Self { db }
    }

    pub async fn send(&self, sender: &str, receiver: &str, text: &str) -> Result<Message, ServiceError> {
        let message = self.db.messages.insert(&Message::new(sender, receiver, text)).await?;
        info!("Message {} sent from {} to {}", message.id, sender, receiver);
        Ok(message)
    }

    /// Every message between `a` and `b` in either direction, oldest first
    pub async fn thread(&self, a: &str, b: &str) -> Result<Vec<Message>, ServiceError> {
        let mut messages = self.db.messages.select_any(between(a, b)).await?;
        messages.sort_by(|x, y| x.created_at.cmp(&y.created_at));
        Ok(messages)
    }

    /// Insert the seed message unless the two already have a conversation
    pub async fn start_conversation(&self, from: &str, to: &str) -> Result<SeedOutcome, ServiceError> {
        if self.db.messages.count(between(from, to)).await? > 0 {
            return Ok(SeedOutcome::AlreadyAdded);
        }
        let message = self.send(from, to, SEED_MESSAGE).await?;
        Ok(SeedOutcome::Started { message })
    }

    /// One entry per counterpart, each with the latest message exchanged.
    /// Ordered by that message's time, newest first.
    pub async fn conversations(&self, email: &str) -> Result<Vec<ConversationSummary>, ServiceError> {
        let touching = FilterData::new(json!({
            "$or": [ { "senderEmail": email }, { "receiverEmail": email } ]
        }));
        let messages = self.db.messages.select_any(touching).await?;

        let mut latest: HashMap<String, Message> = HashMap::new();
        for message in messages {
            let counterpart = message.counterpart(email).to_string();
            match latest.get(&counterpart) {
                Some(current) if current.created_at >= message.created_at => {}
                _ => {
                    latest.insert(counterpart, message);
                }
            }
        }

        let resolver = ProfileResolver::new(self.db);
        let lookups = latest.into_iter().map(|(counterpart, last)| {
            let resolver = &resolver;
            async move {
                let profile = match resolver.resolve(&counterpart).await {
                    Ok(profile) => Some(profile),
                    Err(ServiceError::NotFound(_)) => None,
                    Err(e) => return Err(e),
                };
                Ok(ConversationSummary {
                    email: counterpart,
                    profile,
                    last_message: last.message,
                    last_message_time: last.created_at,
                })
            }
        });

        let mut summaries = join_all(lookups).await.into_iter().collect::<Result<Vec<_>, _>>()?;
        summaries.sort_by(|x, y| y.last_message_time.cmp(&x.last_message_time));
        Ok(summaries)
    }
}

fn between(a: &str, b: &str) -> FilterData {
    FilterData::new(json!({
        "$or": [
            { "senderEmail": a, "receiverEmail": b },
            { "senderEmail": b, "receiverEmail": a }
        ]
    }))
}
