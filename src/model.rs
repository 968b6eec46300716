//! Model-based classification contract.
//!
//! The engine never calls a language model itself: the surrounding system
//! (or a test) runs a classifier ahead of time and passes the result into
//! `resolve` as an `Option<&ModelClassification>`. This module defines that
//! wire contract, the `IntentModel` trait callers implement, and an
//! OpenAI-backed implementation with a hard request timeout. A failed or
//! timed-out call means the caller passes `None` and the pattern path
//! carries the turn alone.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::SlotName;
use crate::intent::Intent;

/// Default OpenAI model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Structured result of a model classification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelClassification {
    pub intent: Intent,
    /// Model-reported confidence, expected in 0.0..=1.0. Out-of-range
    /// values cause the whole result to be discarded during the merge.
    pub confidence: f32,
    #[serde(default)]
    pub slots: Vec<ModelSlot>,
}

/// One slot value the model extracted, as raw text. The resolver re-parses
/// it with the same extractors the pattern path uses, so a model can never
/// smuggle in an untyped value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSlot {
    pub name: SlotName,
    pub value: String,
    pub confidence: f32,
}

/// Classification collaborator interface.
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Classify one message. Errors and timeouts are the caller's signal
    /// to proceed pattern-only.
    async fn classify(&self, text: &str) -> Result<ModelClassification>;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}

/// OpenAI-backed intent classifier.
#[derive(Clone)]
pub struct OpenAiIntentModel {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

const SYSTEM_PROMPT: &str = r#"You classify Spanish/English finance chat messages.
Reply with ONLY a JSON object:
{"intent": "...", "confidence": 0.0-1.0, "slots": [{"name": "...", "value": "...", "confidence": 0.0-1.0}]}
intent is one of: create_organization, invite_member, list_members,
accept_invitation, leave_organization, record_expense, record_income,
request_report, help_request, unknown.
slot names: amount, phone_number, role, org_type, org_name, period,
category, target_organization. Slot values are verbatim text fragments."#;

impl OpenAiIntentModel {
    /// Create a client with the given API key and request timeout.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { api_key, client, model })
    }

    /// Create from `OPENAI_API_KEY`, with the supplied timeout.
    pub fn from_env(timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key, timeout)
    }

    async fn call_api(&self, text: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": text}
            ],
            "temperature": 0.1,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body);
        }

        #[derive(Deserialize)]
        struct Message {
            content: String,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow!("OpenAI returned no choices"))
    }
}

#[async_trait]
impl IntentModel for OpenAiIntentModel {
    async fn classify(&self, text: &str) -> Result<ModelClassification> {
        let raw = self.call_api(text).await?;
        debug!(model = %self.model, "model classification response received");

        let classification: ModelClassification =
            serde_json::from_str(&raw).context("parsing model classification JSON")?;
        if !(0.0..=1.0).contains(&classification.confidence) {
            bail!("model returned out-of-range confidence {}", classification.confidence);
        }
        Ok(classification)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_json_contract() {
        let json = r#"{
            "intent": "record_expense",
            "confidence": 0.92,
            "slots": [
                {"name": "amount", "value": "₡5000", "confidence": 0.95},
                {"name": "category", "value": "almuerzo", "confidence": 0.7}
            ]
        }"#;

        let c: ModelClassification = serde_json::from_str(json).unwrap();
        assert_eq!(c.intent, Intent::RecordExpense);
        assert_eq!(c.slots.len(), 2);
        assert_eq!(c.slots[0].name, SlotName::Amount);
    }

    #[test]
    fn slots_default_to_empty() {
        let json = r#"{"intent": "help_request", "confidence": 0.8}"#;
        let c: ModelClassification = serde_json::from_str(json).unwrap();
        assert!(c.slots.is_empty());
    }

    #[test]
    fn unknown_intent_string_fails_closed() {
        let json = r#"{"intent": "transfer_funds", "confidence": 0.9}"#;
        assert!(serde_json::from_str::<ModelClassification>(json).is_err());
    }
}
