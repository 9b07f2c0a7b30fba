//! Requirement-definition chat and job creation against the agent API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::stream::{StreamClient, StreamSummary};

/// Completeness at which a requirement is ready to become a job.
pub const READY_THRESHOLD: f64 = 0.8;

pub const REQUIREMENT_PATH: &str = "/chat/requirement-definition";
pub const CREATE_JOB_PATH: &str = "/chat/create-job";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequirementState {
    pub data_source: Option<String>,
    pub process_description: Option<String>,
    pub output_format: Option<String>,
    pub schedule: Option<String>,
    #[serde(default)]
    pub completeness: f64,
}

impl RequirementState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.completeness >= READY_THRESHOLD
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatContext {
    pub previous_messages: Vec<Message>,
    pub current_requirements: RequirementState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub conversation_id: String,
    pub user_message: String,
    pub context: ChatContext,
}

/// Events on the requirement-definition stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawChatEvent")]
pub enum ChatStreamEvent {
    Message { content: String },
    RequirementUpdate { requirements: RequirementState },
    /// Any other event type, whatever its payload.
    Unknown,
}

#[derive(Deserialize)]
struct RawChatEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct MessageData {
    content: String,
}

#[derive(Deserialize)]
struct RequirementUpdateData {
    requirements: RequirementState,
}

impl TryFrom<RawChatEvent> for ChatStreamEvent {
    type Error = serde_json::Error;

    fn try_from(raw: RawChatEvent) -> Result<Self, Self::Error> {
        match raw.kind.as_str() {
            "message" => {
                let data: MessageData = serde_json::from_value(raw.data)?;
                Ok(Self::Message {
                    content: data.content,
                })
            }
            "requirement_update" => {
                let data: RequirementUpdateData = serde_json::from_value(raw.data)?;
                Ok(Self::RequirementUpdate {
                    requirements: data.requirements,
                })
            }
            _ => Ok(Self::Unknown),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCreationRequest {
    pub conversation_id: String,
    pub requirements: RequirementState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCreationResponse {
    pub job_id: String,
    pub job_master_id: String,
    pub status: String,
    pub message: String,
}

/// Client for the agent API's chat endpoints.
#[derive(Clone)]
pub struct ChatApi {
    client: StreamClient,
}

impl ChatApi {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: StreamClient::new(api_base),
        }
    }

    pub fn api_base(&self) -> &str {
        self.client.base_url()
    }

    /// Stream one chat turn. `on_event` runs for each event in order;
    /// unknown event types are dropped.
    pub async fn stream_requirement_definition<F>(
        &self,
        conversation_id: &str,
        user_message: &str,
        previous_messages: &[Message],
        current_requirements: &RequirementState,
        mut on_event: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<StreamSummary, StreamError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let request = ChatRequest {
            conversation_id: conversation_id.to_string(),
            user_message: user_message.to_string(),
            context: ChatContext {
                previous_messages: previous_messages.to_vec(),
                current_requirements: current_requirements.clone(),
            },
        };

        self.client
            .stream_request(
                REQUIREMENT_PATH,
                &request,
                |event: ChatStreamEvent| {
                    if event != ChatStreamEvent::Unknown {
                        on_event(event);
                    }
                },
                cancel,
            )
            .await
    }

    pub async fn create_job(
        &self,
        conversation_id: &str,
        requirements: &RequirementState,
    ) -> Result<JobCreationResponse, StreamError> {
        let request = JobCreationRequest {
            conversation_id: conversation_id.to_string(),
            requirements: requirements.clone(),
        };

        match self.client.post_json(CREATE_JOB_PATH, &request).await {
            Err(StreamError::Http { status, status_text }) => Err(StreamError::Http {
                status,
                status_text: format!("Job creation failed: {}", status_text),
            }),
            other => other,
        }
    }
}
