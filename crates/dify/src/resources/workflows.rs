//! Workflow app invocation over the service API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::Result;
use crate::auth::{ApiKey, Session};
use crate::error::ResultExt;
use crate::http::{RequestDescriptor, Transport};
use crate::sse::SseStream;

const WORKFLOWS_RUN: &str = "workflows/run";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ResponseMode {
    Blocking,
    Streaming,
}

/// Inputs of one workflow run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowRunRequest {
    /// Values for the workflow's start-node variables.
    pub inputs: Map<String, Value>,
    /// End-user identifier, unique within the app.
    pub user: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<Value>,
}

impl WorkflowRunRequest {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }
}

#[derive(Serialize)]
struct WorkflowRunBody<'a> {
    #[serde(flatten)]
    request: &'a WorkflowRunRequest,
    response_mode: ResponseMode,
}

/// Result of a blocking run.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub workflow_run_id: String,
    pub task_id: String,
    pub data: WorkflowRunData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunData {
    pub id: String,
    pub workflow_id: String,
    /// `running`, `succeeded`, `failed` or `stopped`.
    pub status: String,
    #[serde(default)]
    pub outputs: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub total_steps: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<i64>,
}

/// Event kind of a streamed workflow chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowStarted,
    NodeStarted,
    NodeFinished,
    TextChunk,
    WorkflowFinished,
    TtsMessage,
    TtsMessageEnd,
    Ping,
    Error,
    #[serde(other)]
    Unknown,
}

/// One `data:` frame of a streaming run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowChunk {
    pub event: WorkflowEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Set on `error` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WorkflowChunk {
    /// Text of a `text_chunk` event.
    pub fn text(&self) -> Option<&str> {
        match self.event {
            WorkflowEvent::TextChunk => self.data.as_ref()?.get("text")?.as_str(),
            _ => None,
        }
    }

    /// Whether no further chunks follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event, WorkflowEvent::WorkflowFinished | WorkflowEvent::Error)
    }
}

impl Session {
    /// Run a workflow app and wait for its result.
    ///
    /// Authenticated with the app's own key, which is never refreshed.
    #[instrument(skip(self, app_key, request), fields(user = %request.user))]
    pub async fn run_workflow(&self, app_key: &ApiKey, request: &WorkflowRunRequest) -> Result<WorkflowRun> {
        let body = WorkflowRunBody {
            request,
            response_mode: ResponseMode::Blocking,
        };

        let run: WorkflowRun = self
            .execute_json(|| {
                RequestDescriptor::post(Transport::App(app_key.clone()), WORKFLOWS_RUN).json(&body)
            })
            .await
            .during("run workflow")?;

        debug!(run_id = %run.workflow_run_id, status = %run.data.status, "Workflow finished");
        Ok(run)
    }

    /// Run a workflow app and stream its events.
    ///
    /// The returned stream owns the response body; drop it or call
    /// [`SseStream::cancel`] to abandon the run's output.
    #[instrument(skip(self, app_key, request), fields(user = %request.user))]
    pub async fn run_workflow_streaming(
        &self,
        app_key: &ApiKey,
        request: &WorkflowRunRequest,
    ) -> Result<SseStream<WorkflowChunk>> {
        let body = WorkflowRunBody {
            request,
            response_mode: ResponseMode::Streaming,
        };

        let response = self
            .execute(|| {
                Ok(RequestDescriptor::post(Transport::App(app_key.clone()), WORKFLOWS_RUN)
                    .json(&body)?
                    .streaming())
            })
            .await
            .during("run workflow")?;

        debug!("Workflow stream opened");
        Ok(SseStream::spawn(
            response.bytes_stream(),
            self.config().stream_buffer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_response_mode() {
        let request = WorkflowRunRequest::new("user-1").with_input("query", "hello");
        let body = serde_json::to_value(WorkflowRunBody {
            request: &request,
            response_mode: ResponseMode::Streaming,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "inputs": {"query": "hello"},
                "user": "user-1",
                "response_mode": "streaming",
            })
        );
    }

    #[test]
    fn unknown_events_are_tolerated() {
        let chunk: WorkflowChunk =
            serde_json::from_str(r#"{"event":"agent_log","task_id":"t"}"#).unwrap();
        assert_eq!(chunk.event, WorkflowEvent::Unknown);
        assert!(!chunk.is_terminal());
    }

    #[test]
    fn error_event_carries_message() {
        let chunk: WorkflowChunk = serde_json::from_str(
            r#"{"event":"error","task_id":"t","status":400,"code":"invalid_param","message":"bad input"}"#,
        )
        .unwrap();
        assert!(chunk.is_terminal());
        assert_eq!(chunk.message.as_deref(), Some("bad input"));
    }

    #[test]
    fn text_chunk_exposes_text() {
        let chunk: WorkflowChunk = serde_json::from_str(
            r#"{"event":"text_chunk","workflow_run_id":"r","data":{"text":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(chunk.text(), Some("hi"));
    }
}
