use std::fmt;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::{SESSION_HEADER, Session};

/// One generated test case as returned by the backend. Unknown or absent
/// fields deserialize to defaults; the whole record is serialized back
/// verbatim when requesting a script for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default)]
    pub test_scenario: String,
    #[serde(default)]
    pub test_type: String,
    #[serde(default)]
    pub feature: String,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub grounded_in: String,
}

/// Per-file result of a batch ingestion upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestionOutcome {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl IngestionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

/// One document to upload: filename, raw content, and MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Failure of a single backend call. One attempt per call, no retry; the
/// message is surfaced to the user as-is.
#[derive(Debug)]
pub enum BackendError {
    Transport(String),
    Server { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(detail) => {
                write!(f, "could not reach the backend: {detail}")
            }
            BackendError::Server { status, body } => {
                write!(f, "server error {status}: {body}")
            }
            BackendError::InvalidResponse(detail) => {
                write!(f, "unexpected backend response: {detail}")
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// The backend collaborator as seen by the workflow layer. Every request
/// carries the session correlation header.
pub trait QaBackend {
    fn upload_documents(
        &self,
        session: &Session,
        documents: Vec<UploadDocument>,
    ) -> Result<Vec<IngestionOutcome>, BackendError>;

    fn generate_test_cases(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<Vec<TestCase>, BackendError>;

    fn generate_script(
        &self,
        session: &Session,
        test_case: &TestCase,
    ) -> Result<String, BackendError>;

    /// Best-effort session-cleanup signal fired at shutdown. Never blocks,
    /// never retried, failures are swallowed.
    fn notify_session_closed(&self, session: &Session);
}

/// Blocking HTTP implementation. Calls block the redraw loop until they
/// complete; there is no concurrency within one client instance.
pub struct HttpQaBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpQaBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl QaBackend for HttpQaBackend {
    fn upload_documents(
        &self,
        session: &Session,
        documents: Vec<UploadDocument>,
    ) -> Result<Vec<IngestionOutcome>, BackendError> {
        let mut form = reqwest::blocking::multipart::Form::new();
        for document in documents {
            let part = reqwest::blocking::multipart::Part::bytes(document.bytes)
                .file_name(document.filename)
                .mime_str(&document.mime)
                .map_err(transport)?;
            form = form.part("files", part);
        }
        let response = self
            .client
            .post(self.endpoint("ingestion/upload"))
            .header(SESSION_HEADER, session.id())
            .multipart(form)
            .send()
            .map_err(transport)?;
        decode_json(response)
    }

    fn generate_test_cases(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<Vec<TestCase>, BackendError> {
        let response = self
            .client
            .post(self.endpoint("generation/test-cases"))
            .header(SESSION_HEADER, session.id())
            .json(&serde_json::json!({ "query": query }))
            .send()
            .map_err(transport)?;
        decode_json(response)
    }

    fn generate_script(
        &self,
        session: &Session,
        test_case: &TestCase,
    ) -> Result<String, BackendError> {
        #[derive(Deserialize)]
        struct ScriptResponse {
            script: String,
        }

        let response = self
            .client
            .post(self.endpoint("generation/script"))
            .header(SESSION_HEADER, session.id())
            .json(&serde_json::json!({ "test_case": test_case }))
            .send()
            .map_err(transport)?;
        let decoded: ScriptResponse = decode_json(response)?;
        Ok(decoded.script)
    }

    fn notify_session_closed(&self, session: &Session) {
        // Detached thread with its own short-timeout client so shutdown never
        // waits on the cleanup signal; the response is ignored entirely.
        let url = self.endpoint("session/cleanup");
        let session_id = session.id().to_string();
        thread::spawn(move || {
            let Ok(client) = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
            else {
                return;
            };
            let _ = client.delete(url).header(SESSION_HEADER, session_id).send();
        });
    }
}

fn transport(err: reqwest::Error) -> BackendError {
    BackendError::Transport(err.to_string())
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn decode_json<T>(response: reqwest::blocking::Response) -> Result<T, BackendError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response.text().map_err(transport)?;
    if !status.is_success() {
        return Err(BackendError::Server {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| BackendError::InvalidResponse(err.to_string()))
}

#[cfg(test)]
#[path = "../tests/unit/backend_tests.rs"]
mod tests;
