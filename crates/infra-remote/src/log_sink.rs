// Log sink adapters

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use transflow_core::port::{LogSink, LogSinkError};

#[derive(Serialize)]
struct LogEvent<'a> {
    client_id: &'a str,
    message: &'a str,
}

/// `POST {url}` with `{"client_id", "message"}`
pub struct HttpLogSink {
    client: reqwest::Client,
    url: String,
}

impl HttpLogSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LogSink for HttpLogSink {
    async fn notify(&self, client_id: &str, message: &str) -> Result<(), LogSinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&LogEvent { client_id, message })
            .send()
            .await
            .map_err(|e| LogSinkError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LogSinkError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Writes notifications to the local tracing subscriber; never fails
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl LogSink for TracingLogSink {
    async fn notify(&self, client_id: &str, message: &str) -> Result<(), LogSinkError> {
        info!(target: "transflow::log_sink", client_id = %client_id, "{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_http;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_http_log_sink_posts_event() {
        let received: Arc<Mutex<Vec<Value>>> = Arc::default();
        let app = Router::new()
            .route(
                "/log",
                post(
                    |State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>| async move {
                        received.lock().unwrap().push(body);
                        Json(serde_json::json!({ "status": "Logged" }))
                    },
                ),
            )
            .with_state(received.clone());
        let base = spawn_http(app).await;

        HttpLogSink::new(format!("{}/log", base))
            .notify("c1", "Translation completed for client c1")
            .await
            .unwrap();

        let events = received.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["client_id"], "c1");
        assert_eq!(events[0]["message"], "Translation completed for client c1");
    }

    #[tokio::test]
    async fn test_http_log_sink_reports_status() {
        let app = Router::new().route("/log", post(|| async { StatusCode::BAD_REQUEST }));
        let base = spawn_http(app).await;

        let err = HttpLogSink::new(format!("{}/log", base))
            .notify("c1", "msg")
            .await
            .unwrap_err();
        assert_eq!(err, LogSinkError::Status(400));
    }

    #[tokio::test]
    async fn test_tracing_log_sink_never_fails() {
        tokio_test::assert_ok!(TracingLogSink.notify("c1", "done").await);
    }
}
