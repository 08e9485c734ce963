//! Full stack over the wire: JSON-RPC API, SQLite store and every remote
//! adapter talking to in-process stand-ins for the external services.

mod common;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use common::{fast_config, TempDb};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use transflow_api_rpc::error::code;
use transflow_api_rpc::server::method;
use transflow_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use transflow_core::application::{
    job_queue, Dispatcher, PipelinePorts, StatusService, SubmissionService,
};
use transflow_core::port::time_provider::SystemTimeProvider;
use transflow_core::port::{ReverseTransform, StageErrorCode};
use transflow_infra_remote::{
    decode_envelope, encode_envelope, AzureTranslator, HttpLogSink, RpcSecondaryTranslator,
    XmlTransformClient,
};

const RETRANSLATE: &str = "translation.retranslate.v1";

type LogEvents = Arc<Mutex<Vec<Value>>>;

async fn spawn_http(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Provider stand-in: uppercases each item, or fails for language "xx"
async fn provider_service() -> String {
    async fn translate(
        Query(query): Query<HashMap<String, String>>,
        Json(items): Json<Vec<Value>>,
    ) -> Result<Json<Value>, axum::http::StatusCode> {
        let to = query.get("to").cloned().unwrap_or_default();
        if to == "xx" {
            return Err(axum::http::StatusCode::BAD_REQUEST);
        }
        let results: Vec<Value> = items
            .iter()
            .map(|item| {
                let text = item["text"].as_str().unwrap_or_default().to_uppercase();
                json!({ "translations": [{ "text": text, "to": to }] })
            })
            .collect();
        Ok(Json(Value::Array(results)))
    }

    spawn_http(Router::new().route("/translate", post(translate))).await
}

/// Transform stand-in: reverses the envelope's text
async fn transform_service() -> String {
    async fn process(body: String) -> String {
        let text = decode_envelope(&body).unwrap();
        encode_envelope(&ReverseTransform::apply(&text))
    }

    let base = spawn_http(Router::new().route("/process_xml", post(process))).await;
    format!("{}/process_xml", base)
}

async fn log_service() -> (String, LogEvents) {
    let events: LogEvents = Arc::default();
    let app = Router::new()
        .route(
            "/log",
            post(|State(events): State<LogEvents>, Json(body): Json<Value>| async move {
                events.lock().unwrap().push(body);
                Json(json!({ "status": "Logged" }))
            }),
        )
        .with_state(events.clone());
    let base = spawn_http(app).await;
    (format!("{}/log", base), events)
}

/// Secondary stand-in: lowercases, rejects empty text with INVALID_ARGUMENT
async fn secondary_service() -> (String, ServerHandle) {
    let server = Server::builder().build("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let mut module = RpcModule::new(());
    module
        .register_method(RETRANSLATE, |params, _, _| {
            let params: HashMap<String, String> = params.parse()?;
            let text = params.get("text").cloned().unwrap_or_default();
            if text.is_empty() {
                return Err(ErrorObjectOwned::owned(
                    StageErrorCode::INVALID_ARGUMENT,
                    "Empty text provided",
                    None::<()>,
                ));
            }
            Ok::<Value, ErrorObjectOwned>(json!({ "text": text.to_lowercase() }))
        })
        .unwrap();

    (format!("http://{}", addr), server.start(module))
}

struct Stack {
    client: HttpClient,
    log_events: LogEvents,
    _db: TempDb,
    _rpc: ServerHandle,
    _secondary: ServerHandle,
}

async fn start_stack() -> Stack {
    let provider_url = provider_service().await;
    let transform_url = transform_service().await;
    let (log_url, log_events) = log_service().await;
    let (secondary_url, secondary_handle) = secondary_service().await;

    let db = TempDb::new();
    let store = db.open().await;

    let ports = PipelinePorts {
        provider: Arc::new(AzureTranslator::new(provider_url, "test-key", "")),
        transform: Arc::new(XmlTransformClient::new(transform_url)),
        secondary: Arc::new(RpcSecondaryTranslator::new(&secondary_url, RETRANSLATE).unwrap()),
        log_sink: Arc::new(HttpLogSink::new(log_url)),
    };

    let (tx, rx) = job_queue();
    let dispatcher = Arc::new(
        Dispatcher::new(
            rx,
            store.clone(),
            ports,
            Arc::new(SystemTimeProvider),
            fast_config(8),
        )
        .unwrap(),
    );

    let handler = RpcHandler::new(
        SubmissionService::new(store.clone(), tx),
        StatusService::new(store),
        dispatcher.activity(),
    );
    let (addr, rpc_handle) = RpcServer::new(
        RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        handler,
    )
    .start()
    .await
    .unwrap();

    tokio::spawn(async move {
        dispatcher.run().await.unwrap();
    });

    Stack {
        client: HttpClientBuilder::default()
            .build(format!("http://{}", addr))
            .unwrap(),
        log_events,
        _db: db,
        _rpc: rpc_handle,
        _secondary: secondary_handle,
    }
}

fn named(pairs: &[(&str, &str)]) -> ObjectParams {
    let mut params = ObjectParams::new();
    for (name, value) in pairs {
        params.insert(name, value).unwrap();
    }
    params
}

fn submit_params(client_id: &str, text: &str, target_language: &str) -> ObjectParams {
    named(&[
        ("client_id", client_id),
        ("text", text),
        ("target_language", target_language),
    ])
}

async fn poll_until_terminal(client: &HttpClient, client_id: &str) -> Value {
    for _ in 0..500 {
        let snapshot: Value = client
            .request(method::STATUS, named(&[("client_id", client_id)]))
            .await
            .unwrap();
        if snapshot["status"] == "COMPLETED" || snapshot["status"] == "ERROR" {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{} never finished", client_id);
}

fn call_error_code(err: ClientError) -> i32 {
    match err {
        ClientError::Call(e) => e.code(),
        other => panic!("expected a call error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_and_poll_to_completion() {
    let stack = start_stack().await;

    let ack: Value = stack
        .client
        .request(
            method::SUBMIT,
            submit_params("c1", "hello & goodbye <world>", "fr"),
        )
        .await
        .unwrap();
    assert_eq!(ack, json!({ "client_id": "c1", "status": "QUEUED" }));

    let snapshot = poll_until_terminal(&stack.client, "c1").await;
    assert_eq!(snapshot["status"], "COMPLETED");
    assert_eq!(snapshot["translated_text"], "HELLO & GOODBYE <WORLD>");
    assert_eq!(snapshot["packet_count"], 3);
    assert_eq!(snapshot["packets_processed"], 3);
    assert_eq!(snapshot["stage_a_done"], true);
    assert_eq!(
        snapshot["stage_a_output"],
        ReverseTransform::apply("HELLO & GOODBYE <WORLD>")
    );
    assert_eq!(snapshot["stage_b_done"], true);
    assert_eq!(snapshot["stage_b_output"], "hello & goodbye <world>");
    assert_eq!(snapshot["time_remaining"], 0);
    assert!(snapshot["completion_time"].is_i64());

    // The log sink is notified before the terminal write lands
    let events = stack.log_events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![json!({ "client_id": "c1", "message": "Translation completed for client c1" })]
    );
}

#[tokio::test]
async fn test_provider_rejection_recorded_as_error() {
    let stack = start_stack().await;

    let _: Value = stack
        .client
        .request(
            method::SUBMIT,
            submit_params("bad", "bonjour", "xx"),
        )
        .await
        .unwrap();

    let snapshot = poll_until_terminal(&stack.client, "bad").await;
    assert_eq!(snapshot["status"], "ERROR");
    assert!(snapshot["translated_text"]
        .as_str()
        .unwrap()
        .contains("HTTP 400"));
    assert_eq!(snapshot["stage_a_done"], false);
    assert_eq!(snapshot["stage_b_done"], false);
    assert!(stack.log_events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_and_not_found_codes() {
    let stack = start_stack().await;

    let err = stack
        .client
        .request::<Value, _>(
            method::SUBMIT,
            named(&[("client_id", "c1"), ("text", "bonjour")]),
        )
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), code::VALIDATION_ERROR);

    let err = stack
        .client
        .request::<Value, _>(method::STATUS, named(&[("client_id", "missing")]))
        .await
        .unwrap_err();
    assert_eq!(call_error_code(err), code::NOT_FOUND);
}

#[tokio::test]
async fn test_queue_and_stats_after_work() {
    let stack = start_stack().await;

    for id in ["a", "b"] {
        let _: Value = stack
            .client
            .request(
                method::SUBMIT,
                submit_params(id, "salut", "en"),
            )
            .await
            .unwrap();
    }
    poll_until_terminal(&stack.client, "a").await;
    poll_until_terminal(&stack.client, "b").await;

    let list: Value = stack.client.request(method::LIST, rpc_params![]).await.unwrap();
    assert_eq!(list["count"], 2);
    assert_eq!(list["translations"]["a"]["translated_text"], "SALUT");

    let stats: Value = stack.client.request(method::STATS, rpc_params![]).await.unwrap();
    assert_eq!(stats["completed"], 2);
    assert_eq!(stats["total"], 2);

    // The terminal write precedes the in-flight bookkeeping; give it a moment
    let mut queue = Value::Null;
    for _ in 0..100 {
        queue = stack.client.request(method::QUEUE, rpc_params![]).await.unwrap();
        if queue["status_message"] == "Queue is empty" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(queue["status_message"], "Queue is empty");
    assert_eq!(queue["pending"], 0);
}
