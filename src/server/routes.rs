use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

use crate::a2a::{AgentCard, SendTaskRequest, TaskSendParams};
use crate::server::json_rpc::{JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use crate::task::TaskManager;

/// State shared across all routes
#[derive(Clone)]
pub struct ServerState {
    pub card: Arc<AgentCard>,
    pub manager: Arc<TaskManager>,
}

/// Create all A2A protocol routes: JSON-RPC dispatch at the root and the
/// public agent card for discovery.
pub fn create_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", post(rpc_endpoint))
        .route("/.well-known/agent-card.json", get(agent_card))
        .with_state(state)
}

/// Handler for the agent card (public discovery)
async fn agent_card(State(state): State<ServerState>) -> Json<AgentCard> {
    Json((*state.card).clone())
}

/// Single JSON-RPC endpoint dispatching on the `method` field.
///
/// Every request gets exactly one structured response. The original request
/// id is echoed whenever the body parses far enough to recover it; a body
/// that is not even JSON gets a null id, never silence.
async fn rpc_endpoint(State(state): State<ServerState>, body: String) -> Json<Value> {
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable request body");
            return to_json(JsonRpcResponse::error(
                None,
                -32700,
                "Parse error".to_string(),
            ));
        }
    };

    // Best-effort id extraction so even a malformed envelope gets an
    // error that echoes the client-supplied id.
    let id: Option<JsonRpcId> = value
        .get("id")
        .and_then(|raw| serde_json::from_value(raw.clone()).ok());

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return to_json(JsonRpcResponse::error(
                id,
                -32600,
                format!("Invalid request: {e}"),
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return to_json(JsonRpcResponse::error(
            id,
            -32600,
            "Invalid JSON-RPC version".to_string(),
        ));
    }

    match request.method.as_str() {
        "tasks/send" | "tasks/sendSubscribe" => {
            let params: TaskSendParams = match request.params {
                Some(raw) => match serde_json::from_value(raw) {
                    Ok(params) => params,
                    Err(e) => {
                        return to_json(JsonRpcResponse::error(
                            id,
                            -32602,
                            format!("Invalid params: {e}"),
                        ));
                    }
                },
                None => {
                    return to_json(JsonRpcResponse::error(
                        id,
                        -32602,
                        "Missing params".to_string(),
                    ));
                }
            };

            let send_request = SendTaskRequest {
                jsonrpc: request.jsonrpc,
                id: request.id.unwrap_or(JsonRpcId::Null),
                method: request.method.clone(),
                params,
            };
            let response = if request.method == "tasks/send" {
                state.manager.on_send_task(send_request).await
            } else {
                state.manager.on_send_task_subscribe(send_request).await
            };
            Json(serde_json::to_value(response).unwrap_or(Value::Null))
        }
        other => to_json(JsonRpcResponse::error(
            id,
            -32601,
            format!("Method not found: {other}"),
        )),
    }
}

fn to_json(response: JsonRpcResponse) -> Json<Value> {
    Json(serde_json::to_value(response).unwrap_or(Value::Null))
}
