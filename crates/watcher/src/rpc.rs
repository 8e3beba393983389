//! Sui fullnode JSON-RPC event source (`suix_queryEvents`).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use suiforge_core::chain::{ChainEvent, EventCursor, EventPage, EventQuery};
use suiforge_core::error::SourceError;
use suiforge_core::source::EventSource;
use tracing::{debug, trace};

/// Queries one fullnode for one network.
pub struct SuiRpcSource {
    network: String,
    rpc_url: String,
    client: reqwest::Client,
}

impl SuiRpcSource {
    pub fn new(
        network: impl Into<String>,
        rpc_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SourceError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            network: network.into(),
            rpc_url: rpc_url.into(),
            client,
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn request_body(query: &EventQuery) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "suix_queryEvents",
            "params": [
                {"MoveEventType": query.event_type},
                query.cursor,
                query.limit,
                query.descending,
            ],
        })
    }
}

#[async_trait]
impl EventSource for SuiRpcSource {
    fn network(&self) -> &str {
        &self.network
    }

    async fn query(&self, query: &EventQuery) -> Result<EventPage, SourceError> {
        debug!(
            network = %self.network,
            cursor = ?query.cursor,
            limit = query.limit,
            descending = query.descending,
            "Querying events"
        );

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&Self::request_body(query))
            .send()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Transport(format!("HTTP {}: {body}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::ResponseParse(e.to_string()))?;
        trace!(network = %self.network, body = %body, "RPC response");

        parse_query_response(&self.network, body)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcPage {
    data: Vec<RpcEvent>,
    #[serde(default)]
    next_cursor: Option<EventCursor>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcEvent {
    id: EventCursor,
    #[serde(default)]
    parsed_json: Value,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    timestamp_ms: Option<String>,
}

/// Decode a `suix_queryEvents` JSON-RPC response envelope.
pub fn parse_query_response(network: &str, body: Value) -> Result<EventPage, SourceError> {
    if let Some(error) = body.get("error") {
        return Err(SourceError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    let result = body
        .get("result")
        .cloned()
        .ok_or_else(|| SourceError::ResponseParse("missing 'result'".into()))?;
    let page: RpcPage =
        serde_json::from_value(result).map_err(|e| SourceError::ResponseParse(e.to_string()))?;

    let events = page
        .data
        .into_iter()
        .map(|event| {
            let event_seq = event.id.event_seq.parse::<u64>().map_err(|_| {
                SourceError::ResponseParse(format!("invalid eventSeq '{}'", event.id.event_seq))
            })?;
            let fields = match event.parsed_json {
                Value::Object(map) => map,
                Value::Null => serde_json::Map::new(),
                other => {
                    return Err(SourceError::ResponseParse(format!(
                        "parsedJson is not an object: {other}"
                    )));
                }
            };
            Ok(ChainEvent {
                network: network.to_string(),
                tx_digest: event.id.tx_digest,
                event_seq,
                fields,
                sender: event.sender,
                timestamp_ms: event.timestamp_ms.and_then(|t| t.parse().ok()),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventPage {
        events,
        next_cursor: page.next_cursor,
        has_next_page: page.has_next_page,
    })
}
