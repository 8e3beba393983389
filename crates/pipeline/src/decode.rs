//! Decoding `TokenCreationEvent` payloads.
//!
//! Move `vector<u8>` fields arrive in `parsedJson` as arrays of byte values;
//! `String` fields arrive as JSON strings. Both are accepted for every text
//! field. `u8`/`u64` fields may arrive as numbers or as decimal strings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use suiforge_core::chain::ChainEvent;
use suiforge_core::contract::{Capabilities, ContractParameters};
use suiforge_core::deployment::TokenKey;
use suiforge_core::error::DecodeError;
use tracing::debug;

/// The factory's creation event, decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreationEvent {
    pub creator: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: u64,
    pub description: String,
    pub metadata_uri: String,
}

impl TokenCreationEvent {
    pub fn decode(event: &ChainEvent) -> Result<Self, DecodeError> {
        Self::from_fields(&event.fields)
    }

    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, DecodeError> {
        let creator = match required(fields, "creator")? {
            Value::String(address) => address.clone(),
            other => {
                return Err(DecodeError::InvalidField {
                    field: "creator".into(),
                    reason: format!("expected an address string, got {other}"),
                });
            }
        };

        let decimals = integer(required(fields, "decimals")?, "decimals")?;
        let decimals = u8::try_from(decimals).map_err(|_| DecodeError::InvalidField {
            field: "decimals".into(),
            reason: format!("{decimals} does not fit in u8"),
        })?;

        Ok(Self {
            creator,
            name: text(required(fields, "name")?),
            symbol: text(required(fields, "symbol")?),
            decimals,
            initial_supply: integer(required(fields, "initial_supply")?, "initial_supply")?,
            description: fields.get("description").map(text).unwrap_or_default(),
            metadata_uri: fields.get("metadata_uri").map(text).unwrap_or_default(),
        })
    }

    pub fn token_key(&self) -> TokenKey {
        TokenKey::new(&self.creator, &self.symbol, &self.name)
    }

    /// Contract parameters for this event. Every capability is enabled; the
    /// event carries no flags.
    pub fn to_parameters(&self) -> ContractParameters {
        ContractParameters {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            description: self.description.clone(),
            initial_supply: self.initial_supply,
            icon_url: self.metadata_uri.clone(),
            capabilities: Capabilities::default(),
            module_name: None,
        }
    }
}

fn required<'a>(fields: &'a Map<String, Value>, field: &str) -> Result<&'a Value, DecodeError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field.to_string())),
        Some(value) => Ok(value),
    }
}

/// Best-effort text: strings as-is, byte arrays as UTF-8 (lossy if need be),
/// anything else as its JSON text.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect();
            match bytes {
                Some(bytes) => match String::from_utf8(bytes) {
                    Ok(s) => s,
                    Err(e) => {
                        debug!(error = %e, "Byte field is not valid UTF-8, decoding lossily");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                },
                None => value.to_string(),
            }
        }
        other => other.to_string(),
    }
}

fn integer(value: &Value, field: &str) -> Result<u64, DecodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DecodeError::InvalidField {
        field: field.to_string(),
        reason: format!("expected a non-negative integer, got {value}"),
    })
}
