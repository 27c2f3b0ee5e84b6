//! Recipient normalization
//!
//! Callers may name a recipient as a bare address, an `(address, name)` pair,
//! an `{"address", "name"}` mapping, or an object already in the service's
//! `{"emailAddress": {...}}` shape. All of them normalize to the latter.

use serde_json::{json, Map, Value};

use crate::error::{GraphError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    Address(String),
    Named { address: String, name: String },
    /// `{"address": "...", "name": "..."}`
    Mapping(Map<String, Value>),
    /// `{"emailAddress": {"address": "...", "name": "..."}}`
    Graph(Map<String, Value>),
}

impl Recipient {
    /// Classify an untyped JSON value.
    ///
    /// Strings, two-element string arrays and objects are accepted. Anything
    /// else is a validation error.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(address) => Ok(Recipient::Address(address)),
            Value::Array(items) => match items.as_slice() {
                [Value::String(address), Value::String(name)] => Ok(Recipient::Named {
                    address: address.clone(),
                    name: name.clone(),
                }),
                _ => Err(GraphError::validation(
                    "recipient pair must be [address, name] strings",
                )),
            },
            Value::Object(map) if map.contains_key("emailAddress") => Ok(Recipient::Graph(map)),
            Value::Object(map) => Ok(Recipient::Mapping(map)),
            other => Err(GraphError::validation(format!(
                "unsupported recipient format: {}",
                other
            ))),
        }
    }

    /// Graph recipient object
    pub fn normalize(&self) -> Result<Value> {
        let (address, name) = match self {
            Recipient::Address(address) => (address.as_str(), ""),
            Recipient::Named { address, name } => (address.as_str(), name.as_str()),
            Recipient::Mapping(map) => address_and_name(map)?,
            Recipient::Graph(map) => {
                let inner = map
                    .get("emailAddress")
                    .and_then(Value::as_object)
                    .ok_or_else(|| GraphError::validation("emailAddress must be an object"))?;
                address_and_name(inner)?
            }
        };

        if address.trim().is_empty() {
            return Err(GraphError::validation("recipient address must not be empty"));
        }

        Ok(json!({ "emailAddress": { "address": address, "name": name } }))
    }
}

fn address_and_name(map: &Map<String, Value>) -> Result<(&str, &str)> {
    let address = map
        .get("address")
        .and_then(Value::as_str)
        .ok_or_else(|| GraphError::validation("recipient mapping requires an 'address' string"))?;
    let name = map.get("name").and_then(Value::as_str).unwrap_or("");
    Ok((address, name))
}

/// Normalize a list of recipients, failing on the first bad entry
pub fn normalize_all(recipients: &[Recipient]) -> Result<Vec<Value>> {
    recipients.iter().map(Recipient::normalize).collect()
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Recipient::Address(address.to_string())
    }
}

impl From<String> for Recipient {
    fn from(address: String) -> Self {
        Recipient::Address(address)
    }
}

impl<A: Into<String>, N: Into<String>> From<(A, N)> for Recipient {
    fn from((address, name): (A, N)) -> Self {
        Recipient::Named {
            address: address.into(),
            name: name.into(),
        }
    }
}
