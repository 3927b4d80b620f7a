//! Field resolution for user lifecycle events.
//!
//! Producers do not agree on a schema: the same attribute may arrive as
//! `name`, `nombre` or `firstName`. Each logical field has an ordered alias
//! list and the first present, non-empty value wins. Missing fields are never
//! an error; only bytes that are not a JSON object are rejected.

use serde_json::{Map, Value as JsonValue};

use crate::{
    error::ParseError,
    models::event::{NormalizedEvent, NormalizedUser},
};

pub const UNKNOWN_ACTION: &str = "unknown";

pub const ACTION_ALIASES: &[&str] = &["action", "accion", "type"];
pub const USER_ALIASES: &[&str] = &["user", "usuario"];
pub const FIRST_NAME_ALIASES: &[&str] = &["name", "nombre", "firstName"];
pub const LAST_NAME_ALIASES: &[&str] = &["lastName", "apellido", "last_name"];
pub const EMAIL_ALIASES: &[&str] = &["email", "correo"];
pub const PHONE_ALIASES: &[&str] = &["phone", "phoneNumber", "telefono"];

/// Decodes `raw` and resolves action, user and timestamp.
///
/// `received_at` stands in for the event timestamp when the producer omitted it.
pub fn normalize(raw: &[u8], received_at: &str) -> Result<NormalizedEvent, ParseError> {
    let event = decode_object(raw)?;

    let action =
        resolve_alias(&event, ACTION_ALIASES).unwrap_or_else(|| UNKNOWN_ACTION.to_string());

    let user = match resolve_object(&event, USER_ALIASES) {
        Some(user) => normalize_user(user),
        None => normalize_user(&Map::new()),
    };

    let timestamp =
        resolve_alias(&event, &["timestamp"]).unwrap_or_else(|| received_at.to_string());

    Ok(NormalizedEvent {
        action,
        user,
        timestamp,
    })
}

pub fn normalize_user(user: &Map<String, JsonValue>) -> NormalizedUser {
    NormalizedUser {
        id: user.get("id").cloned().unwrap_or(JsonValue::Null),
        first_name: resolve_alias(user, FIRST_NAME_ALIASES).unwrap_or_default(),
        last_name: resolve_alias(user, LAST_NAME_ALIASES).unwrap_or_default(),
        email: resolve_alias(user, EMAIL_ALIASES),
        phone: resolve_alias(user, PHONE_ALIASES).unwrap_or_default(),
    }
}

/// Returns the first alias whose value is a non-empty scalar, as a string.
///
/// Strings are taken verbatim, numbers and booleans are stringified. `null`,
/// empty strings, arrays and objects count as absent.
pub fn resolve_alias(object: &Map<String, JsonValue>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| object.get(*alias))
        .find_map(scalar_to_string)
}

fn resolve_object<'a>(
    object: &'a Map<String, JsonValue>,
    aliases: &[&str],
) -> Option<&'a Map<String, JsonValue>> {
    aliases
        .iter()
        .filter_map(|alias| object.get(*alias))
        .filter_map(JsonValue::as_object)
        .find(|user| !user.is_empty())
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_object(raw: &[u8]) -> Result<Map<String, JsonValue>, ParseError> {
    let text = std::str::from_utf8(raw)?;

    match serde_json::from_str::<JsonValue>(text)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(ParseError::NotAnObject {
            found: json_type_name(&other),
        }),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
