//! Request/response envelope codec
//!
//! Every call is wrapped as `{"<prefix>.<operation>": {"<prefix>.<param>": ...}}`
//! and answered as `{"<prefix>.<operation>Response": {"<prefix>.return": ...}}`.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Namespace used by `ActiveListService`
pub const ACTIVE_LIST_PREFIX: &str = "act";

/// Namespace used by `LoginService`
pub const LOGIN_PREFIX: &str = "log";

const LOGIN_OPERATION: &str = "login";

/// Build a namespaced key such as `act.resourceId`
pub fn param(prefix: &str, name: &str) -> String {
    format!("{}.{}", prefix, name)
}

/// Wrap parameters under the `<prefix>.<operation>` key
pub fn encode(prefix: &str, operation: &str, params: Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert(param(prefix, operation), Value::Object(params));
    Value::Object(body)
}

/// Attach the session token to an encoded request.
///
/// Login is never given a token, and a token already present in the
/// parameters is left alone.
pub fn inject_auth_token(body: &mut Value, prefix: &str, operation: &str, token: &str) {
    if operation == LOGIN_OPERATION {
        return;
    }

    let key = param(prefix, "authToken");
    if let Some(Value::Object(params)) = body.get_mut(param(prefix, operation)) {
        if !params.contains_key(&key) {
            params.insert(key, Value::String(token.to_string()));
        }
    }
}

/// Reach into `<prefix>.<operation>Response` / `<prefix>.return`
pub fn return_value<'a>(response: &'a Value, prefix: &str, operation: &str) -> Result<&'a Value> {
    let wrapper = param(prefix, &format!("{}Response", operation));
    let inner = param(prefix, "return");

    response
        .get(&wrapper)
        .and_then(|r| r.get(&inner))
        .ok_or_else(|| Error::MalformedResponse(format!("missing '{}'.'{}'", wrapper, inner)))
}

/// Normalize a field the server sends as absent, a lone value, or an array
pub fn as_rows(value: Option<&Value>) -> &[Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(single) => std::slice::from_ref(single),
    }
}
