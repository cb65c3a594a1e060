// In-memory stand-in for an ESM instance, used as the session transport in tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use esm_lists::transport::RawResponse;
use esm_lists::{ClientConfig, Error, Result, Transport};
use serde_json::{json, Value};

pub const BASE_URL: &str = "https://esm.test:8443";
pub const LIST_ID: &str = "HaHvMOE8BABCAB4uaeU0Fqg==";
pub const TOKEN: &str = "token-123";

pub fn config() -> ClientConfig {
    ClientConfig::new(BASE_URL, "admin", "secret").with_list_id(LIST_ID)
}

pub fn error_page(message: &str) -> String {
    format!(
        "<html><head><title>Apache Tomcat - Error report</title></head><body><h1>{}</h1><HR size=\"1\" noshade=\"noshade\"><p><b>type</b> Exception report</p></body></html>",
        message
    )
}

pub fn raw(status: u16, body: impl Into<String>) -> RawResponse {
    RawResponse {
        status,
        reason: String::new(),
        body: body.into(),
    }
}

#[derive(Default)]
struct ListTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Default)]
struct State {
    requests: Vec<(String, Value)>,
    lists: HashMap<String, ListTable>,
    canned: HashMap<String, RawResponse>,
    unreachable: bool,
}

#[derive(Default)]
pub struct MockEsm {
    state: Mutex<State>,
}

impl MockEsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(self, id: &str, columns: &[&str], rows: &[&[&str]]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.lists.insert(
                id.to_string(),
                ListTable {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows: rows
                        .iter()
                        .map(|r| r.iter().map(|v| v.to_string()).collect())
                        .collect(),
                },
            );
        }
        self
    }

    /// Answer every call to `operation` with a fixed response
    pub fn respond(self, operation: &str, response: RawResponse) -> Self {
        self.state
            .lock()
            .unwrap()
            .canned
            .insert(operation.to_string(), response);
        self
    }

    /// Fail every call at the connection level
    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    pub fn into_transport(self) -> Arc<MockEsm> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn calls(&self, operation: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|(url, _)| operation_of(url) == operation)
            .map(|(_, body)| body)
            .collect()
    }

    pub fn row_count(&self, id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .lists
            .get(id)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    fn handle(state: &mut State, operation: &str, body: &Value) -> RawResponse {
        if let Some(canned) = state.canned.get(operation) {
            return canned.clone();
        }

        match operation {
            "login" => raw(
                200,
                json!({ "log.loginResponse": { "log.return": TOKEN } }).to_string(),
            ),
            "logout" => raw(204, ""),
            _ => {
                let params = &body[format!("act.{}", operation)];
                let id = params["act.resourceId"].as_str().unwrap_or_default();
                let Some(table) = state.lists.get_mut(id) else {
                    return raw(500, error_page("Bad resource id"));
                };
                Self::list_operation(table, operation, params)
            }
        }
    }

    fn list_operation(table: &mut ListTable, operation: &str, params: &Value) -> RawResponse {
        match operation {
            "getResourceById" => raw(
                200,
                json!({
                    "act.getResourceByIdResponse": {
                        "act.return": { "name": "Test list", "fieldNames": table.columns }
                    }
                })
                .to_string(),
            ),
            "getEntries" => {
                let rows: Vec<Value> = table.rows.iter().map(|r| json!({ "entry": r })).collect();
                // Mirrors the server: omitted when empty, bare object for one row
                let mut ret = json!({ "columns": table.columns });
                match rows.len() {
                    0 => {}
                    1 => ret["entryList"] = rows[0].clone(),
                    _ => ret["entryList"] = Value::Array(rows),
                }
                raw(
                    200,
                    json!({ "act.getEntriesResponse": { "act.return": ret } }).to_string(),
                )
            }
            "addEntries" | "deleteEntries" => {
                let list = &params["act.entryList"];
                let columns: Vec<&str> = list["columns"]
                    .as_array()
                    .map(|c| c.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let incoming = list["entryList"].as_array().cloned().unwrap_or_default();

                for row in incoming {
                    let values: Vec<&str> = row["entry"]
                        .as_array()
                        .map(|v| v.iter().filter_map(Value::as_str).collect())
                        .unwrap_or_default();
                    let ordered: Vec<String> = table
                        .columns
                        .iter()
                        .map(|c| {
                            columns
                                .iter()
                                .position(|k| k == c)
                                .and_then(|i| values.get(i))
                                .map(|v| v.to_string())
                                .unwrap_or_default()
                        })
                        .collect();

                    if operation == "addEntries" {
                        table.rows.push(ordered);
                    } else {
                        table.rows.retain(|r| *r != ordered);
                    }
                }
                raw(204, "")
            }
            "clearEntries" => {
                table.rows.clear();
                raw(204, "")
            }
            other => raw(404, format!("unknown operation {}", other)),
        }
    }
}

#[async_trait]
impl Transport for MockEsm {
    async fn post(&self, url: &str, body: &Value) -> Result<RawResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push((url.to_string(), body.clone()));

        if state.unreachable {
            return Err(Error::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let operation = operation_of(url).to_string();
        Ok(Self::handle(&mut state, &operation, body))
    }
}

pub fn operation_of(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}
