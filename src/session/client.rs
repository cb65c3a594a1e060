//! Active List session client

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::entries::{decode_entries, encode_entries, ColumnPolicy, Entry};
use crate::config::{ClientConfig, ProxyConfig};
use crate::envelope::{self, param, ACTIVE_LIST_PREFIX, LOGIN_PREFIX};
use crate::error::{Error, Result};
use crate::transport::{interpret, Endpoint, HttpTransport, Reply, ServiceType, Transport};

const ACTIVE_LIST_SERVICE: &str = "ActiveListService";
const LOGIN_SERVICE: &str = "LoginService";

/// An authenticated session against the ESM Active List service.
///
/// Created by logging in, released by [`ActiveLists::logout`]. Dropping a
/// session that is still logged in schedules a best-effort logout on the
/// current tokio runtime.
pub struct ActiveLists {
    transport: Arc<dyn Transport>,
    base_url: String,
    verify: bool,
    proxies: ProxyConfig,
    token: Option<String>,
    /// Default list used when an operation is not given a resource id
    list_id: Option<String>,
    column_policy: ColumnPolicy,
    logout_timeout: Duration,
    /// Columns last seen per list: resource_id -> column names
    active_lists: HashMap<String, Vec<String>>,
}

impl ActiveLists {
    /// Log in over HTTPS using the config's TLS and proxy settings
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = Self::http_transport(&config)?;
        Self::connect_with(config, transport).await
    }

    /// Build the reqwest transport described by `config`
    pub fn http_transport(config: &ClientConfig) -> Result<Arc<dyn Transport>> {
        config.validate()?;
        Ok(Arc::new(HttpTransport::new(config.verify, &config.proxies)?))
    }

    /// Log in through the given transport
    pub async fn connect_with(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let mut session = Self {
            transport,
            base_url: config.url,
            verify: config.verify,
            proxies: config.proxies,
            token: None,
            list_id: config.list_id,
            column_policy: config.column_policy,
            logout_timeout: Duration::from_secs(config.logout_timeout_secs),
            active_lists: HashMap::new(),
        };

        let mut params = Map::new();
        params.insert(param(LOGIN_PREFIX, "login"), Value::String(config.login.clone()));
        params.insert(param(LOGIN_PREFIX, "password"), Value::String(config.password));

        let endpoint = Endpoint::new(LOGIN_SERVICE, "login").service_type(ServiceType::Core);
        let reply = session
            .send(&endpoint, LOGIN_PREFIX, params)
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;

        let token = match reply {
            Reply::Json(response) => login_token(&response)?,
            Reply::Status(status) => {
                return Err(Error::Authentication(format!(
                    "login returned HTTP {} without a token",
                    status
                )))
            }
        };

        info!("Logged in to {} as {}", session.base_url, config.login);
        session.token = Some(token);
        Ok(session)
    }

    /// Log in, run `f`, then log out whatever `f` returned.
    ///
    /// ```ignore
    /// let rows = ActiveLists::scoped(config, transport, |lists| {
    ///     Box::pin(async move { lists.get_entries(None).await })
    /// })
    /// .await?;
    /// ```
    pub async fn scoped<T, F>(config: ClientConfig, transport: Arc<dyn Transport>, f: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut ActiveLists) -> BoxFuture<'a, Result<T>>,
    {
        let mut session = Self::connect_with(config, transport).await?;
        let result = f(&mut session).await;
        session.logout().await;
        result
    }

    /// Best-effort logout. Failures are logged and discarded.
    pub async fn logout(mut self) {
        if let Some(token) = self.token.take() {
            send_logout(
                Arc::clone(&self.transport),
                logout_endpoint().url(&self.base_url),
                token,
                self.logout_timeout,
            )
            .await;
        }
    }

    /// Retrieve info about an active list: the decoded response, or the bare status on 204
    pub async fn info(&self, resource_id: Option<&str>) -> Result<Reply> {
        let resource_id = self.resolve(resource_id)?;

        let mut params = Map::new();
        params.insert(param(ACTIVE_LIST_PREFIX, "resourceId"), Value::String(resource_id));

        self.send(&list_endpoint("getResourceById"), ACTIVE_LIST_PREFIX, params)
            .await
    }

    /// Retrieve every entry of an active list, keyed by column name.
    ///
    /// Refreshes the cached column order for the list.
    pub async fn get_entries(&mut self, resource_id: Option<&str>) -> Result<Vec<Entry>> {
        let resource_id = self.resolve(resource_id)?;
        let operation = "getEntries";

        let mut params = Map::new();
        params.insert(
            param(ACTIVE_LIST_PREFIX, "resourceId"),
            Value::String(resource_id.clone()),
        );

        let reply = self
            .send(&list_endpoint(operation), ACTIVE_LIST_PREFIX, params)
            .await?;
        let response = reply
            .json()
            .ok_or_else(|| Error::MalformedResponse("getEntries returned no body".to_string()))?;

        let table = envelope::return_value(response, ACTIVE_LIST_PREFIX, operation)?;
        let (columns, entries) = decode_entries(table)?;

        debug!("Read {} entries from list {}", entries.len(), resource_id);
        self.active_lists.insert(resource_id, columns);
        Ok(entries)
    }

    /// Add one entry to an active list
    pub async fn add_entry(&self, entry: &Entry, resource_id: Option<&str>) -> Result<Reply> {
        self.add_entries(std::slice::from_ref(entry), resource_id).await
    }

    /// Add entries in one call; columns are taken from the first entry
    pub async fn add_entries(&self, entries: &[Entry], resource_id: Option<&str>) -> Result<Reply> {
        self.modify_entries("addEntries", entries, resource_id).await
    }

    /// Remove one entry from an active list
    pub async fn delete_entry(&self, entry: &Entry, resource_id: Option<&str>) -> Result<Reply> {
        self.delete_entries(std::slice::from_ref(entry), resource_id).await
    }

    /// Remove entries in one call; columns are taken from the first entry
    pub async fn delete_entries(&self, entries: &[Entry], resource_id: Option<&str>) -> Result<Reply> {
        self.modify_entries("deleteEntries", entries, resource_id).await
    }

    /// Remove all entries from an active list
    pub async fn clear_list(&self, resource_id: Option<&str>) -> Result<Reply> {
        let resource_id = self.resolve(resource_id)?;

        let mut params = Map::new();
        params.insert(param(ACTIVE_LIST_PREFIX, "resourceId"), Value::String(resource_id.clone()));

        let reply = self
            .send(&list_endpoint("clearEntries"), ACTIVE_LIST_PREFIX, params)
            .await?;
        info!("Cleared list {}", resource_id);
        Ok(reply)
    }

    /// Current auth token, `None` once logged out
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn proxies(&self) -> &ProxyConfig {
        &self.proxies
    }

    pub fn default_list_id(&self) -> Option<&str> {
        self.list_id.as_deref()
    }

    pub fn set_default_list_id(&mut self, list_id: Option<String>) {
        self.list_id = list_id;
    }

    /// Column order cached by the last [`ActiveLists::get_entries`] on this list
    pub fn columns(&self, resource_id: &str) -> Option<&[String]> {
        self.active_lists.get(resource_id).map(Vec::as_slice)
    }

    async fn modify_entries(
        &self,
        operation: &str,
        entries: &[Entry],
        resource_id: Option<&str>,
    ) -> Result<Reply> {
        let resource_id = self.resolve(resource_id)?;
        let table = encode_entries(entries, self.column_policy)?;

        let mut params = Map::new();
        params.insert(param(ACTIVE_LIST_PREFIX, "resourceId"), Value::String(resource_id.clone()));
        params.insert(param(ACTIVE_LIST_PREFIX, "entryList"), table);

        let reply = self
            .send(&list_endpoint(operation), ACTIVE_LIST_PREFIX, params)
            .await?;
        info!("{} {} entries on list {}", operation, entries.len(), resource_id);
        Ok(reply)
    }

    /// Explicit id first, then the session default
    fn resolve(&self, resource_id: Option<&str>) -> Result<String> {
        resource_id
            .or(self.list_id.as_deref())
            .map(str::to_string)
            .ok_or(Error::MissingResourceId)
    }

    async fn send(&self, endpoint: &Endpoint, prefix: &str, params: Map<String, Value>) -> Result<Reply> {
        let mut body = envelope::encode(prefix, &endpoint.operation, params);
        if let Some(token) = &self.token {
            envelope::inject_auth_token(&mut body, prefix, &endpoint.operation, token);
        }

        debug!("Calling {}", endpoint);
        let raw = self.transport.post(&endpoint.url(&self.base_url), &body).await?;
        interpret(raw)
    }
}

impl Drop for ActiveLists {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        let url = logout_endpoint().url(&self.base_url);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Session dropped while logged in, scheduling logout");
                handle.spawn(send_logout(
                    Arc::clone(&self.transport),
                    url,
                    token,
                    self.logout_timeout,
                ));
            }
            Err(_) => warn!("Session dropped outside a tokio runtime, logout skipped"),
        }
    }
}

fn list_endpoint(operation: &str) -> Endpoint {
    Endpoint::new(ACTIVE_LIST_SERVICE, operation)
}

fn logout_endpoint() -> Endpoint {
    Endpoint::new(LOGIN_SERVICE, "logout").service_type(ServiceType::Core)
}

/// Pull the token out of a login response, rejecting falsy values
fn login_token(response: &Value) -> Result<String> {
    let value = envelope::return_value(response, LOGIN_PREFIX, "login")
        .map_err(|e| Error::Authentication(e.to_string()))?;

    match value {
        Value::String(token) if !token.is_empty() => Ok(token.clone()),
        Value::Null | Value::Bool(false) | Value::String(_) => Err(Error::Authentication(
            "Could not connect to ArcSight ESM: empty login response".to_string(),
        )),
        other => Err(Error::Authentication(format!(
            "unexpected login token value: {}",
            other
        ))),
    }
}

async fn send_logout(transport: Arc<dyn Transport>, url: String, token: String, timeout: Duration) {
    let mut body = envelope::encode(LOGIN_PREFIX, "logout", Map::new());
    envelope::inject_auth_token(&mut body, LOGIN_PREFIX, "logout", &token);

    match tokio::time::timeout(timeout, transport.post(&url, &body)).await {
        Ok(Ok(raw)) => match interpret(raw) {
            Ok(_) => info!("Logged out"),
            Err(e) => warn!("Logout failed: {}", e),
        },
        Ok(Err(e)) => warn!("Logout failed: {}", e),
        Err(_) => warn!("Logout timed out after {:?}", timeout),
    }
}
