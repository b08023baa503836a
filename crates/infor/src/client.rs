//! Infor CloudSuite Industrial IDO client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::InforError;
use crate::models::{CollectionPage, CollectionRequest, RawRow};

/// Configuration names that must never be used. The client refuses them at
/// construction time so a misconfigured deployment cannot write filters
/// against production data.
const FORBIDDEN_CONFIGS: [&str; 4] = ["LIVE", "PROD", "PRODUCTION", "SL"];

/// Tokens are valid for 60 minutes (SyteLine default); refresh after 55.
const TOKEN_LIFETIME_MINUTES: i64 = 55;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);
const METHOD_TIMEOUT: Duration = Duration::from_secs(30);
const COLLECTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the Infor API.
#[derive(Debug, Clone)]
pub struct InforConnection {
    pub base_url: String,
    pub config: String,
    pub username: String,
    pub password: String,
    /// The on-prem gateway usually runs with a self-signed certificate.
    pub accept_invalid_certs: bool,
}

/// Async interface over the IDO API, so the scheduler and importers can run
/// against a mock in tests.
#[async_trait]
pub trait InforClientTrait: Send + Sync {
    async fn load_collection(
        &self,
        request: CollectionRequest,
    ) -> Result<CollectionPage, InforError>;

    async fn invoke_method(
        &self,
        ido_name: &str,
        method_name: &str,
        parameters: &[(String, String)],
    ) -> Result<Value, InforError>;

    async fn get_ido_info(&self, ido_name: &str) -> Result<Value, InforError>;
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Client for the Infor CloudSuite Industrial REST API (JSON endpoints).
///
/// Authentication is header-based: the token endpoint takes `UserId` and
/// `Password` headers, data endpoints take the raw token in `Authorization`
/// (no `Bearer` prefix). The token is cached process-wide and re-fetched
/// before its stated expiry.
pub struct InforApiClient {
    base_url: String,
    config: String,
    username: String,
    password: String,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl InforApiClient {
    pub fn new(connection: InforConnection) -> Result<Self, InforError> {
        if FORBIDDEN_CONFIGS.contains(&connection.config.to_uppercase().as_str()) {
            return Err(InforError::ForbiddenConfig(connection.config));
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(connection.accept_invalid_certs)
            .build()?;

        Ok(Self {
            base_url: connection.base_url.trim_end_matches('/').to_string(),
            config: connection.config,
            username: connection.username,
            password: connection.password,
            http,
            token: RwLock::new(None),
        })
    }

    /// Returns a valid security token, fetching a fresh one when the cached
    /// token is missing or close to expiry.
    async fn token(&self) -> Result<String, InforError> {
        {
            let cached = self.token.read().await;
            if let Some(t) = cached.as_ref() {
                if t.expires_at > Utc::now() {
                    return Ok(t.token.clone());
                }
            }
        }

        info!("Requesting new token from Infor API (config={})", self.config);

        let response = self
            .http
            .get(format!("{}/json/token/{}", self.base_url, self.config))
            .header("UserId", &self.username)
            .header("Password", &self.password)
            .header("accept", "application/json")
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InforError::Auth(format!("token request failed: {status} {body}")));
        }

        let body: Value = response.json().await?;

        // The token key varies between gateway versions.
        let token = ["Token", "token", "SecurityToken", "value"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| InforError::Auth(format!("token not found in response: {body}")))?;

        let expires_at = Utc::now() + chrono::Duration::minutes(TOKEN_LIFETIME_MINUTES);
        debug!("Token acquired, expires at {expires_at}");

        *self.token.write().await = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });

        Ok(token)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, InforError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(InforError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl InforClientTrait for InforApiClient {
    async fn load_collection(
        &self,
        request: CollectionRequest,
    ) -> Result<CollectionPage, InforError> {
        let token = self.token().await?;

        let mut params: Vec<(String, String)> =
            vec![("props".to_string(), request.properties.join(","))];
        if let Some(filter) = &request.filter {
            params.push(("filter".to_string(), filter.clone()));
        }
        if let Some(order_by) = &request.order_by {
            params.push(("orderBy".to_string(), order_by.clone()));
        }
        // rowcap: -1 = don't send (API default 200), 0 = unlimited, >0 = limit
        if request.record_cap >= 0 {
            params.push(("rowcap".to_string(), request.record_cap.to_string()));
        }
        if let Some(load_type) = request.load_type {
            params.push(("loadtype".to_string(), load_type.as_str().to_string()));
        }
        if let Some(bookmark) = &request.bookmark {
            params.push(("bookmark".to_string(), bookmark.clone()));
        }
        if request.distinct {
            params.push(("distinct".to_string(), "true".to_string()));
        }

        debug!("LoadCollection: {} filter={:?}", request.ido_name, request.filter);

        // The /adv endpoint supports rowcap and bookmark pagination.
        let response = self
            .http
            .get(format!("{}/json/{}/adv", self.base_url, request.ido_name))
            .query(&params)
            .header("Authorization", &token)
            .timeout(COLLECTION_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let body: Value = response.json().await?;

        let (raw_rows, bookmark) = match &body {
            Value::Object(map) => {
                let bookmark = map
                    .get("Bookmark")
                    .or_else(|| map.get("bookmark"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let rows = map
                    .get("Items")
                    .or_else(|| map.get("value"))
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                (rows, bookmark)
            }
            Value::Array(rows) => (rows.clone(), None),
            other => {
                warn!("Unexpected LoadCollection response shape: {other}");
                return Ok(CollectionPage::default());
            }
        };

        let data = normalize_rows(&request.properties, raw_rows);

        // If a bookmark came back there may be more data: an unlimited request
        // hit the gateway's hard page limit, a limited one filled its cap.
        let has_more = match &bookmark {
            Some(_) if request.record_cap == 0 => !data.is_empty(),
            Some(_) => data.len() as i64 == request.record_cap,
            None => false,
        };

        debug!(
            "LoadCollection {}: {} rows (has_more={})",
            request.ido_name,
            data.len(),
            has_more
        );

        Ok(CollectionPage {
            data,
            bookmark,
            has_more,
        })
    }

    async fn invoke_method(
        &self,
        ido_name: &str,
        method_name: &str,
        parameters: &[(String, String)],
    ) -> Result<Value, InforError> {
        let token = self.token().await?;

        debug!("InvokeMethod: {ido_name}.{method_name}");

        let response = self
            .http
            .get(format!("{}/json/method/{ido_name}/{method_name}", self.base_url))
            .query(parameters)
            .header("Authorization", &token)
            .timeout(METHOD_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn get_ido_info(&self, ido_name: &str) -> Result<Value, InforError> {
        let token = self.token().await?;

        debug!("GetIDOInfo: {ido_name}");

        let response = self
            .http
            .get(format!("{}/json/idoinfo/{ido_name}", self.base_url))
            .header("Authorization", &token)
            .timeout(METHOD_TIMEOUT)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }
}

/// Normalizes the three row shapes the gateway produces into uniform map rows:
/// object rows pass through, `{Name, Value}` pair arrays are collected, and
/// plain positional arrays are zipped with the projected property list.
pub fn normalize_rows(properties: &[String], raw_rows: Vec<Value>) -> Vec<RawRow> {
    let mut rows = Vec::with_capacity(raw_rows.len());

    for raw in raw_rows {
        match raw {
            Value::Object(map) => rows.push(map),
            Value::Array(cells) => {
                let is_name_value = cells
                    .first()
                    .and_then(Value::as_object)
                    .map(|o| o.contains_key("Name") && o.contains_key("Value"))
                    .unwrap_or(false);

                let mut row = RawRow::new();
                if is_name_value {
                    for cell in cells {
                        if let Value::Object(pair) = cell {
                            if let (Some(name), Some(value)) =
                                (pair.get("Name").and_then(Value::as_str), pair.get("Value"))
                            {
                                row.insert(name.to_string(), value.clone());
                            }
                        }
                    }
                } else {
                    for (name, value) in properties.iter().zip(cells) {
                        row.insert(name.clone(), value);
                    }
                }
                rows.push(row);
            }
            other => {
                warn!("Skipping row with unexpected shape: {other}");
            }
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_forbidden_configs_rejected() {
        for config in ["LIVE", "prod", "Production", "sl"] {
            let result = InforApiClient::new(InforConnection {
                base_url: "https://erp.example.test".to_string(),
                config: config.to_string(),
                username: String::new(),
                password: String::new(),
                accept_invalid_certs: true,
            });
            assert!(
                matches!(result, Err(InforError::ForbiddenConfig(_))),
                "config '{config}' must be refused"
            );
        }
    }

    #[test]
    fn test_test_config_accepted() {
        let result = InforApiClient::new(InforConnection {
            base_url: "https://erp.example.test/".to_string(),
            config: "TEST".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            accept_invalid_certs: true,
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalize_object_rows() {
        let rows = normalize_rows(
            &props(&["Item", "Description"]),
            vec![json!({"Item": "ABC", "Description": "Widget"})],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Item"], "ABC");
        assert_eq!(rows[0]["Description"], "Widget");
    }

    #[test]
    fn test_normalize_positional_rows() {
        let rows = normalize_rows(
            &props(&["Item", "Description"]),
            vec![json!(["ABC", "Widget"]), json!(["DEF", "Bracket"])],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Item"], "ABC");
        assert_eq!(rows[1]["Description"], "Bracket");
    }

    #[test]
    fn test_normalize_name_value_rows() {
        let rows = normalize_rows(
            &props(&["Item", "Description"]),
            vec![json!([
                {"Name": "Item", "Value": "ABC"},
                {"Name": "Description", "Value": "Widget"}
            ])],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Item"], "ABC");
        assert_eq!(rows[0]["Description"], "Widget");
    }

    #[test]
    fn test_normalize_short_positional_row() {
        // A row with fewer cells than projected properties keeps what it has.
        let rows = normalize_rows(&props(&["Item", "Description"]), vec![json!(["ABC"])]);
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["Item"], "ABC");
    }
}
