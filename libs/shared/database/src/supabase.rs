use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DbError;

/// `column=eq.value` with the value percent-encoded.
pub fn eq_filter(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        headers
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T, DbError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T, DbError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(DbError::from_response(status, &text));
        }

        // 204 responses carry no body; treat them as an empty row set.
        let payload = if text.trim().is_empty() { "[]" } else { text.as_str() };
        Ok(serde_json::from_str(payload)?)
    }

    /// `GET /rest/v1/{table}?{query}`
    pub async fn select<T>(&self, table: &str, query: &str, auth_token: Option<&str>)
                           -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        let path = Self::rest_path(table, query);
        self.request(Method::GET, &path, auth_token, None).await
    }

    pub async fn select_one<T>(&self, table: &str, query: &str, auth_token: Option<&str>)
                               -> Result<Option<T>, DbError>
    where T: DeserializeOwned {
        let rows: Vec<T> = self.select(table, query, auth_token).await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one object or, when `body` is an array, every element in a single statement.
    pub async fn insert<T>(&self, table: &str, body: Value, auth_token: Option<&str>)
                           -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        self.insert_returning(table, "", body, auth_token).await
    }

    /// Like `insert`, with the returned representation limited to `columns`.
    pub async fn insert_returning<T>(&self, table: &str, columns: &str, body: Value,
                                     auth_token: Option<&str>)
                                     -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        let query = if columns.is_empty() { String::new() } else { format!("select={}", columns) };
        let path = Self::rest_path(table, &query);
        self.request_with_headers(
            Method::POST,
            &path,
            auth_token,
            Some(body),
            Some(Self::representation_headers()),
        ).await
    }

    pub async fn update<T>(&self, table: &str, filter: &str, body: Value, auth_token: Option<&str>)
                           -> Result<Vec<T>, DbError>
    where T: DeserializeOwned {
        let path = Self::rest_path(table, filter);
        self.request_with_headers(
            Method::PATCH,
            &path,
            auth_token,
            Some(body),
            Some(Self::representation_headers()),
        ).await
    }

    /// Returns the deleted rows, so an empty result means nothing matched.
    pub async fn delete(&self, table: &str, filter: &str, auth_token: Option<&str>)
                        -> Result<Vec<Value>, DbError> {
        let path = Self::rest_path(table, filter);
        self.request_with_headers(
            Method::DELETE,
            &path,
            auth_token,
            None,
            Some(Self::representation_headers()),
        ).await
    }

    pub async fn exists(&self, table: &str, filter: &str, auth_token: Option<&str>)
                        -> Result<bool, DbError> {
        let query = format!("select=id&{}&limit=1", filter);
        let rows: Vec<Value> = self.select(table, &query, auth_token).await?;
        Ok(!rows.is_empty())
    }

    /// Calls a database function through `POST /rest/v1/rpc/{function}`.
    pub async fn rpc<T>(&self, function: &str, params: Value, auth_token: Option<&str>)
                        -> Result<T, DbError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, auth_token, Some(params)).await
    }

    pub fn rest_path(table: &str, query: &str) -> String {
        if query.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, query)
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
