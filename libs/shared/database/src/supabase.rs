use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

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

    fn get_headers(&self, auth_token: Option<&str>, prefer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        if let Some(prefer_value) = prefer {
            headers.insert("Prefer", HeaderValue::from_str(prefer_value).unwrap());
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_prefer(method, path, auth_token, body, None)
            .await
    }

    /// Insert one row and return the stored representation.
    pub async fn insert<T>(&self, table: &str, auth_token: Option<&str>, row: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}", table);
        let rows: Vec<T> = self
            .request_with_prefer(
                Method::POST,
                &path,
                auth_token,
                Some(row),
                Some("return=representation"),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert into {} returned no representation", table))
    }

    /// Patch rows matching the filter query string and return them.
    pub async fn update<T>(
        &self,
        table: &str,
        filter: &str,
        auth_token: Option<&str>,
        changes: Value,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/{}?{}", table, filter);
        self.request_with_prefer(
            Method::PATCH,
            &path,
            auth_token,
            Some(changes),
            Some("return=representation"),
        )
        .await
    }

    pub async fn delete(&self, table: &str, filter: &str, auth_token: Option<&str>) -> Result<()> {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let url = format!("{}{}", self.base_url, path);
        debug!("Deleting from {}", url);

        let response = self
            .client
            .request(Method::DELETE, &url)
            .headers(self.get_headers(auth_token, None))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(anyhow!("API error ({}): {}", status, error_text));
        }

        Ok(())
    }

    /// Exact row count for a filter, via the Content-Range header.
    pub async fn count(&self, table: &str, filter: &str, auth_token: Option<&str>) -> Result<i64> {
        let path = if filter.is_empty() {
            format!("/rest/v1/{}?select=id", table)
        } else {
            format!("/rest/v1/{}?select=id&{}", table, filter)
        };
        let url = format!("{}{}", self.base_url, path);

        let mut headers = self.get_headers(auth_token, Some("count=exact"));
        headers.insert("Range", HeaderValue::from_static("0-0"));

        let response = self.client.get(&url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 416 {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(anyhow!("API error ({}): {}", status, error_text));
        }

        // Content-Range: 0-0/123
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| anyhow!("Missing count in Content-Range header"))?;

        Ok(total)
    }

    async fn request_with_prefer<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        prefer: Option<&str>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let headers = self.get_headers(auth_token, prefer);

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Conflict: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
