use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// A job as returned by `POST /api/jobs`.
#[derive(Debug, Clone)]
pub struct CreatedJob {
    pub name: String,
    pub steps: u64,
    pub stream_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn create_job(&self, name: &str, steps: u64) -> Result<CreatedJob> {
        let url = format!("{}/api/jobs", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": name, "steps": steps }))
            .send()
            .await
            .context("Failed to create job")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Failed to create job: {} - Response: {}", status, body);
        }

        let api_response: Value = response.json().await.context("Failed to parse response")?;

        // Extract the data from ApiResponse wrapper
        let data = &api_response["data"];
        Ok(CreatedJob {
            name: data["name"]
                .as_str()
                .context("No job name in response")?
                .to_string(),
            steps: data["steps"].as_u64().context("No step count in response")?,
            stream_url: data["stream_url"]
                .as_str()
                .context("No stream URL in response")?
                .to_string(),
        })
    }

    /// Number of open event streams on `path` according to `GET /streams`.
    pub async fn open_streams(&self, path: &str) -> Result<u64> {
        let url = format!("{}/streams", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to get stream status")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to get stream status: {}", response.status());
        }

        let api_response: Value = response.json().await.context("Failed to parse response")?;

        api_response["data"]["paths"][path]
            .as_u64()
            .with_context(|| format!("No connection count for {path}"))
    }
}
