use anyhow::{Context, bail};
use libpathfinder::NamespacePath;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

pub mod types;

use types::{DataLocation, replica_uris};

/// Environment variable holding the Data Management API access token.
pub const TOKEN_ENV: &str = "DATA_MANAGEMENT_ACCESS_TOKEN";

#[async_trait::async_trait]
pub trait RequestBuilderExt {
    async fn send_and_json<U>(self) -> anyhow::Result<U>
    where
        U: DeserializeOwned;
}

#[async_trait::async_trait]
impl RequestBuilderExt for RequestBuilder {
    async fn send_and_json<U>(self) -> anyhow::Result<U>
    where
        U: DeserializeOwned,
    {
        self.send()
            .await?
            .error_for_status()?
            .json::<U>()
            .await
            .with_context(|| "Failed to deserialize response")
    }
}

/// Client for the `data/list` and `data/locate` endpoints.
pub struct DataManagementClient {
    base_url: String,
    client: Client,
}

impl DataManagementClient {
    pub fn new(base_url: impl Into<String>, token: &str) -> anyhow::Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("Access token is not a valid header value")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Builds a client using the token from [`TOKEN_ENV`].
    pub fn from_env(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .with_context(|| format!("Please set the {TOKEN_ENV} environment variable"))?;
        Self::new(base_url, &token)
    }

    pub async fn namespaces(&self) -> anyhow::Result<Vec<String>> {
        let url = format!("{}/data/list", self.base_url);
        self.client
            .get(url)
            .send_and_json()
            .await
            .context("Unable to fetch data namespaces from Data Management API")
    }

    pub async fn locate(&self, namespace: &str, file: &str) -> anyhow::Result<Vec<DataLocation>> {
        let url = format!("{}/data/locate/{namespace}/{file}", self.base_url);
        self.client
            .get(url)
            .send_and_json()
            .await
            .with_context(|| format!("Error locating file '{file}' in namespace '{namespace}'"))
    }

    /// Locates `file` and resolves its replicas to a single namespace path.
    pub async fn replica_path(&self, namespace: &str, file: &str) -> anyhow::Result<NamespacePath> {
        let namespaces = self.namespaces().await?;
        if !namespaces.iter().any(|ns| ns == namespace) {
            bail!("Namespace '{namespace}' not found. Available namespaces: {namespaces:?}");
        }

        let locations = self.locate(namespace, file).await?;
        if locations.is_empty() {
            bail!("File '{file}' not found in namespace '{namespace}'.");
        }
        for location in &locations {
            tracing::debug!(
                "'{file}' at {} (storage area {}): {} replicas",
                location.identifier,
                location.associated_storage_area_id,
                location.replicas.len()
            );
        }

        Ok(libpathfinder::resolve(
            namespace,
            file,
            replica_uris(&locations),
        )?)
    }
}
