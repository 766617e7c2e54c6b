use crate::traits::VectorStore;
use crate::{CollectionStats, Distance, Point, ScrolledPoint, StoreError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct QdrantStore {
    endpoint: Url,
    client: Client,
}

impl QdrantStore {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint.trim_end_matches('/'))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(StoreError::Request(format!(
                "qdrant endpoint must be an http(s) url, got {endpoint}"
            )));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|_| StoreError::Request("invalid qdrant api key".to_string()))?;
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn collection_url(&self, name: &str, suffix: &str) -> Result<Url, StoreError> {
        let path = format!("collections/{name}{suffix}");
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(&path)?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::BackendResponse {
        backend: "qdrant".to_string(),
        details: format!("{status}: {body}"),
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.collection_url(name, "")?)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response).await?;
        Ok(())
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.collection_url(name, "")?)
            .json(&json!({
                "vectors": {
                    "size": vector_size,
                    "distance": distance.as_qdrant(),
                }
            }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn upsert(&self, name: &str, points: &[Point]) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let mut url = self.collection_url(name, "/points")?;
        url.set_query(Some("wait=true"));
        let response = self
            .client
            .put(url)
            .json(&json!({ "points": points }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn scroll(
        &self,
        name: &str,
        limit: usize,
        with_payload: bool,
        with_vectors: bool,
    ) -> Result<Vec<ScrolledPoint>, StoreError> {
        let response = self
            .client
            .post(self.collection_url(name, "/points/scroll")?)
            .json(&json!({
                "limit": limit,
                "with_payload": with_payload,
                "with_vector": with_vectors,
            }))
            .send()
            .await?;
        let parsed: Value = ensure_success(response).await?.json().await?;
        Ok(parse_scroll(&parsed))
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionStats, StoreError> {
        let response = self
            .client
            .get(self.collection_url(name, "")?)
            .send()
            .await?;
        let parsed: Value = ensure_success(response).await?.json().await?;
        Ok(parse_stats(&parsed))
    }
}

fn parse_scroll(body: &Value) -> Vec<ScrolledPoint> {
    body.pointer("/result/points")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(|point| {
                    let id = point.pointer("/id").and_then(Value::as_u64)?;
                    let payload = point
                        .pointer("/payload")
                        .and_then(Value::as_object)
                        .cloned();
                    let vector = point.pointer("/vector").and_then(Value::as_array).map(|values| {
                        values
                            .iter()
                            .filter_map(Value::as_f64)
                            .map(|value| value as f32)
                            .collect()
                    });
                    Some(ScrolledPoint {
                        id,
                        payload,
                        vector,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_stats(body: &Value) -> CollectionStats {
    let result = body
        .pointer("/result")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);
    CollectionStats {
        points_count: result
            .get("points_count")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        vectors_count: result.get("vectors_count").and_then(Value::as_u64),
        status: result
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}
