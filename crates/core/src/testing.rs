//! In-memory `VectorStore` used by unit tests.

use crate::traits::VectorStore;
use crate::{CollectionStats, Distance, Point, ScrolledPoint, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Delete(String),
    Create(String, usize, Distance),
    Upsert(String, usize),
}

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<u64, Point>>,
    calls: Vec<Call>,
    upserts: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_on_upsert: Option<usize>,
}

impl MemoryStore {
    /// The `nth` upsert call (1-based) fails.
    pub fn failing_on_upsert(nth: usize) -> Self {
        Self {
            fail_on_upsert: Some(nth),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().expect("store lock").calls.clone()
    }

    pub fn upsert_sizes(&self, name: &str) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Upsert(collection, size) if collection == name => Some(size),
                _ => None,
            })
            .collect()
    }

    pub fn point_count(&self, name: &str) -> usize {
        self.points(name).len()
    }

    pub fn points(&self, name: &str) -> Vec<Point> {
        self.state
            .lock()
            .expect("store lock")
            .collections
            .get(name)
            .map(|points| points.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert_collection(&self, name: &str, points: Vec<Point>) {
        let mut state = self.state.lock().expect("store lock");
        let collection = state.collections.entry(name.to_string()).or_default();
        for point in points {
            collection.insert(point.id, point);
        }
    }
}

fn missing(name: &str) -> StoreError {
    StoreError::BackendResponse {
        backend: "memory".to_string(),
        details: format!("collection {name} not found"),
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store lock");
        state.calls.push(Call::Delete(name.to_string()));
        state.collections.remove(name);
        Ok(())
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: usize,
        distance: Distance,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store lock");
        state
            .calls
            .push(Call::Create(name.to_string(), vector_size, distance));
        if state.collections.contains_key(name) {
            return Err(StoreError::Request(format!("collection {name} already exists")));
        }
        state.collections.insert(name.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn upsert(&self, name: &str, points: &[Point]) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store lock");
        state.upserts += 1;
        if self.fail_on_upsert == Some(state.upserts) {
            return Err(StoreError::Request("injected upsert failure".to_string()));
        }
        state.calls.push(Call::Upsert(name.to_string(), points.len()));
        let collection = state
            .collections
            .get_mut(name)
            .ok_or_else(|| missing(name))?;
        for point in points {
            collection.insert(point.id, point.clone());
        }
        Ok(())
    }

    async fn scroll(
        &self,
        name: &str,
        limit: usize,
        with_payload: bool,
        with_vectors: bool,
    ) -> Result<Vec<ScrolledPoint>, StoreError> {
        let state = self.state.lock().expect("store lock");
        let collection = state.collections.get(name).ok_or_else(|| missing(name))?;
        Ok(collection
            .values()
            .take(limit)
            .map(|point| ScrolledPoint {
                id: point.id,
                payload: with_payload.then(|| point.payload.clone()),
                vector: with_vectors.then(|| point.vector.clone()),
            })
            .collect())
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionStats, StoreError> {
        let state = self.state.lock().expect("store lock");
        let collection = state.collections.get(name).ok_or_else(|| missing(name))?;
        Ok(CollectionStats {
            points_count: collection.len() as u64,
            vectors_count: Some(collection.len() as u64),
            status: "green".to_string(),
        })
    }
}
