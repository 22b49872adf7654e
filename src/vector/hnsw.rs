// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HNSW graph over chunk embeddings
//!
//! Hierarchical Navigable Small World (HNSW) approximate nearest neighbour
//! search with cosine distance. Vectors are L2-normalized on insert and on
//! query, so `score = 1 - distance` is the cosine similarity.
//!
//! The graph only stores positions; callers map a position back to the
//! chunk at the same offset.

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::prelude::*;

use crate::embeddings::normalize_vector;
use crate::rag::RagError;

/// Search hit: position of the stored vector and its cosine similarity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub score: f32,
}

pub struct HnswIndex {
    /// `None` for an index built from zero vectors
    hnsw: Option<Hnsw<'static, f32, DistCosine>>,
    len: usize,
    dimensions: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("len", &self.len)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl HnswIndex {
    /// Build an index from vectors that all have `dimensions` components.
    ///
    /// # Errors
    ///
    /// Returns `IndexBuild` if a vector has the wrong width or contains
    /// NaN/Infinity.
    pub fn build(vectors: &[Vec<f32>], dimensions: usize) -> Result<Self, RagError> {
        if vectors.is_empty() {
            return Ok(Self {
                hnsw: None,
                len: 0,
                dimensions,
            });
        }

        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RagError::IndexBuild(format!(
                    "Vector {} has wrong dimensions: expected {}, got {}",
                    i,
                    dimensions,
                    vector.len()
                )));
            }

            if vector.iter().any(|v| !v.is_finite()) {
                return Err(RagError::IndexBuild(format!(
                    "Vector {} contains NaN or Infinity values",
                    i
                )));
            }
        }

        let max_nb_connection = 12;
        let ef_construction = 48;
        // log2(n) layers, clamped to what hnsw_rs supports
        let max_layer = if vectors.len() > 1 {
            ((vectors.len() as f32).log2().ceil() as usize).clamp(4, 16)
        } else {
            4
        };

        let mut hnsw: Hnsw<f32, DistCosine> = Hnsw::new(
            max_nb_connection,
            vectors.len(),
            max_layer,
            ef_construction,
            DistCosine,
        );

        for (position, vector) in vectors.iter().enumerate() {
            let normalized = normalize_vector(vector);
            hnsw.insert((&normalized, position));
        }

        hnsw.set_searching_mode(true);

        Ok(Self {
            hnsw: Some(hnsw),
            len: vectors.len(),
            dimensions,
        })
    }

    /// Up to `k` nearest stored vectors, most similar first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RagError> {
        if query.len() != self.dimensions {
            return Err(RagError::Embedding(format!(
                "Query has wrong dimensions: expected {}, got {}",
                self.dimensions,
                query.len()
            )));
        }

        if query.iter().any(|v| !v.is_finite()) {
            return Err(RagError::Embedding(
                "Query contains NaN or Infinity values".to_string(),
            ));
        }

        let hnsw = match &self.hnsw {
            Some(hnsw) if k > 0 => hnsw,
            _ => return Ok(vec![]),
        };

        let normalized_query = normalize_vector(query);
        let ef_search = (k * 2).max(50);
        let neighbours: Vec<Neighbour> = hnsw.search(&normalized_query, k, ef_search);

        let mut results: Vec<Neighbor> = neighbours
            .into_iter()
            .filter(|n| n.d_id < self.len)
            .map(|n| Neighbor {
                position: n.d_id,
                score: 1.0 - n.distance,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}
