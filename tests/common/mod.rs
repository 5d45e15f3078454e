//! Shared test doubles: a deterministic embedder, a canned language model,
//! and failing variants for degraded-path tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use esg_rag::{EmbeddingProvider, LanguageModel, RagError, Result};

/// Deterministic bag-of-words embedder: each word hashes into one of
/// `dims` buckets, so texts sharing vocabulary score high cosine
/// similarity while disjoint texts score near zero.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[(fnv1a(word) % self.dims as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// A [`HashEmbedder`] that stalls each batch, for build-lease contention
/// tests: while a rebuild sits in the stall it holds the exclusive state
/// lease, so concurrent queries and health checks must queue behind it.
pub struct SlowEmbedder {
    inner: HashEmbedder,
    batch_delay: Duration,
}

impl SlowEmbedder {
    pub fn new(dims: usize, batch_delay: Duration) -> Self {
        Self { inner: HashEmbedder::new(dims), batch_delay }
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        tokio::time::sleep(self.batch_delay).await;
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// An embedder that always fails, for abort-path tests.
pub struct FailingEmbedder {
    dims: usize,
}

impl FailingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding {
            provider: "failing".to_string(),
            message: "backend unavailable".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// A language model that echoes a canned grounded answer.
pub struct CannedLlm;

#[async_trait]
impl LanguageModel for CannedLlm {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        assert!(prompt.contains("Context:"), "prompt must embed the context block");
        Ok("Based on the provided context, emissions fell against the baseline.".to_string())
    }
}

/// A language model that always fails, for degraded-answer tests.
pub struct FailingLlm;

#[async_trait]
impl LanguageModel for FailingLlm {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        Err(RagError::Llm {
            provider: "failing".to_string(),
            message: "backend unavailable".to_string(),
        })
    }
}

/// Write a small three-document ESG corpus into `root`.
pub fn write_corpus(root: &Path) {
    fs::create_dir_all(root).unwrap();
    fs::write(
        root.join("carbon_emissions_2023.txt"),
        "Scope 1 and scope 2 emissions fell 12% against the 2020 baseline. \
         The carbon reduction roadmap targets net zero by 2040. \
         Renewable electricity covered 64% of operations this year.",
    )
    .unwrap();
    fs::write(
        root.join("community_programs.txt"),
        "Community investment reached 2.1 million across education and health \
         programs. Employee volunteering hours doubled year over year. \
         Supplier labor audits covered 88% of tier one factories.",
    )
    .unwrap();
    fs::write(
        root.join("board_compliance.txt"),
        "The board approved the updated compliance framework in March. \
         Governance training completion reached 97% of staff. \
         The audit committee reviewed whistleblowing reports quarterly.",
    )
    .unwrap();
}
