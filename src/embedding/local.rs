//! Local ONNX Runtime embedding provider (all-MiniLM-L6-v2 via `ort`).
//!
//! Journal chunks are tokenized in runs of [`INFERENCE_BATCH`], passed through
//! the model, mean-pooled over the attention mask and L2-normalized.

use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};

use super::{EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// Maximum sequence length for all-MiniLM-L6-v2 (trained at 256).
const MAX_SEQ_LEN: usize = 256;

/// Texts per inference call; a full-journal batch is split into runs of this size.
const INFERENCE_BATCH: usize = 32;

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

// Safety: Tokenizer is Send+Sync and the Session is only reached through the Mutex.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let cache_dir = crate::config::expand_tilde(&config.cache_dir);
        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `journal-mcp model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `journal-mcp model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&model_path)
            .context("failed to load ONNX model")?;
        tracing::info!(model = %model_path.display(), name = %config.model, "ONNX model loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn run_inference(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let rows = encodings.len();
        let padded_len = encodings[0].get_ids().len();
        let shape = vec![rows as i64, padded_len as i64];

        let input_ids = flatten(&encodings, Encoding::get_ids);
        let attention_mask = flatten(&encodings, Encoding::get_attention_mask);
        // Single-segment input: token_type_ids are all zero.
        let token_type_ids = vec![0i64; rows * padded_len];

        let input_ids = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))?;
        let mask_tensor =
            Tensor::from_array((shape.clone(), attention_mask.clone().into_boxed_slice()))?;
        let token_type_ids = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("session lock poisoned: {e}"))?;

        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => mask_tensor,
            "token_type_ids" => token_type_ids,
        })?;

        // Output naming differs between ONNX exports.
        let hidden = outputs
            .get("token_embeddings")
            .or_else(|| outputs.get("last_hidden_state"))
            .unwrap_or_else(|| &outputs[0]);

        let (dims, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings tensor")?;
        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape: {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );

        let seq_len = dims[1] as usize;
        Ok((0..rows)
            .map(|row| {
                let tokens = &data[row * seq_len * EMBEDDING_DIM..(row + 1) * seq_len * EMBEDDING_DIM];
                let mask = &attention_mask[row * padded_len..row * padded_len + seq_len];
                l2_normalize(&mean_pool(tokens, mask, EMBEDDING_DIM))
            })
            .collect())
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .context("embedding batch returned no vector")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for run in texts.chunks(INFERENCE_BATCH) {
            vectors.extend(self.run_inference(run)?);
        }
        tracing::debug!(texts = texts.len(), "embedded batch");
        Ok(vectors)
    }
}

fn flatten(encodings: &[Encoding], field: fn(&Encoding) -> &[u32]) -> Vec<i64> {
    encodings
        .iter()
        .flat_map(|e| field(e).iter().map(|&v| v as i64))
        .collect()
}

/// Average the token vectors whose attention mask is set.
///
/// `tokens` is a row-major `[seq_len, dim]` slice and `mask` has `seq_len` entries.
fn mean_pool(tokens: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut weight = 0.0f32;
    for (token, &m) in tokens.chunks_exact(dim).zip(mask) {
        if m == 0 {
            continue;
        }
        let m = m as f32;
        for (acc, value) in pooled.iter_mut().zip(token) {
            *acc += value * m;
        }
        weight += m;
    }
    if weight > 0.0 {
        pooled.iter_mut().for_each(|v| *v /= weight);
    }
    pooled
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
