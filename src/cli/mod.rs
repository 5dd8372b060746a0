//! Terminal commands. Output goes to stdout; logs stay on stderr.

pub mod fields;
pub mod index;
pub mod search;
pub mod stats;

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use crate::config::EmbeddingConfig;

const HF_BASE: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Files the local provider loads, with their location under [`HF_BASE`].
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
];

/// Fetch the ONNX model and tokenizer into `embedding.cache_dir`, skipping
/// files that are already present.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    for (file_name, remote) in MODEL_FILES {
        let dest = cache_dir.join(file_name);
        if dest.exists() {
            println!("{file_name} already present at {}", dest.display());
            continue;
        }
        println!("Downloading {file_name}...");
        download_file(&format!("{HF_BASE}/{remote}"), &dest).await?;
        println!("Saved {}", dest.display());
    }

    println!("Model {} ready in {}", config.model, cache_dir.display());
    Ok(())
}

/// Stream `url` into `dest` with a progress bar, via a temp file and rename.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "download of {url} failed with HTTP {}",
        response.status()
    );

    let progress = match response.content_length() {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")?
                    .progress_chars("##-"),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let tmp_path = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    while let Some(chunk) = response.chunk().await.context("error reading response")? {
        file.write_all(&chunk).await.context("error writing download")?;
        progress.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, dest)
        .await
        .with_context(|| format!("failed to move download into {}", dest.display()))?;
    progress.finish_and_clear();
    Ok(())
}
