//! Detect command.

use std::path::PathBuf;

use anyhow::Context;
use tokio::io::AsyncReadExt;

use scribo_ner::{BackendKind, NerConfig, Structurer};

pub async fn cmd_detect(
    config: &NerConfig,
    texts: Vec<String>,
    input: Option<PathBuf>,
    backend: Option<&str>,
    pretty: bool,
) -> anyhow::Result<()> {
    let texts = collect_texts(texts, input).await?;

    let structurer = Structurer::init_global(config);
    let kind = match backend {
        Some(name) => name.parse::<BackendKind>()?,
        None => structurer.default_backend(),
    };

    tracing::info!("Structuring {} entries with {} backend", texts.len(), kind);
    let entities = structurer.structure_all(&texts, kind).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&entities)?
    } else {
        serde_json::to_string(&entities)?
    };
    println!("{}", json);
    Ok(())
}

/// Texts from arguments, else from the input file, else from stdin.
async fn collect_texts(texts: Vec<String>, input: Option<PathBuf>) -> anyhow::Result<Vec<String>> {
    if !texts.is_empty() {
        return Ok(texts);
    }

    let contents = match input {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    parse_entries(&contents)
}

/// A JSON array of strings, or one entry per non-blank line.
fn parse_entries(contents: &str) -> anyhow::Result<Vec<String>> {
    if contents.trim_start().starts_with('[') {
        return serde_json::from_str(contents).context("Input is not a JSON array of strings");
    }
    Ok(contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}
