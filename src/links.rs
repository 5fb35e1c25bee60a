//! Link list loading and pre-validation.
//!
//! Reads newline-separated feed URLs, removes duplicates while preserving
//! order, and optionally drops links that a plain HTTP GET shows to be
//! dead. The traversal consumes the result as an ordered sequence and
//! processes each link independently.

use crate::config::LinksConfig;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub async fn load_links(config: &LinksConfig) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(&config.file)
        .with_context(|| format!("failed to read links file: {}", config.file))?;

    let mut seen = HashSet::new();
    let links: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(line.to_string()))
        .map(String::from)
        .collect();
    tracing::info!(count = links.len(), file = %config.file, "unique links loaded");

    if !config.validate {
        return Ok(links);
    }

    let client = reqwest::Client::builder()
        .user_agent(DESKTOP_UA)
        .timeout(Duration::from_secs(config.request_timeout_s))
        .build()
        .context("failed to build http client")?;

    let mut valid = Vec::with_capacity(links.len());
    for link in &links {
        if validate_url(&client, link).await {
            valid.push(link.clone());
        } else {
            tracing::warn!(link, "dead or unreachable link skipped");
        }
    }
    if valid.len() < links.len() {
        tracing::warn!(
            skipped = links.len() - valid.len(),
            "invalid or inaccessible links dropped"
        );
    }
    Ok(valid)
}

/// A link is valid unless it resolves to gone (404/410) or is unreachable.
/// Redirects are followed; all other statuses pass, since the real page
/// may still render behind auth walls or geo fences.
async fn validate_url(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => !matches!(response.status().as_u16(), 404 | 410),
        Err(e) => {
            tracing::debug!(url, error = %e, "validation request failed");
            false
        }
    }
}
