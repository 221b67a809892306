//! Ollama auto-discovery helpers.
//!
//! Silently pings the configured Ollama instance and, if responsive, fetches
//! the names of locally downloaded models from the `/api/tags` endpoint.

use serde::Deserialize;

/// Raw shape of the `/api/tags` JSON response.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Ping the Ollama server and return the names of the locally available
/// models, or a human-readable reason when it cannot be reached.
pub fn fetch_model_names(base_url: &str) -> Result<Vec<String>, String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = reqwest::blocking::get(&url)
        .map_err(|e| format!("Ollama unreachable at {url}: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("Ollama returned HTTP {}", response.status()));
    }

    let tags: TagsResponse = response
        .json()
        .map_err(|e| format!("Failed to parse Ollama response: {e}"))?;

    Ok(tags.models.into_iter().map(|m| m.name).collect())
}
