use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    csv_io::Table,
    error::{Result, VidmoodError},
    provider::Provider,
    types::LlmRatings,
};

/// Rated dimensions in reply order, with the description shown to the model.
pub const DIMENSIONS: [(&str, &str); 4] = [
    (
        "Negativity",
        "Degree of negative emotional tone expressed in the text",
    ),
    (
        "Controversiality",
        "Extent to which the text is likely to provoke disagreement or strong opposing views",
    ),
    (
        "Emotional Elevation/Excitement",
        "Level of emotional intensity or stimulation conveyed by the text",
    ),
    (
        "Overall Quality",
        "Clarity, coherence, and polish of the text's expression",
    ),
];

pub fn build_prompt(transcript: &str) -> String {
    let described = DIMENSIONS
        .iter()
        .map(|(name, description)| format!("    - {name}: {description}"))
        .collect::<Vec<_>>()
        .join("\n");
    let order = DIMENSIONS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze the following text and assign a score from 1 to 10 for each of the following dimensions:\n\
         {described}\n\
         Respond with four numbers only, in the following order:\n    {order}\n\
         Separate each number with a comma. Do not include any explanation or extra text.\n\n\
         {}",
        transcript.replace('"', "")
    )
}

/// Accepts exactly four comma-separated integers in `1..=10`.
pub fn parse_ratings(reply: &str) -> Result<LlmRatings> {
    let invalid = |reason: String| VidmoodError::ReplyParse {
        reply: reply.to_string(),
        reason,
    };

    let values = reply
        .trim()
        .split(',')
        .map(|part| {
            let part = part.trim();
            match part.parse::<u8>() {
                Ok(v) if (1..=10).contains(&v) => Ok(v),
                Ok(v) => Err(invalid(format!("rating {v} is outside 1..=10"))),
                Err(_) => Err(invalid(format!("'{part}' is not an integer"))),
            }
        })
        .collect::<Result<Vec<u8>>>()?;

    match values.as_slice() {
        &[negativity, controversiality, excitement, quality] => Ok(LlmRatings {
            negativity,
            controversiality,
            excitement,
            quality,
        }),
        other => Err(invalid(format!("expected 4 ratings, got {}", other.len()))),
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionClient {
    /// Fails early when the provider's API key variable is unset.
    pub fn from_provider(provider: Provider, model: Option<String>) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.to_string(),
            model: model.unwrap_or_else(|| config.model.to_string()),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.0,
            }))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(VidmoodError::CompletionRateLimited {
                reason: format!("{} answered {status}", self.api_url),
            });
        }
        let response = response
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| VidmoodError::CompletionFailed {
                reason: format!("Invalid API response: {:?}", response),
            })?;
        Ok(content.trim().to_string())
    }
}

/// One request, retried once after `penalty` when the provider rate-limits.
async fn complete_with_retry<C: CompletionClient + ?Sized>(
    client: &C,
    prompt: &str,
    penalty: Duration,
) -> Result<String> {
    match client.complete(prompt).await {
        Err(e @ VidmoodError::CompletionRateLimited { .. }) => {
            warn!("{e}; sleeping {}s", penalty.as_secs());
            tokio::time::sleep(penalty).await;
            client.complete(prompt).await
        }
        other => other,
    }
}

/// Append the four rating columns and return how many rows were left empty.
/// Blank transcripts, failed requests and malformed replies all leave empty
/// cells; the rows rated so far are always kept.
pub async fn score_llm_table<C: CompletionClient + ?Sized>(
    table: &mut Table,
    client: &C,
    rate_limit_penalty: Duration,
    mut on_row: impl FnMut(usize, usize),
) -> Result<usize> {
    let column = table.column("transcript")?;
    let total = table.rows.len();
    let mut failed = 0;

    let mut values = Vec::with_capacity(total);
    for (idx, row) in table.rows.iter().enumerate() {
        let transcript = row.get(column).unwrap_or("").trim();
        let cells = if transcript.is_empty() {
            warn!("row {}: blank transcript, not rated", idx + 1);
            failed += 1;
            vec![String::new(); DIMENSIONS.len()]
        } else {
            let prompt = build_prompt(transcript);
            let rated = complete_with_retry(client, &prompt, rate_limit_penalty)
                .await
                .and_then(|reply| {
                    info!("{idx}:\t{reply}");
                    parse_ratings(&reply)
                });
            match rated {
                Ok(ratings) => ratings.to_array().iter().map(u8::to_string).collect(),
                Err(e) => {
                    warn!("row {}: {e}", idx + 1);
                    failed += 1;
                    vec![String::new(); DIMENSIONS.len()]
                }
            }
        };
        values.push(cells);
        on_row(idx + 1, total);
    }

    let names = DIMENSIONS.map(|(name, _)| name);
    table.append_columns(&names, values);
    Ok(failed)
}
