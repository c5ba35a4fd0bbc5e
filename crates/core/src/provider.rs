#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key for {provider_name}: {env_var} environment variable is not set")]
    MissingApiKey {
        provider_name: String,
        env_var: String,
    },
}

/// Hosted chat-completion providers speaking the OpenAI wire format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4.1",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String, ProviderError> {
        let config = self.config();
        std::env::var(config.env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey {
                provider_name: self.name().to_string(),
                env_var: config.env_var.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_provider_is_openai_chat_completions() {
        let config = Provider::default().config();
        assert_eq!(config.env_var, "OPENAI_API_KEY");
        assert!(config.api_url.ends_with("/chat/completions"));
    }

    #[test]
    fn every_provider_has_a_distinct_key_variable() {
        let vars: Vec<_> = [Provider::Openai, Provider::Grok, Provider::Gemini]
            .iter()
            .map(|p| p.config().env_var)
            .collect();
        assert_eq!(vars, ["OPENAI_API_KEY", "XAI_API_KEY", "GEMINI_API_KEY"]);
    }
}
