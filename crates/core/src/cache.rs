use std::path::{Path, PathBuf};

pub const MODEL_CONFIG_FILE: &str = "config.json";
pub const MODEL_WEIGHTS_FILE: &str = "model.safetensors";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vidmood")
}

/// Directory for one hub repo's files, e.g. `models/distilbert--distilbert-base-uncased`.
pub fn get_model_dir(cache_dir: &Path, repo: &str) -> PathBuf {
    cache_dir.join("models").join(repo.replace('/', "--"))
}

/// Hub download URL of `file` on the `main` revision of `repo`.
pub fn hub_file_url(repo: &str, file: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{file}")
}
