pub mod distilbert;
pub mod lexicon;
pub mod llm;
pub mod transformer;

pub use distilbert::{DistilBertSst2, ModelFiles, ensure_model};
pub use lexicon::{PolarityAnalyzer, VaderLexicon, score_lexicon_table};
pub use llm::{
    ChatCompletionClient, CompletionClient, DIMENSIONS, build_prompt, parse_ratings,
    score_llm_table,
};
pub use transformer::{
    ChunkProbs, SequenceClassifier, TokenEncoder, TransformerScorer, chunk_token_ids, softmax2,
    score_transformer_table,
};
