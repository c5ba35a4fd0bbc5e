//! Long-transcript scoring with a two-class sequence classifier.
//!
//! The transcript is tokenized once without boundary markers, cut into
//! fixed-size windows, and each window is wrapped in `[CLS] … [SEP]` and
//! classified on its own. Window probabilities are averaged.

use tracing::{info, warn};

use crate::{
    csv_io::Table,
    error::{Result, VidmoodError},
    types::TransformerScore,
};

pub const TRANSFORMER_COLUMNS: [&str; 3] = [
    "transformer_neg_prob",
    "transformer_pos_prob",
    "transformer_score",
];

/// Positions a model input must keep for `[CLS]` and `[SEP]`.
const RESERVED_POSITIONS: usize = 2;

pub trait TokenEncoder {
    /// Token ids without special tokens.
    fn encode(&self, text: &str) -> Result<Vec<u32>>;
    fn cls_id(&self) -> u32;
    fn sep_id(&self) -> u32;
    /// Longest input the model accepts, boundary markers included.
    fn max_input_len(&self) -> usize;
}

pub trait SequenceClassifier {
    /// Raw logits `[negative, positive]` for one full input sequence.
    fn logits(&self, input_ids: &[u32]) -> Result<[f32; 2]>;
}

/// Per-window probabilities, label 0 negative and label 1 positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkProbs {
    pub neg: f64,
    pub pos: f64,
}

pub fn softmax2(logits: [f32; 2]) -> ChunkProbs {
    let [a, b] = logits.map(f64::from);
    let max = a.max(b);
    let (ea, eb) = ((a - max).exp(), (b - max).exp());
    let sum = ea + eb;
    ChunkProbs {
        neg: ea / sum,
        pos: eb / sum,
    }
}

/// Contiguous windows of at most `chunk_len` ids; the last may be shorter.
pub fn chunk_token_ids(ids: &[u32], chunk_len: usize) -> Vec<&[u32]> {
    if chunk_len == 0 {
        return Vec::new();
    }
    ids.chunks(chunk_len).collect()
}

pub struct TransformerScorer<'a, E: ?Sized, C: ?Sized> {
    encoder: &'a E,
    classifier: &'a C,
}

impl<'a, E, C> TransformerScorer<'a, E, C>
where
    E: TokenEncoder + ?Sized,
    C: SequenceClassifier + ?Sized,
{
    pub fn new(encoder: &'a E, classifier: &'a C) -> Self {
        Self {
            encoder,
            classifier,
        }
    }

    fn chunk_len(&self) -> usize {
        self.encoder
            .max_input_len()
            .saturating_sub(RESERVED_POSITIONS)
    }

    fn classify_window(&self, window: &[u32]) -> Result<ChunkProbs> {
        let mut input = Vec::with_capacity(window.len() + RESERVED_POSITIONS);
        input.push(self.encoder.cls_id());
        input.extend_from_slice(window);
        input.push(self.encoder.sep_id());
        Ok(softmax2(self.classifier.logits(&input)?))
    }

    /// Average window probabilities over the whole transcript.
    pub fn score(&self, text: &str) -> Result<TransformerScore> {
        let ids = self.encoder.encode(text)?;
        let windows = chunk_token_ids(&ids, self.chunk_len());
        if windows.is_empty() {
            return Err(VidmoodError::NoContent);
        }

        let (mut neg, mut pos) = (0.0, 0.0);
        for window in &windows {
            let probs = self.classify_window(window)?;
            neg += probs.neg;
            pos += probs.pos;
        }
        let n = windows.len() as f64;
        let (neg_prob, pos_prob) = (neg / n, pos / n);
        Ok(TransformerScore {
            neg_prob,
            pos_prob,
            score: pos_prob - neg_prob,
        })
    }

    /// One window, truncated to the model limit.
    pub fn score_sentence(&self, text: &str) -> Result<TransformerScore> {
        let mut ids = self.encoder.encode(text)?;
        if ids.is_empty() {
            return Err(VidmoodError::NoContent);
        }
        ids.truncate(self.chunk_len());
        let probs = self.classify_window(&ids)?;
        Ok(TransformerScore {
            neg_prob: probs.neg,
            pos_prob: probs.pos,
            score: probs.pos - probs.neg,
        })
    }
}

/// Append the three transformer columns; rows that cannot be scored keep
/// empty cells. `on_row` is called after each row with its 1-based index.
pub fn score_transformer_table<E, C>(
    table: &mut Table,
    scorer: &TransformerScorer<'_, E, C>,
    mut on_row: impl FnMut(usize, usize),
) -> Result<usize>
where
    E: TokenEncoder + ?Sized,
    C: SequenceClassifier + ?Sized,
{
    let column = table.column("transcript")?;
    let total = table.rows.len();
    let mut failed = 0;

    let mut values = Vec::with_capacity(total);
    for (idx, row) in table.rows.iter().enumerate() {
        let cells = match scorer.score(row.get(column).unwrap_or("")) {
            Ok(s) => vec![
                s.neg_prob.to_string(),
                s.pos_prob.to_string(),
                s.score.to_string(),
            ],
            Err(e) => {
                warn!("row {}: transformer scoring skipped ({e})", idx + 1);
                failed += 1;
                vec![String::new(); TRANSFORMER_COLUMNS.len()]
            }
        };
        values.push(cells);
        on_row(idx + 1, total);
    }

    table.append_columns(&TRANSFORMER_COLUMNS, values);
    info!("transformer scored {} of {total} rows", total - failed);
    Ok(failed)
}
