use tracing::info;
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::{csv_io::Table, error::Result, types::LexiconScores};

pub const LEXICON_COLUMNS: [&str; 4] = ["neg", "neu", "pos", "compound"];

pub trait PolarityAnalyzer {
    fn polarity(&self, text: &str) -> LexiconScores;
}

/// VADER rule-based analyzer.
pub struct VaderLexicon {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl Default for VaderLexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl VaderLexicon {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl PolarityAnalyzer for VaderLexicon {
    fn polarity(&self, text: &str) -> LexiconScores {
        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        LexiconScores {
            neg: get("neg"),
            neu: get("neu"),
            pos: get("pos"),
            compound: get("compound"),
        }
    }
}

/// Drop rows without a transcript, then append `neg, neu, pos, compound`.
pub fn score_lexicon_table<A: PolarityAnalyzer + ?Sized>(
    table: &mut Table,
    analyzer: &A,
) -> Result<()> {
    let dropped = table.retain_present("transcript")?;
    if dropped > 0 {
        info!("dropped {dropped} rows without a transcript");
    }
    let column = table.column("transcript")?;

    let values = table
        .rows
        .iter()
        .map(|row| {
            let s = analyzer.polarity(row.get(column).unwrap_or(""));
            [s.neg, s.neu, s.pos, s.compound]
                .iter()
                .map(|v| v.to_string())
                .collect()
        })
        .collect();
    table.append_columns(&LEXICON_COLUMNS, values);
    Ok(())
}
