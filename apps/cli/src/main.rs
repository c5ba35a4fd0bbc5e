use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vidmood_core::{
    CORRELATION_COLUMNS, ChannelHarvestConfig, LlmConfig, PauseRange, Provider, SampleStatus,
    SamplerConfig, StratifiedSampler, Table, Tier, TierSet, TransformerConfig, VideoCsvWriter,
    YoutubeCaptions, YtDlp,
    analysis::{PLOT_TITLE, views_vs_compound},
    config::seconds,
    correlation_matrix, format_correlation_matrix, format_tier_range, harvest_channel,
    scatter_plot,
    sentiment::{
        ChatCompletionClient, DistilBertSst2, TransformerScorer, VaderLexicon, ensure_model,
        score_lexicon_table, score_llm_table, score_transformer_table,
    },
};

const EXAMPLE_SENTENCES: [&str; 4] = [
    "I absolutely love this! It's fantastic and makes me so happy!",
    "This is terrible. I hated every second of it.",
    "I'm not sure how I feel about this one, it's okay, but a bit dull.",
    "Wow, that was unexpectedly amazing!",
];

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidmood")]
#[command(
    about = "Harvest YouTube transcripts, score their sentiment, and correlate it with engagement"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Harvest every upload of one channel
    Channel(ChannelArgs),
    /// Sample videos across view-count tiers with random keyword searches
    Sample(SampleArgs),
    /// Append VADER lexicon scores
    Lexicon(LexiconArgs),
    /// Append DistilBERT SST-2 scores averaged over transcript windows
    Transformer(TransformerArgs),
    /// Append four LLM ratings per transcript
    Llm(LlmArgs),
    /// Print the engagement/sentiment correlation matrix and draw a scatter plot
    Analyze(AnalyzeArgs),
    /// Score a few sentences with the transformer classifier
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct PauseArgs {
    /// Shortest pause between requests, in seconds
    #[arg(long, value_parser = parse_non_negative)]
    pause_min: Option<f64>,

    /// Longest pause between requests, in seconds
    #[arg(long, value_parser = parse_non_negative)]
    pause_max: Option<f64>,

    /// Seconds to wait after YouTube rate-limits us
    #[arg(long, default_value_t = 60)]
    rate_limit_penalty: u64,

    /// Seed for keyword choice and pause jitter
    #[arg(long)]
    seed: Option<u64>,

    /// yt-dlp executable
    #[arg(long, default_value = "yt-dlp")]
    yt_dlp: String,
}

impl PauseArgs {
    fn pause(&self, default: PauseRange) -> vidmood_core::Result<PauseRange> {
        PauseRange::from_secs(
            self.pause_min.unwrap_or(default.min.as_secs_f64()),
            self.pause_max.unwrap_or(default.max.as_secs_f64()),
        )
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    fn sources(&self) -> (YtDlp, YoutubeCaptions) {
        let ytdlp = YtDlp::new().with_program(&self.yt_dlp);
        (ytdlp.clone(), YoutubeCaptions::new(ytdlp))
    }
}

#[derive(Args)]
struct ChannelArgs {
    /// Channel URL (handle, custom name or channel id)
    #[arg(default_value = "https://www.youtube.com/@CosmicSkeptic")]
    url: String,

    #[arg(short, long, default_value = "channel_videos.csv")]
    output: PathBuf,

    #[command(flatten)]
    pause: PauseArgs,
}

/// Finite, non-negative number of seconds or minutes.
fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value = s.trim().parse::<f64>().map_err(|e| format!("'{s}': {e}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{s}' must be a finite, non-negative number"))
    }
}

/// `name=min..max`, or `name=min..` for an unbounded tier.
fn parse_tier(s: &str) -> Result<Tier, String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=min..max, got '{s}'"))?;
    let (min, max) = range
        .split_once("..")
        .ok_or_else(|| format!("expected min..max in '{range}'"))?;
    let number = |v: &str| {
        v.trim()
            .replace('_', "")
            .parse::<u64>()
            .map_err(|e| format!("'{v}': {e}"))
    };
    let max = match max.trim() {
        "" => None,
        v => Some(number(v)?),
    };
    Ok(Tier::new(name.trim(), number(min)?, max))
}

#[derive(Args)]
struct SampleArgs {
    #[arg(short, long, default_value = "youtube_stratified_sample.csv")]
    output: PathBuf,

    /// Search keywords, comma separated
    #[arg(long, value_delimiter = ',')]
    queries: Option<Vec<String>>,

    /// Results requested per search
    #[arg(long, default_value_t = 50)]
    batch_size: usize,

    /// Videos wanted in each tier
    #[arg(long, default_value_t = 50)]
    per_tier: usize,

    /// View-count tier as name=min..max; repeat for each tier
    #[arg(long = "tier", value_parser = parse_tier)]
    tiers: Vec<Tier>,

    /// Seconds to wait after a failed search
    #[arg(long, default_value_t = 10)]
    error_penalty: u64,

    /// Give up on a tier after this many searches
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up on a tier after this many minutes
    #[arg(long, value_parser = parse_non_negative)]
    max_minutes: Option<f64>,

    #[command(flatten)]
    pause: PauseArgs,
}

#[derive(Args)]
struct LexiconArgs {
    #[arg(short, long, default_value = "channel_videos.csv")]
    input: PathBuf,

    #[arg(short, long, default_value = "youtube_with_sentiment.csv")]
    output: PathBuf,
}

#[derive(Args)]
struct ModelArgs {
    /// Re-download model files even if they are cached
    #[arg(short, long)]
    force: bool,
}

#[derive(Args)]
struct TransformerArgs {
    #[arg(short, long, default_value = "youtube_stratified_sample.csv")]
    input: PathBuf,

    #[arg(short, long, default_value = "youtube_with_transformer_sentiment.csv")]
    output: PathBuf,

    #[command(flatten)]
    model: ModelArgs,
}

impl TransformerArgs {
    fn into_config(self) -> TransformerConfig {
        TransformerConfig {
            input: self.input,
            output: self.output,
            force_download: self.model.force,
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct LlmArgs {
    #[arg(short, long, default_value = "youtube_with_sentiment.csv")]
    input: PathBuf,

    #[arg(short, long, default_value = "youtube_with_llm_scores.csv")]
    output: PathBuf,

    /// AI provider for the ratings
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Model name, overriding the provider default
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(short, long, default_value = "youtube_with_sentiment.csv")]
    input: PathBuf,

    /// Scatter plot destination (SVG)
    #[arg(long, default_value = "sentiment_vs_views.svg")]
    plot: PathBuf,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Sentences to score; four examples are used when none are given
    sentences: Vec<String>,

    #[command(flatten)]
    model: ModelArgs,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vidmood=info,vidmood_core=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn header(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("vidmood").cyan().bold(),
        style(subtitle).dim()
    );
}

fn done(msg: impl std::fmt::Display, started: Instant) -> String {
    format!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    )
}

fn saved(path: &std::path::Path) {
    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(path.display()).cyan()
    );
}

async fn run_channel(args: ChannelArgs) -> Result<()> {
    header("Channel Harvest");
    let config = ChannelHarvestConfig {
        channel_url: args.url,
        output: args.output,
        pause: args.pause.pause(ChannelHarvestConfig::default().pause)?,
        rate_limit_penalty: Duration::from_secs(args.pause.rate_limit_penalty),
    };
    let (videos, captions) = args.pause.sources();
    let mut rng = args.pause.rng();

    let started = Instant::now();
    let mut writer = VideoCsvWriter::create(&config.output)?;
    let report = harvest_channel(&videos, &captions, &config, &mut writer, &mut rng).await?;
    writer.finish()?;

    println!(
        "{}",
        done(
            format!(
                "Harvested {} of {} videos ({} without transcript, {} without metadata)",
                report.processed,
                report.listed,
                report.skipped_no_transcript,
                report.skipped_metadata
            ),
            started
        )
    );
    saved(&config.output);
    Ok(())
}

async fn run_sample(args: SampleArgs) -> Result<()> {
    header("Stratified Sample");
    let defaults = SamplerConfig::default();
    let tiers = if args.tiers.is_empty() {
        defaults.tiers.clone()
    } else {
        TierSet::new(args.tiers)?
    };
    let config = SamplerConfig {
        queries: args.queries.unwrap_or(defaults.queries.clone()),
        batch_size: args.batch_size,
        target_per_tier: args.per_tier,
        tiers,
        pause: args.pause.pause(defaults.pause)?,
        rate_limit_penalty: Duration::from_secs(args.pause.rate_limit_penalty),
        error_penalty: Duration::from_secs(args.error_penalty),
        max_attempts: args.max_attempts,
        max_duration: args.max_minutes.map(|m| seconds(m * 60.0)).transpose()?,
        output: args.output,
    };
    let (videos, captions) = args.pause.sources();

    let started = Instant::now();
    let mut writer = VideoCsvWriter::create(&config.output)?;
    let mut sampler = StratifiedSampler::new(&videos, &captions, &config, args.pause.rng());
    let samples = sampler.sample_all(&mut writer).await?;
    let total = writer.rows();
    writer.finish()?;

    println!("{}", style("─".repeat(60)).dim());
    for (sample, tier) in samples.iter().zip(config.tiers.iter()) {
        let marker = match sample.status {
            SampleStatus::Complete => style("✓").green().bold(),
            SampleStatus::QuotaNotMet => style("!").yellow().bold(),
        };
        println!(
            "{} {:<10} {} {}/{} videos after {} searches",
            marker,
            sample.tier,
            style(format_tier_range(tier)).dim(),
            sample.records.len(),
            sample.needed,
            sample.attempts
        );
    }
    println!("{}", done(format!("Sampled {total} videos"), started));
    saved(&config.output);
    Ok(())
}

fn run_lexicon(args: LexiconArgs) -> Result<()> {
    header("Lexicon Sentiment");
    let started = Instant::now();
    let mut table = Table::read(&args.input)?;
    let spinner = create_spinner(&format!("Scoring {} rows with VADER...", table.rows.len()));
    score_lexicon_table(&mut table, &VaderLexicon::new())?;
    table.write(&args.output)?;
    spinner.finish_with_message(done(format!("Scored {} rows", table.rows.len()), started));
    saved(&args.output);
    Ok(())
}

async fn load_classifier(config: &TransformerConfig) -> Result<DistilBertSst2> {
    let started = Instant::now();
    let spinner = create_spinner("Checking model...");
    let files = ensure_model(config).await?;
    spinner.finish_with_message(done("Model ready", started));

    let started = Instant::now();
    let spinner = create_spinner("Loading DistilBERT...");
    let model = DistilBertSst2::load(&files)?;
    spinner.finish_with_message(done("Model loaded", started));
    Ok(model)
}

async fn run_transformer(args: TransformerArgs) -> Result<()> {
    let config = args.into_config();

    header("Transformer Sentiment");
    let mut table = Table::read(&config.input)?;
    let model = load_classifier(&config).await?;
    let scorer = TransformerScorer::new(&model, &model);

    let started = Instant::now();
    let spinner = create_spinner("Scoring transcripts...");
    let failed = score_transformer_table(&mut table, &scorer, |i, n| {
        spinner.set_message(format!("Scoring transcripts... {i}/{n}"));
    })?;
    table.write(&config.output)?;
    spinner.finish_with_message(done(
        format!(
            "Scored {} rows ({} empty)",
            table.rows.len() - failed,
            failed
        ),
        started,
    ));
    saved(&config.output);
    Ok(())
}

async fn run_llm(args: LlmArgs) -> Result<()> {
    let config = LlmConfig {
        input: args.input,
        output: args.output,
        provider: args.provider.into(),
        model: args.model,
        ..Default::default()
    };

    // Validate API key early
    let client = match ChatCompletionClient::from_provider(config.provider, config.model.clone())
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    header("LLM Ratings");
    let mut table = Table::read(&config.input)?;

    let started = Instant::now();
    let spinner = create_spinner(&format!(
        "Rating transcripts with {} ({})...",
        config.provider.name(),
        client.model()
    ));
    let failed = score_llm_table(&mut table, &client, config.rate_limit_penalty, |i, n| {
        spinner.set_message(format!(
            "Rating transcripts with {}... {i}/{n}",
            config.provider.name()
        ));
    })
    .await?;
    table.write(&config.output)?;
    spinner.finish_with_message(done(
        format!(
            "Rated {} rows ({} left empty)",
            table.rows.len() - failed,
            failed
        ),
        started,
    ));
    saved(&config.output);
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    header("Engagement vs. Sentiment");
    let table = Table::read(&args.input)?;
    let matrix = correlation_matrix(&table, &CORRELATION_COLUMNS)?;

    println!("{}", style("Correlation matrix:").bold());
    println!("{}", format_correlation_matrix(&matrix));

    let points = views_vs_compound(&table)?;
    scatter_plot(&points, &args.plot)?;
    println!(
        "{} {} {}",
        style("✓").green().bold(),
        PLOT_TITLE,
        style(format!("({} points)", points.len())).dim()
    );
    saved(&args.plot);
    Ok(())
}

async fn run_classify(args: ClassifyArgs) -> Result<()> {
    header("Classifier Demo");
    let config = TransformerConfig {
        force_download: args.model.force,
        ..Default::default()
    };
    let model = load_classifier(&config).await?;
    let scorer = TransformerScorer::new(&model, &model);

    let sentences = if args.sentences.is_empty() {
        EXAMPLE_SENTENCES.iter().map(|s| s.to_string()).collect()
    } else {
        args.sentences
    };

    println!("{}", style("─".repeat(60)).dim());
    for sentence in &sentences {
        let result = scorer.score_sentence(sentence)?;
        println!("Sentence: {}", style(sentence).yellow());
        println!("  Negative probability: {:.4}", result.neg_prob);
        println!("  Positive probability: {:.4}", result.pos_prob);
        println!(
            "  Transformer score  : {}\n",
            style(format!("{:+.4}", result.score)).cyan().bold()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let total_start = Instant::now();
    match cli.command {
        Command::Channel(args) => run_channel(args).await?,
        Command::Sample(args) => run_sample(args).await?,
        Command::Lexicon(args) => run_lexicon(args)?,
        Command::Transformer(args) => run_transformer(args).await?,
        Command::Llm(args) => run_llm(args).await?,
        Command::Analyze(args) => run_analyze(args)?,
        Command::Classify(args) => run_classify(args).await?,
    }

    println!(
        "{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    Ok(())
}
