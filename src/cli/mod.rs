//! Diet predictor CLI Module
//!
//! Command-line interface for training, serving and dataset inspection.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::preprocessing::PreprocessingConfig;
use crate::targets::TargetOverrides;
use crate::training::{
    BoostingConfig, TrainingConfig, TrainingOutcome, TrainingPipeline, DEFAULT_DATASET, DEFAULT_MODEL_DIR,
};
use crate::utils::{distinct_values, is_numeric_dtype, load_dataset};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "diet-predictor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve per-nutrient diet prediction models")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train one model per detected nutrition target
    Train {
        /// Input CSV dataset
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        data: PathBuf,

        /// Directory receiving models and run records
        #[arg(short, long, default_value = DEFAULT_MODEL_DIR)]
        model_dir: PathBuf,

        /// Override target detection, e.g. `calories=Kcal_Total` (repeatable)
        #[arg(short, long = "target", value_name = "CATEGORY=COLUMN")]
        targets: Vec<String>,

        /// Seed for the split and the boosted trees
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Start the prediction server
    Serve {
        /// Server host [env: DIET_HOST, default 0.0.0.0]
        #[arg(long)]
        host: Option<String>,

        /// Server port [env: DIET_PORT, default 5001]
        #[arg(short, long)]
        port: Option<u16>,

        /// Model directory [env: MODEL_DIR, default diet_model]
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Landing page served at / [env: INDEX_PATH, default index.html]
        #[arg(long)]
        index_path: Option<PathBuf>,
    },

    /// Show columns, dtypes and categorical values of a dataset
    Inspect {
        /// Input CSV dataset
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data: PathBuf, model_dir: PathBuf, targets: &[String], seed: u64) -> anyhow::Result<()> {
    section("Train");

    let overrides = TargetOverrides::parse_pairs(targets)?;
    let config = TrainingConfig::new(data, model_dir)
        .with_random_state(seed)
        .with_preprocessing(PreprocessingConfig::default())
        .with_overrides(overrides)
        .with_boosting(BoostingConfig::default().with_random_state(seed));

    step_run(&format!("Training from {}", config.data_path.display()));
    let start = Instant::now();
    let outcome = TrainingPipeline::new(config.clone()).run()?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_outcome(&outcome, &config);
    Ok(())
}

fn print_outcome(outcome: &TrainingOutcome, config: &TrainingConfig) {
    println!();
    println!("  {:<12} {}", muted("Targets"), outcome.record.targets.join(", "));
    println!("  {:<12} {}", muted("Features"), outcome.feature_columns.len());
    println!("  {:<12} {} train / {} test", muted("Rows"), outcome.n_train, outcome.n_test);
    if outcome.dropped_rows > 0 {
        println!("  {:<12} {}", muted("Skipped"), format!("{} rows with missing targets", outcome.dropped_rows).yellow());
    }
    if !outcome.dropped_columns.is_empty() {
        println!("  {:<12} {}", muted("Dropped"), outcome.dropped_columns.join(", "));
    }

    section("Metrics");
    println!("  {:<24} {:>10} {:>10} {:>8}", muted("Target"), muted("MAE"), muted("RMSE"), muted("R²"));
    println!("  {}", dim(&"─".repeat(56)));
    for trained in &outcome.targets {
        let m = trained.metrics;
        println!("  {:<24} {:>10.3} {:>10.3} {:>8.4}", trained.target, m.mae, m.rmse, m.r2);
    }
    println!("  {}", dim(&"─".repeat(56)));

    for trained in &outcome.targets {
        if trained.top_features.is_empty() {
            continue;
        }
        let names: Vec<String> = trained
            .top_features
            .iter()
            .map(|(name, share)| format!("{} {}", name, dim(&format!("{:.1}%", share * 100.0))))
            .collect();
        println!("  {} {}", muted(&format!("{:<24}", trained.target)), names.join(", "));
    }

    println!();
    println!("  {} {}", ok("saved"), config.model_dir.display().to_string().white().bold());
    println!();
}

pub fn cmd_inspect(data: &PathBuf) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_dataset(data)?;

    println!("  {:<12} {}", muted("File"), data.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<28} {:<12} {:>6}", muted("Column"), muted("Type"), muted("Nulls"));
    println!("  {}", dim(&"─".repeat(50)));

    let mut categorical = Vec::new();
    for col in df.get_columns() {
        println!(
            "  {:<28} {:<12} {:>6}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
        );
        if !is_numeric_dtype(col.dtype()) {
            categorical.push(col.name().to_string());
        }
    }

    if !categorical.is_empty() {
        section("Categorical values");
        for name in categorical {
            let values = distinct_values(&df, &name)?;
            println!("  {:<28} {}", muted(&name), values.join(", "));
        }
    }

    println!();
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model_dir: Option<PathBuf>,
    index_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = model_dir {
        config = config.with_model_dir(dir);
    }
    if let Some(path) = index_path {
        config = config.with_index_path(path);
    }

    let base = format!("http://{}:{}", config.host, config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Diet Predictor".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Page    ", &base));
    line_box(&kv("Predict ", &format!("{}/predict", base)));
    line_box(&kv("Sample  ", &format!("{}/diet-with-model", base)));
    line_box(&kv("Health  ", &format!("{}/health", base)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
