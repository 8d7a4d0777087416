// src/bin/report_classifier_weights.rs
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use verification_lib::config::VerifierConfig;
use verification_lib::matching::classifier::FEATURE_NAMES;
use verification_lib::matching::LogisticRegressionClassifier;
use verification_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Print the verification classifier's weights", long_about = None)]
struct ReportArgs {
    /// Classifier artifact, overriding CLASSIFIER_MODEL_PATH
    #[arg(long)]
    model: Option<PathBuf>,
}

fn print_weights(model: &LogisticRegressionClassifier) {
    let mut weighted_features: Vec<(&str, f64)> = FEATURE_NAMES
        .iter()
        .copied()
        .zip(model.coefficients.iter().copied())
        .collect();

    // Most influential first.
    weighted_features.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    println!("  | {:<30} | {:>12} |", "Feature Name", "Weight");
    println!("  |--------------------------------|--------------|");
    for (name, weight) in &weighted_features {
        println!("  | {:<30} | {:>12.6} |", name, weight);
    }
    println!("  |--------------------------------|--------------|");
    println!("  | {:<30} | {:>12.6} |", "(Intercept)", model.intercept);
}

fn main() -> Result<()> {
    load_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = ReportArgs::parse();
    let model_path = args
        .model
        .unwrap_or_else(|| VerifierConfig::from_env().classifier_model_path);
    let model = LogisticRegressionClassifier::load_from_json(&model_path)?;

    println!("--- Verification Classifier Weight Report ---");
    println!("Model: {}", model_path.display());
    if let Some(version) = &model.version {
        println!("Version: {}", version);
    }
    if let Some(description) = &model.description {
        println!("Description: {}", description);
    }
    println!();
    print_weights(&model);
    println!("--- End of Report ---");
    Ok(())
}
