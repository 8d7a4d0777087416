// src/matching/mod.rs
pub mod classifier;
pub mod cleaners;
pub mod decision;
pub mod engine;
pub mod features;
pub mod name_checks;
pub mod normalizers;
pub mod similarity;

pub use classifier::{LogisticRegressionClassifier, RecordClassifier};
pub use cleaners::SuffixTable;
pub use engine::VerificationEngine;
