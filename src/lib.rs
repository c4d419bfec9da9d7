//! mealscope - AI-powered nutrition analysis pipeline for diet tracking
//!
//! This library implements the analysis core of a diet-tracking backend:
//! a staged nutrition pipeline over meal photos, a branching disease-risk
//! pipeline, a cache-aside knowledge lookup, and a streaming progress
//! adapter.
//!
//! # Core Concepts
//!
//! - **Model Gateway**: Pluggable vision/analysis LLM providers behind one
//!   trait, with structured decoding of JSON replies
//! - **Pipelines**: Sequential stages over a typed, single-writer state;
//!   early stages hard-fail, late stages degrade gracefully
//! - **Knowledge Cache**: Cache-aside lookup over an opaque
//!   similarity-search store, keyed by a canonical query fingerprint
//! - **Streaming**: Pipeline progress rendered as Server-Sent-Events frames
//!
//! # Example Usage
//!
//! ```ignore
//! use mealscope::config::MealscopeConfig;
//! use mealscope::knowledge::{KnowledgeCache, LexicalKnowledgeStore, MemoryCacheStore};
//! use mealscope::pipeline::{AnalysisInput, ImageSource, NutritionPipeline};
//! use std::sync::Arc;
//!
//! async fn analyze(image: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MealscopeConfig::default();
//!     config.validate()?;
//!
//!     let cache = Arc::new(MemoryCacheStore::new(config.cache_ttl(), config.cache_capacity));
//!     let store = Arc::new(LexicalKnowledgeStore::empty());
//!     let knowledge = Arc::new(KnowledgeCache::new(cache, store));
//!
//!     let pipeline = NutritionPipeline::new(
//!         config.create_vision_gateway(),
//!         config.create_analysis_gateway(),
//!         knowledge,
//!     );
//!
//!     let input = AnalysisInput::new(ImageSource::Bytes(
//!         mealscope::model::ImagePayload::new("image/jpeg", image),
//!     ));
//!     let report = pipeline.run(input).await;
//!     println!("{:?}", report.advice);
//!     Ok(())
//! }
//! ```

// Public modules
pub mod cli;
pub mod config;
pub mod knowledge;
pub mod model;
pub mod persist;
pub mod pipeline;
pub mod progress;
pub mod util;

// Re-export key types for convenient access
pub use config::{ConfigError, MealscopeConfig};
pub use knowledge::{KnowledgeCache, KnowledgeError};
pub use model::{ModelError, ModelGateway};
pub use pipeline::{
    AnalysisInput, AnalysisReport, AnalysisStage, DiseaseRiskPipeline, NutritionPipeline,
    RiskInput, RiskReport,
};
pub use progress::{PipelineEvent, ProgressHandler, SseAdapter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
