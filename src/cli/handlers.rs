//! Command handlers wiring configuration, gateways, and pipelines together

use super::commands::{AnalyzeArgs, RiskArgs};
use crate::config::MealscopeConfig;
use crate::knowledge::{KnowledgeCache, LexicalKnowledgeStore, MemoryCacheStore};
use crate::pipeline::{
    Allergen, AnalysisInput, AnalysisStage, DialogueStage, Disease, DiseaseRiskPipeline,
    ImageSource, NutritionDetail, NutritionPipeline, RiskInput, UserPreferences,
};
use crate::progress::SseAdapter;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub async fn handle_analyze(args: &AnalyzeArgs) -> i32 {
    match run_analyze(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    }
}

async fn run_analyze(args: &AnalyzeArgs) -> Result<i32> {
    let config = MealscopeConfig::default();
    config.validate().context("invalid configuration")?;
    debug!("{}", config);

    let knowledge_store = Arc::new(load_knowledge_store(args.knowledge_file.as_deref()).await?);
    let cache_store = Arc::new(MemoryCacheStore::new(
        config.cache_ttl(),
        config.cache_capacity,
    ));
    let knowledge = Arc::new(
        KnowledgeCache::new(cache_store, knowledge_store).with_top_k(config.retrieval_top_k),
    );

    let pipeline = NutritionPipeline::new(
        config.create_vision_gateway(),
        config.create_analysis_gateway(),
        knowledge,
    );

    let preferences = parse_preferences(args.preferences.as_deref())?;
    let input =
        AnalysisInput::new(ImageSource::Path(args.image.clone())).with_preferences(preferences);

    if args.stream {
        let (adapter, mut receiver) = SseAdapter::channel();
        let printer = tokio::spawn(async move {
            while let Some(frame) = receiver.recv().await {
                print!("{}", frame);
            }
        });

        let report = pipeline.run_with_progress(input, adapter.clone()).await;
        drop(adapter);
        let _ = printer.await;

        Ok(exit_code(report.stage == AnalysisStage::Completed))
    } else {
        let report = pipeline.run(input).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(exit_code(report.stage == AnalysisStage::Completed))
    }
}

pub async fn handle_risk(args: &RiskArgs) -> i32 {
    match run_risk(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    }
}

async fn run_risk(args: &RiskArgs) -> Result<i32> {
    let config = MealscopeConfig::default();
    config.validate().context("invalid configuration")?;

    let pipeline = DiseaseRiskPipeline::new(config.create_analysis_gateway());

    let disease = args.disease.as_ref().map(|name| Disease {
        name: name.clone(),
        code: None,
        severity: args.severity,
        notes: None,
    });
    let allergen = args.allergen.as_ref().map(|name| Allergen::named(name.clone()));
    let nutrition = match args.nutrition.as_deref() {
        Some(json) => Some(
            serde_json::from_str::<NutritionDetail>(json)
                .context("failed to parse --nutrition JSON")?,
        ),
        None => None,
    };

    let input = RiskInput {
        disease,
        allergen,
        food_record: None,
        nutrition,
        user_input: args.input.clone(),
    };

    let report = pipeline.run(input).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(exit_code(report.stage == DialogueStage::Completed))
}

async fn load_knowledge_store(path: Option<&Path>) -> Result<LexicalKnowledgeStore> {
    match path {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read knowledge file {}", path.display()))?;
            let documents: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            debug!(documents = documents.len(), "seeded knowledge store");
            Ok(LexicalKnowledgeStore::new(documents))
        }
        None => Ok(LexicalKnowledgeStore::empty()),
    }
}

fn parse_preferences(json: Option<&str>) -> Result<UserPreferences> {
    match json {
        Some(json) => {
            serde_json::from_str(json).context("failed to parse --preferences JSON")
        }
        None => Ok(UserPreferences::new()),
    }
}

fn exit_code(success: bool) -> i32 {
    if success {
        0
    } else {
        1
    }
}
