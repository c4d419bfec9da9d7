//! Six-stage nutrition analysis pipeline
//!
//! Stages run strictly in order over one [`AnalysisState`]:
//! image analysis, nutrition extraction, knowledge retrieval, dependency
//! synthesis, advice generation, response formatting. The first two stages
//! hard-fail the run because everything downstream needs their output; the
//! knowledge and advice stages only degrade it, since advice is best-effort.

use super::error::StageError;
use super::prompts;
use super::state::{AnalysisInput, AnalysisStage, AnalysisState, ImageSource};
use super::types::{AdviceDependencies, NutritionAdvice, NutritionFacts};
use crate::knowledge::KnowledgeCache;
use crate::model::{
    decode_json_reply, generate_structured, ImagePayload, ModelGateway, ModelPrompt,
};
use crate::persist::{AnalysisRecord, AnalysisSink};
use crate::progress::{NoOpHandler, PipelineEvent, ProgressHandler};
use chrono::Utc;
use futures_util::StreamExt;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Final result of a nutrition analysis run
///
/// A stage's artifact and an error are never both populated for the same
/// stage: artifacts stop at the first hard failure.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub session_id: String,
    pub stage: AnalysisStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<AdviceDependencies>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<NutritionAdvice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrator for the nutrition analysis pipeline
///
/// Re-entrant across runs: every run owns its own state, the knowledge cache
/// is the only shared resource.
pub struct NutritionPipeline {
    vision: Arc<dyn ModelGateway>,
    analysis: Arc<dyn ModelGateway>,
    knowledge: Arc<KnowledgeCache>,
    sink: Option<Arc<dyn AnalysisSink>>,
}

impl NutritionPipeline {
    pub fn new(
        vision: Arc<dyn ModelGateway>,
        analysis: Arc<dyn ModelGateway>,
        knowledge: Arc<KnowledgeCache>,
    ) -> Self {
        Self {
            vision,
            analysis,
            knowledge,
            sink: None,
        }
    }

    /// Records completed runs through the given sink
    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs the pipeline without progress reporting
    pub async fn run(&self, input: AnalysisInput) -> AnalysisReport {
        self.execute(input, Arc::new(NoOpHandler), false).await
    }

    /// Runs the pipeline, reporting progress and streaming advice fragments
    /// through the handler
    pub async fn run_with_progress(
        &self,
        input: AnalysisInput,
        handler: Arc<dyn ProgressHandler>,
    ) -> AnalysisReport {
        self.execute(input, handler, true).await
    }

    async fn execute(
        &self,
        input: AnalysisInput,
        handler: Arc<dyn ProgressHandler>,
        stream_advice: bool,
    ) -> AnalysisReport {
        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, "starting nutrition analysis run");
        handler.on_event(&PipelineEvent::RunStarted {
            session_id: session_id.clone(),
        });

        let mut state = AnalysisState::new(input);

        // Hard-fail stages: everything downstream depends on their output.
        if let Err(e) = self.analyze_image(&mut state).await {
            state.fail(e.to_string());
            return self.finish(state, session_id, &handler).await;
        }
        state.advance(AnalysisStage::ImageAnalyzed);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: AnalysisStage::ImageAnalyzed.to_string(),
        });
        if self.cancelled(&handler, &mut state) {
            return self.finish(state, session_id, &handler).await;
        }

        if let Err(e) = self.extract_nutrition(&mut state).await {
            state.fail(e.to_string());
            return self.finish(state, session_id, &handler).await;
        }
        state.advance(AnalysisStage::NutritionExtracted);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: AnalysisStage::NutritionExtracted.to_string(),
        });
        if self.cancelled(&handler, &mut state) {
            return self.finish(state, session_id, &handler).await;
        }

        // Knowledge is advisory: a retrieval failure degrades the run but
        // never aborts it.
        if let Err(e) = self.retrieve_knowledge(&mut state).await {
            warn!(error = %e, "knowledge retrieval failed, continuing without it");
            state.record_error(format!("knowledge retrieval failed: {}", e));
        }
        state.advance(AnalysisStage::KnowledgeRetrieved);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: AnalysisStage::KnowledgeRetrieved.to_string(),
        });
        if self.cancelled(&handler, &mut state) {
            return self.finish(state, session_id, &handler).await;
        }

        if let Err(e) = self.generate_dependencies(&mut state).await {
            warn!(error = %e, "dependency synthesis failed, using empty dependencies");
            state.record_error(format!("dependency synthesis failed: {}", e));
            state.set_dependencies(AdviceDependencies::default());
        }
        state.advance(AnalysisStage::DependenciesGenerated);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: AnalysisStage::DependenciesGenerated.to_string(),
        });
        if self.cancelled(&handler, &mut state) {
            return self.finish(state, session_id, &handler).await;
        }

        if let Err(e) = self
            .generate_advice(&mut state, &handler, stream_advice)
            .await
        {
            warn!(error = %e, "advice generation failed, completing without advice");
            state.record_error(format!("advice generation failed: {}", e));
        }
        state.advance(AnalysisStage::AdviceGenerated);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: AnalysisStage::AdviceGenerated.to_string(),
        });

        state.advance(AnalysisStage::Completed);
        self.finish(state, session_id, &handler).await
    }

    fn cancelled(&self, handler: &Arc<dyn ProgressHandler>, state: &mut AnalysisState) -> bool {
        if handler.is_cancelled() {
            info!("client disconnected, abandoning run");
            state.fail("client disconnected");
            return true;
        }
        false
    }

    async fn analyze_image(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let image = resolve_image(&state.input().image).await?;

        let prompt = ModelPrompt::new(prompts::vision_prompt())
            .with_system(prompts::VISION_SYSTEM_PROMPT)
            .with_image(image);

        let description = self.vision.generate(prompt).await?;
        debug!(chars = description.len(), "image described");
        state.set_image_description(description);
        Ok(())
    }

    async fn extract_nutrition(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let description = state
            .image_description()
            .ok_or_else(|| StageError::Input("missing image description".into()))?;

        let prompt = ModelPrompt::new(prompts::nutrition_prompt(description));
        let facts: NutritionFacts = generate_structured(self.analysis.as_ref(), prompt).await?;
        debug!(items = facts.food_items.len(), "nutrition facts extracted");
        state.set_nutrition(facts);
        Ok(())
    }

    async fn retrieve_knowledge(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let facts = state
            .nutrition()
            .ok_or_else(|| StageError::Input("missing nutrition facts".into()))?;

        let queries = knowledge_queries(facts);
        let snippets = self.knowledge.lookup(&queries).await?;
        debug!(snippets = snippets.len(), "knowledge retrieved");
        state.set_knowledge(snippets);
        Ok(())
    }

    async fn generate_dependencies(&self, state: &mut AnalysisState) -> Result<(), StageError> {
        let snippets = state.knowledge().unwrap_or(&[]);
        if snippets.is_empty() {
            debug!("no knowledge snippets, using empty dependencies");
            state.set_dependencies(AdviceDependencies::default());
            return Ok(());
        }

        let prompt = ModelPrompt::new(prompts::dependencies_prompt(
            snippets,
            &state.input().preferences,
        ));
        let dependencies: AdviceDependencies =
            generate_structured(self.analysis.as_ref(), prompt).await?;
        state.set_dependencies(dependencies);
        Ok(())
    }

    async fn generate_advice(
        &self,
        state: &mut AnalysisState,
        handler: &Arc<dyn ProgressHandler>,
        stream: bool,
    ) -> Result<(), StageError> {
        let facts = state
            .nutrition()
            .ok_or_else(|| StageError::Input("missing nutrition facts".into()))?;
        let dependencies = state
            .dependencies()
            .ok_or_else(|| StageError::Input("missing advice dependencies".into()))?;

        let prompt = ModelPrompt::new(prompts::advice_prompt(
            facts,
            dependencies,
            &state.input().preferences,
        ));

        let content = if stream {
            let mut fragments = self.analysis.generate_stream(prompt).await?;
            let mut content = String::new();
            while let Some(fragment) = fragments.next().await {
                let fragment = fragment?;
                handler.on_event(&PipelineEvent::ContentFragment {
                    text: fragment.clone(),
                });
                content.push_str(&fragment);
            }
            content
        } else {
            self.analysis.generate(prompt).await?
        };

        let advice: NutritionAdvice = decode_json_reply(&content)?;
        state.set_advice(advice);
        Ok(())
    }

    /// Formats the final response and emits the terminal event
    ///
    /// Pure transform: an upstream error passes through unchanged.
    async fn finish(
        &self,
        mut state: AnalysisState,
        session_id: String,
        handler: &Arc<dyn ProgressHandler>,
    ) -> AnalysisReport {
        if state.stage() == AnalysisStage::Failed {
            let error = state
                .error()
                .unwrap_or("analysis failed")
                .to_string();
            handler.on_event(&PipelineEvent::RunFailed {
                error: error.clone(),
            });
            info!(session_id = %session_id, error = %error, "run failed");
        } else {
            if state.stage() != AnalysisStage::Completed {
                state.advance(AnalysisStage::Completed);
            }
            handler.on_event(&PipelineEvent::RunCompleted {
                session_id: session_id.clone(),
            });
            info!(session_id = %session_id, "run completed");
        }

        let stage = state.stage();
        let (_, image_description, nutrition, dependencies, advice, error) = state.into_parts();

        let report = AnalysisReport {
            session_id,
            stage,
            image_description,
            nutrition,
            dependencies,
            advice,
            error,
        };

        if stage == AnalysisStage::Completed {
            if let Some(sink) = &self.sink {
                let record = AnalysisRecord {
                    session_id: report.session_id.clone(),
                    created_at: Utc::now(),
                    image_description: report.image_description.clone(),
                    nutrition: report.nutrition.clone(),
                    dependencies: report.dependencies.clone(),
                    advice: report.advice.clone(),
                    error: report.error.clone(),
                };
                if let Err(e) = sink.record(record).await {
                    warn!(error = %e, "failed to persist analysis record");
                }
            }
        }

        report
    }
}

/// Derives the four retrieval queries from extracted nutrition facts
fn knowledge_queries(facts: &NutritionFacts) -> Vec<String> {
    vec![
        format!("food items: {}", facts.food_items.join(", ")),
        format!("total calories: {} kcal", facts.total_calories),
        format!(
            "macronutrients: protein {} g, fat {} g, carbohydrates {} g",
            facts.macronutrients.protein, facts.macronutrients.fat,
            facts.macronutrients.carbohydrates
        ),
        format!(
            "vitamins and minerals: vitamin C {} mg, calcium {} mg, iron {} mg, sodium {} mg",
            facts.vitamins_minerals.vitamin_c,
            facts.vitamins_minerals.calcium,
            facts.vitamins_minerals.iron,
            facts.vitamins_minerals.sodium
        ),
    ]
}

/// Resolves the image source into a payload for the vision call
async fn resolve_image(source: &ImageSource) -> Result<ImagePayload, StageError> {
    match source {
        ImageSource::Bytes(payload) => {
            if payload.is_empty() {
                return Err(StageError::Input("no image data".into()));
            }
            Ok(payload.clone())
        }
        ImageSource::Path(path) => {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| StageError::Input(format!("no image data: {}", e)))?;
            if data.is_empty() {
                return Err(StageError::Input("no image data".into()));
            }
            Ok(ImagePayload::new(media_type_for(path), data))
        }
        ImageSource::Url(url) => {
            let response = reqwest::get(url)
                .await
                .map_err(|e| StageError::Input(format!("no image data: {}", e)))?;
            if !response.status().is_success() {
                return Err(StageError::Input(format!(
                    "no image data: fetch returned {}",
                    response.status()
                )));
            }
            let media_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("image/jpeg")
                .to_string();
            let data = response
                .bytes()
                .await
                .map_err(|e| StageError::Input(format!("no image data: {}", e)))?;
            if data.is_empty() {
                return Err(StageError::Input("no image data".into()));
            }
            Ok(ImagePayload::new(media_type, data.to_vec()))
        }
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::HealthLevel;

    #[test]
    fn test_knowledge_queries_cover_four_aspects() {
        let facts = NutritionFacts {
            food_items: vec!["rice".into(), "egg".into()],
            total_calories: 650.0,
            macronutrients: Default::default(),
            vitamins_minerals: Default::default(),
            health_level: HealthLevel::C,
        };
        let queries = knowledge_queries(&facts);
        assert_eq!(queries.len(), 4);
        assert!(queries[0].contains("rice, egg"));
        assert!(queries[1].contains("650"));
    }

    #[test]
    fn test_media_type_inference() {
        assert_eq!(media_type_for(Path::new("meal.png")), "image/png");
        assert_eq!(media_type_for(Path::new("meal.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("meal")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_resolve_empty_bytes_is_input_error() {
        let source = ImageSource::Bytes(ImagePayload::new("image/jpeg", vec![]));
        let result = resolve_image(&source).await;
        assert!(matches!(result, Err(StageError::Input(_))));
    }

    #[tokio::test]
    async fn test_resolve_missing_file_is_input_error() {
        let source = ImageSource::Path("/nonexistent/meal.jpg".into());
        let result = resolve_image(&source).await;
        assert!(matches!(result, Err(StageError::Input(_))));
    }
}
