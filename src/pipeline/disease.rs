//! Branching disease-risk pipeline
//!
//! The branch is chosen at init by the presence of free-text user input.
//! With input, the run normalizes the text into structured disease/allergen
//! records and stops there; a later run without input performs the actual
//! risk analysis over the structured fields. The two phases never execute in
//! the same pass.

use super::error::StageError;
use super::prompts;
use super::state::{DialogueStage, RiskInput, RiskState};
use super::types::{Allergen, Disease, MedicalEntities, RiskAnalysis};
use crate::model::{generate_structured, ModelGateway, ModelPrompt};
use crate::progress::{NoOpHandler, PipelineEvent, ProgressHandler};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Final result of a disease-risk run
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub session_id: String,
    pub stage: DialogueStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<Disease>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergen: Option<Allergen>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<RiskAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Orchestrator for the disease-risk dialogue pipeline
pub struct DiseaseRiskPipeline {
    analysis: Arc<dyn ModelGateway>,
}

impl DiseaseRiskPipeline {
    pub fn new(analysis: Arc<dyn ModelGateway>) -> Self {
        Self { analysis }
    }

    /// Runs the pipeline without progress reporting
    pub async fn run(&self, input: RiskInput) -> RiskReport {
        self.run_with_progress(input, Arc::new(NoOpHandler)).await
    }

    /// Runs the pipeline, reporting progress through the handler
    pub async fn run_with_progress(
        &self,
        input: RiskInput,
        handler: Arc<dyn ProgressHandler>,
    ) -> RiskReport {
        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, "starting disease-risk run");
        handler.on_event(&PipelineEvent::RunStarted {
            session_id: session_id.clone(),
        });

        let mut state = RiskState::new(input);

        if state.input().has_user_input() {
            // Phase 1: normalize free text, then stop. Risk analysis happens
            // in a separate pass without user input.
            self.extract_entities(&mut state).await;
            state.advance(DialogueStage::EntitiesExtracted);
            handler.on_event(&PipelineEvent::StageCompleted {
                stage: DialogueStage::EntitiesExtracted.to_string(),
            });
            state.advance(DialogueStage::Completed);
            return self.finish(state, session_id, &handler);
        }

        // Phase 2: structured risk analysis.
        if let Err(e) = self.analyze_risk(&mut state).await {
            state.fail(e.to_string());
            return self.finish(state, session_id, &handler);
        }
        state.advance(DialogueStage::RiskAnalyzed);
        handler.on_event(&PipelineEvent::StageCompleted {
            stage: DialogueStage::RiskAnalyzed.to_string(),
        });

        if let Err(e) = self.format_response(&mut state) {
            state.fail(e.to_string());
            return self.finish(state, session_id, &handler);
        }
        state.advance(DialogueStage::Completed);
        self.finish(state, session_id, &handler)
    }

    /// Extracts disease/allergen mentions from the free-text input
    ///
    /// Never fails the run: on a model or decode failure the caller-supplied
    /// records pass through unchanged.
    async fn extract_entities(&self, state: &mut RiskState) {
        let text = state.input().user_input.clone().unwrap_or_default();
        let prompt = ModelPrompt::new(prompts::entity_extraction_prompt(&text));

        let entities = match generate_structured::<MedicalEntities>(self.analysis.as_ref(), prompt)
            .await
        {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %e, "entity extraction failed, keeping caller-supplied records");
                MedicalEntities {
                    disease: state.input().disease.clone(),
                    allergen: state.input().allergen.clone(),
                }
            }
        };

        debug!(
            disease = entities.disease.as_ref().map(|d| d.name.as_str()),
            allergen = entities.allergen.as_ref().map(|a| a.name.as_str()),
            "entities extracted"
        );
        state.set_entities(entities);
    }

    async fn analyze_risk(&self, state: &mut RiskState) -> Result<(), StageError> {
        let input = state.input();
        let (disease, nutrition) = match (&input.disease, &input.nutrition) {
            (Some(disease), Some(nutrition)) => (disease.clone(), nutrition.clone()),
            _ => {
                return Err(StageError::Input(
                    "missing disease or nutrition data".into(),
                ))
            }
        };
        let allergen = input.allergen.clone();

        let prompt = ModelPrompt::new(prompts::risk_analysis_prompt(
            &disease,
            &nutrition,
            allergen.as_ref(),
        ));
        let analysis: RiskAnalysis = generate_structured(self.analysis.as_ref(), prompt).await?;
        debug!(
            risky_nutrients = analysis.risky_nutrients.len(),
            "risk analysis produced"
        );
        state.set_analysis(analysis);
        Ok(())
    }

    /// Renders the structured analysis as display text
    fn format_response(&self, state: &mut RiskState) -> Result<(), StageError> {
        if state.error().is_some() {
            // An upstream error passes through unchanged.
            return Ok(());
        }

        let analysis = state
            .analysis()
            .ok_or_else(|| StageError::Format("missing risk analysis".into()))?;

        let mut output = format!("Disease: {}\n", analysis.disease);
        output.push_str(&format!(
            "Nutrients to watch: {}\n",
            analysis.risky_nutrients.join(", ")
        ));
        output.push_str("Risk notes:\n");
        for note in &analysis.risk_explanations {
            output.push_str(&format!("- {}\n", note));
        }
        output.push_str("Foods to avoid:\n");
        for food in &analysis.avoid_foods {
            output.push_str(&format!("- {}\n", food));
        }
        output.push_str("Dietary tips:\n");
        for tip in &analysis.health_tips {
            output.push_str(&format!("- {}\n", tip));
        }
        if let Some(allergen) = &analysis.allergen {
            output.push_str(&format!("Allergen: {}\n", allergen));
        }

        state.set_formatted(output);
        Ok(())
    }

    fn finish(
        &self,
        state: RiskState,
        session_id: String,
        handler: &Arc<dyn ProgressHandler>,
    ) -> RiskReport {
        let stage = state.stage();
        if stage == DialogueStage::Failed {
            let error = state.error().unwrap_or("risk analysis failed").to_string();
            handler.on_event(&PipelineEvent::RunFailed {
                error: error.clone(),
            });
            info!(session_id = %session_id, error = %error, "run failed");
        } else {
            handler.on_event(&PipelineEvent::RunCompleted {
                session_id: session_id.clone(),
            });
            info!(session_id = %session_id, stage = %stage, "run completed");
        }

        let (disease, allergen) = match state.entities() {
            Some(entities) => (entities.disease.clone(), entities.allergen.clone()),
            None => (
                state.input().disease.clone(),
                state.input().allergen.clone(),
            ),
        };

        RiskReport {
            session_id,
            stage,
            disease,
            allergen,
            analysis: state.analysis().cloned(),
            formatted: state.formatted().map(String::from),
            error: state.error().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MockGateway, MockReply};
    use crate::pipeline::types::NutritionDetail;

    fn risk_input_without_text() -> RiskInput {
        RiskInput {
            disease: Some(Disease {
                name: "Hypertension".into(),
                code: None,
                severity: Some(2),
                notes: None,
            }),
            allergen: None,
            food_record: None,
            nutrition: Some(NutritionDetail {
                sodium: 1200.0,
                calories: 800.0,
                ..Default::default()
            }),
            user_input: None,
        }
    }

    #[tokio::test]
    async fn test_missing_disease_hard_fails() {
        let gateway = Arc::new(MockGateway::new());
        let pipeline = DiseaseRiskPipeline::new(gateway.clone());

        let report = pipeline.run(RiskInput::default()).await;
        assert_eq!(report.stage, DialogueStage::Failed);
        assert!(report.error.unwrap().contains("missing"));
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analysis_branch_formats_output() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_reply(MockReply::text(
            r#"{
                "disease": "Hypertension",
                "risky_nutrients": ["sodium"],
                "risk_explanations": ["sodium raises blood pressure"],
                "avoid_foods": ["cured meat"],
                "health_tips": ["cook with less salt"]
            }"#,
        ));
        let pipeline = DiseaseRiskPipeline::new(gateway);

        let report = pipeline.run(risk_input_without_text()).await;
        assert_eq!(report.stage, DialogueStage::Completed);
        let analysis = report.analysis.unwrap();
        assert!(analysis.risky_nutrients.contains(&"sodium".to_string()));
        let formatted = report.formatted.unwrap();
        assert!(formatted.contains("Hypertension"));
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_extraction_branch_stops_before_analysis() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_reply(MockReply::text(
            r#"{"disease": {"name": "Hypertension"}, "allergen": {"name": "peanut"}}"#,
        ));
        let pipeline = DiseaseRiskPipeline::new(gateway.clone());

        let mut input = risk_input_without_text();
        input.user_input = Some("I have hypertension and a peanut allergy".into());

        let report = pipeline.run(input).await;
        assert_eq!(report.stage, DialogueStage::Completed);
        assert_eq!(report.disease.unwrap().name, "Hypertension");
        assert_eq!(report.allergen.unwrap().name, "peanut");
        assert!(report.analysis.is_none(), "extraction must not analyze");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_falls_back_to_input_records() {
        let gateway = Arc::new(MockGateway::new());
        gateway.add_reply(MockReply::text("not json at all"));
        let pipeline = DiseaseRiskPipeline::new(gateway);

        let mut input = risk_input_without_text();
        input.user_input = Some("gibberish".into());

        let report = pipeline.run(input).await;
        assert_eq!(report.stage, DialogueStage::Completed);
        assert_eq!(report.disease.unwrap().name, "Hypertension");
        assert!(report.analysis.is_none());
    }
}
