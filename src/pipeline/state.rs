//! Pipeline state threaded through every stage
//!
//! Each run owns one state value for its lifetime. The stage marker only
//! moves forward, every artifact slot is written by exactly one stage, and a
//! single error slot records the first failure. Stages never overwrite a
//! populated artifact; that discipline is what makes the stage/artifact
//! invariant checkable.

use super::types::{
    AdviceDependencies, Allergen, Disease, FoodRecord, MedicalEntities, NutritionAdvice,
    NutritionDetail, NutritionFacts, RiskAnalysis, UserPreferences,
};
use crate::model::ImagePayload;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stage marker for the nutrition analysis pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Init,
    ImageAnalyzed,
    NutritionExtracted,
    KnowledgeRetrieved,
    DependenciesGenerated,
    AdviceGenerated,
    Completed,
    Failed,
}

impl AnalysisStage {
    /// Position in the forward order; `Failed` is terminal from anywhere
    fn rank(&self) -> u8 {
        match self {
            AnalysisStage::Init => 0,
            AnalysisStage::ImageAnalyzed => 1,
            AnalysisStage::NutritionExtracted => 2,
            AnalysisStage::KnowledgeRetrieved => 3,
            AnalysisStage::DependenciesGenerated => 4,
            AnalysisStage::AdviceGenerated => 5,
            AnalysisStage::Completed => 6,
            AnalysisStage::Failed => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Init => "init",
            AnalysisStage::ImageAnalyzed => "image_analyzed",
            AnalysisStage::NutritionExtracted => "nutrition_extracted",
            AnalysisStage::KnowledgeRetrieved => "knowledge_retrieved",
            AnalysisStage::DependenciesGenerated => "dependencies_generated",
            AnalysisStage::AdviceGenerated => "advice_generated",
            AnalysisStage::Completed => "completed",
            AnalysisStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStage::Completed | AnalysisStage::Failed)
    }
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the meal image comes from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw bytes with a declared media type
    Bytes(ImagePayload),
    /// Local file, media type inferred from the extension
    Path(PathBuf),
    /// HTTP(S) reference fetched at init
    Url(String),
}

/// Immutable input for a nutrition analysis run
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub image: ImageSource,
    pub preferences: UserPreferences,
}

impl AnalysisInput {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            preferences: UserPreferences::new(),
        }
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

/// Mutable state for one nutrition analysis run
#[derive(Debug)]
pub struct AnalysisState {
    stage: AnalysisStage,
    input: AnalysisInput,
    image_description: Option<String>,
    nutrition: Option<NutritionFacts>,
    knowledge: Option<Vec<String>>,
    dependencies: Option<AdviceDependencies>,
    advice: Option<NutritionAdvice>,
    error: Option<String>,
}

impl AnalysisState {
    pub fn new(input: AnalysisInput) -> Self {
        Self {
            stage: AnalysisStage::Init,
            input,
            image_description: None,
            nutrition: None,
            knowledge: None,
            dependencies: None,
            advice: None,
            error: None,
        }
    }

    pub fn stage(&self) -> AnalysisStage {
        self.stage
    }

    pub fn input(&self) -> &AnalysisInput {
        &self.input
    }

    /// Advances the stage marker; the marker never moves backwards
    pub(crate) fn advance(&mut self, next: AnalysisStage) {
        debug_assert!(
            next.rank() > self.stage.rank() || next == AnalysisStage::Failed,
            "stage must advance forward: {} -> {}",
            self.stage,
            next
        );
        self.stage = next;
    }

    /// Marks the run failed; keeps the first recorded error
    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.record_error(message);
        self.stage = AnalysisStage::Failed;
    }

    /// Records a degradation without stopping the run
    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_image_description(&mut self, description: String) {
        debug_assert!(self.image_description.is_none(), "artifact is write-once");
        self.image_description = Some(description);
    }

    pub fn image_description(&self) -> Option<&str> {
        self.image_description.as_deref()
    }

    pub(crate) fn set_nutrition(&mut self, facts: NutritionFacts) {
        debug_assert!(self.nutrition.is_none(), "artifact is write-once");
        self.nutrition = Some(facts);
    }

    pub fn nutrition(&self) -> Option<&NutritionFacts> {
        self.nutrition.as_ref()
    }

    pub(crate) fn set_knowledge(&mut self, snippets: Vec<String>) {
        debug_assert!(self.knowledge.is_none(), "artifact is write-once");
        self.knowledge = Some(snippets);
    }

    pub fn knowledge(&self) -> Option<&[String]> {
        self.knowledge.as_deref()
    }

    pub(crate) fn set_dependencies(&mut self, dependencies: AdviceDependencies) {
        debug_assert!(self.dependencies.is_none(), "artifact is write-once");
        self.dependencies = Some(dependencies);
    }

    pub fn dependencies(&self) -> Option<&AdviceDependencies> {
        self.dependencies.as_ref()
    }

    pub(crate) fn set_advice(&mut self, advice: NutritionAdvice) {
        debug_assert!(self.advice.is_none(), "artifact is write-once");
        self.advice = Some(advice);
    }

    pub fn advice(&self) -> Option<&NutritionAdvice> {
        self.advice.as_ref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        AnalysisStage,
        Option<String>,
        Option<NutritionFacts>,
        Option<AdviceDependencies>,
        Option<NutritionAdvice>,
        Option<String>,
    ) {
        (
            self.stage,
            self.image_description,
            self.nutrition,
            self.dependencies,
            self.advice,
            self.error,
        )
    }
}

/// Stage marker for the disease-risk dialogue pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStage {
    Init,
    EntitiesExtracted,
    RiskAnalyzed,
    Completed,
    Failed,
}

impl DialogueStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueStage::Init => "init",
            DialogueStage::EntitiesExtracted => "entities_extracted",
            DialogueStage::RiskAnalyzed => "risk_analyzed",
            DialogueStage::Completed => "completed",
            DialogueStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DialogueStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for a disease-risk run
///
/// Presence of `user_input` selects the extraction branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<Disease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen: Option<Allergen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_record: Option<FoodRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_input: Option<String>,
}

impl RiskInput {
    /// True when free text is present and non-blank
    pub fn has_user_input(&self) -> bool {
        self.user_input
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Mutable state for one disease-risk run
#[derive(Debug)]
pub struct RiskState {
    stage: DialogueStage,
    input: RiskInput,
    entities: Option<MedicalEntities>,
    analysis: Option<RiskAnalysis>,
    formatted: Option<String>,
    error: Option<String>,
}

impl RiskState {
    pub fn new(input: RiskInput) -> Self {
        Self {
            stage: DialogueStage::Init,
            input,
            entities: None,
            analysis: None,
            formatted: None,
            error: None,
        }
    }

    pub fn stage(&self) -> DialogueStage {
        self.stage
    }

    pub fn input(&self) -> &RiskInput {
        &self.input
    }

    pub(crate) fn advance(&mut self, next: DialogueStage) {
        self.stage = next;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
        self.stage = DialogueStage::Failed;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn set_entities(&mut self, entities: MedicalEntities) {
        debug_assert!(self.entities.is_none(), "artifact is write-once");
        self.entities = Some(entities);
    }

    pub fn entities(&self) -> Option<&MedicalEntities> {
        self.entities.as_ref()
    }

    pub(crate) fn set_analysis(&mut self, analysis: RiskAnalysis) {
        debug_assert!(self.analysis.is_none(), "artifact is write-once");
        self.analysis = Some(analysis);
    }

    pub fn analysis(&self) -> Option<&RiskAnalysis> {
        self.analysis.as_ref()
    }

    pub(crate) fn set_formatted(&mut self, formatted: String) {
        debug_assert!(self.formatted.is_none(), "artifact is write-once");
        self.formatted = Some(formatted);
    }

    pub fn formatted(&self) -> Option<&str> {
        self.formatted.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AnalysisInput {
        AnalysisInput::new(ImageSource::Bytes(ImagePayload::new(
            "image/jpeg",
            vec![0xff, 0xd8],
        )))
    }

    #[test]
    fn test_stage_advances_forward() {
        let mut state = AnalysisState::new(input());
        assert_eq!(state.stage(), AnalysisStage::Init);

        state.advance(AnalysisStage::ImageAnalyzed);
        state.advance(AnalysisStage::NutritionExtracted);
        assert_eq!(state.stage(), AnalysisStage::NutritionExtracted);
    }

    #[test]
    fn test_failed_is_reachable_from_any_stage() {
        let mut state = AnalysisState::new(input());
        state.advance(AnalysisStage::ImageAnalyzed);
        state.fail("boom");
        assert_eq!(state.stage(), AnalysisStage::Failed);
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_first_error_wins() {
        let mut state = AnalysisState::new(input());
        state.record_error("first");
        state.record_error("second");
        assert_eq!(state.error(), Some("first"));
    }

    #[test]
    fn test_artifacts_start_empty() {
        let state = AnalysisState::new(input());
        assert!(state.image_description().is_none());
        assert!(state.nutrition().is_none());
        assert!(state.knowledge().is_none());
        assert!(state.dependencies().is_none());
        assert!(state.advice().is_none());
    }

    #[test]
    fn test_risk_input_branch_selector() {
        let mut risk = RiskInput::default();
        assert!(!risk.has_user_input());

        risk.user_input = Some("   ".to_string());
        assert!(!risk.has_user_input());

        risk.user_input = Some("I have hypertension".to_string());
        assert!(risk.has_user_input());
    }
}
