//! Analysis pipelines and the state threaded through their stages

mod disease;
mod error;
mod nutrition;
pub mod prompts;
mod state;
mod types;

pub use disease::{DiseaseRiskPipeline, RiskReport};
pub use error::StageError;
pub use nutrition::{AnalysisReport, NutritionPipeline};
pub use state::{
    AnalysisInput, AnalysisStage, AnalysisState, DialogueStage, ImageSource, RiskInput, RiskState,
};
pub use types::{
    AdviceDependencies, Allergen, Disease, FoodRecord, HealthLevel, Macronutrients,
    MedicalEntities, NutritionAdvice, NutritionDetail, NutritionFacts, RiskAnalysis,
    UserPreferences, VitaminsMinerals,
};
