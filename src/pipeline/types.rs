//! Domain types flowing through the analysis pipelines
//!
//! Every type here is wire-visible: the model gateway decodes structured
//! replies into them and the final reports serialize them back out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form user preference map ("vegetarian": true, "goal": "cut", ...)
pub type UserPreferences = BTreeMap<String, serde_json::Value>;

/// Overall health grade of a meal, A (best) to E (worst)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HealthLevel {
    E = 1,
    D = 2,
    C = 3,
    B = 4,
    A = 5,
}

impl TryFrom<u8> for HealthLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HealthLevel::E),
            2 => Ok(HealthLevel::D),
            3 => Ok(HealthLevel::C),
            4 => Ok(HealthLevel::B),
            5 => Ok(HealthLevel::A),
            other => Err(format!("health level must be 1-5, got {}", other)),
        }
    }
}

impl From<HealthLevel> for u8 {
    fn from(level: HealthLevel) -> u8 {
        level as u8
    }
}

impl HealthLevel {
    pub fn letter(&self) -> char {
        match self {
            HealthLevel::A => 'A',
            HealthLevel::B => 'B',
            HealthLevel::C => 'C',
            HealthLevel::D => 'D',
            HealthLevel::E => 'E',
        }
    }
}

/// Macronutrient breakdown in grams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macronutrients {
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    #[serde(default)]
    pub dietary_fiber: f64,
    #[serde(default)]
    pub sugar: f64,
}

/// Vitamin and mineral content in milligrams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitaminsMinerals {
    #[serde(default)]
    pub vitamin_a: f64,
    #[serde(default)]
    pub vitamin_c: f64,
    #[serde(default)]
    pub vitamin_d: f64,
    #[serde(default)]
    pub calcium: f64,
    #[serde(default)]
    pub iron: f64,
    #[serde(default)]
    pub sodium: f64,
    #[serde(default)]
    pub potassium: f64,
    #[serde(default)]
    pub cholesterol: f64,
}

/// Structured nutrition facts extracted from an image description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    /// Recognized food items
    pub food_items: Vec<String>,
    /// Estimated total energy in kcal
    pub total_calories: f64,
    pub macronutrients: Macronutrients,
    #[serde(default)]
    pub vitamins_minerals: VitaminsMinerals,
    pub health_level: HealthLevel,
}

/// Knowledge grounding the advice stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceDependencies {
    #[serde(default)]
    pub nutrition_facts: Vec<String>,
    #[serde(default)]
    pub health_guidelines: Vec<String>,
    #[serde(default)]
    pub food_interactions: Vec<String>,
}

impl AdviceDependencies {
    pub fn is_empty(&self) -> bool {
        self.nutrition_facts.is_empty()
            && self.health_guidelines.is_empty()
            && self.food_interactions.is_empty()
    }
}

/// Generated nutrition advice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionAdvice {
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub dietary_tips: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub alternative_foods: Vec<String>,
}

/// Diagnosed disease record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Severity 1 (mild) to 3 (severe)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Disease {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            severity: None,
            notes: None,
        }
    }
}

/// Known allergen record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergen {
    pub name: String,
    /// 1 food, 2 drug, 3 environmental, 4 other
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<u8>,
    /// Severity 1 (mild) to 3 (severe)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
}

impl Allergen {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            severity: None,
        }
    }
}

/// A logged meal the risk analysis can reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// 1 breakfast, 2 lunch, 3 dinner, 4 snack, 5 late-night
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<u8>,
}

/// Per-meal nutrient intake used by the risk analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionDetail {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbohydrates: f64,
    #[serde(default)]
    pub dietary_fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    /// Milligrams
    #[serde(default)]
    pub sodium: f64,
    /// Milligrams
    #[serde(default)]
    pub cholesterol: f64,
}

/// Structured disease-risk analysis produced by the dialogue pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub disease: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen: Option<String>,
    pub risky_nutrients: Vec<String>,
    pub risk_explanations: Vec<String>,
    pub avoid_foods: Vec<String>,
    pub health_tips: Vec<String>,
}

/// Disease/allergen mentions extracted from free text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<Disease>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergen: Option<Allergen>,
}
