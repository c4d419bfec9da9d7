//! Prompt construction for the analysis pipelines
//!
//! Structured stages instruct the model to answer with a bare JSON object;
//! the gateway's reply decoder tolerates fenced or prefixed JSON anyway.

use super::types::{
    AdviceDependencies, Allergen, Disease, NutritionDetail, NutritionFacts, UserPreferences,
};

pub const VISION_SYSTEM_PROMPT: &str = "\
You are a professional dietitian who identifies and analyzes food photos.
Describe every food item in the image in detail, covering:
1. The specific name and kind of each food
2. Estimated portion size and weight
3. Cooking method (fried, stir-fried, steamed, boiled, ...)
4. Freshness and appearance
5. Likely seasonings and side ingredients
Be as detailed and accurate as possible.";

pub fn vision_prompt() -> String {
    "Analyze this food photo and describe every food item in it in detail.".to_string()
}

pub fn nutrition_prompt(image_description: &str) -> String {
    format!(
        r#"Based on the following food description, provide a detailed nutrition analysis.

Food description: {image_description}

Answer with a JSON object in exactly this shape:
{{
    "food_items": ["food 1", "food 2"],
    "total_calories": 0.0,
    "macronutrients": {{
        "protein": 0.0,
        "fat": 0.0,
        "carbohydrates": 0.0,
        "dietary_fiber": 0.0,
        "sugar": 0.0
    }},
    "vitamins_minerals": {{
        "vitamin_a": 0.0,
        "vitamin_c": 0.0,
        "vitamin_d": 0.0,
        "calcium": 0.0,
        "iron": 0.0,
        "sodium": 0.0,
        "potassium": 0.0,
        "cholesterol": 0.0
    }},
    "health_level": 3
}}
Macronutrients are grams, vitamins and minerals are milligrams.
"health_level" grades the meal from 5 (excellent) down to 1 (very poor).
Answer with the JSON object only."#
    )
}

pub fn dependencies_prompt(snippets: &[String], preferences: &UserPreferences) -> String {
    let prefs = serde_json::to_string(preferences).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Based on the following reference knowledge and user profile, compile the
nutrition knowledge relevant to this meal.

Reference knowledge: {snippets:?}
User preferences: {prefs}

Answer with a JSON object in exactly this shape:
{{
    "nutrition_facts": ["key fact 1", "key fact 2"],
    "health_guidelines": ["guideline 1", "guideline 2"],
    "food_interactions": ["interaction 1"]
}}
Use empty arrays for sections with nothing relevant. Answer with the JSON object only."#
    )
}

pub fn advice_prompt(
    facts: &NutritionFacts,
    dependencies: &AdviceDependencies,
    preferences: &UserPreferences,
) -> String {
    let prefs = serde_json::to_string(preferences).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"Based on the following nutrition analysis and reference knowledge, give
professional, actionable dietary advice.

Nutrition analysis:
- Food items: {food_items:?}
- Total calories: {calories} kcal
- Protein {protein} g, fat {fat} g, carbohydrates {carbs} g
- Health grade: {grade}

Reference knowledge:
- Key facts: {facts:?}
- Guidelines: {guidelines:?}
- Food interactions: {interactions:?}

User preferences: {prefs}

Answer with a JSON object in exactly this shape:
{{
    "recommendations": ["specific advice 1", "specific advice 2"],
    "dietary_tips": ["tip 1", "tip 2"],
    "warnings": ["caution 1"],
    "alternative_foods": ["alternative 1"]
}}
Answer with the JSON object only."#,
        food_items = facts.food_items,
        calories = facts.total_calories,
        protein = facts.macronutrients.protein,
        fat = facts.macronutrients.fat,
        carbs = facts.macronutrients.carbohydrates,
        grade = facts.health_level.letter(),
        facts = dependencies.nutrition_facts,
        guidelines = dependencies.health_guidelines,
        interactions = dependencies.food_interactions,
    )
}

pub fn entity_extraction_prompt(user_input: &str) -> String {
    format!(
        r#"Extract any disease and allergen mentions from the user's message.

User message: {user_input}

Answer with a JSON object in exactly this shape:
{{
    "disease": {{"name": "...", "severity": 1}},
    "allergen": {{"name": "...", "category": 1, "severity": 1}}
}}
Omit "disease" or "allergen" entirely when the message does not mention one.
Severity is 1 (mild) to 3 (severe); allergen category is 1 food, 2 drug,
3 environmental, 4 other. Answer with the JSON object only."#
    )
}

pub fn risk_analysis_prompt(
    disease: &Disease,
    nutrition: &NutritionDetail,
    allergen: Option<&Allergen>,
) -> String {
    let allergen_section = match allergen {
        Some(a) => format!("\nKnown allergen: {}", a.name),
        None => String::new(),
    };
    format!(
        r#"You are a medical nutrition expert. Analyze the health risk this intake
poses for the patient.

Disease:
- Name: {name}
- Severity: {severity}

Intake:
- Total calories: {calories} kcal
- Carbohydrates: {carbs} g
- Fat: {fat} g
- Protein: {protein} g
- Cholesterol: {cholesterol} mg
- Sodium: {sodium} mg
- Sugar: {sugar} g{allergen_section}

Cover: which nutrients are harmful for this disease or allergen, why each is
harmful, which foods to avoid, and healthy-diet suggestions.

Answer with a JSON object in exactly this shape:
{{
    "disease": "...",
    "risky_nutrients": ["..."],
    "risk_explanations": ["..."],
    "avoid_foods": ["..."],
    "health_tips": ["..."],
    "allergen": "..."
}}
Omit "allergen" when none applies. Answer with the JSON object only."#,
        name = disease.name,
        severity = disease.severity.unwrap_or(1),
        calories = nutrition.calories,
        carbs = nutrition.carbohydrates,
        fat = nutrition.fat,
        protein = nutrition.protein,
        cholesterol = nutrition.cholesterol,
        sodium = nutrition.sodium,
        sugar = nutrition.sugar,
    )
}
