use serde::{Deserialize, Serialize};
use time::Date;

use super::repo::{Ingredient, Instruction, NutritionInfo};
use crate::tags::repo::Tag;

#[derive(Debug, Deserialize)]
pub struct IngredientAdd {
    pub ingredient: String,
    pub amount: f64,
    #[serde(default)]
    pub unit_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct InstructionAdd {
    pub text: String,
    pub step_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct NutritionInfoAdd {
    pub calories: i32,
    pub protein: i32,
    pub carbohydrates: i32,
    pub sugar: i32,
    pub fiber: i32,
    pub fat: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecipeAdd {
    pub servings: i32,
    pub prep_time: i32,
    pub description: String,
    pub ingredients: Vec<IngredientAdd>,
    pub instructions: Vec<InstructionAdd>,
    pub nutrition_info: NutritionInfoAdd,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UnitAdd {
    pub unit: String,
    pub liquid: bool,
}

/// Full recipe view: the row plus all child rows.
#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub recipe_id: i64,
    pub author_id: i64,
    #[serde(with = "crate::iso_date")]
    pub create_date: Date,
    pub servings: i32,
    pub prep_time: i32,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub nutrition_info: Option<NutritionInfo>,
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_add_deserializes_a_full_payload() {
        let payload: RecipeAdd = serde_json::from_value(serde_json::json!({
            "servings": 4,
            "prep_time": 30,
            "description": "Vegetable stir fry",
            "ingredients": [
                {"ingredient": "Carrot", "amount": 2.0, "unit_id": 1},
                {"ingredient": "Soy sauce", "amount": 0.5}
            ],
            "instructions": [
                {"text": "Chop the vegetables.", "step_order": 1},
                {"text": "Fry on high heat.", "step_order": 2}
            ],
            "nutrition_info": {
                "calories": 250, "protein": 8, "carbohydrates": 30,
                "sugar": 9, "fiber": 6, "fat": 10
            },
            "tag_ids": [3]
        }))
        .unwrap();

        assert_eq!(payload.servings, 4);
        assert_eq!(payload.ingredients.len(), 2);
        assert!(payload.ingredients[1].unit_id.is_none());
        assert_eq!(payload.instructions[1].step_order, 2);
        assert_eq!(payload.tag_ids, vec![3]);
    }

    #[test]
    fn tag_ids_default_to_empty() {
        let payload: RecipeAdd = serde_json::from_value(serde_json::json!({
            "servings": 1,
            "prep_time": 5,
            "description": "Toast",
            "ingredients": [],
            "instructions": [],
            "nutrition_info": {
                "calories": 80, "protein": 3, "carbohydrates": 14,
                "sugar": 1, "fiber": 1, "fat": 1
            }
        }))
        .unwrap();
        assert!(payload.tag_ids.is_empty());
    }
}
