use serde::Serialize;
use serde_json::Value as JsonValue;

/// Best-effort nutrition estimate returned by the gateway. Every numeric
/// field is untrusted: missing, null, negative or non-numeric values all
/// coalesce to 0 instead of failing the whole estimate.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealEstimate {
    pub name: Option<String>,
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fats: u32,
}

impl MealEstimate {
    pub fn from_json(value: &JsonValue) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            calories: coalesce_grams(value.get("calories")),
            protein: coalesce_grams(value.get("protein")),
            carbs: coalesce_grams(value.get("carbs")),
            fats: coalesce_grams(value.get("fats")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEstimate {
    pub burned_calories: f64,
}

impl ExerciseEstimate {
    pub fn from_json(value: &JsonValue) -> Self {
        let burned = value
            .get("burnedCalories")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        Self {
            burned_calories: burned.max(0.0),
        }
    }
}

fn coalesce_grams(value: Option<&JsonValue>) -> u32 {
    value
        .and_then(|v| v.as_f64())
        .map(|v| v.max(0.0).round() as u32)
        .unwrap_or(0)
}
