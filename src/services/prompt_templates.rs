use crate::models::profile::Profile;

/// Prompt for photo-based meal recognition. The model must answer with a
/// bare JSON object; fences are still stripped defensively on the way back.
pub fn meal_image_prompt() -> &'static str {
    r#"You are an expert clinical dietitian. Analyze the attached meal photo in detail:
identify the visible ingredients and estimate their portion sizes. Then, using the USDA
nutrition database as your reference, rigorously calculate the total calories and
macronutrients. Respond ONLY with a valid JSON object with exactly these keys:
"name" (string, a descriptive dish name), "calories" (number), "protein" (number, grams),
"carbs" (number, grams), "fats" (number, grams). Do not add any extra text and do not
wrap the response in markdown code blocks."#
}

/// Prompt for name-based nutrition lookup.
pub fn meal_name_prompt(food_description: &str) -> String {
    format!(
        r#"Act as an expert clinical dietitian. Using the USDA nutrition database as your
primary reference, calculate the most accurate nutrition values possible for: "{food_description}".
If the query does not specify an amount, assume one average standard serving (e.g. 100 g,
1 cup, 1 medium unit). Respond ONLY with a valid JSON object with exactly these keys:
"calories" (number), "protein" (number, grams), "carbs" (number, grams), "fats" (number, grams).
Do not add any extra text and do not wrap the response in markdown code blocks."#
    )
}

/// Prompt for free-text exercise burn estimation. The profile goes into the
/// prompt so the estimate accounts for body weight, age and gender.
pub fn exercise_burn_prompt(profile: &Profile, activity_description: &str) -> String {
    format!(
        r#"Act as an exercise physiologist. The user has the following profile:
- Weight: {weight} kg
- Age: {age} years
- Gender: {gender}
The user just performed this physical activity: "{activity_description}".
Given that information, produce a clinical estimate of the total kilocalories burned
during the session. Respond ONLY with a valid JSON object with the single key
"burnedCalories" (number) holding your final figure. Do not add any extra text and do
not wrap the response in markdown code blocks."#,
        weight = profile.weight,
        age = profile.age,
        gender = profile.gender,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Gender, GoalKind};

    #[test]
    fn exercise_prompt_embeds_profile_and_activity() {
        let profile = Profile {
            name: "Ana".to_string(),
            age: 25,
            weight: 70.0,
            height: 175,
            gender: Gender::Other,
            activity: 1.55,
            goal: GoalKind::Maintain,
        };

        let prompt = exercise_burn_prompt(&profile, "30 minutes of swimming");
        assert!(prompt.contains("70 kg"));
        assert!(prompt.contains("25 years"));
        assert!(prompt.contains("other"));
        assert!(prompt.contains("30 minutes of swimming"));
        assert!(prompt.contains("burnedCalories"));
    }

    #[test]
    fn meal_name_prompt_embeds_the_query() {
        let prompt = meal_name_prompt("2 scrambled eggs with spinach");
        assert!(prompt.contains("2 scrambled eggs with spinach"));
        assert!(prompt.contains("\"calories\""));
    }
}
