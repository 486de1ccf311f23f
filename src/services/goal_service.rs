use tracing::debug;

use crate::models::profile::{Gender, GoalKind, Profile};
use crate::models::targets::{MacroTargets, Targets};

/// Hard floor on the daily calorie goal. Aggressive deficits below this are
/// never handed to the user regardless of profile.
const MIN_DAILY_CALORIES: f64 = 1200.0;

/// Calorie adjustment applied on top of TDEE per goal.
const LOSE_ADJUSTMENT: f64 = -500.0;
const GAIN_ADJUSTMENT: f64 = 300.0;

/// Grams of protein per kilogram of body weight.
const PROTEIN_PER_KG: f64 = 2.0;
/// Share of daily calories taken from fat, at 9 kcal per gram.
const FAT_CALORIE_SHARE: f64 = 0.25;
/// Water intake in milliliters per kilogram, served in 250 ml glasses.
const WATER_ML_PER_KG: f64 = 35.0;
const GLASS_ML: f64 = 250.0;

/// Derives daily calorie, macro and water targets from a profile using the
/// Mifflin-St Jeor basal metabolic rate. Pure and total: same profile in,
/// same targets out.
pub fn compute_targets(profile: &Profile) -> Targets {
    let mut bmr =
        10.0 * profile.weight + 6.25 * f64::from(profile.height) - 5.0 * f64::from(profile.age);
    bmr += match profile.gender {
        Gender::Male => 5.0,
        Gender::Other => -161.0,
    };

    let tdee = bmr * profile.activity;
    let goal_calories = match profile.goal {
        GoalKind::Lose => tdee + LOSE_ADJUSTMENT,
        GoalKind::Gain => tdee + GAIN_ADJUSTMENT,
        GoalKind::Maintain => tdee,
    };
    let daily_calorie_goal = goal_calories.round().max(MIN_DAILY_CALORIES) as u32;

    let protein = (profile.weight * PROTEIN_PER_KG).round() as u32;
    let fats = (f64::from(daily_calorie_goal) * FAT_CALORIE_SHARE / 9.0).round() as u32;
    let carbs = ((f64::from(daily_calorie_goal)
        - f64::from(protein) * 4.0
        - f64::from(fats) * 9.0)
        / 4.0)
        .round()
        .max(0.0) as u32;

    let daily_water_goal = (profile.weight * WATER_ML_PER_KG / GLASS_ML).ceil() as u32;

    let targets = Targets {
        daily_calorie_goal,
        daily_water_goal,
        macros: MacroTargets {
            protein,
            carbs,
            fats,
        },
    };

    debug!(
        target: "app::goals",
        calorie_goal = targets.daily_calorie_goal,
        water_goal = targets.daily_water_goal,
        "targets derived from profile"
    );

    targets
}
