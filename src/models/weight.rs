use serde::{Deserialize, Serialize};

/// One weight measurement per calendar date. Re-logging the same date
/// overwrites that date's value instead of appending a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightEntry {
    pub date: String,
    pub weight: f64,
}

/// Overwrites the entry for `date` when present, otherwise appends.
pub fn upsert(history: &mut Vec<WeightEntry>, date: &str, weight: f64) {
    match history.iter_mut().find(|entry| entry.date == date) {
        Some(entry) => entry.weight = weight,
        None => history.push(WeightEntry {
            date: date.to_string(),
            weight,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relogging_a_date_overwrites_instead_of_duplicating() {
        let mut history = Vec::new();
        upsert(&mut history, "2026-02-24", 71.2);
        upsert(&mut history, "2026-02-25", 70.8);
        upsert(&mut history, "2026-02-25", 70.4);

        assert_eq!(history.len(), 2);
        assert_eq!(history[1].weight, 70.4);
    }
}
