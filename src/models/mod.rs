pub mod estimate;
pub mod ledger;
pub mod profile;
pub mod settings;
pub mod state;
pub mod targets;
pub mod weight;
