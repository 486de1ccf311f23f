pub mod estimation_service;
pub mod goal_service;
pub mod ledger_service;
pub mod prompt_templates;
