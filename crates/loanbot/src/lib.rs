pub mod agent;
pub mod conversation;
pub mod errors;
pub mod eval;
pub mod loan;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod registry;
pub mod session;
pub mod systems;
