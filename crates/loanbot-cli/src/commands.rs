pub mod agent;
pub mod ask;
pub mod chat;
pub mod eval;
pub mod version;
