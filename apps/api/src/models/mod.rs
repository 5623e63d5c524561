pub mod evaluation;
pub mod plan;
pub mod user;
