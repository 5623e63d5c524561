pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod screening;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
