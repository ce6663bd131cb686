// Library exports for Matchpoint
// This allows integration tests and external code to use Matchpoint modules

pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod matching;
pub mod routes;
pub mod state;
