pub mod config;
pub mod producer;
pub mod routes;
pub mod supervisor;
pub mod viewer;
