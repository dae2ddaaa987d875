pub mod camera;
pub mod config;
pub mod decoder;
pub mod draw;
pub mod exit;
pub mod handlers;
pub mod spellcaster;
pub mod visualize;
