pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod epg;
pub mod errors;
pub mod favorites;
pub mod focus;
pub mod gate;
pub mod gesture;
pub mod handlers;
pub mod input;
pub mod item_id;
pub mod media;
pub mod overlay;
pub mod screens;
pub mod store;
pub mod timer;
pub mod ui;
