mod annotator;
mod audio;
mod bounding_box;
mod camera;
mod catalog;
mod cv_utils;
mod model;
mod prediction;
mod routes;
mod server;
mod slot;
mod stream;
mod telemetry;

pub mod app;
pub mod config;

pub use app::start_app;
