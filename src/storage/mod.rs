//! Storage Layer - SQLite-backed feature tables
//!
//! The external pipeline owns the data; this layer only reads. Tables:
//! - cameras(camera_id, model, width, height, params, prior_focal_length)
//! - images(image_id, name, camera_id)
//! - keypoints(image_id, rows, cols, data)
//! - descriptors(image_id, rows, cols, data)

pub mod schema;
pub mod sqlite;

pub use sqlite::{FeatureStats, FeatureStore};
