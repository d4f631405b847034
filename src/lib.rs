//! Closetly wardrobe backend
//!
//! This library provides the core functionality for the closetly system:
//! wardrobe item and model-photo storage, garment classification, and an
//! asynchronous virtual try-on pipeline against the Kling image-generation
//! API, with results re-hosted on the system's own media storage.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
