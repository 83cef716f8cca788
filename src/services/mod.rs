// src/services/mod.rs

pub mod catalog_service;
pub mod generation_queue;
pub mod persistence_service;
pub mod thumbnail_service;
