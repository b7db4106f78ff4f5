//! Core trait abstractions for the scraping library.
//!
//! These traits define the seams where applications plug in page
//! retrieval, browser rendering, and cache storage.

pub mod fetcher;
pub mod renderer;
pub mod store;
