//! PypyDance / WannaDance song ID conversion - shared modules for all binaries.

pub mod catalog;
pub mod convert;
pub mod ids;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod safety;
pub mod scoring;
