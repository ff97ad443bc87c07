//! Training target generation for two-stage region proposal detectors.

mod common;
pub mod anchor;
pub mod config;
pub mod dataset;
pub mod feed;
pub mod loss;
pub mod processor;
pub mod utils;
