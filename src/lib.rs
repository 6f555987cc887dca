pub mod algorithms;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod models;
pub mod output;
pub mod precalc;
pub mod solver;
pub mod state;
