#![doc = include_str!("../../../README.md")]

pub mod driver;
pub mod error;
pub mod experiment;
pub mod generator;
pub mod resource;
pub mod run_stats;
pub mod stage;
pub mod task;
pub mod trace;
pub mod workload;
