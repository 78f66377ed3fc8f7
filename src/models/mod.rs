// src/models/mod.rs

pub mod answer;
pub mod exam;
pub mod submission;
