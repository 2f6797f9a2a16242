//! Retrieval evaluation
//!
//! Hash codes are compared by Hamming distance and scored with mean Average
//! Precision over a held-out query set.

pub mod map;

pub use map::{encode, hamming_distance, mean_average_precision, BinaryCodes, Evaluator, HammingMapEvaluator};
