//! # Dimensionality Reduction
//!
//! Algorithms that project high-dimensional data into a small factor space while preserving
//! its dominant structure.
//!
//! ## Currently Available
//! - **MCA** ([`mca`]): Multiple Correspondence Analysis for tables of categorical variables
//!
//! ## Algorithm Selection Guide
//! - Use **MCA** when every variable is categorical and observations may leave some unanswered
//! - Continuous data belongs in PCA, which this crate does not provide

pub mod mca;
