//! This module defines expressions over rows and how they are evaluated.

pub mod definitions;
pub mod evaluation;
pub mod tree;
