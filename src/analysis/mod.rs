//! Analysis module - scope scanning, loop tree, safety checks

pub mod scope;
pub mod loop_tree;
pub mod safety;
