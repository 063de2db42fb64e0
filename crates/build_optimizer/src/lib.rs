pub mod ast;
pub mod classify;
pub mod config;
pub mod optimizer;
pub mod stage;
pub mod symbols;
pub mod visitors;

pub use optimizer::{
    optimize, transform_javascript, BuildOptimizerOptions, TransformOptions, TransformResult,
};
