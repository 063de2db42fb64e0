pub mod comments;
pub mod error;
pub mod js_ast;
pub mod sourcemap;
pub mod utils;
