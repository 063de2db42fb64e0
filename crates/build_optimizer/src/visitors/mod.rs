pub mod class_downcast;
pub mod decorator_scrubber;
pub mod enum_rewriter;
pub mod pure_call;
