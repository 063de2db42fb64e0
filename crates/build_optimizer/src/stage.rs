use std::sync::Arc;

use anyhow::Result;

use crate::ast::js_ast::JsAst;
use crate::config::FrameworkVocabulary;
use crate::symbols::SymbolResolver;
use crate::visitors::class_downcast::ClassDowncastMatcher;
use crate::visitors::decorator_scrubber::DecoratorScrubber;
use crate::visitors::enum_rewriter::EnumRewriter;
use crate::visitors::pure_call::PureCallMatcher;

/// One rewrite applied to a parsed module.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap scan of the raw text deciding whether the stage is worth scheduling.
    fn test(&self, _content: &str) -> bool {
        true
    }

    fn requires_symbols(&self) -> bool {
        false
    }

    /// Returns whether the module was changed.
    fn run(&self, ast: &mut JsAst, symbols: Option<&dyn SymbolResolver>) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    /// Parse without binding, print only when something changed.
    Fast,
    /// Parse with symbol binding, always print.
    Full,
}

#[derive(Clone, Default)]
pub struct PipelinePlan {
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelinePlan {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn for_file(
        content: &str,
        is_side_effect_free: bool,
        is_core_file: bool,
        vocabulary: &FrameworkVocabulary,
    ) -> Self {
        let mut stages: Vec<Arc<dyn Stage>> = vec![];
        if is_side_effect_free {
            stages.push(Arc::new(PureCallMatcher));
        } else if ClassDowncastMatcher.test(content) {
            stages.push(Arc::new(ClassDowncastMatcher));
        }
        let scrubber = DecoratorScrubber::new(vocabulary.clone(), is_core_file);
        if scrubber.test(content) {
            stages.push(Arc::new(scrubber));
        }
        stages.push(Arc::new(EnumRewriter));
        Self { stages }
    }

    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn requires_symbols(&self) -> bool {
        self.stages.iter().any(|stage| stage.requires_symbols())
    }

    pub fn execution_path(&self, emit_source_map: bool) -> ExecutionPath {
        if emit_source_map || self.requires_symbols() {
            ExecutionPath::Full
        } else {
            ExecutionPath::Fast
        }
    }
}
