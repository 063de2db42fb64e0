use std::fs;

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::ast::error::ParseError;
use crate::ast::js_ast::JsAst;
use crate::ast::sourcemap::RawSourceMap;
use crate::classify::{is_known_core_file, is_known_side_effect_free};
use crate::config::FrameworkVocabulary;
use crate::stage::{ExecutionPath, PipelinePlan};
use crate::symbols::{SymbolResolver, SymbolTable};

/// File name for content that comes without an input path.
const SCRATCH_FILE_NAME: &str = "bo-default-file.js";

lazy_static! {
    static ref SOURCE_MAPPING_URL_REGEX: Regex =
        Regex::new(r"(?m)^//# sourceMappingURL=[^\r\n]*").unwrap();
}

#[derive(Debug, Clone, Default)]
pub struct TransformOptions<'a> {
    pub content: &'a str,
    pub input_file_path: Option<&'a str>,
    pub output_file_path: Option<&'a str>,
    pub emit_source_map: bool,
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformResult {
    pub content: Option<String>,
    pub source_map: Option<RawSourceMap>,
    /// The input is already optimal and should be used unchanged.
    pub skipped: bool,
}

impl TransformResult {
    pub fn skipped() -> Self {
        TransformResult {
            content: None,
            source_map: None,
            skipped: true,
        }
    }
}

/// Runs every stage of `plan` over `options.content`.
pub fn transform_javascript(
    options: &TransformOptions,
    plan: &PipelinePlan,
) -> Result<TransformResult> {
    if plan.is_empty() {
        debug!("no stages scheduled");
        return Ok(TransformResult::skipped());
    }
    let path = plan.execution_path(options.emit_source_map);
    debug!("running {:?} on the {:?} path", plan.names(), path);
    match path {
        ExecutionPath::Fast => fast_path(options, plan),
        ExecutionPath::Full => full_path(options, plan),
    }
}

fn parse(options: &TransformOptions) -> Result<Option<JsAst>> {
    let path = options.input_file_path.unwrap_or(SCRATCH_FILE_NAME);
    match JsAst::new(options.content, path) {
        Ok(ast) => Ok(Some(ast)),
        Err(err) if !options.strict && err.is::<ParseError>() => {
            warn!(
                "skipping {}: input is not valid JavaScript",
                options.input_file_path.unwrap_or("<content>")
            );
            debug!("{}", err);
            Ok(None)
        }
        Err(err) => Err(anyhow!(
            "build optimizer failed with the following error messages:\n{}",
            err
        )),
    }
}

fn fast_path(options: &TransformOptions, plan: &PipelinePlan) -> Result<TransformResult> {
    let Some(mut ast) = parse(options)? else {
        return Ok(TransformResult::skipped());
    };
    let mut changed = false;
    for stage in plan.stages() {
        changed |= stage.run(&mut ast, None)?;
    }
    if !changed {
        return Ok(TransformResult::skipped());
    }
    let generated = ast.generate(false)?;
    Ok(TransformResult {
        content: Some(generated.code),
        source_map: None,
        skipped: false,
    })
}

fn full_path(options: &TransformOptions, plan: &PipelinePlan) -> Result<TransformResult> {
    let Some(mut ast) = parse(options)? else {
        return Ok(TransformResult::skipped());
    };
    ast.resolve();
    let symbols = SymbolTable::build(&ast.ast);
    for stage in plan.stages() {
        stage.run(&mut ast, Some(&symbols as &dyn SymbolResolver))?;
    }

    let generated = ast.generate(options.emit_source_map)?;
    let mut content = generated.code;
    if content.is_empty() {
        return Ok(TransformResult::skipped());
    }
    let source_map = match generated.source_map {
        Some(mut map) if options.emit_source_map => {
            map.sources = vec![options.input_file_path.unwrap_or_default().to_string()];
            match options.output_file_path {
                Some(output) => {
                    map.file = output.to_string();
                    let url = format!("//# sourceMappingURL={output}.map");
                    content = SOURCE_MAPPING_URL_REGEX
                        .replace_all(&content, url.as_str())
                        .into_owned();
                }
                None => {
                    map.file = String::new();
                    let stripped = SOURCE_MAPPING_URL_REGEX.replace_all(&content, "");
                    content = format!("{}\n", stripped.trim_end());
                }
            }
            Some(map)
        }
        _ => None,
    };
    Ok(TransformResult {
        content: Some(content),
        source_map,
        skipped: false,
    })
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptimizerOptions {
    pub content: Option<String>,
    pub input_file_path: Option<String>,
    pub output_file_path: Option<String>,
    /// Path used to classify the file when it differs from the input path.
    pub original_file_path: Option<String>,
    pub emit_source_map: bool,
    pub strict: bool,
    pub is_side_effect_free: Option<bool>,
    pub is_framework_core_file: Option<bool>,
}

/// Classifies the file, picks the stages and runs them.
pub fn optimize(
    options: &BuildOptimizerOptions,
    vocabulary: &FrameworkVocabulary,
) -> Result<TransformResult> {
    let content = match (&options.content, &options.input_file_path) {
        (Some(content), _) => content.clone(),
        (None, Some(input)) => fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input))?,
        (None, None) => {
            return Err(anyhow!(
                "either an input file path or content must be provided"
            ))
        }
    };
    if content.is_empty() {
        return Ok(TransformResult::skipped());
    }

    let original_file_path = options
        .original_file_path
        .as_deref()
        .or(options.input_file_path.as_deref());
    let is_side_effect_free = options
        .is_side_effect_free
        .unwrap_or_else(|| original_file_path.is_some_and(is_known_side_effect_free));
    let is_core_file = options
        .is_framework_core_file
        .unwrap_or_else(|| original_file_path.is_some_and(is_known_core_file));
    debug!(
        "optimizing {} (side effect free: {}, core: {})",
        original_file_path.unwrap_or("<content>"),
        is_side_effect_free,
        is_core_file
    );

    let plan = PipelinePlan::for_file(&content, is_side_effect_free, is_core_file, vocabulary);
    transform_javascript(
        &TransformOptions {
            content: &content,
            input_file_path: options.input_file_path.as_deref(),
            output_file_path: options.output_file_path.as_deref(),
            emit_source_map: options.emit_source_map,
            strict: options.strict,
        },
        &plan,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ast::tests::{setup_logger, squash};
    use crate::visitors::class_downcast::ClassDowncastMatcher;
    use crate::visitors::decorator_scrubber::DecoratorScrubber;
    use crate::visitors::enum_rewriter::EnumRewriter;

    const ENUM: &str = r#"var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E || (E = {}));
"#;

    fn options(content: &str) -> TransformOptions<'_> {
        TransformOptions {
            content,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_plan_is_skipped() {
        setup_logger();
        let result = transform_javascript(&options(ENUM), &PipelinePlan::default()).unwrap();
        assert_eq!(result, TransformResult::skipped());
    }

    #[test]
    fn test_fast_path_without_changes_is_skipped() {
        setup_logger();
        let plan = PipelinePlan::new(vec![Arc::new(EnumRewriter)]);
        let result = transform_javascript(&options("var a = 1;"), &plan).unwrap();
        assert!(result.skipped);
        assert!(result.content.is_none());
    }

    #[test]
    fn test_fast_path_with_changes() {
        let plan = PipelinePlan::new(vec![Arc::new(EnumRewriter)]);
        let result = transform_javascript(&options(ENUM), &plan).unwrap();
        assert!(!result.skipped);
        assert!(result.source_map.is_none());
        assert!(squash(&result.content.unwrap()).starts_with("varE=/*@__PURE__*/(function(E){"));
    }

    #[test]
    fn test_full_path_always_prints() {
        let plan = PipelinePlan::new(vec![Arc::new(DecoratorScrubber::new(
            FrameworkVocabulary::default(),
            false,
        ))]);
        let result = transform_javascript(&options("var a = 1;"), &plan).unwrap();
        assert!(!result.skipped);
        let content = result.content.unwrap();
        assert!(content.contains("var a = 1;"));
        assert!(!content.contains("sourceMappingURL"));
    }

    #[test]
    fn test_source_map_with_output_path() {
        let plan = PipelinePlan::new(vec![Arc::new(EnumRewriter)]);
        let result = transform_javascript(
            &TransformOptions {
                content: ENUM,
                input_file_path: Some("src/enum.js"),
                output_file_path: Some("dist/enum.js"),
                emit_source_map: true,
                strict: false,
            },
            &plan,
        )
        .unwrap();
        let content = result.content.unwrap();
        assert!(content.ends_with("//# sourceMappingURL=dist/enum.js.map"));
        assert!(!content.contains(SCRATCH_FILE_NAME));
        let map = result.source_map.unwrap();
        assert_eq!(map.file, "dist/enum.js");
        assert_eq!(map.sources, vec!["src/enum.js".to_string()]);
        assert!(!map.mappings.is_empty());
    }

    #[test]
    fn test_source_map_without_output_path() {
        let plan = PipelinePlan::new(vec![Arc::new(EnumRewriter)]);
        let result = transform_javascript(
            &TransformOptions {
                content: "var a = 1;",
                emit_source_map: true,
                ..Default::default()
            },
            &plan,
        )
        .unwrap();
        let content = result.content.unwrap();
        assert!(!content.contains("sourceMappingURL"));
        let map = result.source_map.unwrap();
        assert_eq!(map.file, "");
        assert_eq!(map.sources, vec!["".to_string()]);
    }

    #[test]
    fn test_invalid_input() {
        let plan = PipelinePlan::new(vec![Arc::new(ClassDowncastMatcher)]);
        let result = transform_javascript(&options("var = ;"), &plan).unwrap();
        assert!(result.skipped);

        let err = transform_javascript(
            &TransformOptions {
                content: "var = ;",
                strict: true,
                ..Default::default()
            },
            &plan,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("failed with the following error messages"));
    }

    #[test]
    fn test_strict_parse_error_names_input_file() {
        let plan = PipelinePlan::new(vec![Arc::new(EnumRewriter)]);
        let err = transform_javascript(
            &TransformOptions {
                content: "var = ;",
                input_file_path: Some("src/broken.js"),
                strict: true,
                ..Default::default()
            },
            &plan,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("src/broken.js:1:"));
        assert!(!message.contains(SCRATCH_FILE_NAME));
    }

    #[test]
    fn test_optimize_requires_input() {
        let err = optimize(
            &BuildOptimizerOptions::default(),
            &FrameworkVocabulary::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be provided"));
    }

    #[test]
    fn test_optimize_empty_content_is_skipped() {
        let result = optimize(
            &BuildOptimizerOptions {
                content: Some(String::new()),
                ..Default::default()
            },
            &FrameworkVocabulary::default(),
        )
        .unwrap();
        assert!(result.skipped);
    }

    #[test]
    fn test_optimize_classifies_side_effect_free_files() {
        let result = optimize(
            &BuildOptimizerOptions {
                content: Some("var a = foo();".to_string()),
                input_file_path: Some("/app/src/app.ngfactory.js".to_string()),
                ..Default::default()
            },
            &FrameworkVocabulary::default(),
        )
        .unwrap();
        let content = squash(&result.content.unwrap());
        assert!(content.contains("PURE_IMPORTS_START"));
        assert!(content.contains("vara=/*@__PURE__*/foo();"));

        let result = optimize(
            &BuildOptimizerOptions {
                content: Some("var a = foo();".to_string()),
                input_file_path: Some("/app/src/app.ngfactory.js".to_string()),
                is_side_effect_free: Some(false),
                ..Default::default()
            },
            &FrameworkVocabulary::default(),
        )
        .unwrap();
        assert!(result.skipped);
    }
}
