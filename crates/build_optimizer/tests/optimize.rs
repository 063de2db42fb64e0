use build_optimizer::ast::sourcemap::RawSourceMap;
use build_optimizer::config::FrameworkVocabulary;
use build_optimizer::{optimize, BuildOptimizerOptions};

fn fixture(name: &str) -> String {
    format!("{}/test/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn squash(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_optimize_component_file() {
    let result = optimize(
        &BuildOptimizerOptions {
            input_file_path: Some(fixture("app.component.js")),
            output_file_path: Some("dist/app.component.js".to_string()),
            emit_source_map: true,
            strict: true,
            ..Default::default()
        },
        &FrameworkVocabulary::default(),
    )
    .unwrap();
    assert!(!result.skipped);

    let content = result.content.unwrap();
    assert!(content.ends_with("//# sourceMappingURL=dist/app.component.js.map"));
    let code = squash(&content);
    assert!(code.contains("varMode=/*@__PURE__*/(function(Mode){"));
    assert!(code.contains("returnMode;})({});"));
    assert!(code.contains("/*@__PURE__*/(function(){functionAppComponent(){"));
    assert!(!code.contains("__decorate(["));
    assert!(code.contains("AppComponent.prototype.toggle=function(){"));
    assert!(code.contains("export{AppComponent};"));

    let map: RawSourceMap = result.source_map.unwrap();
    assert_eq!(map.version, 3);
    assert_eq!(map.file, "dist/app.component.js");
    assert_eq!(map.sources, vec![fixture("app.component.js")]);
}

#[test]
fn test_optimize_factory_file() {
    let result = optimize(
        &BuildOptimizerOptions {
            input_file_path: Some(fixture("app.module.ngfactory.js")),
            ..Default::default()
        },
        &FrameworkVocabulary::default(),
    )
    .unwrap();
    let code = squash(&result.content.unwrap());
    assert!(code.starts_with("/**PURE_IMPORTS_START_angular_core,app.modulePURE_IMPORTS_END*/"));
    assert!(code.contains("varAppModuleNgFactory=/*@__PURE__*/i0.ɵcmf("));
    // calls inside the factory function are left alone
    assert!(code.contains("returni0.ɵmod([i0.ɵmpd("));
}

#[test]
fn test_optimize_content_overrides_file() {
    let result = optimize(
        &BuildOptimizerOptions {
            content: Some("var a = 1;".to_string()),
            input_file_path: Some("does-not-exist.js".to_string()),
            ..Default::default()
        },
        &FrameworkVocabulary::default(),
    )
    .unwrap();
    assert!(result.skipped);
}

#[test]
fn test_optimize_missing_file() {
    let err = optimize(
        &BuildOptimizerOptions {
            input_file_path: Some(fixture("missing.js")),
            ..Default::default()
        },
        &FrameworkVocabulary::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("failed to read"));
}
