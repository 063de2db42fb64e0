use anyhow::Result;
use swc_core::common::Spanned;
use swc_core::ecma::ast::{
    ArrowExpr, CallExpr, Callee, Class, Expr, Function, GetterProp, ModuleDecl, ModuleItem,
    SetterProp,
};
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::debug;

use crate::ast::comments::Comments;
use crate::ast::js_ast::JsAst;
use crate::ast::utils::unparen;
use crate::stage::Stage;
use crate::symbols::SymbolResolver;

/// Marks every top-level call and `new` in a side-effect-free module as pure,
/// and records the module's imports in a manifest comment.
pub struct PureCallMatcher;

impl Stage for PureCallMatcher {
    fn name(&self) -> &'static str {
        "pure-call"
    }

    fn run(&self, ast: &mut JsAst, _symbols: Option<&dyn SymbolResolver>) -> Result<bool> {
        let mut marker = TopLevelCallMarker {
            comments: &ast.comments,
            marked: 0,
        };
        ast.ast.visit_with(&mut marker);
        let manifest_added = add_pure_imports_manifest(&ast.ast.body, &ast.comments);
        debug!(
            "{}: marked {} calls, manifest added: {}",
            self.name(),
            marker.marked,
            manifest_added
        );
        Ok(marker.marked > 0 || manifest_added)
    }
}

struct TopLevelCallMarker<'a> {
    comments: &'a Comments,
    marked: usize,
}

impl TopLevelCallMarker<'_> {
    fn is_annotated(&self, mut expr: &Expr) -> bool {
        loop {
            if self.comments.has_pure(expr.span_lo()) {
                return true;
            }
            match expr {
                Expr::Paren(paren) => expr = &paren.expr,
                _ => return false,
            }
        }
    }
}

impl Visit for TopLevelCallMarker<'_> {
    // bodies only run when called, so nothing inside them is top-level
    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_class(&mut self, _: &Class) {}

    fn visit_getter_prop(&mut self, _: &GetterProp) {}

    fn visit_setter_prop(&mut self, _: &SetterProp) {}

    fn visit_expr(&mut self, expr: &Expr) {
        let inner = unparen(expr);
        if is_pure_candidate(inner)
            && !self.is_annotated(expr)
            && self.comments.add_pure(expr.span_lo())
        {
            self.marked += 1;
        }
        inner.visit_children_with(self);
    }
}

fn is_pure_candidate(expr: &Expr) -> bool {
    match expr {
        Expr::New(_) => true,
        Expr::Call(CallExpr {
            callee: Callee::Expr(callee),
            args,
            ..
        }) => match unparen(callee) {
            // an IIFE with arguments might leak them
            Expr::Fn(_) => args.is_empty(),
            _ => true,
        },
        _ => false,
    }
}

/// Import specifiers of the module, normalized into identifier-like tokens.
pub fn pure_imports(items: &[ModuleItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) if !import.specifiers.is_empty() => {
                Some(import_token(&import.src.value))
            }
            _ => None,
        })
        .collect()
}

fn import_token(src: &str) -> String {
    src.trim_start_matches(['.', '/'])
        .chars()
        .map(|c| match c {
            '/' | '\\' | '@' | '-' => '_',
            c => c,
        })
        .collect()
}

fn add_pure_imports_manifest(items: &[ModuleItem], comments: &Comments) -> bool {
    let Some(first) = items.first() else {
        return false;
    };
    let text = format!(
        "* PURE_IMPORTS_START {} PURE_IMPORTS_END ",
        pure_imports(items).join(",")
    );
    let pos = first.span_lo();
    if pos.is_dummy() || comments.has_block_comment(pos, &text) {
        return false;
    }
    comments.prepend_block_comment(pos, &text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::tests::{squash, TestUtils};

    fn run(code: &str) -> (bool, String) {
        let mut test_utils = TestUtils::gen_js_ast(code);
        let changed = test_utils.run(&PureCallMatcher);
        (changed, squash(&test_utils.js_ast_to_code()))
    }

    #[test]
    fn test_top_level_calls_are_marked() {
        let (changed, code) = run(
            r#"
var a = foo();
var b = new Bar();
baz.qux(1);
"#,
        );
        assert!(changed);
        assert!(code.contains("vara=/*@__PURE__*/foo();"));
        assert!(code.contains("varb=/*@__PURE__*/newBar();"));
        assert!(code.contains("/*@__PURE__*/baz.qux(1);"));
    }

    #[test]
    fn test_function_bodies_are_skipped() {
        let (_, code) = run(
            r#"
function f() { return g(); }
var h = function () { return i(); };
var j = () => k();
"#,
        );
        assert_eq!(code.matches("@__PURE__").count(), 0);
    }

    #[test]
    fn test_iife_with_arguments_is_skipped() {
        let (_, code) = run("(function (a) { a.x = 1; })(window);");
        assert_eq!(code.matches("@__PURE__").count(), 0);
        let (_, code) = run("var x = (function () { return 1; })();");
        assert!(code.contains("varx=/*@__PURE__*/(function(){return1;})();"));
    }

    #[test]
    fn test_arrow_iife_is_marked() {
        let (changed, code) = run("((a) => { a.x = 1; })(window);");
        assert!(changed);
        assert_eq!(code.matches("@__PURE__").count(), 1);
        assert!(code.contains("/*@__PURE__*/(("));
    }

    #[test]
    fn test_nested_calls_in_arguments_are_marked() {
        let (_, code) = run("var a = foo(bar());");
        assert!(code.contains("vara=/*@__PURE__*/foo(/*@__PURE__*/bar());"));
    }

    #[test]
    fn test_existing_annotation_is_kept_single() {
        let (_, code) = run("var a = /*@__PURE__*/ foo();");
        assert_eq!(code.matches("@__PURE__").count(), 1);
    }

    #[test]
    fn test_imports_manifest() {
        let (changed, code) = run(
            r#"
import { a } from './foo-bar';
import * as b from '@angular/core';
import './side-effect';
var c = a;
"#,
        );
        assert!(changed);
        assert!(code.starts_with("/**PURE_IMPORTS_STARTfoo_bar,_angular_corePURE_IMPORTS_END*/"));
    }

    #[test]
    fn test_imports_manifest_without_imports() {
        let (changed, code) = run("var a = 1;");
        assert!(changed);
        assert!(code.starts_with("/**PURE_IMPORTS_STARTPURE_IMPORTS_END*/vara=1;"));
    }

    #[test]
    fn test_run_twice_adds_nothing() {
        let mut test_utils = TestUtils::gen_js_ast("var a = foo();");
        assert!(test_utils.run(&PureCallMatcher));
        assert!(!test_utils.run(&PureCallMatcher));
        let code = test_utils.js_ast_to_code();
        assert_eq!(code.matches("@__PURE__").count(), 1);
        assert_eq!(code.matches("PURE_IMPORTS_START").count(), 1);
    }

    #[test]
    fn test_import_token() {
        assert_eq!(import_token("./foo-bar"), "foo_bar");
        assert_eq!(import_token("../../a/b"), "a_b");
        assert_eq!(import_token("@angular/core"), "_angular_core");
        assert_eq!(import_token("rxjs\\operators"), "rxjs_operators");
    }
}
