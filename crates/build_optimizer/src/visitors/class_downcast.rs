use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use swc_core::common::Spanned;
use swc_core::ecma::ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, Callee, Decl, Expr, ExprStmt, FnExpr, Ident,
    MemberProp, Pat, Stmt, VarDecl,
};
use swc_core::ecma::visit::{Visit, VisitWith};
use tracing::debug;

use crate::ast::comments::Comments;
use crate::ast::js_ast::JsAst;
use crate::ast::utils::{is_ident, is_ident_expr, unparen_once};
use crate::stage::Stage;
use crate::symbols::SymbolResolver;

const EXPORT_VAR_SETTER: &str = r"(?:export )?(?:var|const)\s+(?:\S+)\s*=\s*";
const MULTI_LINE_COMMENT: &str = r"\s*(?:/\*[\s\S]*?\*/)?\s*";
const NEW_LINE: &str = r"\s*\r?\n\s*";

lazy_static! {
    static ref DOWNLEVELED_CLASS_REGEXES: [Regex; 2] = [
        // var Foo = (function () {
        //     function Foo() {
        Regex::new(&format!(
            r"(?m)^{EXPORT_VAR_SETTER}{MULTI_LINE_COMMENT}\({MULTI_LINE_COMMENT}\s*function \(\) \{{{NEW_LINE}{MULTI_LINE_COMMENT}function (?:\S+)\([^\)]*\) \{{{NEW_LINE}"
        ))
        .unwrap(),
        // var Foo = (function (_super) {
        //     __extends(Foo, _super);
        Regex::new(&format!(
            r"(?m)^{EXPORT_VAR_SETTER}{MULTI_LINE_COMMENT}\({MULTI_LINE_COMMENT}\s*function \(_super\) \{{{NEW_LINE}\S*\.?__extends\(\S+, _super\);"
        ))
        .unwrap(),
    ];
}

/// Marks ES5 class IIFEs as pure so minifiers can drop unused classes.
pub struct ClassDowncastMatcher;

impl Stage for ClassDowncastMatcher {
    fn name(&self) -> &'static str {
        "class-downcast"
    }

    fn test(&self, content: &str) -> bool {
        DOWNLEVELED_CLASS_REGEXES
            .iter()
            .any(|regex| regex.is_match(content))
    }

    fn run(&self, ast: &mut JsAst, _symbols: Option<&dyn SymbolResolver>) -> Result<bool> {
        let mut marker = DownleveledClassMarker {
            comments: &ast.comments,
            marked: 0,
        };
        ast.ast.visit_with(&mut marker);
        debug!("{}: marked {} classes", self.name(), marker.marked);
        Ok(marker.marked > 0)
    }
}

struct DownleveledClassMarker<'a> {
    comments: &'a Comments,
    marked: usize,
}

impl Visit for DownleveledClassMarker<'_> {
    fn visit_var_decl(&mut self, n: &VarDecl) {
        if let Some(init) = downleveled_class_initializer(n) {
            if self.comments.add_pure(init.span_lo()) {
                self.marked += 1;
            }
        }
        n.visit_children_with(self);
    }
}

/// The initializer of `var X = (function () { function X() {} ... return X; }())`
/// or of its `_super` variant, when the declaration has that shape.
fn downleveled_class_initializer(var: &VarDecl) -> Option<&Expr> {
    let [decl] = var.decls.as_slice() else {
        return None;
    };
    if !matches!(decl.name, Pat::Ident(_)) {
        return None;
    }
    let init = decl.init.as_deref()?;
    let Expr::Call(call) = unparen_once(init) else {
        return None;
    };
    if call.args.len() > 1 {
        return None;
    }
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let (params, body): (Vec<&Pat>, &BlockStmt) = match unparen_once(callee) {
        Expr::Fn(FnExpr { function, .. }) => (
            function.params.iter().map(|param| &param.pat).collect(),
            function.body.as_ref()?,
        ),
        Expr::Arrow(ArrowExpr { params, body, .. }) => match &**body {
            BlockStmtOrExpr::BlockStmt(body) => (params.iter().collect(), body),
            _ => return None,
        },
        _ => return None,
    };
    let stmts = &body.stmts;
    if stmts.len() < 2 {
        return None;
    }
    let returned = returned_class(stmts)?;

    let matched = match params.as_slice() {
        [] => is_class_declaration(&stmts[0], returned),
        [Pat::Ident(param)] if is_ident(&param.id, "_super") => {
            stmts.len() >= 3
                && is_extends_call(&stmts[0])
                && matches!(&stmts[1], Stmt::Decl(Decl::Fn(f)) if f.ident.sym == returned.sym)
        }
        _ => false,
    };
    matched.then_some(init)
}

/// The identifier returned by the last `return` after the first statement.
fn returned_class(stmts: &[Stmt]) -> Option<&Ident> {
    let ret = stmts.iter().skip(1).rev().find_map(|stmt| match stmt {
        Stmt::Return(ret) => Some(ret),
        _ => None,
    })?;
    match ret.arg.as_deref() {
        Some(Expr::Ident(ident)) => Some(ident),
        _ => None,
    }
}

fn is_class_declaration(stmt: &Stmt, returned: &Ident) -> bool {
    match stmt {
        Stmt::Decl(Decl::Fn(f)) => f.ident.sym == returned.sym,
        Stmt::Decl(Decl::Class(c)) => c.ident.sym == returned.sym,
        _ => false,
    }
}

/// `__extends(Foo, _super);` or `tslib.__extends(Foo, _super);`
fn is_extends_call(stmt: &Stmt) -> bool {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return false;
    };
    let Expr::Call(call) = &**expr else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let name = match &**callee {
        Expr::Ident(ident) => &*ident.sym,
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => &*prop.sym,
            _ => return false,
        },
        _ => return false,
    };
    name.ends_with("__extends")
        && call
            .args
            .last()
            .is_some_and(|arg| arg.spread.is_none() && is_ident_expr(&arg.expr, "_super"))
}
