use std::mem;

use anyhow::{anyhow, Result};
use swc_core::common::{Span, Spanned, DUMMY_SP};
use swc_core::ecma::ast::{
    AssignExpr, AssignOp, AssignTarget, BinExpr, BinaryOp, BlockStmt, CallExpr, Callee,
    ComputedPropName, Decl, ExportDecl, Expr, ExprStmt, FnExpr, Function, Lit, MemberExpr,
    MemberProp, ModuleDecl, ModuleItem, ParenExpr, Pat, SimpleAssignTarget, Stmt, UnaryExpr,
    UnaryOp, VarDecl, VarDeclKind, VarDeclarator,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::debug;

use crate::ast::comments::Comments;
use crate::ast::error::TransformError;
use crate::ast::js_ast::JsAst;
use crate::ast::utils::{
    assign_target_ident, assign_target_member, empty_object, expr_arg, is_ident_expr,
    member_prop_name, return_ident, stmt_assignment, unparen,
};
use crate::stage::Stage;
use crate::symbols::SymbolResolver;

/// Wraps TypeScript and tsickle enum declarations into pure IIFEs.
pub struct EnumRewriter;

impl Stage for EnumRewriter {
    fn name(&self) -> &'static str {
        "enum-rewriter"
    }

    fn run(&self, ast: &mut JsAst, _symbols: Option<&dyn SymbolResolver>) -> Result<bool> {
        let mut wrapper = EnumWrapper {
            comments: &ast.comments,
            rewritten: 0,
            error: None,
        };
        ast.ast.visit_mut_with(&mut wrapper);
        if let Some(error) = wrapper.error {
            return Err(error);
        }
        debug!("{}: rewrote {} enums", self.name(), wrapper.rewritten);
        Ok(wrapper.rewritten > 0)
    }
}

/// A variable statement lifted out of a statement list.
struct HostVar {
    var: Box<VarDecl>,
    /// Span of the `export` declaration, when the variable was exported.
    export: Option<Span>,
}

/// Statement lists of modules and of blocks share the same rewriting.
trait StatementItem: Sized {
    fn as_stmt(&self) -> Option<&Stmt>;
    fn as_var(&self) -> Option<(&VarDecl, bool)>;
    fn is_import(&self) -> bool;
    fn is_export_declaration(&self) -> bool;
    fn into_stmt(self) -> Option<Stmt>;
    fn into_host_var(self) -> Option<HostVar>;
    fn from_host_var(host: HostVar) -> Self;
}

impl StatementItem for Stmt {
    fn as_stmt(&self) -> Option<&Stmt> {
        Some(self)
    }

    fn as_var(&self) -> Option<(&VarDecl, bool)> {
        match self {
            Stmt::Decl(Decl::Var(var)) => Some((var, false)),
            _ => None,
        }
    }

    fn is_import(&self) -> bool {
        false
    }

    fn is_export_declaration(&self) -> bool {
        false
    }

    fn into_stmt(self) -> Option<Stmt> {
        Some(self)
    }

    fn into_host_var(self) -> Option<HostVar> {
        match self {
            Stmt::Decl(Decl::Var(var)) => Some(HostVar { var, export: None }),
            _ => None,
        }
    }

    fn from_host_var(host: HostVar) -> Self {
        Stmt::Decl(Decl::Var(host.var))
    }
}

impl StatementItem for ModuleItem {
    fn as_stmt(&self) -> Option<&Stmt> {
        match self {
            ModuleItem::Stmt(stmt) => Some(stmt),
            _ => None,
        }
    }

    fn as_var(&self) -> Option<(&VarDecl, bool)> {
        match self {
            ModuleItem::Stmt(stmt) => stmt.as_var(),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                decl: Decl::Var(var),
                ..
            })) => Some((var, true)),
            _ => None,
        }
    }

    fn is_import(&self) -> bool {
        matches!(self, ModuleItem::ModuleDecl(ModuleDecl::Import(_)))
    }

    fn is_export_declaration(&self) -> bool {
        matches!(
            self,
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(_) | ModuleDecl::ExportAll(_))
        )
    }

    fn into_stmt(self) -> Option<Stmt> {
        match self {
            ModuleItem::Stmt(stmt) => Some(stmt),
            _ => None,
        }
    }

    fn into_host_var(self) -> Option<HostVar> {
        match self {
            ModuleItem::Stmt(stmt) => stmt.into_host_var(),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                span,
                decl: Decl::Var(var),
            })) => Some(HostVar {
                var,
                export: Some(span),
            }),
            _ => None,
        }
    }

    fn from_host_var(host: HostVar) -> Self {
        match host.export {
            Some(span) => ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                span,
                decl: Decl::Var(host.var),
            })),
            None => ModuleItem::Stmt(Stmt::Decl(Decl::Var(host.var))),
        }
    }
}

#[derive(Debug)]
enum EnumShape {
    /// `var E; (function (E) { ... })(E || (E = {}));`
    Iife { export_target: Option<MemberExpr> },
    /// `var E = {...};` followed by member statements.
    Statements { export_consumed: bool },
}

#[derive(Debug)]
struct EnumMatch {
    start: usize,
    len: usize,
    shape: EnumShape,
}

struct EnumWrapper<'a> {
    comments: &'a Comments,
    rewritten: usize,
    error: Option<anyhow::Error>,
}

impl VisitMut for EnumWrapper<'_> {
    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        items.visit_mut_children_with(self);
        self.wrap_enums(items);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        self.wrap_enums(stmts);
    }
}

impl EnumWrapper<'_> {
    fn wrap_enums<T: StatementItem>(&mut self, items: &mut Vec<T>) {
        if self.error.is_some() {
            return;
        }
        let matches = find_enums(items);
        if matches.is_empty() {
            return;
        }

        let mut pending = matches.into_iter().peekable();
        let mut old_items = mem::take(items).into_iter().enumerate();
        while let Some((index, item)) = old_items.next() {
            let Some(found) = pending.next_if(|found| found.start == index) else {
                items.push(item);
                continue;
            };
            let rest = old_items
                .by_ref()
                .take(found.len - 1)
                .map(|(_, item)| item)
                .collect::<Vec<_>>();
            match self.rewrite(item, rest, found.shape) {
                Ok(rewritten) => {
                    self.rewritten += 1;
                    items.push(rewritten);
                }
                Err(error) => {
                    self.error = Some(error);
                    return;
                }
            }
        }
    }

    fn rewrite<T: StatementItem>(&self, host: T, rest: Vec<T>, shape: EnumShape) -> Result<T> {
        let host = host.into_host_var().ok_or_else(|| {
            anyhow!(TransformError::InvalidEnumDeclaration {
                message: "expected a variable statement".to_string()
            })
        })?;
        match shape {
            EnumShape::Iife { export_target } => {
                let iife = rest
                    .into_iter()
                    .next()
                    .and_then(T::into_stmt)
                    .ok_or_else(|| {
                        anyhow!(TransformError::InvalidEnumIife {
                            message: "missing IIFE statement".to_string()
                        })
                    })?;
                self.update_enum_iife(host, iife, export_target)
                    .map(T::from_host_var)
            }
            EnumShape::Statements { export_consumed } => {
                let statements = rest
                    .into_iter()
                    .skip(usize::from(export_consumed))
                    .map(|item| {
                        item.into_stmt().ok_or_else(|| {
                            anyhow!(TransformError::InvalidEnumDeclaration {
                                message: "expected an expression statement".to_string()
                            })
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.wrap_statements(host, statements, export_consumed)
                    .map(T::from_host_var)
            }
        }
    }

    /// Turns the IIFE into an initializer: `var E = /*@__PURE__*/ (function (E) { ...; return E; })({});`
    fn update_enum_iife(
        &self,
        mut host: HostVar,
        iife: Stmt,
        export_target: Option<MemberExpr>,
    ) -> Result<HostVar> {
        let invalid = |message: &str| {
            anyhow!(TransformError::InvalidEnumIife {
                message: message.to_string()
            })
        };
        let Stmt::Expr(ExprStmt { expr, .. }) = iife else {
            return Err(invalid("expected an expression statement"));
        };
        let Expr::Call(mut call) = *expr else {
            return Err(invalid("expected a call expression"));
        };
        {
            let Callee::Expr(callee) = &mut call.callee else {
                return Err(invalid("expected a callee expression"));
            };
            let Expr::Paren(ParenExpr { expr: callee, .. }) = &mut **callee else {
                return Err(invalid("expected a parenthesized callee"));
            };
            let Expr::Fn(FnExpr { function, .. }) = &mut **callee else {
                return Err(invalid("expected a function expression"));
            };
            let param = match function.params.first().map(|param| &param.pat) {
                Some(Pat::Ident(binding)) => binding.id.clone(),
                _ => return Err(invalid("expected an identifier parameter")),
            };
            let body = function
                .body
                .as_mut()
                .ok_or_else(|| invalid("expected a function body"))?;
            body.stmts.push(return_ident(param));
        }
        call.args = vec![expr_arg(empty_object())];
        self.comments.add_pure(call.span.lo);

        let pure_call = Box::new(Expr::Call(call));
        let value = match export_target {
            // E = exports.E = exports.E || /*@__PURE__*/ (function (E) { ... })({})
            Some(target) if host.export.is_none() => Expr::Assign(AssignExpr {
                span: DUMMY_SP,
                op: AssignOp::Assign,
                left: AssignTarget::Simple(SimpleAssignTarget::Member(target.clone())),
                right: Box::new(Expr::Bin(BinExpr {
                    span: DUMMY_SP,
                    op: BinaryOp::LogicalOr,
                    left: Box::new(Expr::Member(target)),
                    right: pure_call,
                })),
            }),
            _ => *pure_call,
        };
        let decl = host
            .var
            .decls
            .first_mut()
            .ok_or_else(|| invalid("expected a declarator"))?;
        decl.init = Some(Box::new(value));
        Ok(host)
    }

    /// `var E = /*@__PURE__*/ (function () { var E = <seed>; ...statements; return E; })();`
    fn wrap_statements(
        &self,
        mut host: HostVar,
        statements: Vec<Stmt>,
        export_consumed: bool,
    ) -> Result<HostVar> {
        let invalid = |message: &str| {
            anyhow!(TransformError::InvalidEnumDeclaration {
                message: message.to_string()
            })
        };
        let decl = host
            .var
            .decls
            .first_mut()
            .ok_or_else(|| invalid("expected a declarator"))?;
        let name = match &decl.name {
            Pat::Ident(binding) => binding.id.clone(),
            _ => return Err(invalid("expected an identifier")),
        };
        let seed = decl
            .init
            .take()
            .ok_or_else(|| invalid("expected an initializer"))?;
        let seed_span = seed.span();

        let mut stmts = Vec::with_capacity(statements.len() + 2);
        stmts.push(Stmt::Decl(Decl::Var(Box::new(VarDecl {
            span: DUMMY_SP,
            ctxt: Default::default(),
            kind: VarDeclKind::Var,
            declare: false,
            decls: vec![VarDeclarator {
                span: DUMMY_SP,
                name: Pat::Ident(name.clone().into()),
                init: Some(seed),
                definite: false,
            }],
        }))));
        stmts.extend(statements);
        stmts.push(return_ident(name));

        let call = CallExpr {
            span: seed_span,
            ctxt: Default::default(),
            callee: Callee::Expr(Box::new(Expr::Paren(ParenExpr {
                span: DUMMY_SP,
                expr: Box::new(Expr::Fn(FnExpr {
                    ident: None,
                    function: Box::new(Function {
                        params: vec![],
                        decorators: vec![],
                        span: DUMMY_SP,
                        ctxt: Default::default(),
                        body: Some(BlockStmt {
                            span: DUMMY_SP,
                            ctxt: Default::default(),
                            stmts,
                        }),
                        is_generator: false,
                        is_async: false,
                        type_params: None,
                        return_type: None,
                    }),
                })),
            }))),
            args: vec![],
            type_args: None,
        };
        self.comments.add_pure(seed_span.lo);
        decl.init = Some(Box::new(Expr::Call(call)));

        if export_consumed && host.export.is_none() {
            host.export = Some(DUMMY_SP);
        }
        Ok(host)
    }
}

fn find_enums<T: StatementItem>(items: &[T]) -> Vec<EnumMatch> {
    let mut matches = vec![];
    let mut index = 0;
    // an enum always spans at least two statements
    while index + 1 < items.len() {
        if items[index].is_import() {
            index += 1;
            continue;
        }
        match detect_enum(items, index) {
            Some(found) => {
                index += found.len;
                matches.push(found);
            }
            None => index += 1,
        }
    }
    matches
}

fn detect_enum<T: StatementItem>(items: &[T], index: usize) -> Option<EnumMatch> {
    let (var, _) = items[index].as_var()?;
    let [decl] = var.decls.as_slice() else {
        return None;
    };
    let Pat::Ident(binding) = &decl.name else {
        return None;
    };
    let name = &*binding.id.sym;

    let (len, shape) = match decl.init.as_deref() {
        None => {
            let export_target = enum_iife(name, items.get(index + 1)?.as_stmt()?)?;
            (2, EnumShape::Iife { export_target })
        }
        Some(Expr::Object(seed)) if seed.props.is_empty() => {
            let count = tsickle_enum_statements(name, items, index + 1)?;
            (
                1 + count,
                EnumShape::Statements {
                    export_consumed: false,
                },
            )
        }
        Some(Expr::Object(seed)) => {
            let mut offset = index + 1;
            let export_consumed = items
                .get(offset)
                .is_some_and(|item| item.is_export_declaration());
            if export_consumed {
                offset += 1;
            }
            let count = enum_name_statements(name, items, offset, None);
            if count != seed.props.len() {
                return None;
            }
            (
                1 + usize::from(export_consumed) + count,
                EnumShape::Statements { export_consumed },
            )
        }
        _ => return None,
    };

    // already the body of a wrapped enum
    let end = index + len;
    if matches!(shape, EnumShape::Statements { .. })
        && index == 0
        && end + 1 == items.len()
        && returns_ident(&items[end], name)
    {
        return None;
    }

    Some(EnumMatch {
        start: index,
        len,
        shape,
    })
}

fn returns_ident<T: StatementItem>(item: &T, name: &str) -> bool {
    matches!(
        item.as_stmt(),
        Some(Stmt::Return(ret)) if ret.arg.as_deref().is_some_and(|arg| is_ident_expr(arg, name))
    )
}

/// Matches `(function (E) { E[E["A"] = 0] = "A"; })(<arg>)` and returns the
/// export target found in the argument, if any.
fn enum_iife(name: &str, stmt: &Stmt) -> Option<Option<MemberExpr>> {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return None;
    };
    let Expr::Call(call) = &**expr else {
        return None;
    };
    let [arg] = call.args.as_slice() else {
        return None;
    };
    if arg.spread.is_some() {
        return None;
    }
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Paren(ParenExpr { expr: callee, .. }) = &**callee else {
        return None;
    };
    let Expr::Fn(FnExpr { function, .. }) = &**callee else {
        return None;
    };
    let [param] = function.params.as_slice() else {
        return None;
    };
    let Pat::Ident(param) = &param.pat else {
        return None;
    };
    if param.id.sym != *name {
        return None;
    }
    let body = function.body.as_ref()?;

    let export_target = enum_iife_argument(name, &arg.expr)?;
    let members_only = !body.stmts.is_empty()
        && body
            .stmts
            .iter()
            .all(|stmt| is_enum_dual_statement(stmt, name));
    members_only.then_some(export_target)
}

/// `E || (E = {})`, `E = E || (E = {})` or `E = exports.E || (exports.E = {})`.
fn enum_iife_argument(name: &str, expr: &Expr) -> Option<Option<MemberExpr>> {
    match expr {
        Expr::Bin(BinExpr {
            op: BinaryOp::LogicalOr,
            left,
            right,
            ..
        }) => (is_ident_expr(left, name)
            && empty_object_assignment(right)
                .and_then(assign_target_ident)
                .is_some_and(|target| target.sym == *name))
        .then_some(None),
        Expr::Assign(AssignExpr {
            op: AssignOp::Assign,
            left,
            right,
            ..
        }) => {
            if !assign_target_ident(left).is_some_and(|target| target.sym == *name) {
                return None;
            }
            let Expr::Bin(BinExpr {
                op: BinaryOp::LogicalOr,
                left: guard,
                right: fallback,
                ..
            }) = &**right
            else {
                return None;
            };
            let fallback = empty_object_assignment(fallback)?;
            match &**guard {
                Expr::Member(target)
                    if assign_target_member(fallback)
                        .is_some_and(|fallback| same_member(fallback, target)) =>
                {
                    Some(Some(target.clone()))
                }
                guard
                    if is_ident_expr(guard, name)
                        && assign_target_ident(fallback)
                            .is_some_and(|fallback| fallback.sym == *name) =>
                {
                    Some(None)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// The target of `(<target> = {})`.
fn empty_object_assignment(expr: &Expr) -> Option<&AssignTarget> {
    match unparen(expr) {
        Expr::Assign(AssignExpr {
            op: AssignOp::Assign,
            left,
            right,
            ..
        }) if matches!(&**right, Expr::Object(object) if object.props.is_empty()) => Some(left),
        _ => None,
    }
}

/// Both sides name the same `obj.prop`.
fn same_member(a: &MemberExpr, b: &MemberExpr) -> bool {
    match (&*a.obj, &*b.obj) {
        (Expr::Ident(a_obj), Expr::Ident(b_obj)) => {
            a_obj.sym == b_obj.sym
                && member_key(a).is_some()
                && member_key(a) == member_key(b)
        }
        _ => false,
    }
}

/// The statements after an empty `var E = {};` seed, in either tsickle layout.
fn tsickle_enum_statements<T: StatementItem>(
    name: &str,
    items: &[T],
    offset: usize,
) -> Option<usize> {
    let keys = items
        .iter()
        .skip(offset)
        .map_while(|item| item.as_stmt().and_then(|stmt| enum_value_statement(stmt, name)))
        .collect::<Vec<_>>();
    if !keys.is_empty() {
        // E.A = 0; E.B = 1; E[E.A] = "A"; E[E.B] = "B";
        let count = enum_name_statements(name, items, offset + keys.len(), Some(keys.as_slice()));
        return (count == keys.len()).then_some(keys.len() + count);
    }
    // E[E.A = 0] = "A"; E[E.B = 1] = "B";
    let count = items
        .iter()
        .skip(offset)
        .take_while(|item| {
            item.as_stmt()
                .is_some_and(|stmt| is_enum_dual_statement(stmt, name))
        })
        .count();
    (count > 0).then_some(count)
}

/// Counts consecutive `E[E.Key] = "Key";` statements starting at `offset`.
fn enum_name_statements<T: StatementItem>(
    name: &str,
    items: &[T],
    offset: usize,
    keys: Option<&[&str]>,
) -> usize {
    items
        .iter()
        .skip(offset)
        .take_while(|item| {
            item.as_stmt()
                .and_then(|stmt| enum_name_statement(stmt, name))
                .is_some_and(|key| keys.map_or(true, |keys| keys.contains(&key)))
        })
        .count()
}

/// `E.Key = <value>;`, giving back `Key`.
fn enum_value_statement<'a>(stmt: &'a Stmt, name: &str) -> Option<&'a str> {
    let (left, _) = stmt_assignment(stmt)?;
    let member = assign_target_member(left)?;
    if !is_ident_expr(&member.obj, name) {
        return None;
    }
    member_prop_name(member)
}

/// `E[E.Key] = "Key";`, giving back `Key`.
fn enum_name_statement<'a>(stmt: &'a Stmt, name: &str) -> Option<&'a str> {
    let (left, right) = stmt_assignment(stmt)?;
    let Expr::Lit(Lit::Str(value)) = right else {
        return None;
    };
    let inner = computed_member_of(left, name)?;
    let Expr::Member(inner) = inner else {
        return None;
    };
    if !is_ident_expr(&inner.obj, name) {
        return None;
    }
    let key = member_prop_name(inner)?;
    (key == &*value.value).then_some(key)
}

/// `E[E.Key = <value>] = "Key";` or `E[E["Key"] = <value>] = "Key";` with a
/// literal value.
fn is_enum_dual_statement(stmt: &Stmt, name: &str) -> bool {
    let Some((left, right)) = stmt_assignment(stmt) else {
        return false;
    };
    let Expr::Lit(Lit::Str(label)) = right else {
        return false;
    };
    let Some(Expr::Assign(AssignExpr {
        op: AssignOp::Assign,
        left: inner,
        right: value,
        ..
    })) = computed_member_of(left, name)
    else {
        return false;
    };
    is_enum_value(value)
        && assign_target_member(inner).is_some_and(|inner| {
            is_ident_expr(&inner.obj, name) && member_key(inner) == Some(&*label.value)
        })
}

fn is_enum_value(expr: &Expr) -> bool {
    match unparen(expr) {
        Expr::Lit(Lit::Num(_) | Lit::Str(_)) => true,
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Minus,
            arg,
            ..
        }) => matches!(&**arg, Expr::Lit(Lit::Num(_))),
        _ => false,
    }
}

/// `E.Key` or `E["Key"]`, giving back `Key`.
fn member_key(member: &MemberExpr) -> Option<&str> {
    match &member.prop {
        MemberProp::Computed(ComputedPropName { expr, .. }) => match &**expr {
            Expr::Lit(Lit::Str(key)) => Some(&*key.value),
            _ => None,
        },
        _ => member_prop_name(member),
    }
}

/// The computed key of `E[<key>]` on the left of an assignment.
fn computed_member_of<'a>(left: &'a AssignTarget, name: &str) -> Option<&'a Expr> {
    let member = assign_target_member(left)?;
    if !is_ident_expr(&member.obj, name) {
        return None;
    }
    match &member.prop {
        MemberProp::Computed(ComputedPropName { expr, .. }) => Some(expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::tests::{squash, TestUtils};

    fn run(code: &str) -> (bool, String) {
        let mut test_utils = TestUtils::gen_js_ast(code);
        let changed = test_utils.run(&EnumRewriter);
        (changed, squash(&test_utils.js_ast_to_code()))
    }

    #[test]
    fn test_typescript_enum() {
        let (changed, code) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "A";
    E[E["B"] = 1] = "B";
})(E || (E = {}));
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"varE=/*@__PURE__*/(function(E){E[E["A"]=0]="A";E[E["B"]=1]="B";returnE;})({});"#
        );
    }

    #[test]
    fn test_typescript_enum_with_export_target() {
        let (changed, code) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E = exports.E || (exports.E = {}));
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"varE=exports.E=exports.E||/*@__PURE__*/(function(E){E[E["A"]=0]="A";returnE;})({});"#
        );
    }

    #[test]
    fn test_exported_typescript_enum() {
        let (changed, code) = run(
            r#"
export var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E || (E = {}));
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"exportvarE=/*@__PURE__*/(function(E){E[E["A"]=0]="A";returnE;})({});"#
        );
    }

    #[test]
    fn test_tsickle_enum_with_value_and_name_statements() {
        let (changed, code) = run(
            r#"
var Kind = {};
Kind.A = 0;
Kind.B = 1;
Kind[Kind.A] = "A";
Kind[Kind.B] = "B";
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"varKind=/*@__PURE__*/(function(){varKind={};Kind.A=0;Kind.B=1;Kind[Kind.A]="A";Kind[Kind.B]="B";returnKind;})();"#
        );
    }

    #[test]
    fn test_tsickle_enum_with_dual_statements() {
        let (changed, code) = run(
            r#"
var Direction = {};
Direction[Direction.Up = 0] = "Up";
Direction[Direction.Down = 1] = "Down";
foo(Direction);
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"varDirection=/*@__PURE__*/(function(){varDirection={};Direction[Direction.Up=0]="Up";Direction[Direction.Down=1]="Down";returnDirection;})();foo(Direction);"#
        );
    }

    #[test]
    fn test_seeded_enum_consumes_export() {
        let (changed, code) = run(
            r#"
var Color = { Red: 0, Green: 1 };
export { Color };
Color[Color.Red] = "Red";
Color[Color.Green] = "Green";
"#,
        );
        assert!(changed);
        assert_eq!(
            code,
            r#"exportvarColor=/*@__PURE__*/(function(){varColor={Red:0,Green:1};Color[Color.Red]="Red";Color[Color.Green]="Green";returnColor;})();"#
        );
    }

    #[test]
    fn test_mismatched_statements_are_untouched() {
        let (changed, _) = run(
            r#"
var Color = { Red: 0, Green: 1 };
Color[Color.Red] = "Red";
"#,
        );
        assert!(!changed);
        let (changed, _) = run(
            r#"
var K = {};
K.A = 0;
K[K.B] = "B";
"#,
        );
        assert!(!changed);
        let (changed, _) = run(
            r#"
var E;
(function (E) {
    E.foo = bar();
})(E || (E = {}));
"#,
        );
        assert!(!changed);
    }

    #[test]
    fn test_side_effecting_iife_body_is_untouched() {
        let (changed, code) = run(
            r#"
var E;
(function (E) {
    E[launch()] = fire();
})(E || (E = {}));
"#,
        );
        assert!(!changed);
        assert!(!code.contains("@__PURE__"));

        let (changed, _) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "B";
})(E || (E = {}));
"#,
        );
        assert!(!changed);

        let (changed, _) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = fire()] = "A";
})(E || (E = {}));
"#,
        );
        assert!(!changed);
    }

    #[test]
    fn test_iife_parameter_must_name_the_enum() {
        let (changed, code) = run(
            r#"
var E;
(function (X) {
    X[X["A"] = 0] = "A";
})(E || (E = {}));
"#,
        );
        assert!(!changed);
        assert!(!code.contains("@__PURE__"));
    }

    #[test]
    fn test_iife_fallback_must_assign_the_enum() {
        let (changed, code) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E || (F = {}));
"#,
        );
        assert!(!changed);
        assert!(code.contains("F={}"));

        let (changed, _) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E = exports.E || (exports.F = {}));
"#,
        );
        assert!(!changed);

        let (changed, _) = run(
            r#"
var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(F = exports.E || (exports.E = {}));
"#,
        );
        assert!(!changed);
    }

    #[test]
    fn test_negative_enum_values() {
        let (changed, code) = run(
            r#"
var E;
(function (E) {
    E[E["Low"] = -1] = "Low";
    E[E.High = 1] = "High";
})(E || (E = {}));
"#,
        );
        assert!(changed);
        assert!(code.starts_with("varE=/*@__PURE__*/(function(E){"));
    }

    #[test]
    fn test_nested_enum_is_wrapped() {
        let (changed, code) = run(
            r#"
function scope() {
    var E;
    (function (E) {
        E[E["A"] = 0] = "A";
    })(E || (E = {}));
    return E;
}
"#,
        );
        assert!(changed);
        assert!(code.contains(r#"varE=/*@__PURE__*/(function(E){E[E["A"]=0]="A";returnE;})({});returnE;"#));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut test_utils = TestUtils::gen_js_ast(
            r#"
var Direction = {};
Direction[Direction.Up = 0] = "Up";
var E;
(function (E) {
    E[E["A"] = 0] = "A";
})(E || (E = {}));
"#,
        );
        assert!(test_utils.run(&EnumRewriter));
        let first = test_utils.js_ast_to_code();

        let mut again = TestUtils::gen_js_ast(&first);
        assert!(!again.run(&EnumRewriter));
        assert_eq!(squash(&again.js_ast_to_code()), squash(&first));
        assert_eq!(first.matches("@__PURE__").count(), 2);
    }
}
