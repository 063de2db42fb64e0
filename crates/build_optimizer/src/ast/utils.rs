use swc_core::common::DUMMY_SP;
use swc_core::ecma::ast::{
    AssignExpr, AssignOp, AssignTarget, CallExpr, Callee, Expr, ExprOrSpread, ExprStmt, Ident,
    IdentName, Lit, MemberExpr, MemberProp, ObjectLit, ReturnStmt, SimpleAssignTarget, Stmt,
};

/// Strips every layer of parentheses.
pub fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

pub fn unparen_once(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => &paren.expr,
        _ => expr,
    }
}

pub fn is_ident(ident: &Ident, sym: &str) -> bool {
    ident.sym == *sym
}

pub fn is_ident_expr(expr: &Expr, sym: &str) -> bool {
    matches!(expr, Expr::Ident(ident) if is_ident(ident, sym))
}

pub fn get_call_expr_ident(call_expr: &CallExpr) -> Option<&Ident> {
    match &call_expr.callee {
        Callee::Expr(callee) => match &**callee {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        },
        _ => None,
    }
}

/// `obj.prop` with a plain identifier property.
pub fn member_prop_name(member: &MemberExpr) -> Option<&str> {
    match &member.prop {
        MemberProp::Ident(IdentName { sym, .. }) => Some(&**sym),
        _ => None,
    }
}

pub fn assign_target_ident(target: &AssignTarget) -> Option<&Ident> {
    match target {
        AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => Some(&binding.id),
        _ => None,
    }
}

pub fn assign_target_member(target: &AssignTarget) -> Option<&MemberExpr> {
    match target {
        AssignTarget::Simple(SimpleAssignTarget::Member(member)) => Some(member),
        _ => None,
    }
}

/// The `left = right` pair of an expression statement doing a plain assignment.
pub fn stmt_assignment(stmt: &Stmt) -> Option<(&AssignTarget, &Expr)> {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return None;
    };
    match &**expr {
        Expr::Assign(AssignExpr {
            op: AssignOp::Assign,
            left,
            right,
            ..
        }) => Some((left, right)),
        _ => None,
    }
}

pub fn first_str_arg(call_expr: &CallExpr) -> Option<&str> {
    call_expr.args.first().and_then(|arg| match &*arg.expr {
        Expr::Lit(Lit::Str(str_)) => Some(&*str_.value),
        _ => None,
    })
}

pub fn id(s: &str) -> Ident {
    Ident {
        ctxt: Default::default(),
        span: DUMMY_SP,
        sym: s.into(),
        optional: false,
    }
}

pub fn empty_object() -> Expr {
    Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props: vec![],
    })
}

pub fn expr_arg(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: None,
        expr: Box::new(expr),
    }
}

pub fn return_ident(ident: Ident) -> Stmt {
    Stmt::Return(ReturnStmt {
        span: DUMMY_SP,
        arg: Some(Box::new(Expr::Ident(ident))),
    })
}

#[cfg(test)]
mod tests {
    use swc_core::ecma::ast::{Expr, ModuleItem, Stmt};

    use super::*;
    use crate::ast::js_ast::JsAst;

    fn first_stmt(code: &str) -> Stmt {
        let ast = JsAst::new(code, "test.js").unwrap();
        match ast.ast.body.into_iter().next() {
            Some(ModuleItem::Stmt(stmt)) => stmt,
            _ => panic!("expected a statement"),
        }
    }

    fn first_expr(code: &str) -> Expr {
        match first_stmt(code) {
            Stmt::Expr(expr_stmt) => *expr_stmt.expr,
            _ => panic!("expected an expression statement"),
        }
    }

    #[test]
    fn test_unparen() {
        let expr = first_expr("((a));");
        assert!(is_ident_expr(unparen(&expr), "a"));
        assert!(matches!(unparen_once(&expr), Expr::Paren(_)));
    }

    #[test]
    fn test_stmt_assignment() {
        let stmt = first_stmt("Foo.decorators = [];");
        let (left, right) = stmt_assignment(&stmt).unwrap();
        let member = assign_target_member(left).unwrap();
        assert_eq!(member_prop_name(member), Some("decorators"));
        assert!(matches!(right, Expr::Array(_)));
        assert!(stmt_assignment(&first_stmt("Foo.count += 1;")).is_none());
    }

    #[test]
    fn test_first_str_arg() {
        let expr = first_expr("__metadata('design:paramtypes', []);");
        let Expr::Call(call) = expr else {
            panic!("expected a call");
        };
        assert_eq!(first_str_arg(&call), Some("design:paramtypes"));
        assert_eq!(get_call_expr_ident(&call).map(|i| &*i.sym), Some("__metadata"));
    }
}
