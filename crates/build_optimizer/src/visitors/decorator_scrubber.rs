use std::collections::HashSet;

use anyhow::{anyhow, Result};
use swc_core::ecma::ast::{
    ArrayLit, AssignExpr, AssignOp, AssignTarget, BinExpr, BinaryOp, BlockStmt, BlockStmtOrExpr,
    CallExpr, Callee, Decl, Expr, ExprOrSpread, ExprStmt, Ident, ImportDecl, ImportSpecifier,
    KeyValueProp, Lit, MemberExpr, MemberProp, Module, ModuleDecl, ModuleExportName, ModuleItem,
    ObjectLit, Pat, Prop, PropName, PropOrSpread, SimpleAssignTarget, Stmt, VarDecl,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::debug;

use crate::ast::error::TransformError;
use crate::ast::js_ast::JsAst;
use crate::ast::utils::{
    assign_target_ident, first_str_arg, get_call_expr_ident, member_prop_name, unparen,
};
use crate::config::FrameworkVocabulary;
use crate::stage::Stage;
use crate::symbols::{DeclId, SymbolResolver};

/// Removes framework decorator metadata that is only needed by the JIT compiler.
pub struct DecoratorScrubber {
    vocabulary: FrameworkVocabulary,
    is_core_file: bool,
}

impl DecoratorScrubber {
    pub fn new(vocabulary: FrameworkVocabulary, is_core_file: bool) -> Self {
        Self {
            vocabulary,
            is_core_file,
        }
    }

    fn is_framework_module(&self, src: &str) -> bool {
        src == self.vocabulary.framework_module || (self.is_core_file && src.starts_with('.'))
    }

    /// Declarations of the framework's decorator functions visible in this module.
    fn framework_declarations(
        &self,
        module: &Module,
        symbols: &dyn SymbolResolver,
    ) -> HashSet<DeclId> {
        let mut declarations = HashSet::new();
        for import in top_level_imports(module) {
            if !self.is_framework_module(&import.src.value) {
                continue;
            }
            for specifier in &import.specifiers {
                let ImportSpecifier::Named(named) = specifier else {
                    continue;
                };
                let imported = match &named.imported {
                    Some(ModuleExportName::Ident(ident)) => &*ident.sym,
                    Some(ModuleExportName::Str(str_)) => &*str_.value,
                    None => &*named.local.sym,
                };
                if self.vocabulary.is_decorator(imported) {
                    declarations.extend(symbols.resolve_declaration(&named.local));
                }
            }
        }

        // the core package declares the decorators itself
        if self.is_core_file {
            let locals = top_level_vars(module)
                .filter(|ident| self.vocabulary.is_decorator(&ident.sym))
                .collect::<Vec<_>>();
            let names = locals
                .iter()
                .map(|ident| &*ident.sym)
                .collect::<HashSet<_>>();
            if names.len() == self.vocabulary.decorators.len() {
                for ident in locals {
                    declarations.extend(symbols.resolve_declaration(ident));
                }
            }
        }
        declarations
    }

    /// Namespace imports of the helper module, e.g. `import * as tslib_1 from 'tslib'`.
    fn helper_namespaces(&self, module: &Module, symbols: &dyn SymbolResolver) -> HashSet<DeclId> {
        top_level_imports(module)
            .filter(|import| import.src.value == *self.vocabulary.helper_module)
            .flat_map(|import| import.specifiers.iter())
            .filter_map(|specifier| match specifier {
                ImportSpecifier::Namespace(namespace) => {
                    Some(symbols.resolve_declaration(&namespace.local))
                }
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl Stage for DecoratorScrubber {
    fn name(&self) -> &'static str {
        "decorator-scrubber"
    }

    fn test(&self, content: &str) -> bool {
        self.vocabulary
            .scrub_markers()
            .iter()
            .any(|marker| content.contains(marker))
    }

    fn requires_symbols(&self) -> bool {
        true
    }

    fn run(&self, ast: &mut JsAst, symbols: Option<&dyn SymbolResolver>) -> Result<bool> {
        let symbols = symbols.ok_or_else(|| {
            anyhow!(TransformError::MissingSymbols { stage: self.name() })
        })?;
        let framework = self.framework_declarations(&ast.ast, symbols);
        let helper_namespaces = self.helper_namespaces(&ast.ast, symbols);
        let mut scrubber = MetadataScrubber {
            vocabulary: &self.vocabulary,
            symbols,
            framework,
            helper_namespaces,
            removed: 0,
        };
        ast.ast.visit_mut_with(&mut scrubber);
        debug!("{}: removed {} nodes", self.name(), scrubber.removed);
        Ok(scrubber.removed > 0)
    }
}

fn top_level_imports(module: &Module) -> impl Iterator<Item = &ImportDecl> {
    module.body.iter().filter_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(import),
        _ => None,
    })
}

fn top_level_vars(module: &Module) -> impl Iterator<Item = &Ident> {
    module
        .body
        .iter()
        .filter_map(|item| match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => Some(&**var),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => match &export.decl {
                Decl::Var(var) => Some(&**var),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|var: &VarDecl| var.decls.iter())
        .filter_map(|decl| match &decl.name {
            Pat::Ident(binding) => Some(&binding.id),
            _ => None,
        })
}

/// What to do with a metadata statement.
#[derive(Debug, PartialEq, Eq)]
enum Scrub {
    Keep,
    /// Some elements were removed in place.
    Trimmed,
    Remove,
}

struct MetadataScrubber<'a> {
    vocabulary: &'a FrameworkVocabulary,
    symbols: &'a dyn SymbolResolver,
    framework: HashSet<DeclId>,
    helper_namespaces: HashSet<DeclId>,
    removed: usize,
}

impl VisitMut for MetadataScrubber<'_> {
    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        items.visit_mut_children_with(self);
        items.retain_mut(|item| match item {
            ModuleItem::Stmt(stmt) => !self.scrub_statement(stmt),
            _ => true,
        });
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        stmts.retain_mut(|stmt| !self.scrub_statement(stmt));
    }
}

impl MetadataScrubber<'_> {
    /// Returns true when the whole statement has to go.
    fn scrub_statement(&mut self, stmt: &mut Stmt) -> bool {
        let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
            return false;
        };
        match self.scrub_expression(expr) {
            Scrub::Remove => {
                self.removed += 1;
                true
            }
            Scrub::Trimmed | Scrub::Keep => false,
        }
    }

    fn scrub_expression(&mut self, expr: &mut Expr) -> Scrub {
        // Foo.ctorParameters = function () { return [...]; };
        if let Some((class, value)) = member_assignment(expr, "ctorParameters") {
            if !matches!(unparen(value), Expr::Fn(_) | Expr::Arrow(_)) {
                return Scrub::Keep;
            }
            return if self.vocabulary.is_whitelisted_service(&class.sym) {
                Scrub::Keep
            } else {
                Scrub::Remove
            };
        }
        // (function () { ɵsetClassMetadata(Foo, [...], null, null); })();
        if self.is_class_metadata_iife(expr) {
            return Scrub::Remove;
        }
        // Foo.decorators = [{ type: Component, args: [...] }];
        if let Some((_, value)) = member_assignment(expr, "decorators") {
            return match value {
                Expr::Array(array) => self.scrub_decorator_array(array),
                _ => Scrub::Keep,
            };
        }
        // Foo = __decorate([Component({...})], Foo);
        if let Some((class, call)) = self.decorate_assignment(expr) {
            let class = class.sym.to_string();
            return self.scrub_decorate_call(call, Some(&class), false);
        }
        // __decorate([Input(), __metadata("design:type", Object)], Foo.prototype, "bar", void 0);
        if let Some(call) = self.property_decorate_call(expr) {
            let class = decorate_target_class(call).map(|class| class.to_string());
            return self.scrub_decorate_call(call, class.as_deref(), true);
        }
        // Foo.propDecorators = { bar: [{ type: Input }] };
        if let Some((_, value)) = member_assignment(expr, "propDecorators") {
            return match value {
                Expr::Object(object) => self.scrub_prop_decorators(object),
                _ => Scrub::Keep,
            };
        }
        Scrub::Keep
    }

    fn scrub_decorator_array(&mut self, array: &mut ArrayLit) -> Scrub {
        let Some(indices) = self.framework_decorator_indices(array) else {
            return Scrub::Keep;
        };
        self.remove_elements(&mut array.elems, &indices)
    }

    fn scrub_prop_decorators(&mut self, object: &mut ObjectLit) -> Scrub {
        let all_decorator_lists = object.props.iter().all(|prop| {
            matches!(
                prop,
                PropOrSpread::Prop(prop) if matches!(
                    &**prop,
                    Prop::KeyValue(KeyValueProp { value, .. }) if matches!(&**value, Expr::Array(_))
                )
            )
        });
        if !all_decorator_lists {
            return Scrub::Keep;
        }

        let mut whole_props = vec![];
        let mut trimmed = false;
        for (index, prop) in object.props.iter_mut().enumerate() {
            let Some(array) = prop_decorator_list(prop) else {
                continue;
            };
            let Some(indices) = self.framework_decorator_indices(array) else {
                continue;
            };
            if indices.len() == array.elems.len() {
                whole_props.push(index);
            } else if !indices.is_empty() {
                remove_indices(&mut array.elems, &indices);
                self.removed += indices.len();
                trimmed = true;
            }
        }

        if !trimmed && whole_props.len() == object.props.len() {
            return Scrub::Remove;
        }
        if whole_props.is_empty() {
            return if trimmed { Scrub::Trimmed } else { Scrub::Keep };
        }
        remove_indices(&mut object.props, &whole_props);
        self.removed += whole_props.len();
        Scrub::Trimmed
    }

    fn scrub_decorate_call(
        &mut self,
        call: &mut CallExpr,
        class: Option<&str>,
        property_level: bool,
    ) -> Scrub {
        let Some(ExprOrSpread { expr, .. }) = call.args.first_mut() else {
            return Scrub::Keep;
        };
        let Expr::Array(array) = &mut **expr else {
            return Scrub::Keep;
        };
        let whitelisted = class.is_some_and(|class| self.vocabulary.is_whitelisted_service(class));

        let mut framework = vec![];
        let mut constructor_metadata = vec![];
        let mut other_metadata = 0;
        for (index, elem) in array.elems.iter().enumerate() {
            let Some(ExprOrSpread { spread: None, expr }) = elem else {
                return Scrub::Keep;
            };
            let Expr::Call(call) = &**expr else {
                return Scrub::Keep;
            };
            if self.is_framework_decorator_call(call) {
                framework.push(index);
            } else if !whitelisted
                && (self.is_metadata_call(call, Some("design:paramtypes")) || self.is_param_call(call))
            {
                constructor_metadata.push(index);
            } else if property_level && self.is_metadata_call(call, None) {
                other_metadata += 1;
            }
        }
        if framework.is_empty() {
            return Scrub::Keep;
        }
        if framework.len() + constructor_metadata.len() + other_metadata == array.elems.len() {
            return Scrub::Remove;
        }
        let mut indices = framework;
        indices.extend(constructor_metadata);
        remove_indices(&mut array.elems, &indices);
        self.removed += indices.len();
        Scrub::Trimmed
    }

    fn remove_elements<T>(&mut self, elems: &mut Vec<T>, indices: &[usize]) -> Scrub {
        if indices.len() == elems.len() {
            Scrub::Remove
        } else if indices.is_empty() {
            Scrub::Keep
        } else {
            remove_indices(elems, indices);
            self.removed += indices.len();
            Scrub::Trimmed
        }
    }

    /// Indices of `{ type: Decorator }` entries, or None if some entry is not an object literal.
    fn framework_decorator_indices(&self, array: &ArrayLit) -> Option<Vec<usize>> {
        let mut indices = vec![];
        for (index, elem) in array.elems.iter().enumerate() {
            let Some(ExprOrSpread { spread: None, expr }) = elem else {
                return None;
            };
            let Expr::Object(object) = &**expr else {
                return None;
            };
            if self.is_framework_decorator_object(object) {
                indices.push(index);
            }
        }
        Some(indices)
    }

    fn is_framework_decorator_object(&self, object: &ObjectLit) -> bool {
        let types = object
            .props
            .iter()
            .filter_map(|prop| match prop {
                PropOrSpread::Prop(prop) => match &**prop {
                    Prop::KeyValue(KeyValueProp {
                        key: PropName::Ident(key),
                        value,
                    }) if &*key.sym == "type" => Some(value),
                    _ => None,
                },
                _ => None,
            })
            .collect::<Vec<_>>();
        match types.as_slice() {
            [value] => matches!(&***value, Expr::Ident(ident) if self.is_framework_ident(ident)),
            _ => false,
        }
    }

    fn is_framework_ident(&self, ident: &Ident) -> bool {
        !self.framework.is_empty()
            && !self
                .symbols
                .resolve_declaration(ident)
                .is_disjoint(&self.framework)
    }

    fn is_framework_decorator_call(&self, call: &CallExpr) -> bool {
        get_call_expr_ident(call).is_some_and(|ident| self.is_framework_ident(ident))
    }

    /// Calls to a helper by plain name, by a renamed copy, or through the helper namespace.
    fn is_helper(&self, call: &CallExpr, helper: &str) -> bool {
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        let name = match &**callee {
            Expr::Ident(ident) => &*ident.sym,
            Expr::Member(MemberExpr {
                obj,
                prop: MemberProp::Ident(prop),
                ..
            }) => {
                let Expr::Ident(namespace) = &**obj else {
                    return false;
                };
                if self
                    .symbols
                    .resolve_declaration(namespace)
                    .is_disjoint(&self.helper_namespaces)
                {
                    return false;
                }
                &*prop.sym
            }
            _ => return false,
        };
        is_helper_name(name, helper)
    }

    fn is_metadata_call(&self, call: &CallExpr, key: Option<&str>) -> bool {
        self.is_helper(call, &self.vocabulary.metadata_helper)
            && call.args.len() >= 2
            && first_str_arg(call).is_some_and(|value| key.map_or(true, |key| key == value))
    }

    fn is_param_call(&self, call: &CallExpr) -> bool {
        self.is_helper(call, &self.vocabulary.param_helper)
            && call.args.len() == 2
            && matches!(&*call.args[0].expr, Expr::Lit(Lit::Num(_)))
    }

    /// `Foo = __decorate([...], Foo)` or `Foo = Foo_1 = __decorate([...], Foo)`.
    fn decorate_assignment<'e>(&self, expr: &'e mut Expr) -> Option<(&'e Ident, &'e mut CallExpr)> {
        let Expr::Assign(AssignExpr {
            op: AssignOp::Assign,
            left,
            right,
            ..
        }) = expr
        else {
            return None;
        };
        let class = assign_target_ident(left)?;
        let call = match &mut **right {
            Expr::Call(call) => call,
            Expr::Assign(AssignExpr {
                op: AssignOp::Assign,
                left: alias,
                right: inner,
                ..
            }) => {
                assign_target_ident(alias)?;
                match &mut **inner {
                    Expr::Call(call) => call,
                    _ => return None,
                }
            }
            _ => return None,
        };
        let is_decorate = self.is_helper(call, &self.vocabulary.decorate_helper)
            && call.args.len() == 2
            && matches!(&*call.args[1].expr, Expr::Ident(target) if target.sym == class.sym)
            && matches!(&*call.args[0].expr, Expr::Array(_));
        is_decorate.then_some((class, call))
    }

    /// A bare `__decorate([Decorator(), __metadata(...)], target, "key", desc)` statement.
    fn property_decorate_call<'e>(&self, expr: &'e mut Expr) -> Option<&'e mut CallExpr> {
        let Expr::Call(call) = expr else {
            return None;
        };
        if !self.is_helper(call, &self.vocabulary.decorate_helper) || call.args.len() != 4 {
            return None;
        }
        let Expr::Array(array) = &*call.args[0].expr else {
            return None;
        };
        let matched = array_call(array, 0).is_some_and(|call| self.is_framework_decorator_call(call))
            && array_call(array, 1)
                .is_some_and(|call| self.is_metadata_call(call, Some("design:type")));
        matched.then_some(call)
    }

    /// `(function () { ɵsetClassMetadata(...); })()`, optionally guarded by `ngDevMode &&`.
    fn is_class_metadata_iife(&self, expr: &Expr) -> bool {
        let Expr::Call(CallExpr {
            callee: Callee::Expr(callee),
            args,
            ..
        }) = expr
        else {
            return false;
        };
        if !args.is_empty() {
            return false;
        }
        let body = match unparen(callee) {
            Expr::Fn(function) => function.function.body.as_ref(),
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(body) => Some(body),
                _ => None,
            },
            _ => None,
        };
        let Some(BlockStmt { stmts, .. }) = body else {
            return false;
        };
        let [Stmt::Expr(ExprStmt { expr: inner, .. })] = stmts.as_slice() else {
            return false;
        };
        match &**inner {
            Expr::Bin(BinExpr {
                op: BinaryOp::LogicalAnd,
                right,
                ..
            }) => self.is_set_class_metadata_call(right),
            other => self.is_set_class_metadata_call(other),
        }
    }

    fn is_set_class_metadata_call(&self, expr: &Expr) -> bool {
        let Expr::Call(CallExpr {
            callee: Callee::Expr(callee),
            ..
        }) = unparen(expr)
        else {
            return false;
        };
        let name = match &**callee {
            Expr::Ident(ident) => Some(&*ident.sym),
            Expr::Member(member) => member_prop_name(member),
            _ => None,
        };
        name == Some(self.vocabulary.class_metadata_helper.as_str())
    }
}

/// `Class.property = value`, giving back the class identifier and the value.
fn member_assignment<'e>(expr: &'e mut Expr, property: &str) -> Option<(&'e Ident, &'e mut Expr)> {
    let Expr::Assign(AssignExpr {
        op: AssignOp::Assign,
        left: AssignTarget::Simple(SimpleAssignTarget::Member(member)),
        right,
        ..
    }) = expr
    else {
        return None;
    };
    if member_prop_name(member) != Some(property) {
        return None;
    }
    let Expr::Ident(class) = &*member.obj else {
        return None;
    };
    Some((class, &mut **right))
}

fn array_call(array: &ArrayLit, index: usize) -> Option<&CallExpr> {
    match array.elems.get(index) {
        Some(Some(ExprOrSpread { spread: None, expr })) => match &**expr {
            Expr::Call(call) => Some(call),
            _ => None,
        },
        _ => None,
    }
}

fn prop_decorator_list(prop: &mut PropOrSpread) -> Option<&mut ArrayLit> {
    let PropOrSpread::Prop(prop) = prop else {
        return None;
    };
    let Prop::KeyValue(KeyValueProp { value, .. }) = &mut **prop else {
        return None;
    };
    match &mut **value {
        Expr::Array(array) => Some(array),
        _ => None,
    }
}

/// The class name of `__decorate(..., Foo.prototype, ...)` or `__decorate(..., Foo, ...)`.
fn decorate_target_class(call: &CallExpr) -> Option<&str> {
    match &*call.args.get(1)?.expr {
        Expr::Ident(ident) => Some(&*ident.sym),
        Expr::Member(member) if member_prop_name(member) == Some("prototype") => match &*member.obj {
            Expr::Ident(ident) => Some(&*ident.sym),
            _ => None,
        },
        _ => None,
    }
}

/// `__decorate`, `__decorate$1`, `___decorate` all name the `__decorate` helper.
pub fn is_helper_name(name: &str, helper: &str) -> bool {
    if name == helper || name.strip_prefix('_') == Some(helper) {
        return true;
    }
    name.strip_prefix(helper)
        .and_then(|rest| rest.strip_prefix('$'))
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
}

fn remove_indices<T>(items: &mut Vec<T>, indices: &[usize]) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !indices.contains(&index);
        index += 1;
        keep
    });
}
