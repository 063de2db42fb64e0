use std::collections::{HashMap, HashSet};

use swc_core::ecma::ast::{
    ArrowExpr, ClassDecl, FnDecl, Function, Id, Ident, ImportDecl, ImportSpecifier, Module,
    ModuleExportName, Pat, VarDeclarator,
};
use swc_core::ecma::visit::{Visit, VisitWith};

/// Opaque handle to a declaration recorded in a [`SymbolTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclarationKind {
    NamedImport { src: String, imported: String },
    DefaultImport { src: String },
    NamespaceImport { src: String },
    Var,
    Function,
    Class,
}

#[derive(Clone, Debug)]
pub struct Declaration {
    pub id: Id,
    pub kind: DeclarationKind,
    pub top_level: bool,
}

/// Answers which declarations an identifier refers to. Only meaningful on a
/// module that went through [`crate::ast::js_ast::JsAst::resolve`].
pub trait SymbolResolver {
    fn resolve_declaration(&self, ident: &Ident) -> HashSet<DeclId>;
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    declarations: Vec<Declaration>,
    by_id: HashMap<Id, Vec<DeclId>>,
}

impl SymbolTable {
    pub fn build(module: &Module) -> Self {
        let mut collector = DeclarationCollector {
            table: SymbolTable::default(),
            depth: 0,
        };
        module.visit_with(&mut collector);
        collector.table
    }

    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn declare(&mut self, ident: &Ident, kind: DeclarationKind, top_level: bool) {
        let handle = DeclId(self.declarations.len());
        let id = ident.to_id();
        self.declarations.push(Declaration {
            id: id.clone(),
            kind,
            top_level,
        });
        self.by_id.entry(id).or_default().push(handle);
    }
}

impl SymbolResolver for SymbolTable {
    fn resolve_declaration(&self, ident: &Ident) -> HashSet<DeclId> {
        self.by_id
            .get(&ident.to_id())
            .map(|handles| handles.iter().copied().collect())
            .unwrap_or_default()
    }
}

struct DeclarationCollector {
    table: SymbolTable,
    depth: usize,
}

impl DeclarationCollector {
    fn declare(&mut self, ident: &Ident, kind: DeclarationKind) {
        let top_level = self.depth == 0;
        self.table.declare(ident, kind, top_level);
    }
}

impl Visit for DeclarationCollector {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let src = n.src.value.to_string();
        for specifier in &n.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(str_)) => str_.value.to_string(),
                        None => named.local.sym.to_string(),
                    };
                    self.declare(
                        &named.local,
                        DeclarationKind::NamedImport {
                            src: src.clone(),
                            imported,
                        },
                    );
                }
                ImportSpecifier::Default(default) => {
                    self.declare(
                        &default.local,
                        DeclarationKind::DefaultImport { src: src.clone() },
                    );
                }
                ImportSpecifier::Namespace(namespace) => {
                    self.declare(
                        &namespace.local,
                        DeclarationKind::NamespaceImport { src: src.clone() },
                    );
                }
            }
        }
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        if let Pat::Ident(binding) = &n.name {
            self.declare(&binding.id, DeclarationKind::Var);
        }
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.declare(&n.ident, DeclarationKind::Function);
        n.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(&n.ident, DeclarationKind::Class);
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &Function) {
        self.depth += 1;
        n.visit_children_with(self);
        self.depth -= 1;
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.depth += 1;
        n.visit_children_with(self);
        self.depth -= 1;
    }
}
