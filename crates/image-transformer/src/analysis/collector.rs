use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_edit::ByteOffset;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use super::declaration::{
    classify_destructure, classify_initializer, collect_pat_idents, ident_name, prop_name,
    static_member_name, str_value, unwrap_expr, DeclKind,
};
use super::{ExportTarget, PathDeclaration, ScopeId, ScopeTree, DEFAULT_EXPORT_LOCAL};
use crate::parse::SourceText;

/// Walks a module once and records scopes, declarations, member paths,
/// exports and the scope of every JSX element.
pub(super) struct Collector<'a, 's> {
    text: &'a SourceText<'s>,
    pub(super) scopes: ScopeTree,
    current: ScopeId,
    pending_function_name: Option<Ident>,
    pub(super) paths: Vec<PathDeclaration>,
    pub(super) exports: FxHashMap<SmolStr, ExportTarget>,
    pub(super) star_exports: Vec<SmolStr>,
    pub(super) tag_scopes: FxHashMap<ByteOffset, ScopeId>,
}

impl<'a, 's> Collector<'a, 's> {
    pub(super) fn new(text: &'a SourceText<'s>) -> Self {
        Self {
            text,
            scopes: ScopeTree::new(),
            current: ScopeTree::ROOT,
            pending_function_name: None,
            paths: Vec::new(),
            exports: FxHashMap::default(),
            star_exports: Vec::new(),
            tag_scopes: FxHashMap::default(),
        }
    }

    fn enter_scope(&mut self, is_function: bool) {
        self.current = self.scopes.push_scope(self.current, is_function);
    }

    fn exit_scope(&mut self) {
        self.current = self.scopes.parent(self.current).unwrap_or(ScopeTree::ROOT);
    }

    fn declare(&mut self, ident: &Ident, kind: DeclKind, is_var: bool) {
        let scope = if is_var {
            self.scopes.function_scope(self.current)
        } else {
            self.current
        };
        let span = self.text.span(ident.span);
        self.scopes
            .declare_from(scope, self.current, ident_name(ident), kind, span);
    }

    fn declare_opaque_pats<'p>(&mut self, pats: impl IntoIterator<Item = &'p Pat>) {
        let mut names = Vec::new();
        for pat in pats {
            collect_pat_idents(pat, &mut names);
        }
        for (ident, kind) in names {
            self.declare(&ident, kind, false);
        }
    }

    fn export(&mut self, exported: SmolStr, target: ExportTarget) {
        self.exports.entry(exported).or_insert(target);
    }

    fn record_object_paths(&mut self, prefix: &mut Vec<SmolStr>, object: &ObjectLit) {
        for prop in &object.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match prop.as_ref() {
                Prop::KeyValue(kv) => {
                    let Some(key) = prop_name(&kv.key) else {
                        continue;
                    };
                    prefix.push(key);
                    match unwrap_expr(&kv.value) {
                        Expr::Object(nested) => self.record_object_paths(prefix, nested),
                        value => self.paths.push(PathDeclaration {
                            path: prefix.clone(),
                            kind: classify_initializer(value),
                            scope: self.current,
                        }),
                    }
                    prefix.pop();
                }
                Prop::Shorthand(ident) => {
                    let mut path = prefix.clone();
                    path.push(ident_name(ident));
                    self.paths.push(PathDeclaration {
                        path,
                        kind: DeclKind::Proxy {
                            target: ident_name(ident),
                        },
                        scope: self.current,
                    });
                }
                _ => {}
            }
        }
    }

    fn record_exports(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::ExportDecl(export) => match &export.decl {
                Decl::Var(var) if !var.declare => {
                    let mut names = Vec::new();
                    for declarator in &var.decls {
                        collect_pat_idents(&declarator.name, &mut names);
                    }
                    for (ident, _) in names {
                        let name = ident_name(&ident);
                        self.export(name.clone(), ExportTarget::Local(name));
                    }
                }
                Decl::Fn(func) => {
                    let name = ident_name(&func.ident);
                    self.export(name.clone(), ExportTarget::Local(name));
                }
                Decl::Class(class) => {
                    let name = ident_name(&class.ident);
                    self.export(name.clone(), ExportTarget::Local(name));
                }
                _ => {}
            },
            ModuleDecl::ExportNamed(named) if !named.type_only => {
                let source = named.src.as_deref().and_then(str_value);
                for spec in &named.specifiers {
                    match spec {
                        ExportSpecifier::Named(spec) if !spec.is_type_only => {
                            let Some(orig) = module_export_name(&spec.orig) else {
                                continue;
                            };
                            let exported = spec
                                .exported
                                .as_ref()
                                .and_then(module_export_name)
                                .unwrap_or_else(|| orig.clone());
                            let target = match &source {
                                Some(module) => ExportTarget::ReExport {
                                    module: module.clone(),
                                    export: orig,
                                },
                                None => ExportTarget::Local(orig),
                            };
                            self.export(exported, target);
                        }
                        ExportSpecifier::Default(spec) => {
                            if let Some(module) = &source {
                                self.export(
                                    ident_name(&spec.exported),
                                    ExportTarget::ReExport {
                                        module: module.clone(),
                                        export: "default".into(),
                                    },
                                );
                            }
                        }
                        _ => {}
                    }
                }
            }
            ModuleDecl::ExportDefaultExpr(export) => match unwrap_expr(&export.expr) {
                Expr::Ident(ident) => {
                    self.export("default".into(), ExportTarget::Local(ident_name(ident)));
                }
                expr => {
                    let span = self.text.span(export.span);
                    self.scopes.declare(
                        ScopeTree::ROOT,
                        DEFAULT_EXPORT_LOCAL.into(),
                        classify_initializer(expr),
                        span,
                    );
                    self.export(
                        "default".into(),
                        ExportTarget::Local(DEFAULT_EXPORT_LOCAL.into()),
                    );
                }
            },
            ModuleDecl::ExportAll(all) if !all.type_only => {
                if let Some(module) = str_value(&all.src) {
                    self.star_exports.push(module);
                }
            }
            _ => {}
        }
    }
}

impl Visit for Collector<'_, '_> {
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        if import.type_only {
            return;
        }
        let Some(module) = str_value(&import.src) else {
            return;
        };
        let quote = self
            .text
            .slice(import.src.span)
            .chars()
            .next()
            .filter(|c| matches!(c, '\'' | '"'))
            .unwrap_or('\'');

        for spec in &import.specifiers {
            match spec {
                ImportSpecifier::Named(named) if !named.is_type_only => {
                    let export = named
                        .imported
                        .as_ref()
                        .and_then(module_export_name)
                        .unwrap_or_else(|| ident_name(&named.local));
                    let kind = DeclKind::Import {
                        module: module.clone(),
                        export,
                        quote,
                    };
                    self.declare(&named.local, kind, false);
                }
                ImportSpecifier::Named(_) => {}
                ImportSpecifier::Default(default) => {
                    let kind = DeclKind::Import {
                        module: module.clone(),
                        export: "default".into(),
                        quote,
                    };
                    self.declare(&default.local, kind, false);
                }
                ImportSpecifier::Namespace(namespace) => {
                    let kind = DeclKind::Namespace {
                        module: module.clone(),
                    };
                    self.declare(&namespace.local, kind, false);
                }
            }
        }
    }

    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        self.record_exports(decl);
        decl.visit_children_with(self);
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.enter_scope(false);
        block.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_fn_decl(&mut self, func: &FnDecl) {
        self.declare(&func.ident, DeclKind::Opaque, false);
        func.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, func: &FnExpr) {
        self.pending_function_name = func.ident.clone();
        func.function.visit_with(self);
    }

    fn visit_class_decl(&mut self, class: &ClassDecl) {
        self.declare(&class.ident, DeclKind::Opaque, false);
        class.class.visit_with(self);
    }

    fn visit_arrow_expr(&mut self, func: &ArrowExpr) {
        self.enter_scope(true);
        self.declare_opaque_pats(&func.params);
        func.params.visit_with(self);
        func.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_function(&mut self, func: &Function) {
        self.enter_scope(true);
        if let Some(name) = self.pending_function_name.take() {
            self.declare(&name, DeclKind::Opaque, false);
        }
        self.declare_opaque_pats(func.params.iter().map(|param| &param.pat));
        func.params.visit_with(self);
        if let Some(body) = &func.body {
            body.visit_with(self);
        }
        self.exit_scope();
    }

    fn visit_constructor(&mut self, ctor: &Constructor) {
        self.enter_scope(true);
        self.declare_opaque_pats(ctor.params.iter().filter_map(|param| match param {
            ParamOrTsParamProp::Param(param) => Some(&param.pat),
            ParamOrTsParamProp::TsParamProp(_) => None,
        }));
        if let Some(body) = &ctor.body {
            body.visit_with(self);
        }
        self.exit_scope();
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        let is_var = decl.kind == VarDeclKind::Var;

        for declarator in &decl.decls {
            let bindings = match (&declarator.name, declarator.init.as_deref()) {
                (Pat::Ident(ident), Some(init)) => {
                    vec![(ident.id.clone(), classify_initializer(init))]
                }
                (pat @ Pat::Object(_), Some(init)) => classify_destructure(pat, init),
                (pat, _) => {
                    let mut names = Vec::new();
                    collect_pat_idents(pat, &mut names);
                    names
                }
            };
            for (ident, kind) in bindings {
                self.declare(&ident, kind, is_var);
            }

            if let (Pat::Ident(ident), Some(init)) = (&declarator.name, declarator.init.as_deref())
            {
                if let Expr::Object(object) = unwrap_expr(init) {
                    self.record_object_paths(&mut vec![ident_name(&ident.id)], object);
                }
            }

            declarator.name.visit_with(self);
            declarator.init.visit_with(self);
        }
    }

    fn visit_for_stmt(&mut self, stmt: &ForStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_for_in_stmt(&mut self, stmt: &ForInStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        self.enter_scope(false);
        stmt.visit_children_with(self);
        self.exit_scope();
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.enter_scope(false);
        self.declare_opaque_pats(clause.param.as_ref());
        clause.body.visit_with(self);
        self.exit_scope();
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        if assign.op == AssignOp::Assign {
            if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left {
                if let Some(path) = member_path(member) {
                    self.paths.push(PathDeclaration {
                        path,
                        kind: classify_initializer(&assign.right),
                        scope: self.current,
                    });
                }
            }
        }
        assign.visit_children_with(self);
    }

    fn visit_jsx_element(&mut self, element: &JSXElement) {
        let offset = self.text.span(element.opening.span).start;
        self.tag_scopes.insert(offset, self.current);
        element.visit_children_with(self);
    }

    fn visit_ts_type(&mut self, _ty: &TsType) {}
}

/// Returns `["a", "b", "C"]` for `a.b.C` or `a["b"].C`.
fn member_path(member: &MemberExpr) -> Option<Vec<SmolStr>> {
    let mut path = match unwrap_expr(&member.obj) {
        Expr::Ident(ident) => vec![ident_name(ident)],
        Expr::Member(inner) => member_path(inner)?,
        _ => return None,
    };
    path.push(static_member_name(&member.prop)?);
    Some(path)
}

fn module_export_name(name: &ModuleExportName) -> Option<SmolStr> {
    match name {
        ModuleExportName::Ident(ident) => Some(ident_name(ident)),
        ModuleExportName::Str(s) => str_value(s),
    }
}
