//! What a declaration binds its name to.

use smol_str::SmolStr;
use swc_ecma_ast::{
    CallExpr, Callee, Expr, Ident, Lit, MemberProp, ObjectPatProp, Pat, PropName, Str,
};

/// The declaring construct of a binding, reduced to what resolution needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// `import X from 'm'` or `import { e as X } from 'm'`. Default imports
    /// use the export name `default`.
    Import {
        module: SmolStr,
        export: SmolStr,
        /// Quote character of the module specifier in the source.
        quote: char,
    },
    /// `import * as X from 'm'` or `const X = require('m')`.
    Namespace { module: SmolStr },
    /// `const X = require('m').e`. `module` is `None` when the argument is
    /// not a string literal.
    RequireMember {
        module: Option<SmolStr>,
        export: SmolStr,
    },
    /// `const { e: X } = require('m')`.
    RequireDestructure {
        module: Option<SmolStr>,
        key: SmolStr,
    },
    /// `const X = Y`.
    Proxy { target: SmolStr },
    /// `const X = wrapper(Y)` invoked through a tagged template, a further
    /// call or a member access, e.g. `styled(Y)\`...\`` or
    /// `styled(Y).withConfig({})(...)`.
    WrapperCall { wrapper: SmolStr, target: SmolStr },
    /// Anything resolution cannot see through: parameters, functions,
    /// classes, loop variables and other initializers.
    Opaque,
}

/// Classifies the initializer of a plain identifier binding.
pub fn classify_initializer(init: &Expr) -> DeclKind {
    let init = unwrap_expr(init);
    match init {
        Expr::Ident(ident) => DeclKind::Proxy {
            target: ident_name(ident),
        },
        Expr::Member(member) => {
            let Some(call) = require_call(&member.obj) else {
                return DeclKind::Opaque;
            };
            match static_member_name(&member.prop) {
                Some(export) => DeclKind::RequireMember {
                    module: require_module(call),
                    export,
                },
                None => DeclKind::Opaque,
            }
        }
        Expr::Call(call) if is_require(call) => match require_module(call) {
            Some(module) => DeclKind::Namespace { module },
            None => DeclKind::Opaque,
        },
        Expr::Call(_) | Expr::TaggedTpl(_) => match peel_wrapper(init, false) {
            Some((wrapper, target)) => DeclKind::WrapperCall { wrapper, target },
            None => DeclKind::Opaque,
        },
        _ => DeclKind::Opaque,
    }
}

/// Binds every name of an object pattern initialized by `require(...)`.
///
/// Names under nested patterns or rest elements are opaque.
pub fn classify_destructure(pat: &Pat, init: &Expr) -> Vec<(Ident, DeclKind)> {
    let mut out = Vec::new();
    let (Pat::Object(pat), Some(call)) = (pat, require_call(init)) else {
        collect_pat_idents(pat, &mut out);
        return out;
    };
    let module = require_module(call);

    for prop in &pat.props {
        match prop {
            ObjectPatProp::KeyValue(kv) => {
                let local = match kv.value.as_ref() {
                    Pat::Ident(ident) => Some(&ident.id),
                    Pat::Assign(assign) => match assign.left.as_ref() {
                        Pat::Ident(ident) => Some(&ident.id),
                        _ => None,
                    },
                    _ => None,
                };
                match (local, prop_name(&kv.key)) {
                    (Some(local), Some(key)) => out.push((
                        local.clone(),
                        DeclKind::RequireDestructure {
                            module: module.clone(),
                            key,
                        },
                    )),
                    _ => collect_pat_idents(&kv.value, &mut out),
                }
            }
            ObjectPatProp::Assign(assign) => out.push((
                assign.key.id.clone(),
                DeclKind::RequireDestructure {
                    module: module.clone(),
                    key: ident_name(&assign.key.id),
                },
            )),
            ObjectPatProp::Rest(rest) => collect_pat_idents(&rest.arg, &mut out),
        }
    }
    out
}

/// Collects every identifier a pattern binds, all of them opaque.
pub fn collect_pat_idents(pat: &Pat, out: &mut Vec<(Ident, DeclKind)>) {
    match pat {
        Pat::Ident(ident) => out.push((ident.id.clone(), DeclKind::Opaque)),
        Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                collect_pat_idents(elem, out);
            }
        }
        Pat::Object(obj) => {
            for prop in &obj.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pat_idents(&kv.value, out),
                    ObjectPatProp::Assign(assign) => {
                        out.push((assign.key.id.clone(), DeclKind::Opaque))
                    }
                    ObjectPatProp::Rest(rest) => collect_pat_idents(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => collect_pat_idents(&assign.left, out),
        Pat::Rest(rest) => collect_pat_idents(&rest.arg, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

/// Strips parentheses and TypeScript-only wrappers.
pub fn unwrap_expr(mut expr: &Expr) -> &Expr {
    loop {
        expr = match expr {
            Expr::Paren(inner) => &inner.expr,
            Expr::TsAs(inner) => &inner.expr,
            Expr::TsSatisfies(inner) => &inner.expr,
            Expr::TsNonNull(inner) => &inner.expr,
            Expr::TsConstAssertion(inner) => &inner.expr,
            Expr::TsTypeAssertion(inner) => &inner.expr,
            _ => return expr,
        };
    }
}

/// Peels configuration layers off a wrapper invocation until a call of the
/// form `ident(Target)` is reached.
///
/// At least one layer (tagged template, member access or outer call) must
/// be peeled; a bare `fn(Target)` is not a component wrapper.
fn peel_wrapper(expr: &Expr, layered: bool) -> Option<(SmolStr, SmolStr)> {
    match unwrap_expr(expr) {
        Expr::TaggedTpl(tpl) => peel_wrapper(&tpl.tag, true),
        Expr::Member(member) => peel_wrapper(&member.obj, true),
        Expr::Call(call) => {
            let Callee::Expr(callee) = &call.callee else {
                return None;
            };
            match unwrap_expr(callee) {
                Expr::Ident(wrapper) if layered => {
                    let target = call.args.first().filter(|arg| arg.spread.is_none())?;
                    match unwrap_expr(&target.expr) {
                        Expr::Ident(target) => Some((ident_name(wrapper), ident_name(target))),
                        _ => None,
                    }
                }
                Expr::Ident(_) => None,
                other => peel_wrapper(other, true),
            }
        }
        _ => None,
    }
}

pub fn is_require(call: &CallExpr) -> bool {
    matches!(
        &call.callee,
        Callee::Expr(callee) if matches!(callee.as_ref(), Expr::Ident(ident) if &*ident.sym == "require")
    )
}

pub fn require_call(expr: &Expr) -> Option<&CallExpr> {
    match unwrap_expr(expr) {
        Expr::Call(call) if is_require(call) => Some(call),
        _ => None,
    }
}

/// Returns the literal module specifier of a `require` call.
pub fn require_module(call: &CallExpr) -> Option<SmolStr> {
    let arg = call.args.first().filter(|arg| arg.spread.is_none())?;
    match arg.expr.as_ref() {
        Expr::Lit(Lit::Str(s)) => str_value(s),
        _ => None,
    }
}

pub fn static_member_name(prop: &MemberProp) -> Option<SmolStr> {
    match prop {
        MemberProp::Ident(ident) => Some(SmolStr::new(ident.sym.as_str())),
        MemberProp::Computed(computed) => match computed.expr.as_ref() {
            Expr::Lit(Lit::Str(s)) => str_value(s),
            _ => None,
        },
        MemberProp::PrivateName(_) => None,
    }
}

pub fn prop_name(key: &PropName) -> Option<SmolStr> {
    match key {
        PropName::Ident(ident) => Some(SmolStr::new(ident.sym.as_str())),
        PropName::Str(s) => str_value(s),
        _ => None,
    }
}

pub fn str_value(s: &Str) -> Option<SmolStr> {
    s.value.as_str().map(SmolStr::new)
}

pub fn ident_name(ident: &Ident) -> SmolStr {
    SmolStr::new(ident.sym.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_module;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{Decl, ModuleItem, Stmt};

    fn init_kind(source: &str) -> DeclKind {
        let parsed = parse_module(source, None).unwrap();
        let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = &parsed.module.body[0] else {
            panic!("expected a variable declaration");
        };
        classify_initializer(var.decls[0].init.as_deref().unwrap())
    }

    #[test]
    fn proxies_and_requires() {
        assert_eq!(init_kind("const A = B;"), DeclKind::Proxy { target: "B".into() });
        assert_eq!(
            init_kind("const A = require('react-optimized-image').Svg;"),
            DeclKind::RequireMember {
                module: Some("react-optimized-image".into()),
                export: "Svg".into(),
            }
        );
        assert_eq!(
            init_kind("const A = require(name)['default'];"),
            DeclKind::RequireMember {
                module: None,
                export: "default".into(),
            }
        );
        assert_eq!(
            init_kind("const A = require('m');"),
            DeclKind::Namespace { module: "m".into() }
        );
        assert_eq!(init_kind("const A = require('m')[key];"), DeclKind::Opaque);
    }

    #[test]
    fn wrapper_forms() {
        let expected = DeclKind::WrapperCall {
            wrapper: "styled".into(),
            target: "Img".into(),
        };
        assert_eq!(init_kind("const A = styled(Img)`color: red;`;"), expected);
        assert_eq!(init_kind("const A = styled(Img)({ color: 'red' });"), expected);
        assert_eq!(
            init_kind("const A = styled(Img).withConfig({ displayName: 'A' })({});"),
            expected
        );
        assert_eq!(init_kind("const A = styled(Img).attrs({})`x`;"), expected);
        assert_eq!(init_kind("const A = styled(Img);"), DeclKind::Opaque);
        assert_eq!(init_kind("const A = styled.div`x`;"), DeclKind::Opaque);
        assert_eq!(init_kind("const A = styled('div')`x`;"), DeclKind::Opaque);
    }

    #[test]
    fn destructured_require() {
        let parsed =
            parse_module("const { Svg: Icon, Img, ...rest } = require('m');", None).unwrap();
        let ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) = &parsed.module.body[0] else {
            panic!("expected a variable declaration");
        };
        let kinds: Vec<_> = classify_destructure(&var.decls[0].name, var.decls[0].init.as_deref().unwrap())
            .into_iter()
            .map(|(ident, kind)| (ident.sym.to_string(), kind))
            .collect();

        assert_eq!(
            kinds,
            vec![
                (
                    "Icon".to_string(),
                    DeclKind::RequireDestructure {
                        module: Some("m".into()),
                        key: "Svg".into(),
                    }
                ),
                (
                    "Img".to_string(),
                    DeclKind::RequireDestructure {
                        module: Some("m".into()),
                        key: "Img".into(),
                    }
                ),
                ("rest".to_string(), DeclKind::Opaque),
            ]
        );
    }
}
