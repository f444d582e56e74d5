//! Static analysis of one module: scopes, declarations, member-path
//! assignments and exports.
//!
//! The analysis is built once per file from the untouched syntax tree and is
//! read-only afterwards, so rewriting one tag can never change how another
//! tag resolves.

mod collector;
pub mod declaration;
mod scope;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_edit::ByteOffset;
use swc_ecma_visit::VisitWith;

pub use declaration::DeclKind;
pub use scope::{DeclId, Declaration, ScopeId, ScopeTree};

use crate::parse::ParsedModule;

/// Local name of the synthetic binding behind `export default <expression>`.
pub(crate) const DEFAULT_EXPORT_LOCAL: &str = "*default*";

/// A value reached through a property chain, e.g. `styles.imgs.StyledSvg`.
#[derive(Debug, Clone)]
pub struct PathDeclaration {
    pub path: Vec<SmolStr>,
    pub kind: DeclKind,
    pub scope: ScopeId,
}

/// What an exported name points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// A binding in the module scope.
    Local(SmolStr),
    /// `export { export as name } from 'module'`.
    ReExport { module: SmolStr, export: SmolStr },
}

#[derive(Debug)]
pub struct ModuleAnalysis {
    file: Option<Utf8PathBuf>,
    scopes: ScopeTree,
    paths: Vec<PathDeclaration>,
    exports: FxHashMap<SmolStr, ExportTarget>,
    star_exports: Vec<SmolStr>,
    tag_scopes: FxHashMap<ByteOffset, ScopeId>,
}

impl ModuleAnalysis {
    pub fn build(parsed: &ParsedModule<'_>, file: Option<Utf8PathBuf>) -> Self {
        let mut collector = collector::Collector::new(&parsed.text);
        parsed.module.visit_with(&mut collector);

        tracing::trace!(
            file = file.as_ref().map(|f| f.as_str()).unwrap_or("<input>"),
            scopes = collector.scopes.scope_count(),
            paths = collector.paths.len(),
            exports = collector.exports.len(),
            "analysed module"
        );

        Self {
            file,
            scopes: collector.scopes,
            paths: collector.paths,
            exports: collector.exports,
            star_exports: collector.star_exports,
            tag_scopes: collector.tag_scopes,
        }
    }

    pub fn file(&self) -> Option<&Utf8Path> {
        self.file.as_deref()
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// Returns the scope enclosing the JSX element whose opening tag starts
    /// at `offset`.
    pub fn tag_scope(&self, offset: ByteOffset) -> ScopeId {
        self.tag_scopes
            .get(&offset)
            .copied()
            .unwrap_or(ScopeTree::ROOT)
    }

    /// Finds the first declaration of exactly this property chain whose root
    /// identifier is bound to `root`, by index.
    pub fn path_declaration(
        &self,
        path: &[SmolStr],
        root: DeclId,
    ) -> Option<(usize, &PathDeclaration)> {
        let name = path.first()?;
        self.paths.iter().enumerate().find(|(_, decl)| {
            decl.path == path && self.scopes.lookup(decl.scope, name) == Some(root)
        })
    }

    pub fn export(&self, name: &str) -> Option<&ExportTarget> {
        self.exports.get(name)
    }

    pub fn star_exports(&self) -> &[SmolStr] {
        &self.star_exports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_module;
    use pretty_assertions::assert_eq;

    fn analyse(source: &str) -> ModuleAnalysis {
        let parsed = parse_module(source, None).unwrap();
        ModuleAnalysis::build(&parsed, None)
    }

    fn path(parts: &[&str]) -> Vec<SmolStr> {
        parts.iter().map(|part| SmolStr::new(part)).collect()
    }

    fn kind_of(analysis: &ModuleAnalysis, scope: ScopeId, name: &str) -> Option<DeclKind> {
        let id = analysis.scopes().lookup(scope, name)?;
        Some(analysis.scopes().declaration(id)?.kind.clone())
    }

    #[test]
    fn imports_are_module_scoped() {
        let analysis = analyse(
            "import Img, { Svg as Icon } from 'react-optimized-image';\nimport * as ns from \"pkg\";",
        );
        let root = ScopeTree::ROOT;
        assert_eq!(
            kind_of(&analysis, root, "Img"),
            Some(DeclKind::Import {
                module: "react-optimized-image".into(),
                export: "default".into(),
                quote: '\'',
            })
        );
        assert_eq!(
            kind_of(&analysis, root, "Icon"),
            Some(DeclKind::Import {
                module: "react-optimized-image".into(),
                export: "Svg".into(),
                quote: '\'',
            })
        );
        assert_eq!(
            kind_of(&analysis, root, "ns"),
            Some(DeclKind::Namespace {
                module: "pkg".into()
            })
        );
    }

    #[test]
    fn parameters_shadow_imports_inside_functions() {
        let source = "import Img from 'react-optimized-image';\nfunction f(Img) { return <Img src={x} />; }\nconst g = () => <Img src={x} />;";
        let analysis = analyse(source);
        let inner = source.find("<Img").unwrap() as u32;
        let outer = source.rfind("<Img").unwrap() as u32;

        let inner_scope = analysis.tag_scope(inner.into());
        let outer_scope = analysis.tag_scope(outer.into());
        assert_eq!(kind_of(&analysis, inner_scope, "Img"), Some(DeclKind::Opaque));
        assert!(matches!(
            kind_of(&analysis, outer_scope, "Img"),
            Some(DeclKind::Import { .. })
        ));
    }

    #[test]
    fn var_hoists_out_of_blocks() {
        let analysis = analyse("{ var A = B; let C = D; }");
        assert_eq!(
            kind_of(&analysis, ScopeTree::ROOT, "A"),
            Some(DeclKind::Proxy { target: "B".into() })
        );
        assert_eq!(kind_of(&analysis, ScopeTree::ROOT, "C"), None);
    }

    #[test]
    fn member_paths_from_assignments_and_object_literals() {
        let analysis = analyse(
            "const styles = { imgs: { StyledSvg: styled(Svg)`x`, Plain } };\nstyles.other.Img = Img;",
        );
        let styles = analysis.scopes().lookup(ScopeTree::ROOT, "styles").unwrap();
        let (_, nested) = analysis
            .path_declaration(&path(&["styles", "imgs", "StyledSvg"]), styles)
            .unwrap();
        assert_eq!(
            nested.kind,
            DeclKind::WrapperCall {
                wrapper: "styled".into(),
                target: "Svg".into(),
            }
        );
        let (_, shorthand) = analysis
            .path_declaration(&path(&["styles", "imgs", "Plain"]), styles)
            .unwrap();
        assert_eq!(shorthand.kind, DeclKind::Proxy { target: "Plain".into() });
        let (index, assigned) = analysis
            .path_declaration(&path(&["styles", "other", "Img"]), styles)
            .unwrap();
        assert_eq!(index, 2);
        assert_eq!(assigned.kind, DeclKind::Proxy { target: "Img".into() });
        assert!(analysis
            .path_declaration(&path(&["styles", "imgs"]), styles)
            .is_none());
    }

    #[test]
    fn export_table() {
        let analysis = analyse(
            "export const A = styled(Img)``;\nconst B = 1;\nexport { B as C };\nexport { D as E } from './d';\nexport * from './all';\nexport default styled(Svg)``;",
        );
        assert_eq!(analysis.export("A"), Some(&ExportTarget::Local("A".into())));
        assert_eq!(analysis.export("C"), Some(&ExportTarget::Local("B".into())));
        assert_eq!(
            analysis.export("E"),
            Some(&ExportTarget::ReExport {
                module: "./d".into(),
                export: "D".into(),
            })
        );
        assert_eq!(analysis.star_exports(), ["./all"]);
        assert_eq!(
            analysis.export("default"),
            Some(&ExportTarget::Local(DEFAULT_EXPORT_LOCAL.into()))
        );
        assert_eq!(
            kind_of(&analysis, ScopeTree::ROOT, DEFAULT_EXPORT_LOCAL),
            Some(DeclKind::WrapperCall {
                wrapper: "styled".into(),
                target: "Svg".into(),
            })
        );
    }
}
