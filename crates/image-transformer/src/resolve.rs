//! Tracing identifiers back to the module export they denote.

use camino::Utf8PathBuf;
use indexmap::IndexSet;
use smol_str::SmolStr;

use crate::analysis::{DeclId, DeclKind, ExportTarget, ModuleAnalysis, ScopeId, ScopeTree};
use crate::component::is_styling_package;
use crate::loader::{is_relative, ModuleLoader};

/// A statically known `(module, export)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedExport {
    pub module: SmolStr,
    pub export: SmolStr,
}

impl ResolvedExport {
    pub fn new(module: impl Into<SmolStr>, export: impl Into<SmolStr>) -> Self {
        Self {
            module: module.into(),
            export: export.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Decl(DeclId),
    Path(usize),
    Export(SmolStr),
}

/// Resolves identifiers and member chains across one or more modules.
///
/// Nodes currently being resolved are kept on a stack; reaching one of them
/// again is a cycle and yields `None`. A node may still be visited again on
/// a sibling branch, e.g. the same `styled` import behind two nested wrappers.
pub struct Resolver<'l> {
    loader: &'l dyn ModuleLoader,
    in_progress: IndexSet<(Option<Utf8PathBuf>, Node)>,
}

impl<'l> Resolver<'l> {
    pub fn new(loader: &'l dyn ModuleLoader) -> Self {
        Self {
            loader,
            in_progress: IndexSet::new(),
        }
    }

    /// Resolves `name` as seen from `scope`.
    pub fn resolve_identifier(
        &mut self,
        module: &ModuleAnalysis,
        scope: ScopeId,
        name: &str,
    ) -> Option<ResolvedExport> {
        let Some(id) = module.scopes().lookup(scope, name) else {
            tracing::trace!(name, "no declaration in scope");
            return None;
        };
        self.resolve_declaration(module, id)
    }

    /// Resolves a property chain such as `styles.imgs.StyledSvg`.
    ///
    /// The root identifier must be declared in `scope`. A two-segment chain on
    /// a namespace binding (`ns.Img`) resolves to that export of the
    /// namespace's module. Anything else is looked up among the member-path
    /// declarations rooted at that same binding.
    pub fn resolve_path(
        &mut self,
        module: &ModuleAnalysis,
        scope: ScopeId,
        path: &[SmolStr],
    ) -> Option<ResolvedExport> {
        let (root, rest) = path.split_first()?;
        let Some(root_id) = module.scopes().lookup(scope, root) else {
            tracing::trace!(root = %root, "member path root is not declared");
            return None;
        };
        if let [export] = rest {
            let namespace = module.scopes().declaration(root_id);
            if let Some(DeclKind::Namespace { module: source }) = namespace.map(|decl| &decl.kind) {
                return self.follow(module, ResolvedExport::new(source.clone(), export.clone()));
            }
        }

        let Some((index, declaration)) = module.path_declaration(path, root_id) else {
            tracing::trace!(path = %path.join("."), "no member path declaration");
            return None;
        };
        self.guarded(module, Node::Path(index), |this| {
            this.resolve_kind(module, &declaration.kind, declaration.scope)
        })
    }

    fn resolve_declaration(&mut self, module: &ModuleAnalysis, id: DeclId) -> Option<ResolvedExport> {
        let declaration = module.scopes().declaration(id)?;
        self.guarded(module, Node::Decl(id), |this| {
            this.resolve_kind(module, &declaration.kind, declaration.scope)
        })
    }

    fn resolve_kind(
        &mut self,
        module: &ModuleAnalysis,
        kind: &DeclKind,
        scope: ScopeId,
    ) -> Option<ResolvedExport> {
        match kind {
            DeclKind::Import {
                module: source,
                export,
                ..
            } => self.follow(module, ResolvedExport::new(source.clone(), export.clone())),
            DeclKind::RequireMember {
                module: Some(source),
                export,
            } => self.follow(module, ResolvedExport::new(source.clone(), export.clone())),
            DeclKind::RequireDestructure {
                module: Some(source),
                key,
            } => self.follow(module, ResolvedExport::new(source.clone(), key.clone())),
            DeclKind::Proxy { target } => self.resolve_identifier(module, scope, target),
            DeclKind::WrapperCall { wrapper, target } => {
                let wrapper_export = self.resolve_identifier(module, scope, wrapper)?;
                if !is_styling_package(&wrapper_export.module) {
                    tracing::trace!(
                        wrapper = %wrapper,
                        module = %wrapper_export.module,
                        "call wrapper is not a styling package"
                    );
                    return None;
                }
                self.resolve_identifier(module, scope, target)
            }
            DeclKind::RequireMember { module: None, .. }
            | DeclKind::RequireDestructure { module: None, .. }
            | DeclKind::Namespace { .. }
            | DeclKind::Opaque => None,
        }
    }

    /// Continues into a local module for relative specifiers; anything else
    /// is final.
    fn follow(&mut self, module: &ModuleAnalysis, export: ResolvedExport) -> Option<ResolvedExport> {
        if !is_relative(&export.module) {
            return Some(export);
        }
        let dir = module.file()?.parent()?;
        let Some(target) = self.loader.load(dir, &export.module) else {
            tracing::debug!(module = %export.module, %dir, "local module not loaded");
            return None;
        };
        self.resolve_export(&target, &export.export)
    }

    fn resolve_export(&mut self, target: &ModuleAnalysis, name: &str) -> Option<ResolvedExport> {
        self.guarded(target, Node::Export(name.into()), |this| {
            match target.export(name) {
                Some(ExportTarget::Local(local)) => {
                    let id = target.scopes().lookup(ScopeTree::ROOT, local)?;
                    this.resolve_declaration(target, id)
                }
                Some(ExportTarget::ReExport { module, export }) => {
                    this.follow(target, ResolvedExport::new(module.clone(), export.clone()))
                }
                None if name != "default" => target
                    .star_exports()
                    .iter()
                    .find_map(|module| this.follow(target, ResolvedExport::new(module.clone(), name))),
                None => None,
            }
        })
    }

    fn guarded(
        &mut self,
        module: &ModuleAnalysis,
        node: Node,
        resolve: impl FnOnce(&mut Self) -> Option<ResolvedExport>,
    ) -> Option<ResolvedExport> {
        let key = (module.file().map(ToOwned::to_owned), node);
        if !self.in_progress.insert(key) {
            tracing::debug!(file = ?module.file(), "resolution cycle");
            return None;
        }
        let resolved = resolve(self);
        self.in_progress.pop();
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::NoopModuleLoader;
    use crate::parse::parse_module;
    use pretty_assertions::assert_eq;

    fn resolve(source: &str, name: &str) -> Option<ResolvedExport> {
        let parsed = parse_module(source, None).unwrap();
        let analysis = ModuleAnalysis::build(&parsed, None);
        Resolver::new(&NoopModuleLoader).resolve_identifier(&analysis, ScopeTree::ROOT, name)
    }

    fn resolve_path(source: &str, path: &[&str]) -> Option<ResolvedExport> {
        let parsed = parse_module(source, None).unwrap();
        let analysis = ModuleAnalysis::build(&parsed, None);
        let path: Vec<SmolStr> = path.iter().map(|part| SmolStr::new(part)).collect();
        Resolver::new(&NoopModuleLoader).resolve_path(&analysis, ScopeTree::ROOT, &path)
    }

    fn svg() -> Option<ResolvedExport> {
        Some(ResolvedExport::new("react-optimized-image", "Svg"))
    }

    #[test]
    fn proxy_chains_of_any_length() {
        let import = "import { Svg } from 'react-optimized-image';\n";
        assert_eq!(resolve(import, "Svg"), svg());
        assert_eq!(resolve(&format!("{import}const A = Svg;"), "A"), svg());
        assert_eq!(
            resolve(&format!("{import}const A = Svg;\nconst B = A;\nconst C = (B);"), "C"),
            svg()
        );
    }

    #[test]
    fn require_forms() {
        assert_eq!(
            resolve("const Icon = require('react-optimized-image').Svg;", "Icon"),
            svg()
        );
        assert_eq!(
            resolve("const { Svg: Icon } = require('react-optimized-image');", "Icon"),
            svg()
        );
        assert_eq!(
            resolve(
                "const { default: Image } = require('react-optimized-image/lib/components/Img');",
                "Image"
            ),
            Some(ResolvedExport::new(
                "react-optimized-image/lib/components/Img",
                "default"
            ))
        );
        assert_eq!(resolve("const Icon = require(name).Svg;", "Icon"), None);
    }

    #[test]
    fn styling_wrappers_are_transparent() {
        let source = "import styled from 'styled-components';\nimport Img from 'react-optimized-image';\nconst A = styled(Img)`color: red;`;\nconst B = styled(A).withConfig({ displayName: 'B' })({});\n";
        let img = Some(ResolvedExport::new("react-optimized-image", "default"));
        assert_eq!(resolve(source, "A"), img);
        assert_eq!(resolve(source, "B"), img);

        let emotion = "import styled from '@emotion/styled';\nimport { Img } from 'react-optimized-image';\nconst A = styled(Img)({});";
        assert_eq!(
            resolve(emotion, "A"),
            Some(ResolvedExport::new("react-optimized-image", "Img"))
        );
    }

    #[test]
    fn unknown_wrappers_are_opaque() {
        let source = "import wrap from 'some-hoc';\nimport Img from 'react-optimized-image';\nconst A = wrap(Img)({});";
        assert_eq!(resolve(source, "A"), None);
        assert_eq!(resolve("const A = styled(Img)``;", "A"), None);
    }

    #[test]
    fn cycles_are_unresolved() {
        assert_eq!(resolve("var A = B;\nvar B = A;", "A"), None);
        assert_eq!(resolve("const A = A;", "A"), None);
    }

    #[test]
    fn member_paths() {
        let source = "import styled from 'styled-components';\nimport { Svg } from 'react-optimized-image';\nconst styles = { imgs: {} };\nstyles.imgs.StyledSvg = styled(Svg)``;\n";
        assert_eq!(resolve_path(source, &["styles", "imgs", "StyledSvg"]), svg());
        assert_eq!(resolve_path(source, &["styles", "imgs", "Other"]), None);

        let nested = "import styled from 'styled-components';\nimport { Svg } from 'react-optimized-image';\nconst styles = { imgs: { StyledSvg: styled(Svg)`` } };\n";
        assert_eq!(resolve_path(nested, &["styles", "imgs", "StyledSvg"]), svg());
    }

    #[test]
    fn member_path_roots_respect_shadowing() {
        let source = "import { Svg } from 'react-optimized-image';\nconst styles = { Icon: Svg };\nfunction f(styles) { return <styles.Icon />; }\n";
        let parsed = parse_module(source, None).unwrap();
        let analysis = ModuleAnalysis::build(&parsed, None);
        let tag = analysis.tag_scope((source.find("<styles").unwrap() as u32).into());
        let path: Vec<SmolStr> = vec!["styles".into(), "Icon".into()];

        let mut resolver = Resolver::new(&NoopModuleLoader);
        assert_eq!(resolver.resolve_path(&analysis, tag, &path), None);
        assert_eq!(resolver.resolve_path(&analysis, ScopeTree::ROOT, &path), svg());
        assert_eq!(resolve_path("window.styles = { Icon: Svg };", &["window", "styles", "Icon"]), None);
    }

    #[test]
    fn namespace_members() {
        assert_eq!(
            resolve_path("import * as images from 'react-optimized-image';", &["images", "Svg"]),
            svg()
        );
        assert_eq!(
            resolve_path("const images = require('react-optimized-image');", &["images", "Svg"]),
            svg()
        );
    }

    #[test]
    fn relative_imports_without_a_file_are_unresolved() {
        assert_eq!(resolve("import { StyledSvg } from './styles';", "StyledSvg"), None);
    }
}
