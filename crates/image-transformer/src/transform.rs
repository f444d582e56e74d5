//! The per-file rewrite: find qualifying tags, resolve their components and
//! collect the text edits of each rule.

use std::sync::Arc;

use camino::Utf8PathBuf;
use serde::Serialize;
use smol_str::SmolStr;
use source_edit::{EditSet, OffsetMap, Span};
use swc_ecma_ast::{Expr, JSXElement, JSXElementName, JSXMemberExpr, JSXObject};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::{debug, trace};

use crate::analysis::declaration::{is_require, unwrap_expr};
use crate::analysis::{DeclKind, ModuleAnalysis, ScopeId};
use crate::attributes::AttributeReader;
use crate::component::ComponentKind;
use crate::config::GlobalConfig;
use crate::error::TransformError;
use crate::loader::{FsModuleLoader, ModuleLoader};
use crate::location::ResourceLocation;
use crate::parse::{parse_module, SourceText};
use crate::resolve::{ResolvedExport, Resolver};
use crate::synthesize::{
    rewrite_img, rewrite_svg, Tag, UrlPolicy, MARKER_ATTRIBUTE, SOURCE_ATTRIBUTE,
};

/// File extensions a resource location may name.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "svg", "gif", "webp"];

/// Options for [`transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Path of the input. Needed to follow relative imports and to pick the
    /// TypeScript or JavaScript grammar.
    pub filename: Option<Utf8PathBuf>,
    pub config: Arc<GlobalConfig>,
    pub url_policy: UrlPolicy,
}

/// A tag that was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewrittenTag {
    pub kind: ComponentKind,
    /// The opening element in the input.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub code: String,
    pub offsets: OffsetMap,
    pub tags: Vec<RewrittenTag>,
}

impl TransformResult {
    /// Returns true if at least one tag was rewritten.
    pub fn changed(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Rewrites every qualifying tag in `source`, following relative imports on
/// disk.
pub fn transform(source: &str, options: &TransformOptions) -> Result<TransformResult, TransformError> {
    transform_with_loader(source, options, &FsModuleLoader::new())
}

/// Like [`transform`], with a caller-provided module loader.
pub fn transform_with_loader(
    source: &str,
    options: &TransformOptions,
    loader: &dyn ModuleLoader,
) -> Result<TransformResult, TransformError> {
    let parsed = parse_module(source, options.filename.as_deref())?;
    let analysis = ModuleAnalysis::build(&parsed, options.filename.clone());

    let mut rewriter = TagRewriter {
        text: &parsed.text,
        analysis: &analysis,
        resolver: Resolver::new(loader),
        options,
        edits: EditSet::new(),
        tags: Vec::new(),
        error: None,
    };
    parsed.module.visit_with(&mut rewriter);

    if let Some(err) = rewriter.error {
        return Err(err);
    }

    let applied = rewriter.edits.apply(source)?;
    debug!(
        file = options.filename.as_ref().map(|f| f.as_str()).unwrap_or("<input>"),
        tags = rewriter.tags.len(),
        edits = rewriter.edits.len(),
        "transformed module"
    );
    Ok(TransformResult {
        code: applied.code,
        offsets: applied.offsets,
        tags: rewriter.tags,
    })
}

struct TagRewriter<'a, 's, 'l> {
    text: &'a SourceText<'s>,
    analysis: &'a ModuleAnalysis,
    resolver: Resolver<'l>,
    options: &'a TransformOptions,
    edits: EditSet,
    tags: Vec<RewrittenTag>,
    error: Option<TransformError>,
}

impl TagRewriter<'_, '_, '_> {
    fn rewrite(&mut self, element: &JSXElement) -> Result<(), TransformError> {
        let opening = &element.opening;
        let attrs = AttributeReader::new(opening, self.text);
        if attrs.has(MARKER_ATTRIBUTE) {
            return Ok(());
        }

        let span = self.text.span(opening.span);
        let scope = self.analysis.tag_scope(span.start);
        let Some(location) = self.source_location(&attrs, scope) else {
            return Ok(());
        };
        if !names_image(location.trailing()) {
            trace!(location = location.trailing(), "not an image resource");
            return Ok(());
        }

        let Some(export) = self.resolve_name(&opening.name, scope) else {
            return Ok(());
        };
        let kind = ComponentKind::classify(&export);
        let tag = Tag::new(opening, self.text, location);
        let edits = match kind {
            ComponentKind::Img => {
                rewrite_img(&tag, &self.options.config, self.options.url_policy)?
            }
            ComponentKind::Svg => rewrite_svg(&tag),
            ComponentKind::None => return Ok(()),
        };

        trace!(%kind, start = u32::from(span.start), "rewriting tag");
        self.edits.extend(edits);
        self.tags.push(RewrittenTag { kind, span });
        Ok(())
    }

    /// The location behind `src={require(...)}` or `src={importedImage}`.
    fn source_location(
        &self,
        attrs: &AttributeReader<'_, '_>,
        scope: ScopeId,
    ) -> Option<ResourceLocation> {
        match unwrap_expr(attrs.expression(SOURCE_ATTRIBUTE)?) {
            Expr::Call(call) if is_require(call) => {
                let arg = call.args.first().filter(|arg| arg.spread.is_none())?;
                ResourceLocation::from_expr(&arg.expr, self.text)
            }
            Expr::Ident(ident) => {
                let scopes = self.analysis.scopes();
                let declaration = scopes.declaration(scopes.lookup(scope, ident.sym.as_str())?)?;
                match &declaration.kind {
                    DeclKind::Import { module, quote, .. } => {
                        Some(ResourceLocation::literal(module.as_str(), *quote))
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn resolve_name(&mut self, name: &JSXElementName, scope: ScopeId) -> Option<ResolvedExport> {
        match name {
            JSXElementName::Ident(ident) => {
                self.resolver
                    .resolve_identifier(self.analysis, scope, ident.sym.as_str())
            }
            JSXElementName::JSXMemberExpr(member) => {
                let path = jsx_member_path(member)?;
                self.resolver.resolve_path(self.analysis, scope, &path)
            }
            JSXElementName::JSXNamespacedName(_) => None,
        }
    }
}

impl Visit for TagRewriter<'_, '_, '_> {
    fn visit_jsx_element(&mut self, element: &JSXElement) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.rewrite(element) {
            self.error = Some(err);
            return;
        }
        element.visit_children_with(self);
    }
}

/// `<a.b.C>` as `["a", "b", "C"]`.
fn jsx_member_path(member: &JSXMemberExpr) -> Option<Vec<SmolStr>> {
    let mut path = match &member.obj {
        JSXObject::Ident(ident) => vec![SmolStr::new(ident.sym.as_str())],
        JSXObject::JSXMemberExpr(inner) => jsx_member_path(inner)?,
    };
    path.push(SmolStr::new(member.prop.sym.as_str()));
    Some(path)
}

/// True if `trailing` is empty or its path part names an image file.
fn names_image(trailing: &str) -> bool {
    if trailing.is_empty() {
        return true;
    }
    let path = trailing.split_once('?').map_or(trailing, |(path, _)| path);
    let Some((_, extension)) = path.rsplit_once('.') else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|image| extension.eq_ignore_ascii_case(image))
}
