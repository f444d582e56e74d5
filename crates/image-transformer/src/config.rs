//! Image configuration and the project-level `images.config` file.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use swc_common::{FileName, SourceMap};
use swc_ecma_ast::{
    AssignTarget, Expr, ExprStmt, Lit, MemberProp, ModuleDecl, ModuleItem, ObjectLit, Prop,
    PropOrSpread,
    SimpleAssignTarget, Stmt, UnaryOp,
};
use swc_ecma_parser::{parse_file_as_module, EsSyntax, Syntax};
use thiserror::Error;

use crate::analysis::declaration::{prop_name, str_value, unwrap_expr};

/// Per-image settings. Every field is optional so layers can be overlaid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub densities: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Vec<u32>>,
}

/// Boolean settings, in the order they are written as attributes.
pub const BOOLEAN_FIELDS: [&str; 4] = ["webp", "inline", "url", "original"];

/// Number-array settings, in the order they are written as attributes.
pub const ARRAY_FIELDS: [&str; 3] = ["sizes", "densities", "breakpoints"];

impl ImageConfig {
    /// Settings compiled into the package. Nothing is set; the fallbacks for
    /// `sizes` and `densities` are applied by [`Self::size_buckets`] and
    /// [`Self::density_list`].
    pub fn package_defaults() -> Self {
        Self::default()
    }

    /// Returns `self` with every field set in `higher` replaced.
    pub fn overlay(&self, higher: &ImageConfig) -> ImageConfig {
        ImageConfig {
            webp: higher.webp.or(self.webp),
            inline: higher.inline.or(self.inline),
            url: higher.url.or(self.url),
            original: higher.original.or(self.original),
            sizes: higher.sizes.clone().or_else(|| self.sizes.clone()),
            densities: higher.densities.clone().or_else(|| self.densities.clone()),
            breakpoints: higher
                .breakpoints
                .clone()
                .or_else(|| self.breakpoints.clone()),
        }
    }

    pub fn boolean(&self, field: &str) -> Option<bool> {
        match field {
            "webp" => self.webp,
            "inline" => self.inline,
            "url" => self.url,
            "original" => self.original,
            _ => None,
        }
    }

    pub fn set_boolean(&mut self, field: &str, value: bool) {
        match field {
            "webp" => self.webp = Some(value),
            "inline" => self.inline = Some(value),
            "url" => self.url = Some(value),
            "original" => self.original = Some(value),
            _ => {}
        }
    }

    pub fn array(&self, field: &str) -> Option<&[u32]> {
        match field {
            "sizes" => self.sizes.as_deref(),
            "densities" => self.densities.as_deref(),
            "breakpoints" => self.breakpoints.as_deref(),
            _ => None,
        }
    }

    pub fn set_array(&mut self, field: &str, value: Vec<u32>) {
        match field {
            "sizes" => self.sizes = Some(value),
            "densities" => self.densities = Some(value),
            "breakpoints" => self.breakpoints = Some(value),
            _ => {}
        }
    }

    /// Configured sizes, or `None` for the single "original" bucket.
    pub fn size_buckets(&self) -> Option<&[u32]> {
        self.sizes.as_deref().filter(|sizes| !sizes.is_empty())
    }

    /// Configured densities, `[1]` when absent or empty.
    pub fn density_list(&self) -> &[u32] {
        match self.densities.as_deref() {
            Some(densities) if !densities.is_empty() => densities,
            _ => &[1],
        }
    }
}

/// Project-wide defaults and named presets selected with the `type` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ImageConfig>,
    pub types: IndexMap<String, ImageConfig>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    #[diagnostic(code(optimized_image::config::read))]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}")]
    #[diagnostic(code(optimized_image::config::json))]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(code(optimized_image::config::parse))]
    Parse { path: Utf8PathBuf, message: String },

    #[error("{path}: {message}")]
    #[diagnostic(
        code(optimized_image::config::not_static),
        help("images.config.js must export a plain object literal")
    )]
    NotStatic { path: Utf8PathBuf, message: String },

    #[error("{path}: `{section}.{field}` must only contain positive integers, found {value}")]
    #[diagnostic(code(optimized_image::config::invalid_value))]
    InvalidValue {
        path: Utf8PathBuf,
        section: String,
        field: &'static str,
        value: u32,
    },

    #[error("{path} does not export a configuration object")]
    #[diagnostic(
        code(optimized_image::config::missing_export),
        help("use `module.exports = {{ ... }}` or `export default {{ ... }}`")
    )]
    MissingExport { path: Utf8PathBuf },
}

impl GlobalConfig {
    /// File names looked up in the project root, in order.
    pub const FILE_NAMES: [&'static str; 2] = ["images.config.json", "images.config.js"];

    /// Loads the configuration from `root`. A project without a config file
    /// gets an empty configuration.
    pub fn load(root: &Utf8Path) -> Result<Self, ConfigError> {
        for name in Self::FILE_NAMES {
            let path = root.join(name);
            if path.is_file() {
                return Self::load_file(&path);
            }
        }
        tracing::debug!(%root, "no images.config found");
        Ok(Self::default())
    }

    /// Loads a JSON (`.json`) or JavaScript configuration file.
    pub fn load_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = if path.extension() == Some("json") {
            Self::from_json(path, &content)?
        } else {
            Self::from_js(path, &content)?
        };
        tracing::debug!(%path, types = config.types.len(), "loaded image configuration");
        Ok(config)
    }

    pub fn from_json(path: &Utf8Path, content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Reads `module.exports = {...}` or `export default {...}` without
    /// evaluating the file.
    pub fn from_js(path: &Utf8Path, content: &str) -> Result<Self, ConfigError> {
        let cm: Arc<SourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Custom(path.to_string()).into(), content.to_string());
        let module = parse_file_as_module(
            &fm,
            Syntax::Es(EsSyntax::default()),
            swc_ecma_ast::EsVersion::Es2022,
            None,
            &mut Vec::new(),
        )
        .map_err(|err| ConfigError::Parse {
            path: path.to_owned(),
            message: err.kind().msg().into_owned(),
        })?;

        let object = module
            .body
            .iter()
            .find_map(exported_object)
            .ok_or_else(|| ConfigError::MissingExport {
                path: path.to_owned(),
            })?;
        let value = object_to_json(object).map_err(|message| ConfigError::NotStatic {
            path: path.to_owned(),
            message,
        })?;
        let config: Self = serde_json::from_value(value).map_err(|source| ConfigError::Json {
            path: path.to_owned(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Checks that `sizes`, `densities` and `breakpoints` hold no zeros.
    pub fn validate(&self, path: &Utf8Path) -> Result<(), ConfigError> {
        let sections = self
            .default
            .iter()
            .map(|config| ("default".to_string(), config))
            .chain(
                self.types
                    .iter()
                    .map(|(name, config)| (format!("types.{name}"), config)),
            );
        for (section, config) in sections {
            for field in ARRAY_FIELDS {
                let invalid = config
                    .array(field)
                    .and_then(|values| values.iter().find(|value| **value == 0));
                if let Some(&value) = invalid {
                    return Err(ConfigError::InvalidValue {
                        path: path.to_owned(),
                        section,
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Names accepted by the `type` attribute.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// The global layer for a tag: `default` overlaid with the selected type.
    pub fn layer(&self, type_name: Option<&str>) -> ImageConfig {
        let base = self.default.clone().unwrap_or_default();
        match type_name.and_then(|name| self.types.get(name)) {
            Some(preset) => base.overlay(preset),
            None => base,
        }
    }
}

fn exported_object(item: &ModuleItem) -> Option<&ObjectLit> {
    let expr = match item {
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => &export.expr,
        ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) => {
            let Expr::Assign(assign) = expr.as_ref() else {
                return None;
            };
            let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left else {
                return None;
            };
            let is_module_exports = matches!(member.obj.as_ref(), Expr::Ident(obj) if &*obj.sym == "module")
                && matches!(&member.prop, MemberProp::Ident(prop) if &*prop.sym == "exports");
            if !is_module_exports {
                return None;
            }
            &assign.right
        }
        _ => return None,
    };
    match unwrap_expr(expr) {
        Expr::Object(object) => Some(object),
        _ => None,
    }
}

fn object_to_json(object: &ObjectLit) -> Result<Value, String> {
    let mut map = Map::new();
    for prop in &object.props {
        let PropOrSpread::Prop(prop) = prop else {
            return Err("spread properties are not supported".to_string());
        };
        let Prop::KeyValue(kv) = prop.as_ref() else {
            return Err("only `key: value` properties are supported".to_string());
        };
        let key = prop_name(&kv.key).ok_or_else(|| "computed keys are not supported".to_string())?;
        map.insert(key.to_string(), expr_to_json(&kv.value)?);
    }
    Ok(Value::Object(map))
}

fn expr_to_json(expr: &Expr) -> Result<Value, String> {
    match unwrap_expr(expr) {
        Expr::Object(object) => object_to_json(object),
        Expr::Array(array) => array
            .elems
            .iter()
            .flatten()
            .map(|elem| {
                if elem.spread.is_some() {
                    Err("spread elements are not supported".to_string())
                } else {
                    expr_to_json(&elem.expr)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Lit(Lit::Str(s)) => Ok(Value::String(
            str_value(s).map(|value| value.to_string()).unwrap_or_default(),
        )),
        Expr::Lit(Lit::Bool(b)) => Ok(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Ok(Value::Null),
        Expr::Lit(Lit::Num(n)) => number(n.value),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match unwrap_expr(&unary.arg) {
            Expr::Lit(Lit::Num(n)) => number(-n.value),
            _ => Err("only literal values are supported".to_string()),
        },
        _ => Err("only literal values are supported".to_string()),
    }
}

fn number(value: f64) -> Result<Value, String> {
    if value.fract() == 0.0 && value.abs() < u32::MAX as f64 {
        return Ok(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("{value} is not a finite number"))
}
