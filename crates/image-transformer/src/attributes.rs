//! Reading static attribute values from a JSX opening element.

use swc_common::Spanned;
use swc_ecma_ast::{
    Expr, JSXAttr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXExpr, JSXOpeningElement, Lit,
};

use crate::analysis::declaration::unwrap_expr;
use crate::error::{source_span, TransformError};
use crate::parse::SourceText;

/// Attribute accessors for one tag. The first attribute with a given name
/// wins; spread attributes are skipped.
pub struct AttributeReader<'a, 's> {
    attrs: &'a [JSXAttrOrSpread],
    text: &'a SourceText<'s>,
}

impl<'a, 's> AttributeReader<'a, 's> {
    pub fn new(opening: &'a JSXOpeningElement, text: &'a SourceText<'s>) -> Self {
        Self {
            attrs: &opening.attrs,
            text,
        }
    }

    pub fn find(&self, name: &str) -> Option<&'a JSXAttr> {
        self.attrs.iter().find_map(|attr| match attr {
            JSXAttrOrSpread::JSXAttr(attr) if attr_name(attr) == Some(name) => Some(attr),
            _ => None,
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The expression inside `name={...}`, if the attribute has one.
    pub fn expression(&self, name: &str) -> Option<&'a Expr> {
        match &self.find(name)?.value {
            Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                JSXExpr::Expr(expr) => Some(expr),
                JSXExpr::JSXEmptyExpr(_) => None,
            },
            _ => None,
        }
    }

    /// `name` alone is `true`, `name={true}` / `name={false}` are literal;
    /// anything else is an error.
    pub fn boolean(&self, name: &str) -> Result<Option<bool>, TransformError> {
        let Some(attr) = self.find(name) else {
            return Ok(None);
        };
        let Some(value) = &attr.value else {
            return Ok(Some(true));
        };
        match self.container_expr(value) {
            Some(Expr::Lit(Lit::Bool(b))) => Ok(Some(b.value)),
            _ => Err(TransformError::StaticBoolean {
                attribute: name.to_string(),
                span: source_span(self.text.span_of(value)),
            }),
        }
    }

    /// `name={[400, 800]}`. Holes are skipped; every element must be a
    /// positive integer literal.
    pub fn number_array(&self, name: &str) -> Result<Option<Vec<u32>>, TransformError> {
        let Some(attr) = self.find(name) else {
            return Ok(None);
        };
        let not_array = |span| TransformError::StaticNumberArray {
            attribute: name.to_string(),
            span: source_span(span),
        };
        let Some(value) = &attr.value else {
            return Err(not_array(self.text.span_of(attr)));
        };
        let Some(Expr::Array(array)) = self.container_expr(value) else {
            return Err(not_array(self.text.span_of(value)));
        };

        let mut numbers = Vec::with_capacity(array.elems.len());
        for (index, elem) in array.elems.iter().enumerate() {
            let Some(elem) = elem else {
                continue;
            };
            let span = source_span(self.text.span_of(&*elem.expr));
            let number = match (elem.spread, unwrap_expr(&elem.expr)) {
                (None, Expr::Lit(Lit::Num(number))) => number.value,
                _ => {
                    return Err(TransformError::StaticNumber {
                        attribute: name.to_string(),
                        index,
                        span,
                    })
                }
            };
            if number.fract() != 0.0 || number < 1.0 || number > f64::from(u32::MAX) {
                return Err(TransformError::NotPositiveInteger {
                    attribute: name.to_string(),
                    index,
                    span,
                });
            }
            numbers.push(number as u32);
        }
        Ok(Some(numbers))
    }

    /// `name="value"` where `value` must be one of `allowed`.
    pub fn enumerated<'v>(
        &self,
        name: &str,
        allowed: impl IntoIterator<Item = &'v str>,
    ) -> Result<Option<String>, TransformError> {
        let Some(attr) = self.find(name) else {
            return Ok(None);
        };
        let not_string = |span| TransformError::StaticString {
            attribute: name.to_string(),
            span: source_span(span),
        };
        let Some(value) = &attr.value else {
            return Err(not_string(self.text.span_of(attr)));
        };
        let literal = match value {
            JSXAttrValue::JSXExprContainer(_)
            | JSXAttrValue::JSXElement(_)
            | JSXAttrValue::JSXFragment(_) => None,
            other => unquote(self.text.slice(other.span())),
        };
        let Some(literal) = literal else {
            return Err(not_string(self.text.span_of(value)));
        };

        let allowed: Vec<&str> = allowed.into_iter().collect();
        if allowed.contains(&literal) {
            Ok(Some(literal.to_string()))
        } else {
            Err(TransformError::UnknownType {
                name: literal.to_string(),
                known: if allowed.is_empty() {
                    "none".to_string()
                } else {
                    allowed.join(", ")
                },
                span: source_span(self.text.span_of(value)),
            })
        }
    }

    fn container_expr(&self, value: &'a JSXAttrValue) -> Option<&'a Expr> {
        match value {
            JSXAttrValue::JSXExprContainer(container) => match &container.expr {
                JSXExpr::Expr(expr) => Some(unwrap_expr(expr)),
                JSXExpr::JSXEmptyExpr(_) => None,
            },
            _ => None,
        }
    }
}

pub fn attr_name(attr: &JSXAttr) -> Option<&str> {
    match &attr.name {
        JSXAttrName::Ident(ident) => Some(ident.sym.as_str()),
        JSXAttrName::JSXNamespacedName(_) => None,
    }
}

/// Strips the quotes of a JSX string attribute value.
fn unquote(raw: &str) -> Option<&str> {
    let quote = raw.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    raw.strip_prefix(quote)?.strip_suffix(quote)
}
