//! Resource locations: the path argument of `require(...)`.

use swc_ecma_ast::{BinaryOp, Expr, Lit};

use crate::analysis::declaration::{str_value, unwrap_expr};
use crate::parse::SourceText;
use crate::query::{merge_into_path, Query};

/// The syntactic shape of a location. Only the trailing literal text is
/// ever rewritten; everything before it is kept as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationShape {
    /// `'./a.png'`
    Literal,
    /// `'./' + name + '.png'`
    Concatenation,
    /// `` `./${name}.png` ``
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    shape: LocationShape,
    /// Source text before the trailing literal, including any opening quote
    /// for templates.
    prefix: String,
    /// Source text after the trailing literal, e.g. the `)` of a
    /// parenthesized last operand.
    suffix: String,
    /// The trailing literal: the string value for literals and
    /// concatenations, the raw text for templates.
    trailing: String,
    /// Quote character for string literals.
    quote: char,
}

impl ResourceLocation {
    /// A single string literal.
    pub fn literal(path: impl Into<String>, quote: char) -> Self {
        Self {
            shape: LocationShape::Literal,
            prefix: String::new(),
            suffix: String::new(),
            trailing: path.into(),
            quote,
        }
    }

    /// Reads a location from the first argument of a `require` call.
    ///
    /// Returns `None` for shapes that have no trailing literal.
    pub fn from_expr(expr: &Expr, text: &SourceText<'_>) -> Option<Self> {
        match unwrap_expr(expr) {
            Expr::Lit(Lit::Str(s)) => Some(Self::literal(
                str_value(s)?.as_str(),
                quote_of(text.slice(s.span)),
            )),
            Expr::Bin(bin) if bin.op == BinaryOp::Add => {
                let Expr::Lit(Lit::Str(right)) = unwrap_expr(&bin.right) else {
                    return None;
                };
                let outer = text.span(bin.span);
                let literal = text.span(right.span);
                let source = text.source();
                let prefix = source.get(usize::from(outer.start)..usize::from(literal.start))?;
                let suffix = source.get(usize::from(literal.end)..usize::from(outer.end))?;
                Some(Self {
                    shape: LocationShape::Concatenation,
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                    trailing: str_value(right)?.to_string(),
                    quote: quote_of(text.slice(right.span)),
                })
            }
            Expr::Tpl(tpl) => {
                let last = tpl.quasis.last()?;
                let raw = last.raw.as_str();
                let source = text.slice(tpl.span);
                // The last quasi is followed only by the closing backtick.
                let prefix_len = source.len().checked_sub(raw.len() + 1)?;
                let prefix = source.get(..prefix_len)?;
                Some(Self {
                    shape: LocationShape::Template,
                    prefix: prefix.to_string(),
                    suffix: String::new(),
                    trailing: raw.to_string(),
                    quote: '`',
                })
            }
            _ => None,
        }
    }

    pub fn shape(&self) -> LocationShape {
        self.shape
    }

    /// The trailing literal text, including any query string.
    pub fn trailing(&self) -> &str {
        &self.trailing
    }

    /// Returns a copy with `query` merged into the trailing literal.
    pub fn with_query(&self, query: &Query) -> Self {
        Self {
            trailing: merge_into_path(&self.trailing, query),
            ..self.clone()
        }
    }

    /// Renders the location as an expression.
    pub fn render(&self) -> String {
        match self.shape {
            LocationShape::Literal => quote(&self.trailing, self.quote),
            LocationShape::Concatenation => format!(
                "{}{}{}",
                self.prefix,
                quote(&self.trailing, self.quote),
                self.suffix
            ),
            LocationShape::Template => format!("{}{}`", self.prefix, self.trailing),
        }
    }

    /// Renders `require(<location>)`.
    pub fn render_require(&self) -> String {
        format!("require({})", self.render())
    }
}

fn quote_of(raw: &str) -> char {
    match raw.chars().next() {
        Some('"') => '"',
        _ => '\'',
    }
}

fn quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
