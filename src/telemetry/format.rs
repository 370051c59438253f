//! Composite message formatting.
//!
//! Templates use positional placeholders of the form
//! `{index[,alignment][:specifier]}`; literal braces are written `{{` and
//! `}}`. Numeric specifiers honour the separators of the supplied
//! [`Culture`], falling back to [`Culture::invariant`].
//!
//! | Specifier | Applies to | Result for `1234.5` / `42` (invariant) |
//! |-----------|------------|----------------------------------------|
//! | `N<p>`    | numbers    | `1,234.50`                             |
//! | `F<p>`    | numbers    | `1234.50`                              |
//! | `P<p>`    | numbers    | `123,450.00%`                          |
//! | `D<w>`    | integers   | `0042` with `D4`                       |
//! | `X<w>`    | integers   | `2A`                                   |
//!
//! Strings and booleans ignore the specifier. Alignments, widths and
//! precisions above [`MAX_WIDTH`] are rejected.

use std::fmt;

use crate::telemetry::error::FormatError;

/// Largest accepted alignment, width or precision
pub const MAX_WIDTH: usize = u16::MAX as usize;

/// Number separators used when rendering numeric arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Culture {
    name: String,
    decimal_separator: char,
    group_separator: char,
}

impl Culture {
    pub fn new(name: impl Into<String>, decimal_separator: char, group_separator: char) -> Self {
        Self {
            name: name.into(),
            decimal_separator,
            group_separator,
        }
    }

    pub fn invariant() -> Self {
        Self::new("", '.', ',')
    }

    pub fn en_us() -> Self {
        Self::new("en-US", '.', ',')
    }

    pub fn de_de() -> Self {
        Self::new("de-DE", ',', '.')
    }

    pub fn fr_fr() -> Self {
        Self::new("fr-FR", ',', '\u{a0}')
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    pub fn group_separator(&self) -> char {
        self.group_separator
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

/// A single positional argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl Arg {
    /// Capture any displayable value as a string argument
    pub fn display(value: impl fmt::Display) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<char> for Arg {
    fn from(value: char) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

macro_rules! arg_from_int {
    ($variant:ident, $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Arg {
                fn from(value: $source) -> Self {
                    Self::$variant(value as $target)
                }
            }
        )*
    };
}

arg_from_int!(Int, i64: i8, i16, i32, i64, isize);
arg_from_int!(UInt, u64: u8, u16, u32, u64, usize);

/// Positional arguments for a log call.
///
/// Implemented for `()` and tuples of up to three values (the convenience
/// arities), and for slices and vectors of [`Arg`] when more are needed.
pub trait FormatArgs {
    fn into_args(self) -> Vec<Arg>;
}

impl FormatArgs for () {
    fn into_args(self) -> Vec<Arg> {
        Vec::new()
    }
}

impl<A: Into<Arg>> FormatArgs for (A,) {
    fn into_args(self) -> Vec<Arg> {
        vec![self.0.into()]
    }
}

impl<A: Into<Arg>, B: Into<Arg>> FormatArgs for (A, B) {
    fn into_args(self) -> Vec<Arg> {
        vec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Arg>, B: Into<Arg>, C: Into<Arg>> FormatArgs for (A, B, C) {
    fn into_args(self) -> Vec<Arg> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

impl FormatArgs for Vec<Arg> {
    fn into_args(self) -> Vec<Arg> {
        self
    }
}

impl FormatArgs for &[Arg] {
    fn into_args(self) -> Vec<Arg> {
        self.to_vec()
    }
}

/// Substitute `args` into `template`.
///
/// With no arguments the template is returned verbatim, so a plain message
/// containing braces is never rejected.
pub fn format_message(
    culture: Option<&Culture>,
    template: &str,
    args: &[Arg],
) -> Result<String, FormatError> {
    if args.is_empty() {
        return Ok(template.to_string());
    }

    let invariant = Culture::invariant();
    let culture = culture.unwrap_or(&invariant);

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut body = String::new();
                let mut closed = false;
                for (inner_pos, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(FormatError::InvalidPlaceholder { position: inner_pos }),
                        _ => body.push(inner),
                    }
                }
                if !closed {
                    return Err(FormatError::UnbalancedBrace { position: pos });
                }

                let placeholder = Placeholder::parse(&body, pos)?;
                let arg = args.get(placeholder.index).ok_or(FormatError::MissingArgument {
                    index: placeholder.index,
                    supplied: args.len(),
                })?;
                let rendered = render(arg, placeholder.spec, culture, placeholder.index)?;
                pad(&mut out, &rendered, placeholder.alignment);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(FormatError::UnbalancedBrace { position: pos });
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

struct Placeholder<'a> {
    index: usize,
    alignment: i32,
    spec: Option<&'a str>,
}

impl<'a> Placeholder<'a> {
    fn parse(body: &'a str, position: usize) -> Result<Self, FormatError> {
        let invalid = || FormatError::InvalidPlaceholder { position };

        let (head, spec) = match body.split_once(':') {
            Some((head, spec)) => (head, Some(spec)),
            None => (body, None),
        };
        let (index, alignment) = match head.split_once(',') {
            Some((index, alignment)) => (index, Some(alignment)),
            None => (head, None),
        };

        let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
        let alignment = match alignment {
            Some(a) => a.trim().parse::<i32>().map_err(|_| invalid())?,
            None => 0,
        };
        if alignment.unsigned_abs() as usize > MAX_WIDTH {
            return Err(invalid());
        }

        Ok(Self {
            index,
            alignment,
            spec: spec.filter(|s| !s.is_empty()),
        })
    }
}

fn pad(out: &mut String, value: &str, alignment: i32) {
    let width = alignment.unsigned_abs() as usize;
    let len = value.chars().count();
    let fill = width.saturating_sub(len);

    if alignment < 0 {
        out.push_str(value);
        out.extend(std::iter::repeat(' ').take(fill));
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(value);
    }
}

fn render(arg: &Arg, spec: Option<&str>, culture: &Culture, index: usize) -> Result<String, FormatError> {
    let spec = match (arg, spec) {
        (Arg::Str(s), _) => return Ok(s.clone()),
        (Arg::Bool(b), _) => return Ok(b.to_string()),
        (_, None) => return Ok(render_plain(arg, culture)),
        (_, Some(spec)) => spec,
    };

    let invalid = || FormatError::InvalidSpecifier {
        index,
        spec: spec.to_string(),
    };

    let mut chars = spec.chars();
    let kind = chars.next().ok_or_else(invalid)?;
    let digits = chars.as_str();
    let precision = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().map_err(|_| invalid())?)
    };
    if precision.is_some_and(|p| p > MAX_WIDTH) {
        return Err(invalid());
    }

    match kind.to_ascii_uppercase() {
        'N' => number(arg, precision.unwrap_or(2), Some(culture.group_separator), culture).ok_or_else(invalid),
        'F' => number(arg, precision.unwrap_or(2), None, culture).ok_or_else(invalid),
        'P' => {
            let scaled = match arg {
                Arg::Int(v) => Arg::Float(*v as f64 * 100.0),
                Arg::UInt(v) => Arg::Float(*v as f64 * 100.0),
                Arg::Float(v) => Arg::Float(v * 100.0),
                _ => return Err(invalid()),
            };
            number(&scaled, precision.unwrap_or(2), Some(culture.group_separator), culture)
                .map(|n| format!("{}%", n))
                .ok_or_else(invalid)
        }
        'D' => {
            let width = precision.unwrap_or(0);
            match arg {
                Arg::Int(v) if *v < 0 => Ok(format!("-{:0>width$}", v.unsigned_abs(), width = width)),
                Arg::Int(v) => Ok(format!("{:0>width$}", v, width = width)),
                Arg::UInt(v) => Ok(format!("{:0>width$}", v, width = width)),
                _ => Err(invalid()),
            }
        }
        'X' => {
            let width = precision.unwrap_or(0);
            let hex = match arg {
                Arg::Int(v) => format!("{:0>width$X}", v, width = width),
                Arg::UInt(v) => format!("{:0>width$X}", v, width = width),
                _ => return Err(invalid()),
            };
            Ok(if kind.is_ascii_lowercase() {
                hex.to_ascii_lowercase()
            } else {
                hex
            })
        }
        _ => Err(invalid()),
    }
}

fn render_plain(arg: &Arg, culture: &Culture) -> String {
    match arg {
        Arg::Str(s) => s.clone(),
        Arg::Bool(b) => b.to_string(),
        Arg::Int(v) => v.to_string(),
        Arg::UInt(v) => v.to_string(),
        Arg::Float(v) => v.to_string().replace('.', &culture.decimal_separator.to_string()),
    }
}

fn number(arg: &Arg, precision: usize, group: Option<char>, culture: &Culture) -> Option<String> {
    let (negative, integral, fraction) = match arg {
        Arg::Int(v) => (*v < 0, v.unsigned_abs().to_string(), "0".repeat(precision)),
        Arg::UInt(v) => (false, v.to_string(), "0".repeat(precision)),
        Arg::Float(v) if !v.is_finite() => return Some(v.to_string()),
        Arg::Float(v) => {
            let fixed = format!("{:.*}", precision, v.abs());
            let (integral, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
            let is_zero = integral.chars().chain(fraction.chars()).all(|c| c == '0');
            (*v < 0.0 && !is_zero, integral.to_string(), fraction.to_string())
        }
        _ => return None,
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    match group {
        Some(separator) => out.push_str(&group_digits(&integral, separator)),
        None => out.push_str(&integral),
    }
    if precision > 0 {
        out.push(culture.decimal_separator);
        out.push_str(&fraction);
    }
    Some(out)
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
