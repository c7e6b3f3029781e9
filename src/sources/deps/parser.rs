//! Restricted parser for gclient `DEPS` files.
//!
//! A `DEPS` file is written in Python syntax, but only a literal subset of
//! it carries the information we need. This parser accepts exactly that
//! subset and never evaluates anything:
//!
//! - top-level `name = expr` assignments
//! - string, integer, `True`/`False`/`None` literals
//! - lists, tuples and dicts with string keys
//! - `+` concatenation and implicit adjacent-literal concatenation of strings
//! - `Var('name')` lookups into the previously assigned `vars` dict
//! - `Str('...')` wrappers
//!
//! Anything else is rejected with the line it appears on.

use crate::core::error::PipelineError;

/// A literal value from a `DEPS` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepsValue {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
    List(Vec<DepsValue>),
    /// Key order is preserved.
    Dict(Vec<(String, DepsValue)>),
}

impl DepsValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DepsValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(String, DepsValue)]> {
        match self {
            DepsValue::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            DepsValue::Str(s) => !s.is_empty(),
            DepsValue::Int(n) => *n != 0,
            DepsValue::Bool(b) => *b,
            DepsValue::None => false,
            DepsValue::List(items) => !items.is_empty(),
            DepsValue::Dict(entries) => !entries.is_empty(),
        }
    }
}

/// Look up a key in a dict's entries.
pub fn dict_get<'a>(entries: &'a [(String, DepsValue)], key: &str) -> Option<&'a DepsValue> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Punct(char),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
}

fn error(line: usize, message: impl Into<String>) -> PipelineError {
    PipelineError::ManifestParse {
        line,
        message: message.into(),
    }
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, PipelineError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = line;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(c) => value.push(c),
                            None => return Err(error(start, "unterminated string")),
                        },
                        Some('\n') | None => return Err(error(start, "unterminated string")),
                        Some(c) => value.push(c),
                    }
                }
                tokens.push(Spanned {
                    token: Token::Str(value),
                    line: start,
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                let value = text
                    .parse()
                    .map_err(|_| error(line, format!("invalid number `{}`", text)))?;
                tokens.push(Spanned {
                    token: Token::Int(value),
                    line,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Ident(ident),
                    line,
                });
            }
            '{' | '}' | '[' | ']' | '(' | ')' | ',' | ':' | '=' | '+' | ';' => {
                tokens.push(Spanned {
                    token: Token::Punct(c),
                    line,
                });
                chars.next();
            }
            other => return Err(error(line, format!("unexpected character `{}`", other))),
        }
    }

    Ok(tokens)
}

/// Parse the top-level assignments of a `DEPS` file, in file order.
pub fn parse(src: &str) -> Result<Vec<(String, DepsValue)>, PipelineError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        vars: Vec::new(),
    };
    parser.parse_file()
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    vars: Vec<(String, DepsValue)>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        self.pos += 1;
        token
    }

    fn expect(&mut self, punct: char) -> Result<(), PipelineError> {
        let line = self.line();
        match self.next() {
            Some(Token::Punct(c)) if c == punct => Ok(()),
            other => Err(error(line, format!("expected `{}`, found {:?}", punct, other))),
        }
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_file(&mut self) -> Result<Vec<(String, DepsValue)>, PipelineError> {
        let mut assignments = Vec::new();

        while self.peek().is_some() {
            if self.eat(';') {
                continue;
            }
            let line = self.line();
            let name = match self.next() {
                Some(Token::Ident(name)) => name,
                other => return Err(error(line, format!("expected assignment, found {:?}", other))),
            };
            self.expect('=')?;
            let value = self.parse_expr()?;

            if name == "vars" {
                if let DepsValue::Dict(ref entries) = value {
                    self.vars = entries.clone();
                }
            }
            assignments.push((name, value));
        }

        Ok(assignments)
    }

    fn parse_expr(&mut self) -> Result<DepsValue, PipelineError> {
        let mut value = self.parse_primary()?;

        loop {
            let line = self.line();
            let explicit = self.eat('+');
            let adjacent = !explicit && matches!(self.peek(), Some(Token::Str(_)));
            if !explicit && !adjacent {
                break;
            }

            let rhs = self.parse_primary()?;
            value = match (value, rhs) {
                (DepsValue::Str(mut lhs), DepsValue::Str(rhs)) => {
                    lhs.push_str(&rhs);
                    DepsValue::Str(lhs)
                }
                _ => return Err(error(line, "only strings can be concatenated")),
            };
        }

        Ok(value)
    }

    fn parse_primary(&mut self) -> Result<DepsValue, PipelineError> {
        let line = self.line();
        match self.next() {
            Some(Token::Str(s)) => Ok(DepsValue::Str(s)),
            Some(Token::Int(n)) => Ok(DepsValue::Int(n)),
            Some(Token::Punct('{')) => self.parse_dict(),
            Some(Token::Punct('[')) => Ok(DepsValue::List(self.parse_seq(']')?.0)),
            Some(Token::Punct('(')) => {
                // `(expr)` groups, `(expr,)` is a one-element tuple.
                let (mut items, trailing_comma) = self.parse_seq(')')?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(DepsValue::List(items))
                }
            }
            Some(Token::Ident(ident)) => match ident.as_str() {
                "True" => Ok(DepsValue::Bool(true)),
                "False" => Ok(DepsValue::Bool(false)),
                "None" => Ok(DepsValue::None),
                "Var" => {
                    let name = self.parse_call_arg(line)?;
                    dict_get(&self.vars, &name)
                        .cloned()
                        .ok_or_else(|| error(line, format!("undefined var `{}`", name)))
                }
                "Str" => Ok(DepsValue::Str(self.parse_call_arg(line)?)),
                other => Err(error(line, format!("unsupported expression `{}`", other))),
            },
            other => Err(error(line, format!("unexpected token {:?}", other))),
        }
    }

    fn parse_call_arg(&mut self, line: usize) -> Result<String, PipelineError> {
        self.expect('(')?;
        let arg = match self.parse_expr()? {
            DepsValue::Str(s) => s,
            _ => return Err(error(line, "expected a string argument")),
        };
        self.expect(')')?;
        Ok(arg)
    }

    fn parse_seq(&mut self, close: char) -> Result<(Vec<DepsValue>, bool), PipelineError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while !self.eat(close) {
            items.push(self.parse_expr()?);
            trailing_comma = self.eat(',');
            if !trailing_comma {
                self.expect(close)?;
                break;
            }
        }
        Ok((items, trailing_comma))
    }

    fn parse_dict(&mut self) -> Result<DepsValue, PipelineError> {
        let mut entries: Vec<(String, DepsValue)> = Vec::new();
        while !self.eat('}') {
            let line = self.line();
            let key = match self.parse_expr()? {
                DepsValue::Str(key) => key,
                _ => return Err(error(line, "dict keys must be strings")),
            };
            self.expect(':')?;
            let value = self.parse_expr()?;

            // Later keys replace earlier ones, as in a Python dict literal.
            if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                entries.push((key, value));
            }

            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
        }
        Ok(DepsValue::Dict(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literals() {
        let src = r#"
use_relative_paths = True
count = 3
nothing = None
names = ['a', "b",]
pair = ('x', 'y')
grouped = ('x' + 'y')
"#;
        let parsed = parse(src).unwrap();
        assert_eq!(parsed[0], ("use_relative_paths".into(), DepsValue::Bool(true)));
        assert_eq!(parsed[1].1, DepsValue::Int(3));
        assert_eq!(parsed[2].1, DepsValue::None);
        assert_eq!(
            parsed[3].1,
            DepsValue::List(vec![DepsValue::Str("a".into()), DepsValue::Str("b".into())])
        );
        assert_eq!(
            parsed[4].1,
            DepsValue::List(vec![DepsValue::Str("x".into()), DepsValue::Str("y".into())])
        );
        assert_eq!(parsed[5].1, DepsValue::Str("xy".into()));
    }

    #[test]
    fn test_var_and_concatenation() {
        let src = r#"
vars = {
  # Comment lines are ignored.
  'chromium_url': 'https://chromium.googlesource.com',
  'build_revision': 'abc123',
}
deps = {
  'v8/build':
    Var('chromium_url') + '/chromium/src/build.git' + '@' + Var('build_revision'),
}
"#;
        let parsed = parse(src).unwrap();
        let deps = parsed[1].1.as_dict().unwrap();
        assert_eq!(
            deps[0].1.as_str(),
            Some("https://chromium.googlesource.com/chromium/src/build.git@abc123")
        );
    }

    #[test]
    fn test_adjacent_strings_and_str_wrapper() {
        let src = "vars = { 'a': Str('one') }\nb = 'x' 'y' + Var('a')\n";
        let parsed = parse(src).unwrap();
        assert_eq!(parsed[1].1.as_str(), Some("xyone"));
    }

    #[test]
    fn test_undefined_var() {
        let err = parse("deps = { 'a': Var('missing') }").unwrap_err();
        assert!(err.to_string().contains("undefined var `missing`"));
    }

    #[test]
    fn test_rejects_code() {
        assert!(parse("import os").is_err());
        assert!(parse("deps = __import__('os').system('rm -rf /')").is_err());
        assert!(parse("deps = { 'a': open('x').read() }").is_err());
        assert!(parse("deps = [x for x in y]").is_err());
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse("a = 'x'\nb = {\n  'k': lambda: 1,\n}\n").unwrap_err();
        assert!(matches!(err, PipelineError::ManifestParse { line: 3, .. }));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse("a = 'oops\n").is_err());
    }
}
