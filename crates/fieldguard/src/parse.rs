//! Annotation compiler
//!
//! Turns annotation text such as `dict[int | str, str]` or
//! `Optional[tuple[int, ...]]` into a [`TypeExpr`] once, when a schema is
//! defined. Names the engine has no rule for become
//! [`TypeExpr::Unsupported`]. `Annotated[...]` cannot be written as text
//! since constraints are values; attach them with [`TypeExpr::with`].

use crate::errors::ConfigError;
use crate::types::TypeExpr;
use once_cell::sync::Lazy;
use regex::Regex;

/// Deepest bracket nesting accepted
const MAX_NESTING: usize = 64;

/// One token: ellipsis, dotted identifier, or punctuation
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(\.\.\.)|([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)|([\[\],|]))").unwrap()
});

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Ellipsis,
    Open,
    Close,
    Comma,
    Pipe,
}

impl TypeExpr {
    /// Compile annotation text into a type expression
    ///
    /// ```
    /// use fieldguard::TypeExpr;
    ///
    /// let expr = TypeExpr::parse("dict[int | str, str]").unwrap();
    /// assert_eq!(expr.to_string(), "mapping[integer | string, string]");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        Parser::new(input)?.parse()
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ConfigError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while !input[pos..].trim_start().is_empty() {
        let Some(caps) = TOKEN_REGEX.captures(&input[pos..]) else {
            let offset = pos + (input[pos..].len() - input[pos..].trim_start().len());
            return Err(parse_error(input, offset, "unexpected character"));
        };
        let whole = caps.get(0).map_or(0, |m| m.end());
        let start = pos + whole - caps.iter().skip(1).flatten().map(|m| m.len()).sum::<usize>();

        let token = if caps.get(1).is_some() {
            Token::Ellipsis
        } else if let Some(name) = caps.get(2) {
            Token::Name(name.as_str().to_string())
        } else {
            match caps.get(3).map(|m| m.as_str()) {
                Some("[") => Token::Open,
                Some("]") => Token::Close,
                Some(",") => Token::Comma,
                _ => Token::Pipe,
            }
        };

        tokens.push((start, token));
        pos += whole;
    }

    Ok(tokens)
}

fn parse_error(input: &str, position: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        input: input.to_string(),
        position,
        message: message.into(),
    }
}

/// Argument inside brackets; `...` is only meaningful for tuples
enum Arg {
    Expr(TypeExpr),
    Ellipsis,
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, ConfigError> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            cursor: 0,
            depth: 0,
        })
    }

    fn parse(mut self) -> Result<TypeExpr, ConfigError> {
        let expr = self.union()?;
        if let Some((pos, _)) = self.tokens.get(self.cursor) {
            return Err(parse_error(self.input, *pos, "unexpected trailing input"));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, t)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.input.len(), |(pos, _)| *pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|(_, t)| t.clone());
        self.cursor += 1;
        token
    }

    fn error(&self, message: impl Into<String>) -> ConfigError {
        parse_error(self.input, self.position(), message)
    }

    // union := term ('|' term)*
    fn union(&mut self) -> Result<TypeExpr, ConfigError> {
        let mut members = vec![self.term()?];
        while self.peek() == Some(&Token::Pipe) {
            self.cursor += 1;
            members.push(self.term()?);
        }
        Ok(TypeExpr::union(members))
    }

    // term := NAME ('[' arg (',' arg)* ']')?
    fn term(&mut self) -> Result<TypeExpr, ConfigError> {
        let start = self.position();
        let name = match self.next() {
            Some(Token::Name(name)) => name,
            _ => return Err(parse_error(self.input, start, "expected a type name")),
        };

        let args = if self.peek() == Some(&Token::Open) {
            if self.depth == MAX_NESTING {
                return Err(self.error(format!("brackets nested deeper than {} levels", MAX_NESTING)));
            }
            self.cursor += 1;
            self.depth += 1;
            let args = self.args();
            self.depth -= 1;
            Some(args?)
        } else {
            None
        };

        self.resolve(&name, args, start)
    }

    fn args(&mut self) -> Result<Vec<Arg>, ConfigError> {
        let mut args = Vec::new();
        loop {
            if self.peek() == Some(&Token::Ellipsis) {
                self.cursor += 1;
                args.push(Arg::Ellipsis);
            } else {
                args.push(Arg::Expr(self.union()?));
            }

            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::Close) => return Ok(args),
                _ => {
                    self.cursor -= 1;
                    return Err(self.error("expected ',' or ']'"));
                }
            }
        }
    }

    fn resolve(&self, name: &str, args: Option<Vec<Arg>>, at: usize) -> Result<TypeExpr, ConfigError> {
        let bare = name.strip_prefix("typing.").unwrap_or(name);

        let expr = match (bare, args) {
            ("str", None) => TypeExpr::string(),
            ("int", None) => TypeExpr::integer(),
            ("float", None) => TypeExpr::float(),
            ("bool", None) => TypeExpr::boolean(),
            ("bytes", None) => TypeExpr::bytes(),
            ("None" | "NoneType", None) => TypeExpr::Null,
            ("Any", None) => TypeExpr::Any,

            ("list" | "List", None) => TypeExpr::list(),
            ("list" | "List", Some(args)) => TypeExpr::list_of(self.exprs(args, at)?),
            ("set" | "Set", None) => TypeExpr::set(),
            ("set" | "Set", Some(args)) => TypeExpr::set_of(self.exprs(args, at)?),

            ("tuple" | "Tuple", None) => TypeExpr::tuple(),
            ("tuple" | "Tuple", Some(args)) => self.tuple(args, at)?,

            ("dict" | "Dict" | "Mapping", None) => TypeExpr::mapping(),
            ("dict" | "Dict" | "Mapping", Some(args)) => {
                let mut exprs = self.exprs(args, at)?;
                if exprs.len() != 2 {
                    return Err(parse_error(self.input, at, "mappings take exactly two arguments"));
                }
                let value = exprs.remove(1);
                let key = exprs.remove(0);
                TypeExpr::mapping_of(key, value)
            }

            ("Union", Some(args)) => TypeExpr::union(self.exprs(args, at)?),
            ("Optional", Some(args)) => {
                let mut exprs = self.exprs(args, at)?;
                if exprs.len() != 1 {
                    return Err(parse_error(self.input, at, "Optional takes exactly one argument"));
                }
                TypeExpr::optional(exprs.remove(0))
            }
            ("Final", Some(args)) => {
                let mut exprs = self.exprs(args, at)?;
                if exprs.len() != 1 {
                    return Err(parse_error(self.input, at, "Final takes exactly one argument"));
                }
                TypeExpr::final_of(exprs.remove(0))
            }
            ("Annotated", _) => {
                return Err(parse_error(
                    self.input,
                    at,
                    "Annotated needs constraint values; attach them with TypeExpr::with",
                ))
            }
            ("Union" | "Optional" | "Final", None) => {
                return Err(parse_error(self.input, at, format!("{} needs arguments", bare)))
            }

            (_, _) => TypeExpr::Unsupported(name.to_string()),
        };

        Ok(expr)
    }

    fn exprs(&self, args: Vec<Arg>, at: usize) -> Result<Vec<TypeExpr>, ConfigError> {
        args.into_iter()
            .map(|arg| match arg {
                Arg::Expr(expr) => Ok(expr),
                Arg::Ellipsis => Err(parse_error(self.input, at, "'...' is only allowed in tuple[T, ...]")),
            })
            .collect()
    }

    fn tuple(&self, mut args: Vec<Arg>, at: usize) -> Result<TypeExpr, ConfigError> {
        if args.len() == 2 && matches!(args[1], Arg::Ellipsis) {
            args.pop();
            let mut element = self.exprs(args, at)?;
            return Ok(TypeExpr::variadic_tuple(element.remove(0)));
        }
        Ok(TypeExpr::tuple_of(self.exprs(args, at)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrimitiveKind, TupleArity};

    #[test]
    fn test_parse_primitives() {
        assert!(matches!(TypeExpr::parse("str").unwrap(), TypeExpr::Primitive(PrimitiveKind::String)));
        assert!(matches!(TypeExpr::parse(" int ").unwrap(), TypeExpr::Primitive(PrimitiveKind::Int)));
        assert!(matches!(TypeExpr::parse("bytes").unwrap(), TypeExpr::Primitive(PrimitiveKind::Bytes)));
        assert!(matches!(TypeExpr::parse("typing.Any").unwrap(), TypeExpr::Any));
        assert!(matches!(TypeExpr::parse("None").unwrap(), TypeExpr::Null));
    }

    #[test]
    fn test_parse_unions() {
        assert_eq!(TypeExpr::parse("str | None").unwrap().to_string(), "(<string>, <null>)");
        assert_eq!(TypeExpr::parse("Optional[str]").unwrap().to_string(), "(<string>, <null>)");
        assert_eq!(TypeExpr::parse("Union[str | int]").unwrap().to_string(), "(<string>, <integer>)");
        assert_eq!(TypeExpr::parse("Union[str]").unwrap().to_string(), "<string>");
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(TypeExpr::parse("List").unwrap().to_string(), "<list>");
        assert_eq!(TypeExpr::parse("list[str, int]").unwrap().to_string(), "list[string, integer]");
        assert_eq!(TypeExpr::parse("set[str | int]").unwrap().to_string(), "set[string | integer]");
        assert_eq!(
            TypeExpr::parse("Mapping[Any, str]").unwrap().to_string(),
            "mapping[Any, string]"
        );
    }

    #[test]
    fn test_parse_tuples() {
        match TypeExpr::parse("Tuple[int, ...]").unwrap() {
            TypeExpr::Tuple(Some(TupleArity::Variadic(_))) => {}
            other => panic!("expected variadic tuple, got {:?}", other),
        }
        match TypeExpr::parse("tuple[str | int, int]").unwrap() {
            TypeExpr::Tuple(Some(TupleArity::Fixed(positions))) => assert_eq!(positions.len(), 2),
            other => panic!("expected fixed tuple, got {:?}", other),
        }
        assert!(matches!(TypeExpr::parse("tuple").unwrap(), TypeExpr::Tuple(None)));
    }

    #[test]
    fn test_parse_final_and_unknown() {
        assert_eq!(TypeExpr::parse("Final[str]").unwrap().to_string(), "Final[string]");
        assert!(matches!(
            TypeExpr::parse("list[Widget]").unwrap(),
            TypeExpr::Container { elements: Some(ref e), .. } if matches!(e[0], TypeExpr::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        let err = TypeExpr::parse("list[int").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { position: 8, .. }), "{:?}", err);

        assert!(matches!(TypeExpr::parse("dict[str]"), Err(ConfigError::Parse { .. })));
        assert!(matches!(TypeExpr::parse("list[...]"), Err(ConfigError::Parse { .. })));
        assert!(matches!(TypeExpr::parse("Annotated[int, x]"), Err(ConfigError::Parse { .. })));
        assert!(matches!(TypeExpr::parse("int int"), Err(ConfigError::Parse { position: 4, .. })));
        assert!(matches!(TypeExpr::parse("int$"), Err(ConfigError::Parse { position: 3, .. })));
        assert!(matches!(TypeExpr::parse(""), Err(ConfigError::Parse { .. })));
    }

    fn nested_lists(depth: usize) -> String {
        format!("{}int{}", "list[".repeat(depth), "]".repeat(depth))
    }

    #[test]
    fn test_parse_nesting_limit() {
        assert!(TypeExpr::parse(&nested_lists(MAX_NESTING)).is_ok());

        let err = TypeExpr::parse(&nested_lists(MAX_NESTING + 1)).unwrap_err();
        let offset = MAX_NESTING * "list[".len() + "list".len();
        assert!(matches!(err, ConfigError::Parse { position, .. } if position == offset), "{:?}", err);

        // Stays an error, not a stack overflow, on a small stack
        let deep = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| TypeExpr::parse(&nested_lists(20_000)).is_err())
            .unwrap()
            .join()
            .unwrap();
        assert!(deep);
    }
}
