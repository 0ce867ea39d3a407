//! Recursive-descent parser for the plain-text schema syntax.
//!
//! The syntax describes nested JSON content using type keywords and the two
//! nesting constructors, one field per `name: type` entry:
//!
//! ```text
//! attribute: Utf8
//! nested: Struct(
//!     foo: Float32
//!     bar=bax: Int16
//!     vector: List[UInt8]
//! )
//! ```
//!
//! Details of note:
//!
//! * The top level is an implicit `Struct`: a comma- or whitespace-separated
//!   list of fields. Commas between fields are optional.
//! * `()`, `[]` and `{}` all delimit nested types, and the kinds do not need
//!   to match up: `List[Struct(...)}` is accepted. Each opening bracket is
//!   matched to the nearest unmatched closing bracket of any kind.
//! * `name=rename: type` requests an output rename for that field; see
//!   [`rename_map`](super::rename::rename_map) for how renames surface in
//!   flattened column names.
//! * An entry may omit the `name:` prefix entirely (the element of a `List`,
//!   or a bare top-level type such as `"Int64"`), declaring an anonymous
//!   field.
//!
//! Parsing is total: any input either yields exactly one tree or fails with
//! a [`SchemaError`] at the first violation.

use std::collections::BTreeSet;

use crate::schema::error::SchemaError;
use crate::schema::rename::output_columns;
use crate::schema::types::{DataType, Field, ScalarKind};

/// Parse schema text into a type tree rooted at the implicit top-level
/// struct. Beyond the grammar itself, the declared leaves must surface
/// under pairwise-distinct output column names: a rename colliding with a
/// sibling, or two leaves renamed alike at different levels, is rejected
/// here rather than silently collapsing columns downstream.
pub fn parse_schema(source: &str) -> Result<DataType, SchemaError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        end: source.len(),
    };
    let fields = parser.parse_fields(Terminator::EndOfSchema)?;
    let tree = DataType::Struct(fields);

    let mut columns = BTreeSet::new();
    for name in output_columns(&tree) {
        if !columns.insert(name.clone()) {
            return Err(SchemaError::DuplicateColumn { name });
        }
    }

    Ok(tree)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Colon,
    Equals,
    Comma,
    Open(char),
    Close(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(word) => format!("`{word}`"),
            Token::Colon => "`:`".to_string(),
            Token::Equals => "`=`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Open(c) | Token::Close(c) => format!("`{c}`"),
        }
    }
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(source: &str) -> Result<Vec<Spanned>, SchemaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            ':' => Token::Colon,
            '=' => Token::Equals,
            ',' => Token::Comma,
            '(' | '[' | '{' => Token::Open(c),
            ')' | ']' | '}' => Token::Close(c),
            c if c.is_ascii_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Ident(word),
                    position,
                });
                continue;
            }
            other => {
                return Err(SchemaError::Syntax {
                    position,
                    expected: "an identifier, `:`, `=`, `,` or a bracket",
                    found: format!("`{other}`"),
                })
            }
        };
        chars.next();
        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

/// What ends the field list currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Terminator {
    /// Top level: fields run until the input is exhausted.
    EndOfSchema,
    /// Inside a `Struct(...)`: fields run until a closing bracket, which is
    /// consumed.
    ClosingBracket,
}

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.index)
    }

    fn peek_second(&self) -> Option<&Spanned> {
        self.tokens.get(self.index + 1)
    }

    fn bump(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.index);
        if spanned.is_some() {
            self.index += 1;
        }
        spanned
    }

    /// Position of the next token, or one past the source when exhausted.
    fn position(&self) -> usize {
        self.peek().map_or(self.end, |s| s.position)
    }

    fn skip_commas(&mut self) {
        while matches!(self.peek(), Some(s) if s.token == Token::Comma) {
            self.index += 1;
        }
    }

    /// Parse a field sequence up to the given terminator, enforcing
    /// source-name uniqueness within this struct level.
    fn parse_fields(&mut self, terminator: Terminator) -> Result<Vec<Field>, SchemaError> {
        let mut fields: Vec<Field> = Vec::new();

        loop {
            self.skip_commas();
            match (self.peek(), terminator) {
                (None, Terminator::EndOfSchema) => break,
                (None, Terminator::ClosingBracket) => {
                    return Err(SchemaError::Syntax {
                        position: self.end,
                        expected: "a closing bracket",
                        found: "end of schema".to_string(),
                    })
                }
                (Some(s), Terminator::ClosingBracket) if matches!(s.token, Token::Close(_)) => {
                    self.index += 1;
                    break;
                }
                (Some(s), Terminator::EndOfSchema) if matches!(s.token, Token::Close(_)) => {
                    return Err(SchemaError::Syntax {
                        position: s.position,
                        expected: "a field",
                        found: s.token.describe(),
                    })
                }
                _ => {
                    let position = self.position();
                    let field = self.parse_field()?;
                    if fields.iter().any(|f| f.name == field.name) {
                        return Err(SchemaError::DuplicateField {
                            name: field.name,
                            position,
                        });
                    }
                    fields.push(field);
                }
            }
        }

        if fields.is_empty() {
            return Err(SchemaError::Syntax {
                position: self.position().min(self.end),
                expected: "at least one field",
                found: "none".to_string(),
            });
        }

        Ok(fields)
    }

    /// `name [= rename] : type`, or a bare type declaring an anonymous
    /// field.
    fn parse_field(&mut self) -> Result<Field, SchemaError> {
        let named = matches!(
            (self.peek(), self.peek_second()),
            (
                Some(Spanned { token: Token::Ident(_), .. }),
                Some(Spanned { token: Token::Colon | Token::Equals, .. }),
            )
        );

        if !named {
            let dtype = self.parse_type()?;
            return Ok(Field::new("", dtype));
        }

        let name = match self.bump() {
            Some(Spanned { token: Token::Ident(word), .. }) => word.clone(),
            _ => unreachable!("peeked an identifier"),
        };

        let rename = if matches!(self.peek(), Some(s) if s.token == Token::Equals) {
            self.index += 1;
            match self.bump() {
                Some(Spanned { token: Token::Ident(word), .. }) => Some(word.clone()),
                other => {
                    let (position, found) = match other {
                        Some(s) => (s.position, s.token.describe()),
                        None => (self.end, "end of schema".to_string()),
                    };
                    return Err(SchemaError::Syntax {
                        position,
                        expected: "a field name after `=`",
                        found,
                    });
                }
            }
        } else {
            None
        };

        match self.bump() {
            Some(s) if s.token == Token::Colon => {}
            other => {
                let (position, found) = match other {
                    Some(s) => (s.position, s.token.describe()),
                    None => (self.end, "end of schema".to_string()),
                };
                return Err(SchemaError::Syntax {
                    position,
                    expected: "`:`",
                    found,
                });
            }
        }

        let dtype = self.parse_type()?;
        Ok(Field {
            name,
            rename,
            dtype,
        })
    }

    fn parse_type(&mut self) -> Result<DataType, SchemaError> {
        let (word, position) = match self.bump() {
            Some(Spanned { token: Token::Ident(word), position }) => (word.clone(), *position),
            Some(s) => {
                return Err(SchemaError::Syntax {
                    position: s.position,
                    expected: "a type",
                    found: s.token.describe(),
                })
            }
            None => {
                return Err(SchemaError::Syntax {
                    position: self.end,
                    expected: "a type",
                    found: "end of schema".to_string(),
                })
            }
        };

        match word.as_str() {
            "List" => {
                self.expect_open()?;
                let element = self.parse_list_element()?;
                Ok(DataType::List(Box::new(element)))
            }
            "Struct" => {
                self.expect_open()?;
                let fields = self.parse_fields(Terminator::ClosingBracket)?;
                Ok(DataType::Struct(fields))
            }
            _ => ScalarKind::from_keyword(&word)
                .map(DataType::Scalar)
                .ok_or(SchemaError::UnknownType {
                    token: word,
                    position,
                }),
        }
    }

    /// The single element of a `List(...)`. A `name:` prefix is tolerated
    /// here (the grammar allows a full field) but lists contribute no path
    /// segment, so only the type is kept.
    fn parse_list_element(&mut self) -> Result<DataType, SchemaError> {
        let field = self.parse_field()?;
        self.skip_commas();
        match self.bump() {
            Some(s) if matches!(s.token, Token::Close(_)) => Ok(field.dtype),
            other => {
                let (position, found) = match other {
                    Some(s) => (s.position, s.token.describe()),
                    None => (self.end, "end of schema".to_string()),
                };
                Err(SchemaError::Syntax {
                    position,
                    expected: "a closing bracket",
                    found,
                })
            }
        }
    }

    fn expect_open(&mut self) -> Result<(), SchemaError> {
        match self.bump() {
            Some(s) if matches!(s.token, Token::Open(_)) => Ok(()),
            other => {
                let (position, found) = match other {
                    Some(s) => (s.position, s.token.describe()),
                    None => (self.end, "end of schema".to_string()),
                };
                Err(SchemaError::Syntax {
                    position,
                    expected: "an opening bracket",
                    found,
                })
            }
        }
    }
}
