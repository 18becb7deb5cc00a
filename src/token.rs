//! Token definitions and the lexer for the recognized Go subset.
//!
//! The lexer performs Go's automatic semicolon insertion so the parser can
//! treat struct fields and declarations as `;`-terminated, and it collects
//! `//`-style comment groups, attaching each group to the token that
//! immediately follows it. Doc comments are the source of all help text, so
//! dropping them is not an option.

/// A lexical token of the Go subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Ident(String),
    Int(String),
    Float(String),
    Str { value: String, raw: bool },
    Rune(char),

    Package,
    Import,
    Func,
    Type,
    Struct,
    Interface,
    Map,
    Chan,
    Const,
    Var,
    Return,

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Star,
    Amp,
    Assign,
    Define,
    Ellipsis,

    /// Any other operator, kept verbatim.
    Op(String),

    Eof,
}

impl Tok {
    /// Whether Go inserts a semicolon when a newline follows this token.
    fn ends_statement(&self) -> bool {
        match self {
            // `break`, `continue` and `fallthrough` are lexed as plain
            // identifiers; they terminate statements like any identifier.
            Tok::Ident(_)
            | Tok::Int(_)
            | Tok::Float(_)
            | Tok::Str { .. }
            | Tok::Rune(_)
            | Tok::Return
            | Tok::RParen
            | Tok::RBracket
            | Tok::RBrace => true,
            Tok::Op(op) => op == "++" || op == "--",
            _ => false,
        }
    }
}

/// A `//`-comment group attached to the token following it.
#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    /// Comment lines joined with `\n`, each stripped of `// `.
    pub text: String,
    /// 1-based line of the group's first comment.
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: Tok,
    pub offset: usize,
    pub line: u32,
    pub doc: Option<Doc>,
}

/// A lexical problem, reported with its 1-based line.
#[derive(Debug)]
pub struct LexProblem {
    pub line: u32,
    pub message: String,
}

struct Lexer<'a> {
    chars: Vec<(usize, char)>,
    text: &'a str,
    i: usize,
    line: u32,
}

struct PendingDoc {
    lines: Vec<String>,
    first_line: u32,
    last_line: u32,
}

/// Lexes a whole file into tokens (terminated by `Tok::Eof`).
pub fn lex(text: &str) -> Result<Vec<Token>, LexProblem> {
    let mut lx = Lexer {
        chars: text.char_indices().collect(),
        text,
        i: 0,
        line: 1,
    };
    let mut tokens: Vec<Token> = Vec::new();
    let mut pending: Option<PendingDoc> = None;

    loop {
        // Skip whitespace and comments, inserting semicolons at newlines and
        // maintaining the pending comment group.
        loop {
            match lx.peek() {
                Some('\n') => {
                    if tokens.last().map_or(false, |t| t.kind.ends_statement()) {
                        let (offset, _) = lx.chars[lx.i];
                        tokens.push(Token {
                            kind: Tok::Semi,
                            offset,
                            line: lx.line,
                            doc: None,
                        });
                    }
                    lx.bump();
                }
                Some(c) if c.is_whitespace() => {
                    lx.bump();
                }
                Some('/') if lx.peek_at(1) == Some('/') => {
                    let comment_line = lx.line;
                    let on_code_line = tokens.last().map_or(false, |t| t.line == comment_line);
                    let text = lx.read_line_comment();

                    if !on_code_line {
                        match pending.as_mut() {
                            Some(p) if p.last_line + 1 == comment_line => {
                                p.lines.push(text);
                                p.last_line = comment_line;
                            }
                            _ => {
                                pending = Some(PendingDoc {
                                    lines: vec![text],
                                    first_line: comment_line,
                                    last_line: comment_line,
                                });
                            }
                        }
                    }
                }
                Some('/') if lx.peek_at(1) == Some('*') => {
                    let had_newline = lx.skip_block_comment()?;
                    if had_newline && tokens.last().map_or(false, |t| t.kind.ends_statement()) {
                        tokens.push(Token {
                            kind: Tok::Semi,
                            offset: lx.offset(),
                            line: lx.line,
                            doc: None,
                        });
                    }
                }
                _ => break,
            }
        }

        let Some(c) = lx.peek() else { break };
        let offset = lx.offset();
        let line = lx.line;

        let kind = if c.is_alphabetic() || c == '_' {
            lx.read_word()
        } else if c.is_ascii_digit() {
            lx.read_number()
        } else if c == '"' {
            lx.read_interpreted_string()?
        } else if c == '`' {
            lx.read_raw_string()?
        } else if c == '\'' {
            lx.read_rune()?
        } else {
            lx.read_operator()
        };

        let doc = match pending.take() {
            Some(p) if p.last_line + 1 == line => Some(Doc {
                text: p.lines.join("\n"),
                line: p.first_line,
            }),
            _ => None,
        };

        tokens.push(Token {
            kind,
            offset,
            line,
            doc,
        });
    }

    if tokens.last().map_or(false, |t| t.kind.ends_statement()) {
        tokens.push(Token {
            kind: Tok::Semi,
            offset: lx.text.len(),
            line: lx.line,
            doc: None,
        });
    }

    tokens.push(Token {
        kind: Tok::Eof,
        offset: lx.text.len(),
        line: lx.line,
        doc: None,
    });

    Ok(tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.i)
            .map(|&(o, _)| o)
            .unwrap_or(self.text.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(ch) = c {
            if ch == '\n' {
                self.line += 1;
            }
            self.i += 1;
        }
        c
    }

    fn error(&self, message: impl Into<String>) -> LexProblem {
        LexProblem {
            line: self.line,
            message: message.into(),
        }
    }

    fn read_line_comment(&mut self) -> String {
        // Consume `//`.
        self.bump();
        self.bump();

        let start = self.offset();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let end = self.offset();

        let text = &self.text[start..end];
        text.strip_prefix(' ').unwrap_or(text).to_owned()
    }

    fn skip_block_comment(&mut self) -> Result<bool, LexProblem> {
        // Consume `/*`.
        self.bump();
        self.bump();

        let mut had_newline = false;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated block comment")),
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    return Ok(had_newline);
                }
                Some('\n') => {
                    had_newline = true;
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn read_word(&mut self) -> Tok {
        let start = self.offset();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.text[start..self.offset()];

        match word {
            "package" => Tok::Package,
            "import" => Tok::Import,
            "func" => Tok::Func,
            "type" => Tok::Type,
            "struct" => Tok::Struct,
            "interface" => Tok::Interface,
            "map" => Tok::Map,
            "chan" => Tok::Chan,
            "const" => Tok::Const,
            "var" => Tok::Var,
            "return" => Tok::Return,
            _ => Tok::Ident(word.to_owned()),
        }
    }

    fn read_number(&mut self) -> Tok {
        let start = self.offset();
        let mut is_float = false;
        let mut prev_exp = false;

        while let Some(c) = self.peek() {
            let take = if c.is_ascii_alphanumeric() || c == '_' {
                true
            } else if c == '.' {
                is_float = true;
                true
            } else if (c == '+' || c == '-') && prev_exp {
                true
            } else {
                false
            };
            if !take {
                break;
            }
            let so_far = &self.text[start..self.offset()];
            prev_exp =
                (c == 'e' || c == 'E') && !so_far.starts_with("0x") && !so_far.starts_with("0X");
            if prev_exp {
                is_float = true;
            }
            self.bump();
        }

        let text = self.text[start..self.offset()].to_owned();
        if is_float {
            Tok::Float(text)
        } else {
            Tok::Int(text)
        }
    }

    fn read_interpreted_string(&mut self) -> Result<Tok, LexProblem> {
        // Consume the opening quote.
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string literal")),
                Some('"') => break,
                Some('\\') => value.push(self.read_escape()?),
                Some(c) => value.push(c),
            }
        }

        Ok(Tok::Str { value, raw: false })
    }

    fn read_escape(&mut self) -> Result<char, LexProblem> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };

        let ch = match c {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => self.read_hex_escape(2)?,
            'u' => self.read_hex_escape(4)?,
            'U' => self.read_hex_escape(8)?,
            '0'..='7' => {
                let mut n = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            n = n * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                char::from_u32(n).unwrap_or('\u{fffd}')
            }
            other => other,
        };

        Ok(ch)
    }

    fn read_hex_escape(&mut self, digits: usize) -> Result<char, LexProblem> {
        let mut n: u32 = 0;
        for _ in 0..digits {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                return Err(self.error("invalid hexadecimal escape"));
            };
            n = n * 16 + d;
            self.bump();
        }
        Ok(char::from_u32(n).unwrap_or('\u{fffd}'))
    }

    fn read_raw_string(&mut self) -> Result<Tok, LexProblem> {
        // Consume the opening backquote.
        self.bump();

        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated raw string literal")),
                Some('`') => break,
                Some('\r') => {}
                Some(c) => value.push(c),
            }
        }

        Ok(Tok::Str { value, raw: true })
    }

    fn read_rune(&mut self) -> Result<Tok, LexProblem> {
        // Consume the opening quote.
        self.bump();

        let c = match self.bump() {
            None | Some('\n') => return Err(self.error("unterminated rune literal")),
            Some('\\') => self.read_escape()?,
            Some(c) => c,
        };

        match self.bump() {
            Some('\'') => Ok(Tok::Rune(c)),
            _ => Err(self.error("unterminated rune literal")),
        }
    }

    fn read_operator(&mut self) -> Tok {
        const THREE: &[&str] = &["...", "<<=", ">>=", "&^="];
        const TWO: &[&str] = &[
            "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=", "-=", "*=", "/=",
            "%=", "&=", "|=", "^=", "<<", ">>", "&^",
        ];

        let rest: String = self.chars[self.i..]
            .iter()
            .take(3)
            .map(|&(_, c)| c)
            .collect();

        for op in THREE {
            if rest.starts_with(op) {
                for _ in 0..3 {
                    self.bump();
                }
                return match *op {
                    "..." => Tok::Ellipsis,
                    other => Tok::Op(other.to_owned()),
                };
            }
        }

        for op in TWO {
            if rest.starts_with(op) {
                for _ in 0..2 {
                    self.bump();
                }
                return match *op {
                    ":=" => Tok::Define,
                    other => Tok::Op(other.to_owned()),
                };
            }
        }

        let c = self.bump().unwrap_or(' ');
        match c {
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            ',' => Tok::Comma,
            ';' => Tok::Semi,
            ':' => Tok::Colon,
            '.' => Tok::Dot,
            '*' => Tok::Star,
            '&' => Tok::Amp,
            '=' => Tok::Assign,
            other => Tok::Op(other.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{lex, Tok};

    fn kinds(src: &str) -> Vec<Tok> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        let toks = kinds("x := 1\ny := 2\n");

        assert_eq!(
            toks,
            vec![
                Tok::Ident("x".into()),
                Tok::Define,
                Tok::Int("1".into()),
                Tok::Semi,
                Tok::Ident("y".into()),
                Tok::Define,
                Tok::Int("2".into()),
                Tok::Semi,
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_brace_open() {
        let toks = kinds("type Options struct {\n\tName string\n}\n");

        // No semicolon after `struct` or `{`; one after `string` and `}`.
        assert_eq!(
            toks,
            vec![
                Tok::Type,
                Tok::Ident("Options".into()),
                Tok::Struct,
                Tok::LBrace,
                Tok::Ident("Name".into()),
                Tok::Ident("string".into()),
                Tok::Semi,
                Tok::RBrace,
                Tok::Semi,
                Tok::Eof,
            ]
        );
    }

    #[test]
    fn test_doc_comment_attachment() {
        let toks = lex("// Port is the port.\n// Second line.\nPort int\n").unwrap();

        let doc = toks[0].doc.as_ref().unwrap();
        assert_eq!(doc.text, "Port is the port.\nSecond line.");
        assert_eq!(doc.line, 1);
        assert_eq!(toks[0].kind, Tok::Ident("Port".into()));
    }

    #[test]
    fn test_doc_comment_blank_line_detaches() {
        let toks = lex("// Stray comment.\n\nPort int\n").unwrap();

        assert!(toks[0].doc.is_none());
    }

    #[test]
    fn test_trailing_comment_is_not_doc() {
        let toks = lex("x := 1 // trailing\n// doc\ny := 2\n").unwrap();

        let y = toks
            .iter()
            .find(|t| t.kind == Tok::Ident("y".into()))
            .unwrap();
        assert_eq!(y.doc.as_ref().unwrap().text, "doc");
    }

    #[test]
    fn test_string_literals() {
        let toks = kinds(r#"x := "a\nb""#);
        assert!(toks.contains(&Tok::Str {
            value: "a\nb".into(),
            raw: false
        }));

        let toks = kinds("t := `env:\"NAME\"`");
        assert!(toks.contains(&Tok::Str {
            value: "env:\"NAME\"".into(),
            raw: true
        }));
    }

    #[test]
    fn test_operators() {
        let toks = kinds("a <= b && c != d");
        assert!(toks.contains(&Tok::Op("<=".into())));
        assert!(toks.contains(&Tok::Op("&&".into())));
        assert!(toks.contains(&Tok::Op("!=".into())));
    }
}
