//! Recursive-descent parser for the recognized Go subset.
//!
//! Function bodies are not materialized: the parser tracks brace depth,
//! records the body's line span, and opportunistically parses the first
//! top-level `return` expression that fits the restricted grammar (the
//! initializer interpreter consumes it). Declarations outside the subset are
//! skipped, not rejected; only a malformed file structure is an error.

use crate::ast::{
    CompositeElem, ConstSpec, Expr, Field, File, FuncDecl, ImportKind, ImportSpec, Param, TypeDecl,
    TypeDeclKind, TypeExpr,
};
use crate::error::Error;
use crate::source::SourceFile;
use crate::token::{lex, Doc, Tok, Token};

/// Parses one source file into a syntax tree.
pub fn parse_file(file_id: usize, source: &SourceFile) -> Result<File, Error> {
    let tokens = lex(source.text())
        .map_err(|p| Error::parse(source.name(), p.line, p.message))?;

    let mut parser = Parser {
        toks: tokens,
        i: 0,
        file_name: source.name().to_owned(),
    };
    parser.parse(file_id)
}

struct Parser {
    toks: Vec<Token>,
    i: usize,
    file_name: String,
}

impl Parser {
    fn cur(&self) -> &Token {
        &self.toks[self.i.min(self.toks.len() - 1)]
    }

    fn peek(&self) -> &Tok {
        &self.cur().kind
    }

    fn peek_at(&self, n: usize) -> &Tok {
        let idx = (self.i + n).min(self.toks.len() - 1);
        &self.toks[idx].kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.i < self.toks.len() - 1 {
            self.i += 1;
        }
        tok
    }

    fn eat(&mut self, kind: &Tok) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &Tok, what: &str) -> Result<Token, Error> {
        if self.peek() == kind {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {}, found {}", what, tok_text(self.peek()))))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Token), Error> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                let tok = self.bump();
                Ok((name, tok))
            }
            other => Err(self.error(format!("expected {}, found {}", what, tok_text(&other)))),
        }
    }

    fn error(&self, message: String) -> Error {
        Error::parse(&self.file_name, self.cur().line, message)
    }

    fn skip_semis(&mut self) {
        while matches!(self.peek(), Tok::Semi) {
            self.bump();
        }
    }

    fn parse(&mut self, file_id: usize) -> Result<File, Error> {
        let mut file = File {
            file_id,
            package_name: String::new(),
            imports: Vec::new(),
            import_spans: Vec::new(),
            funcs: Vec::new(),
            types: Vec::new(),
            consts: Vec::new(),
        };

        self.skip_semis();
        self.expect(&Tok::Package, "`package` clause")?;
        let (name, _) = self.expect_ident("package name")?;
        file.package_name = name;

        loop {
            self.skip_semis();
            match self.peek() {
                Tok::Eof => break,
                Tok::Import => self.parse_import_decl(&mut file)?,
                Tok::Func => {
                    let decl = self.parse_func_decl()?;
                    file.funcs.push(decl);
                }
                Tok::Type => self.parse_type_decl(&mut file)?,
                Tok::Const => self.parse_value_decl(&mut file, true)?,
                Tok::Var => self.parse_value_decl(&mut file, false)?,
                _ => {
                    // Not part of the subset; drop the token and continue.
                    self.bump();
                }
            }
        }

        Ok(file)
    }

    fn parse_import_decl(&mut self, file: &mut File) -> Result<(), Error> {
        let start_line = self.cur().line;
        self.bump();

        let end_line;
        if self.eat(&Tok::LParen) {
            loop {
                self.skip_semis();
                if matches!(self.peek(), Tok::RParen) {
                    end_line = self.cur().line;
                    self.bump();
                    break;
                }
                if matches!(self.peek(), Tok::Eof) {
                    return Err(self.error("unterminated import declaration".into()));
                }
                let spec = self.parse_import_spec()?;
                file.imports.push(spec);
            }
        } else {
            let spec = self.parse_import_spec()?;
            end_line = self.toks[self.i.saturating_sub(1)].line;
            file.imports.push(spec);
        }

        file.import_spans.push((start_line, end_line));
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, Error> {
        let kind = match self.peek().clone() {
            Tok::Dot => {
                self.bump();
                ImportKind::Dot
            }
            Tok::Ident(name) => {
                self.bump();
                if name == "_" {
                    ImportKind::Blank
                } else {
                    ImportKind::Alias(name)
                }
            }
            _ => ImportKind::Normal,
        };

        match self.peek().clone() {
            Tok::Str { value, .. } => {
                self.bump();
                Ok(ImportSpec { kind, path: value })
            }
            other => Err(self.error(format!(
                "expected import path, found {}",
                tok_text(&other)
            ))),
        }
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, Error> {
        let func_tok = self.bump();
        let (doc, doc_line) = split_doc(&func_tok.doc);

        let recv = if matches!(self.peek(), Tok::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let (name, _) = self.expect_ident("function name")?;

        // Type parameter lists are outside the subset; skip them.
        if matches!(self.peek(), Tok::LBracket) {
            let mut depth = 0usize;
            loop {
                match self.peek() {
                    Tok::Eof => return Err(self.error("unterminated type parameter list".into())),
                    Tok::LBracket => {
                        depth += 1;
                        self.bump();
                    }
                    Tok::RBracket => {
                        depth -= 1;
                        self.bump();
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {
                        self.bump();
                    }
                }
            }
        }

        self.expect(&Tok::LParen, "`(`")?;
        let params = self.parse_params()?;

        let results = self.parse_results()?;

        let mut decl = FuncDecl {
            doc,
            doc_line,
            name,
            recv,
            params,
            results,
            ret_expr: None,
            offset: func_tok.offset,
            func_line: func_tok.line,
            end_line: func_tok.line,
        };

        if matches!(self.peek(), Tok::LBrace) {
            self.scan_body(&mut decl)?;
        } else {
            decl.end_line = self.toks[self.i.saturating_sub(1)].line;
        }

        Ok(decl)
    }

    fn parse_receiver(&mut self) -> Result<Param, Error> {
        self.expect(&Tok::LParen, "`(`")?;

        let name = match (self.peek().clone(), self.peek_at(1)) {
            (Tok::Ident(n), kind) if is_type_start(kind) => {
                self.bump();
                Some(n)
            }
            _ => None,
        };
        let typ = self.parse_type()?;
        self.expect(&Tok::RParen, "`)`")?;

        Ok(Param { name, typ })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();

        loop {
            self.skip_semis();
            if self.eat(&Tok::RParen) {
                break;
            }

            // Leading `name,` pairs of a shared-type group.
            let mut group: Vec<String> = Vec::new();
            while let Tok::Ident(name) = self.peek().clone() {
                if matches!(self.peek_at(1), Tok::Comma) {
                    self.bump();
                    self.bump();
                    group.push(name);
                } else {
                    break;
                }
            }

            match (self.peek().clone(), self.peek_at(1).clone()) {
                (Tok::Ident(name), kind) if is_type_start(&kind) => {
                    self.bump();
                    let typ = self.parse_type()?;
                    for n in group.drain(..) {
                        params.push(Param {
                            name: Some(n),
                            typ: typ.clone(),
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        typ,
                    });
                }
                _ => {
                    // Unnamed parameters; any collected identifiers were
                    // plain type names.
                    for n in group.drain(..) {
                        params.push(Param {
                            name: None,
                            typ: TypeExpr::Name(n),
                        });
                    }
                    let typ = self.parse_type()?;
                    params.push(Param { name: None, typ });
                }
            }

            if !self.eat(&Tok::Comma) {
                self.expect(&Tok::RParen, "`)` after parameters")?;
                break;
            }
        }

        Ok(params)
    }

    fn parse_results(&mut self) -> Result<Vec<TypeExpr>, Error> {
        let mut results = Vec::new();

        if self.eat(&Tok::LParen) {
            loop {
                self.skip_semis();
                if self.eat(&Tok::RParen) {
                    break;
                }
                // Named results share the parameter grammar; only the types
                // are kept.
                if let (Tok::Ident(_), kind) = (self.peek().clone(), self.peek_at(1).clone()) {
                    if is_type_start(&kind) {
                        self.bump();
                    }
                }
                results.push(self.parse_type()?);
                if !self.eat(&Tok::Comma) {
                    self.expect(&Tok::RParen, "`)` after results")?;
                    break;
                }
            }
        } else if is_type_start(self.peek()) && !matches!(self.peek(), Tok::LBrace) {
            results.push(self.parse_type()?);
        }

        Ok(results)
    }

    /// Consumes a function body, recording its span and the first
    /// recognizable top-level `return` expression.
    fn scan_body(&mut self, decl: &mut FuncDecl) -> Result<(), Error> {
        self.expect(&Tok::LBrace, "`{`")?;
        let mut depth = 1usize;

        loop {
            match self.peek() {
                Tok::Eof => return Err(self.error("unterminated function body".into())),
                Tok::LBrace => {
                    depth += 1;
                    self.bump();
                }
                Tok::RBrace => {
                    depth -= 1;
                    let tok = self.bump();
                    if depth == 0 {
                        decl.end_line = tok.line;
                        return Ok(());
                    }
                }
                Tok::Return if depth == 1 && decl.ret_expr.is_none() => {
                    self.bump();
                    let save = self.i;
                    match self.parse_expr() {
                        Ok(expr) => decl.ret_expr = Some(expr),
                        Err(_) => self.i = save,
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr, Error> {
        match self.peek().clone() {
            Tok::Star => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Tok::LBracket => {
                self.bump();
                if self.eat(&Tok::RBracket) {
                    Ok(TypeExpr::Slice(Box::new(self.parse_type()?)))
                } else {
                    // Fixed-size array; keep the written form.
                    let mut size = String::new();
                    while !matches!(self.peek(), Tok::RBracket | Tok::Eof) {
                        size.push_str(&tok_text(&self.bump().kind));
                    }
                    self.expect(&Tok::RBracket, "`]`")?;
                    let elem = self.parse_type()?;
                    Ok(TypeExpr::Other(format!("[{}]{}", size, elem.text())))
                }
            }
            Tok::Map => {
                self.bump();
                self.expect(&Tok::LBracket, "`[`")?;
                let key = self.parse_type()?;
                self.expect(&Tok::RBracket, "`]`")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            Tok::Chan => {
                self.bump();
                self.eat(&Tok::Op("<-".into()));
                let elem = self.parse_type()?;
                Ok(TypeExpr::Other(format!("chan {}", elem.text())))
            }
            Tok::Op(op) if op == "<-" => {
                self.bump();
                self.expect(&Tok::Chan, "`chan`")?;
                let elem = self.parse_type()?;
                Ok(TypeExpr::Other(format!("<-chan {}", elem.text())))
            }
            Tok::Func => {
                self.bump();
                let text = self.consume_balanced_text("func")?;
                Ok(TypeExpr::Other(text))
            }
            Tok::Interface => {
                self.bump();
                let text = self.consume_balanced_text("interface")?;
                Ok(TypeExpr::Other(text))
            }
            Tok::Struct => {
                self.bump();
                let text = self.consume_balanced_text("struct")?;
                Ok(TypeExpr::Other(text))
            }
            Tok::Ellipsis => {
                self.bump();
                let elem = self.parse_type()?;
                Ok(TypeExpr::Other(format!("...{}", elem.text())))
            }
            Tok::Ident(name) => {
                self.bump();
                if matches!(self.peek(), Tok::Dot) {
                    self.bump();
                    let (sel, _) = self.expect_ident("type name after `.`")?;
                    Ok(TypeExpr::Selector(name, sel))
                } else {
                    Ok(TypeExpr::Name(name))
                }
            }
            other => Err(self.error(format!("expected type, found {}", tok_text(&other)))),
        }
    }

    /// Consumes the bracketed remainder of a `func`/`interface`/`struct`
    /// type, returning a best-effort textual rendering.
    fn consume_balanced_text(&mut self, head: &str) -> Result<String, Error> {
        let mut text = String::from(head);
        let mut depth = 0usize;

        loop {
            match self.peek() {
                Tok::Eof => return Err(self.error("unterminated type literal".into())),
                Tok::LParen | Tok::LBrace | Tok::LBracket => {
                    depth += 1;
                    text.push_str(&tok_text(&self.bump().kind));
                }
                Tok::RParen | Tok::RBrace | Tok::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    text.push_str(&tok_text(&self.bump().kind));
                    if depth == 0 {
                        // A complete bracketed unit ends the type unless
                        // another opens immediately (func results, etc.).
                        if !matches!(
                            self.peek(),
                            Tok::LParen | Tok::LBrace | Tok::LBracket | Tok::Ident(_)
                        ) {
                            break;
                        }
                    }
                }
                Tok::Semi if depth == 0 => break,
                Tok::Comma if depth == 0 => break,
                _ => {
                    text.push_str(&tok_text(&self.bump().kind));
                }
            }
        }

        Ok(text)
    }

    fn parse_type_decl(&mut self, file: &mut File) -> Result<(), Error> {
        let type_tok = self.bump();
        let (decl_doc, _) = split_doc(&type_tok.doc);

        if self.eat(&Tok::LParen) {
            loop {
                self.skip_semis();
                if self.eat(&Tok::RParen) {
                    break;
                }
                if matches!(self.peek(), Tok::Eof) {
                    return Err(self.error("unterminated type declaration".into()));
                }
                let spec_doc = split_doc(&self.cur().doc).0;
                let decl = self.parse_type_spec(spec_doc)?;
                file.types.push(decl);
            }
        } else {
            let decl = self.parse_type_spec(decl_doc)?;
            file.types.push(decl);
        }

        Ok(())
    }

    fn parse_type_spec(&mut self, doc: Option<String>) -> Result<TypeDecl, Error> {
        let (name, _) = self.expect_ident("type name")?;

        // `type X = Y` aliases resolve like definitions for our purposes.
        self.eat(&Tok::Assign);

        let kind = if matches!(self.peek(), Tok::Struct) && matches!(self.peek_at(1), Tok::LBrace) {
            self.bump();
            self.bump();
            TypeDeclKind::Struct(self.parse_fields()?)
        } else if is_type_start(self.peek()) {
            let underlying = self.parse_type()?;
            match underlying {
                TypeExpr::Other(_) => TypeDeclKind::Other,
                other => TypeDeclKind::Named(other),
            }
        } else {
            TypeDeclKind::Other
        };

        Ok(TypeDecl { doc, name, kind })
    }

    fn parse_fields(&mut self) -> Result<Vec<Field>, Error> {
        let mut fields = Vec::new();

        loop {
            self.skip_semis();
            if self.eat(&Tok::RBrace) {
                break;
            }
            if matches!(self.peek(), Tok::Eof) {
                return Err(self.error("unterminated struct type".into()));
            }

            let doc = split_doc(&self.cur().doc).0;
            let mut names: Vec<String> = Vec::new();

            // Leading `Name,` pairs of a shared-type group.
            while let Tok::Ident(name) = self.peek().clone() {
                if matches!(self.peek_at(1), Tok::Comma) {
                    self.bump();
                    self.bump();
                    names.push(name);
                } else {
                    break;
                }
            }

            let typ;
            if names.is_empty() {
                match (self.peek().clone(), self.peek_at(1).clone()) {
                    (Tok::Ident(name), Tok::Semi)
                    | (Tok::Ident(name), Tok::RBrace)
                    | (Tok::Ident(name), Tok::Str { .. }) => {
                        // Embedded plain type.
                        self.bump();
                        typ = TypeExpr::Name(name);
                    }
                    (Tok::Ident(_), Tok::Dot) | (Tok::Star, _) => {
                        // Embedded qualified or pointer type.
                        typ = self.parse_type()?;
                    }
                    (Tok::Ident(name), _) => {
                        self.bump();
                        names.push(name);
                        typ = self.parse_type()?;
                    }
                    _ => {
                        typ = self.parse_type()?;
                    }
                }
            } else {
                let (name, _) = self.expect_ident("field name")?;
                names.push(name);
                typ = self.parse_type()?;
            }

            let tag = match self.peek().clone() {
                Tok::Str { value, .. } => {
                    self.bump();
                    Some(value)
                }
                _ => None,
            };

            fields.push(Field {
                doc,
                names,
                typ,
                tag,
            });
        }

        Ok(fields)
    }

    fn parse_value_decl(&mut self, file: &mut File, is_const: bool) -> Result<(), Error> {
        self.bump();

        if self.eat(&Tok::LParen) {
            loop {
                self.skip_semis();
                if self.eat(&Tok::RParen) {
                    break;
                }
                if matches!(self.peek(), Tok::Eof) {
                    return Err(self.error("unterminated declaration group".into()));
                }
                self.parse_value_spec(file, is_const)?;
            }
        } else {
            self.parse_value_spec(file, is_const)?;
        }

        Ok(())
    }

    fn parse_value_spec(&mut self, file: &mut File, is_const: bool) -> Result<(), Error> {
        let mut names = Vec::new();
        loop {
            let (name, _) = self.expect_ident("name")?;
            names.push(name);
            if !self.eat(&Tok::Comma) {
                break;
            }
        }

        let typ = if is_type_start(self.peek()) && !matches!(self.peek(), Tok::Semi) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut values: Vec<Option<Expr>> = Vec::new();
        if self.eat(&Tok::Assign) {
            loop {
                let save = self.i;
                match self.parse_expr() {
                    Ok(expr) => values.push(Some(expr)),
                    Err(_) => {
                        self.i = save;
                        self.skip_value_tokens();
                        values.push(None);
                    }
                }
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
        }

        if is_const {
            for (idx, name) in names.into_iter().enumerate() {
                file.consts.push(ConstSpec {
                    name,
                    typ: typ.clone(),
                    value: values.get(idx).cloned().flatten(),
                });
            }
        }

        Ok(())
    }

    /// Skips an unparseable value expression up to the next `,`, `;` or
    /// closing bracket at the current nesting level.
    fn skip_value_tokens(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Tok::Eof => break,
                Tok::LParen | Tok::LBrace | Tok::LBracket => {
                    depth += 1;
                    self.bump();
                }
                Tok::RParen | Tok::RBrace | Tok::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                Tok::Comma | Tok::Semi if depth == 0 => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, Error> {
        match self.peek().clone() {
            Tok::Amp => {
                self.bump();
                Ok(Expr::Unary {
                    op: '&',
                    x: Box::new(self.parse_expr()?),
                })
            }
            Tok::Star => {
                self.bump();
                Ok(Expr::Unary {
                    op: '*',
                    x: Box::new(self.parse_expr()?),
                })
            }
            Tok::Op(op) if op == "-" => {
                self.bump();
                match self.parse_expr()? {
                    Expr::Int(n) => Ok(Expr::Int(-n)),
                    other => Ok(Expr::Unsupported(format!("-{:?}", other))),
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let mut expr = match self.peek().clone() {
            Tok::Str { value, .. } => {
                self.bump();
                Expr::Str(value)
            }
            Tok::Int(text) => {
                self.bump();
                match parse_go_int(&text) {
                    Some(n) => Expr::Int(n),
                    None => Expr::Unsupported(text),
                }
            }
            Tok::Float(text) => {
                self.bump();
                Expr::Unsupported(text)
            }
            Tok::Rune(c) => {
                self.bump();
                Expr::Unsupported(format!("'{}'", c))
            }
            Tok::Ident(name) => {
                self.bump();
                Expr::Ident(name)
            }
            Tok::LBracket => {
                // Slice (or array) literal.
                let typ = self.parse_type()?;
                self.expect(&Tok::LBrace, "`{` of composite literal")?;
                let elems = self.parse_composite_elems()?;
                return Ok(Expr::Composite {
                    typ: Some(typ),
                    elems,
                });
            }
            Tok::LParen => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect(&Tok::RParen, "`)`")?;
                inner
            }
            other => {
                return Err(self.error(format!(
                    "expression not recognized at {}",
                    tok_text(&other)
                )))
            }
        };

        loop {
            match self.peek().clone() {
                Tok::Dot => {
                    self.bump();
                    let (sel, _) = self.expect_ident("selector")?;
                    expr = Expr::Selector(Box::new(expr), sel);
                }
                Tok::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    loop {
                        self.skip_semis();
                        if self.eat(&Tok::RParen) {
                            break;
                        }
                        let save = self.i;
                        match self.parse_expr() {
                            Ok(arg) => args.push(arg),
                            Err(_) => {
                                self.i = save;
                                self.skip_value_tokens();
                                args.push(Expr::Unsupported("argument".into()));
                            }
                        }
                        if !self.eat(&Tok::Comma) {
                            self.expect(&Tok::RParen, "`)` after arguments")?;
                            break;
                        }
                    }
                    expr = Expr::Call {
                        fun: Box::new(expr),
                        args,
                    };
                }
                Tok::LBrace => {
                    let typ = match &expr {
                        Expr::Ident(name) => Some(TypeExpr::Name(name.clone())),
                        Expr::Selector(x, sel) => match x.as_ref() {
                            Expr::Ident(pkg) => {
                                Some(TypeExpr::Selector(pkg.clone(), sel.clone()))
                            }
                            _ => None,
                        },
                        _ => None,
                    };
                    let Some(typ) = typ else { break };
                    self.bump();
                    let elems = self.parse_composite_elems()?;
                    expr = Expr::Composite {
                        typ: Some(typ),
                        elems,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_composite_elems(&mut self) -> Result<Vec<CompositeElem>, Error> {
        let mut elems = Vec::new();

        loop {
            self.skip_semis();
            if self.eat(&Tok::RBrace) {
                break;
            }
            if matches!(self.peek(), Tok::Eof) {
                return Err(self.error("unterminated composite literal".into()));
            }

            let key = match (self.peek().clone(), self.peek_at(1).clone()) {
                (Tok::Ident(name), Tok::Colon) => {
                    self.bump();
                    self.bump();
                    Some(name)
                }
                _ => None,
            };

            let save = self.i;
            let value = match self.parse_expr() {
                Ok(expr) => expr,
                Err(_) => {
                    self.i = save;
                    self.skip_value_tokens();
                    Expr::Unsupported("element".into())
                }
            };

            elems.push(CompositeElem { key, value });

            if !self.eat(&Tok::Comma) {
                self.skip_semis();
                self.expect(&Tok::RBrace, "`}` of composite literal")?;
                break;
            }
        }

        Ok(elems)
    }
}

fn split_doc(doc: &Option<Doc>) -> (Option<String>, Option<u32>) {
    match doc {
        Some(d) => (Some(d.text.clone()), Some(d.line)),
        None => (None, None),
    }
}

fn is_type_start(tok: &Tok) -> bool {
    matches!(
        tok,
        Tok::Ident(_)
            | Tok::Star
            | Tok::LBracket
            | Tok::Map
            | Tok::Chan
            | Tok::Func
            | Tok::Interface
            | Tok::Struct
            | Tok::Ellipsis
    ) || matches!(tok, Tok::Op(op) if op == "<-")
}

/// Parses a Go integer literal, including `0x`/`0o`/`0b` prefixes, legacy
/// octal and `_` separators.
pub fn parse_go_int(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();

    let (digits, radix) = if let Some(rest) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        (rest, 16)
    } else if let Some(rest) = cleaned
        .strip_prefix("0o")
        .or_else(|| cleaned.strip_prefix("0O"))
    {
        (rest, 8)
    } else if let Some(rest) = cleaned
        .strip_prefix("0b")
        .or_else(|| cleaned.strip_prefix("0B"))
    {
        (rest, 2)
    } else if cleaned.len() > 1 && cleaned.starts_with('0') {
        (&cleaned[1..], 8)
    } else {
        (cleaned.as_str(), 10)
    };

    i64::from_str_radix(digits, radix).ok()
}

fn tok_text(tok: &Tok) -> String {
    match tok {
        Tok::Ident(name) => name.clone(),
        Tok::Int(text) | Tok::Float(text) => text.clone(),
        Tok::Str { value, raw: false } => format!("{:?}", value),
        Tok::Str { value, raw: true } => format!("`{}`", value),
        Tok::Rune(c) => format!("'{}'", c),
        Tok::Package => "package".into(),
        Tok::Import => "import".into(),
        Tok::Func => "func".into(),
        Tok::Type => "type".into(),
        Tok::Struct => "struct".into(),
        Tok::Interface => "interface".into(),
        Tok::Map => "map".into(),
        Tok::Chan => "chan".into(),
        Tok::Const => "const".into(),
        Tok::Var => "var".into(),
        Tok::Return => "return".into(),
        Tok::LParen => "(".into(),
        Tok::RParen => ")".into(),
        Tok::LBrace => "{".into(),
        Tok::RBrace => "}".into(),
        Tok::LBracket => "[".into(),
        Tok::RBracket => "]".into(),
        Tok::Comma => ",".into(),
        Tok::Semi => ";".into(),
        Tok::Colon => ":".into(),
        Tok::Dot => ".".into(),
        Tok::Star => "*".into(),
        Tok::Amp => "&".into(),
        Tok::Assign => "=".into(),
        Tok::Define => ":=".into(),
        Tok::Ellipsis => "...".into(),
        Tok::Op(op) => op.clone(),
        Tok::Eof => "end of file".into(),
    }
}
