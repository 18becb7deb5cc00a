//! Syntax trees for the recognized Go subset.
//!
//! Only the shapes the pipeline consumes are modeled: the package clause,
//! imports, function and method declarations (bodies reduced to their line
//! span and, when present, a single recognizable `return` expression), type
//! declarations, const declarations, and the restricted expression grammar
//! of the initializer interpreter.

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Id of the file in the package's position table.
    pub file_id: usize,
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
    /// Line spans of the import declarations, in source order.
    pub import_spans: Vec<(u32, u32)>,
    pub funcs: Vec<FuncDecl>,
    pub types: Vec<TypeDecl>,
    pub consts: Vec<ConstSpec>,
}

/// An import spec, e.g. `m "lib/math"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub kind: ImportKind,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportKind {
    Normal,
    Alias(String),
    /// `.` import: exported identifiers usable unqualified.
    Dot,
    /// `_` import: side effects only.
    Blank,
}

impl ImportSpec {
    /// The identifier this import binds in the file, if any.
    pub fn qualifier(&self) -> Option<&str> {
        match &self.kind {
            ImportKind::Normal => Some(base_name(&self.path)),
            ImportKind::Alias(alias) => Some(alias),
            ImportKind::Dot | ImportKind::Blank => None,
        }
    }
}

/// Last segment of an import path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A function or method declaration. Bodies are not kept; the interpreter
/// only needs the top-level `return` expression, and the rewriter only the
/// line span.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub doc: Option<String>,
    /// First line of the doc comment group, when present.
    pub doc_line: Option<u32>,
    pub name: String,
    /// Method receiver, when this is a method declaration.
    pub recv: Option<Param>,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    /// The expression of the first recognizable top-level `return` in the
    /// body, if any.
    pub ret_expr: Option<Expr>,
    /// Byte offset of the `func` keyword.
    pub offset: usize,
    /// Line of the `func` keyword.
    pub func_line: u32,
    /// Line of the closing brace of the body (the `func` line when the
    /// declaration has no body).
    pub end_line: u32,
}

impl FuncDecl {
    /// First line of the declaration including its doc comment.
    pub fn start_line(&self) -> u32 {
        self.doc_line.unwrap_or(self.func_line)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub typ: TypeExpr,
}

/// A type declaration, e.g. `type Options struct { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub doc: Option<String>,
    pub name: String,
    pub kind: TypeDeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclKind {
    Struct(Vec<Field>),
    /// `type Mode string` and `type Mode = string` alike.
    Named(TypeExpr),
    Other,
}

/// One field declaration of a struct type. An empty name list means the
/// field is embedded.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub doc: Option<String>,
    pub names: Vec<String>,
    pub typ: TypeExpr,
    /// Raw struct tag content, without the backquotes.
    pub tag: Option<String>,
}

/// A single-name constant spec, e.g. `const ModeAuto Mode = "auto"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstSpec {
    pub name: String,
    pub typ: Option<TypeExpr>,
    pub value: Option<Expr>,
}

/// A type expression, retaining enough structure for classification while
/// reproducing the written spelling exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Name(String),
    /// Qualified identifier, e.g. `context.Context`.
    Selector(String, String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// Anything else, kept as source text.
    Other(String),
}

impl TypeExpr {
    /// The type as written in source.
    pub fn text(&self) -> String {
        match self {
            TypeExpr::Name(name) => name.clone(),
            TypeExpr::Selector(pkg, name) => format!("{}.{}", pkg, name),
            TypeExpr::Pointer(inner) => format!("*{}", inner.text()),
            TypeExpr::Slice(inner) => format!("[]{}", inner.text()),
            TypeExpr::Map(k, v) => format!("map[{}]{}", k.text(), v.text()),
            TypeExpr::Other(text) => text.clone(),
        }
    }

    /// Strips one leading pointer, if any.
    pub fn strip_pointer(&self) -> (&TypeExpr, bool) {
        match self {
            TypeExpr::Pointer(inner) => (inner, true),
            other => (other, false),
        }
    }

    /// The unqualified name of a plain or qualified identifier type.
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Name(name) => Some(name),
            TypeExpr::Selector(_, name) => Some(name),
            _ => None,
        }
    }

    pub fn is_slice_of(&self, elem: &str) -> bool {
        matches!(self, TypeExpr::Slice(inner) if inner.text() == elem)
    }
}

/// The restricted expression grammar of the initializer interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Ident(String),
    Selector(Box<Expr>, String),
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
    },
    Composite {
        typ: Option<TypeExpr>,
        elems: Vec<CompositeElem>,
    },
    Unary {
        op: char,
        x: Box<Expr>,
    },
    /// A construct outside the recognized grammar, kept for diagnostics.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeElem {
    pub key: Option<String>,
    pub value: Expr,
}

impl File {
    pub fn find_func(&self, name: &str) -> Option<&FuncDecl> {
        self.funcs.iter().find(|f| f.recv.is_none() && f.name == name)
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_const(&self, name: &str) -> Option<&ConstSpec> {
        self.consts.iter().find(|c| c.name == name)
    }

    /// The import binding the marker package, whose path is `goat` or ends
    /// in `/goat`.
    pub fn marker_import(&self) -> Option<&ImportSpec> {
        self.imports
            .iter()
            .find(|spec| spec.path == "goat" || spec.path.ends_with("/goat"))
    }
}
