//! Syntax model handed to the analyzers by a package loader.
//!
//! The shapes follow Go's own syntax tree closely enough that the analyzers
//! can tell a pointer receiver from a generic one, or a package-qualified
//! access from a field access on a local value. Anything the analyzers never
//! need to distinguish is kept as [`Expr::Other`] with its children, so a
//! pre-order walk still reaches every nested expression.

mod scope;

pub use scope::{ObjectKind, Scope};

use std::path::PathBuf;

/// One parsed source file
#[derive(Debug, Clone, Default)]
pub struct File {
    pub path: PathBuf,

    /// Name from the `package` clause
    pub package_name: String,

    pub imports: Vec<ImportSpec>,

    pub decls: Vec<Decl>,

    /// Set when the file carries a `Code generated ... DO NOT EDIT.` marker
    pub generated: bool,
}

impl File {
    pub fn new(path: impl Into<PathBuf>, package_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package_name: package_name.into(),
            ..Self::default()
        }
    }

    pub fn with_import(mut self, name: Option<&str>, path: &str) -> Self {
        self.imports.push(ImportSpec {
            name: name.map(str::to_string),
            path: path.to_string(),
        });
        self
    }

    pub fn with_decl(mut self, decl: Decl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Path with forward slashes, for suffix and directory checks
    pub fn slash_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }

    pub fn func_decls(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }

    /// Pre-order walk over every expression in the file.
    ///
    /// Returning `false` from the callback skips the children of that node.
    pub fn inspect<'a>(&'a self, f: &mut dyn FnMut(&'a Expr) -> bool) {
        for decl in &self.decls {
            decl.inspect(f);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit local name, `_` or `.` when present
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Func(FuncDecl),
    Value(ValueSpec),
    Type(TypeSpec),
}

impl Decl {
    fn inspect<'a>(&'a self, f: &mut dyn FnMut(&'a Expr) -> bool) {
        match self {
            Decl::Func(func) => {
                for field in func.recv.iter().flatten() {
                    field.ty.inspect(f);
                }
                inspect_fields(&func.type_params, f);
                inspect_fields(&func.params, f);
                inspect_fields(&func.results, f);
                for expr in func.body.iter().flatten() {
                    expr.inspect(f);
                }
            }
            Decl::Value(spec) => {
                if let Some(ty) = &spec.ty {
                    ty.inspect(f);
                }
                for value in &spec.values {
                    value.inspect(f);
                }
            }
            Decl::Type(spec) => {
                inspect_fields(&spec.type_params, f);
                spec.ty.inspect(f);
            }
        }
    }
}

fn inspect_fields<'a>(fields: &'a [Field], f: &mut dyn FnMut(&'a Expr) -> bool) {
    for field in fields {
        field.ty.inspect(f);
    }
}

/// Function or method declaration
#[derive(Debug, Clone, Default)]
pub struct FuncDecl {
    pub name: String,

    /// Receiver list, `None` for plain functions
    pub recv: Option<Vec<Field>>,

    pub type_params: Vec<Field>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,

    /// Body as a sequence of statements, `None` for external declarations
    pub body: Option<Vec<Expr>>,
}

impl FuncDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_recv(mut self, ty: Expr) -> Self {
        self.recv = Some(vec![Field::new(&["r"], ty)]);
        self
    }

    pub fn with_result(mut self, ty: Expr) -> Self {
        self.results.push(Field::anonymous(ty));
        self
    }

    pub fn with_body(mut self, stmts: Vec<Expr>) -> Self {
        self.body = Some(stmts);
        self
    }

    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

/// A parameter, result, receiver or type parameter group
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: Expr,
}

impl Field {
    pub fn new(names: &[&str], ty: Expr) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            ty,
        }
    }

    pub fn anonymous(ty: Expr) -> Self {
        Self { names: Vec::new(), ty }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKeyword {
    Const,
    Var,
}

/// `const` or `var` spec: `names [type] [= values]`
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub keyword: ValueKeyword,
    pub names: Vec<String>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub type_params: Vec<Field>,
    pub ty: Expr,
    pub alias: bool,
}

/// Expression or type expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    BasicLit(String),
    /// `x.sel`, also package-qualified types
    Selector { x: Box<Expr>, sel: String },
    Call { fun: Box<Expr>, args: Vec<Expr> },
    /// `x[index]`, also single-argument generic instantiation
    Index { x: Box<Expr>, index: Box<Expr> },
    /// `x[a, b]`, multi-argument generic instantiation
    IndexList { x: Box<Expr>, indices: Vec<Expr> },
    Slice { x: Box<Expr>, bounds: Vec<Expr> },
    /// `x.(T)`; `ty` is `None` for the `x.(type)` switch guard
    TypeAssert { x: Box<Expr>, ty: Option<Box<Expr>> },
    Paren(Box<Expr>),
    /// Pointer type or dereference
    Star(Box<Expr>),
    Unary { op: String, x: Box<Expr> },
    CompositeLit { ty: Option<Box<Expr>>, elts: Vec<Expr> },
    KeyValue { key: Box<Expr>, value: Box<Expr> },
    FuncLit {
        params: Vec<Field>,
        results: Vec<Field>,
        body: Vec<Expr>,
    },
    Other { kind: String, children: Vec<Expr> },
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    pub fn selector(x: Expr, sel: &str) -> Self {
        Expr::Selector {
            x: Box::new(x),
            sel: sel.to_string(),
        }
    }

    /// `alias.Name`
    pub fn qualified(alias: &str, name: &str) -> Self {
        Self::selector(Self::ident(alias), name)
    }

    pub fn call(fun: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            fun: Box::new(fun),
            args,
        }
    }

    pub fn star(x: Expr) -> Self {
        Expr::Star(Box::new(x))
    }

    pub fn index(x: Expr, index: Expr) -> Self {
        Expr::Index {
            x: Box::new(x),
            index: Box::new(index),
        }
    }

    pub fn index_list(x: Expr, indices: Vec<Expr>) -> Self {
        Expr::IndexList {
            x: Box::new(x),
            indices,
        }
    }

    pub fn paren(x: Expr) -> Self {
        Expr::Paren(Box::new(x))
    }

    pub fn unary(op: &str, x: Expr) -> Self {
        Expr::Unary {
            op: op.to_string(),
            x: Box::new(x),
        }
    }

    pub fn composite(ty: Option<Expr>, elts: Vec<Expr>) -> Self {
        Expr::CompositeLit {
            ty: ty.map(Box::new),
            elts,
        }
    }

    pub fn other(kind: &str, children: Vec<Expr>) -> Self {
        Expr::Other {
            kind: kind.to_string(),
            children,
        }
    }

    /// Short shape name used in diagnostics
    pub fn kind_name(&self) -> &str {
        match self {
            Expr::Ident(_) => "identifier",
            Expr::BasicLit(_) => "literal",
            Expr::Selector { .. } => "selector",
            Expr::Call { .. } => "call",
            Expr::Index { .. } => "index",
            Expr::IndexList { .. } => "index list",
            Expr::Slice { .. } => "slice",
            Expr::TypeAssert { .. } => "type assertion",
            Expr::Paren(_) => "parenthesized expression",
            Expr::Star(_) => "star expression",
            Expr::Unary { .. } => "unary expression",
            Expr::CompositeLit { .. } => "composite literal",
            Expr::KeyValue { .. } => "key-value pair",
            Expr::FuncLit { .. } => "function literal",
            Expr::Other { kind, .. } => kind,
        }
    }

    pub fn inspect<'a>(&'a self, f: &mut dyn FnMut(&'a Expr) -> bool) {
        if !f(self) {
            return;
        }
        match self {
            Expr::Ident(_) | Expr::BasicLit(_) => {}
            Expr::Selector { x, .. } | Expr::Paren(x) | Expr::Star(x) | Expr::Unary { x, .. } => {
                x.inspect(f)
            }
            Expr::Call { fun, args } => {
                fun.inspect(f);
                args.iter().for_each(|arg| arg.inspect(f));
            }
            Expr::Index { x, index } => {
                x.inspect(f);
                index.inspect(f);
            }
            Expr::IndexList { x, indices } => {
                x.inspect(f);
                indices.iter().for_each(|i| i.inspect(f));
            }
            Expr::Slice { x, bounds } => {
                x.inspect(f);
                bounds.iter().for_each(|b| b.inspect(f));
            }
            Expr::TypeAssert { x, ty } => {
                x.inspect(f);
                if let Some(ty) = ty {
                    ty.inspect(f);
                }
            }
            Expr::CompositeLit { ty, elts } => {
                if let Some(ty) = ty {
                    ty.inspect(f);
                }
                elts.iter().for_each(|e| e.inspect(f));
            }
            Expr::KeyValue { key, value } => {
                key.inspect(f);
                value.inspect(f);
            }
            Expr::FuncLit {
                params,
                results,
                body,
            } => {
                inspect_fields(params, f);
                inspect_fields(results, f);
                body.iter().for_each(|s| s.inspect(f));
            }
            Expr::Other { children, .. } => children.iter().for_each(|c| c.inspect(f)),
        }
    }
}

/// Go's exported-name rule: the first character is an uppercase letter
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
