use super::common::{children_of_kind, descendants, field_children, location, named_children, node_text, ParseResult, Parser};
use crate::error::{Error, Result};
use crate::syntax::{Decl, Expr, Field, File, FuncDecl, ImportSpec, TypeSpec, ValueKeyword, ValueSpec};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::{Node, Parser as TsParser};
use tracing::trace;

/// Go source code parser using tree-sitter
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .expect("Failed to load Go grammar");
        Self { parser }
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for GoParser {
    fn parse(&mut self, path: &Path, contents: &str) -> Result<ParseResult> {
        let tree = self.parser.parse(contents, None).ok_or_else(|| Error::Io {
            path: path.display().to_string(),
            message: "tree-sitter produced no syntax tree".to_string(),
        })?;
        let root = tree.root_node();

        let lowering = Lowering { source: contents };
        let mut file = File::new(path, "");
        file.generated = is_generated(contents);

        for child in named_children(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = named_children(child).first() {
                        file.package_name = node_text(*name, contents).to_string();
                    }
                }
                "import_declaration" => {
                    file.imports.extend(lowering.imports(child));
                }
                "function_declaration" | "method_declaration" => {
                    file.decls.push(Decl::Func(lowering.func_decl(child)));
                }
                "const_declaration" | "var_declaration" => {
                    lowering.value_decls(child, &mut file.decls);
                }
                "type_declaration" => {
                    lowering.type_decls(child, &mut file.decls);
                }
                other => trace!("Skipping top-level {} in {}", other, path.display()),
            }
        }

        let mut errors = Vec::new();
        if root.has_error() {
            if let Some(bad) = descendants(root).find(|n| n.is_error() || n.is_missing()) {
                let what = if bad.is_missing() {
                    format!("missing {}", bad.kind())
                } else {
                    "unexpected input".to_string()
                };
                errors.push(format!("{}: syntax error: {}", location(path, bad), what));
            }
        }

        Ok(ParseResult { file, errors })
    }
}

/// `// Code generated ... DO NOT EDIT.` on a line of its own
pub fn is_generated(contents: &str) -> bool {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER
        .get_or_init(|| {
            Regex::new(r"(?m)^// Code generated .* DO NOT EDIT\.$").expect("valid generated-file regex")
        })
        .is_match(contents)
}

/// Converts tree-sitter nodes into the syntax model
struct Lowering<'s> {
    source: &'s str,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> String {
        node_text(node, self.source).to_string()
    }

    fn imports(&self, decl: Node) -> Vec<ImportSpec> {
        descendants(decl)
            .filter(|n| n.kind() == "import_spec")
            .filter_map(|spec| {
                let path = spec.child_by_field_name("path")?;
                let path = self
                    .text(path)
                    .trim_matches(|c| c == '"' || c == '`')
                    .to_string();
                let name = spec.child_by_field_name("name").map(|n| self.text(n));
                Some(ImportSpec { name, path })
            })
            .collect()
    }

    fn func_decl(&self, node: Node) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();

        FuncDecl {
            name,
            recv: node
                .child_by_field_name("receiver")
                .map(|list| self.fields(list)),
            type_params: node
                .child_by_field_name("type_parameters")
                .map(|list| self.fields(list))
                .unwrap_or_default(),
            params: node
                .child_by_field_name("parameters")
                .map(|list| self.fields(list))
                .unwrap_or_default(),
            results: node
                .child_by_field_name("result")
                .map(|result| self.results(result))
                .unwrap_or_default(),
            body: node
                .child_by_field_name("body")
                .map(|block| self.statements(block)),
        }
    }

    fn results(&self, result: Node) -> Vec<Field> {
        if result.kind() == "parameter_list" {
            self.fields(result)
        } else {
            vec![Field::anonymous(self.expr(result))]
        }
    }

    /// Parameter, receiver or type parameter list
    fn fields(&self, list: Node) -> Vec<Field> {
        named_children(list)
            .into_iter()
            .filter_map(|decl| {
                let ty = decl.child_by_field_name("type")?;
                let names = field_children(decl, "name", "identifier")
                    .into_iter()
                    .map(|n| self.text(n))
                    .collect();
                let ty = self.expr(ty);
                let ty = if decl.kind() == "variadic_parameter_declaration" {
                    Expr::other("ellipsis", vec![ty])
                } else {
                    ty
                };
                Some(Field { names, ty })
            })
            .collect()
    }

    fn statements(&self, block: Node) -> Vec<Expr> {
        named_children(block)
            .into_iter()
            .map(|stmt| self.expr(stmt))
            .collect()
    }

    fn value_decls(&self, decl: Node, out: &mut Vec<Decl>) {
        let keyword = if decl.kind() == "const_declaration" {
            ValueKeyword::Const
        } else {
            ValueKeyword::Var
        };

        let specs = named_children(decl).into_iter().flat_map(|child| {
            if child.kind() == "var_spec_list" {
                children_of_kind(child, "var_spec")
            } else {
                vec![child]
            }
        });

        for spec in specs.filter(|n| n.kind() == "const_spec" || n.kind() == "var_spec") {
            let names = field_children(spec, "name", "identifier")
                .into_iter()
                .map(|n| self.text(n))
                .collect();
            let ty = spec.child_by_field_name("type").map(|t| self.expr(t));
            let values = spec
                .child_by_field_name("value")
                .map(|list| named_children(list).into_iter().map(|v| self.expr(v)).collect())
                .unwrap_or_default();

            out.push(Decl::Value(ValueSpec {
                keyword,
                names,
                ty,
                values,
            }));
        }
    }

    fn type_decls(&self, decl: Node, out: &mut Vec<Decl>) {
        for spec in named_children(decl) {
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };

            out.push(Decl::Type(TypeSpec {
                name: self.text(name),
                type_params: spec
                    .child_by_field_name("type_parameters")
                    .map(|list| self.fields(list))
                    .unwrap_or_default(),
                ty: self.expr(ty),
                alias,
            }));
        }
    }

    fn field_expr(&self, node: Node, field: &str) -> Option<Expr> {
        node.child_by_field_name(field).map(|child| self.expr(child))
    }

    fn boxed(&self, node: Node, field: &str) -> Box<Expr> {
        Box::new(
            self.field_expr(node, field)
                .unwrap_or_else(|| Expr::other("missing", vec![])),
        )
    }

    fn first_child(&self, node: Node) -> Expr {
        named_children(node)
            .first()
            .map(|child| self.expr(*child))
            .unwrap_or_else(|| Expr::other("missing", vec![]))
    }

    /// `f[A]` is an index, `f[A, B]` an index list, as in Go's own syntax tree
    fn instantiate(&self, base: Expr, mut args: Vec<Expr>) -> Expr {
        match args.len() {
            0 => base,
            1 => Expr::index(base, args.remove(0)),
            _ => Expr::index_list(base, args),
        }
    }

    fn type_arguments(&self, node: Node) -> Vec<Expr> {
        named_children(node).into_iter().map(|arg| self.expr(arg)).collect()
    }

    fn literal_elements(&self, body: Node) -> Vec<Expr> {
        named_children(body).into_iter().map(|elt| self.expr(elt)).collect()
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "identifier" | "type_identifier" | "field_identifier" | "package_identifier"
            | "blank_identifier" | "label_name" => Expr::Ident(self.text(node)),

            "int_literal" | "float_literal" | "imaginary_literal" | "rune_literal"
            | "raw_string_literal" | "interpreted_string_literal" | "nil" | "true" | "false"
            | "iota" => Expr::BasicLit(self.text(node)),

            "selector_expression" => Expr::Selector {
                x: self.boxed(node, "operand"),
                sel: node
                    .child_by_field_name("field")
                    .map(|f| self.text(f))
                    .unwrap_or_default(),
            },

            "qualified_type" => Expr::Selector {
                x: self.boxed(node, "package"),
                sel: node
                    .child_by_field_name("name")
                    .map(|n| self.text(n))
                    .unwrap_or_default(),
            },

            "call_expression" => {
                let fun = self
                    .field_expr(node, "function")
                    .unwrap_or_else(|| Expr::other("missing", vec![]));
                let type_args = node
                    .child_by_field_name("type_arguments")
                    .map(|t| self.type_arguments(t))
                    .unwrap_or_default();
                let args = node
                    .child_by_field_name("arguments")
                    .map(|list| named_children(list).into_iter().map(|a| self.expr(a)).collect())
                    .unwrap_or_default();
                Expr::call(self.instantiate(fun, type_args), args)
            }

            "type_conversion_expression" => Expr::Call {
                fun: self.boxed(node, "type"),
                args: self.field_expr(node, "operand").into_iter().collect(),
            },

            "type_instantiation_expression" => {
                let base = node.child_by_field_name("type");
                let args = named_children(node)
                    .into_iter()
                    .filter(|child| Some(child.id()) != base.map(|b| b.id()))
                    .map(|child| self.expr(child))
                    .collect();
                let base = base
                    .map(|b| self.expr(b))
                    .unwrap_or_else(|| Expr::other("missing", vec![]));
                self.instantiate(base, args)
            }

            "generic_type" => {
                let base = self
                    .field_expr(node, "type")
                    .unwrap_or_else(|| Expr::other("missing", vec![]));
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|t| self.type_arguments(t))
                    .unwrap_or_default();
                self.instantiate(base, args)
            }

            "index_expression" => Expr::Index {
                x: self.boxed(node, "operand"),
                index: self.boxed(node, "index"),
            },

            "slice_expression" => Expr::Slice {
                x: self.boxed(node, "operand"),
                bounds: ["start", "end", "capacity"]
                    .iter()
                    .filter_map(|field| self.field_expr(node, field))
                    .collect(),
            },

            "type_assertion_expression" => Expr::TypeAssert {
                x: self.boxed(node, "operand"),
                ty: self.field_expr(node, "type").map(Box::new),
            },

            "parenthesized_expression" | "parenthesized_type" => Expr::paren(self.first_child(node)),

            "pointer_type" => Expr::star(self.first_child(node)),

            "unary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|o| self.text(o))
                    .unwrap_or_default();
                let operand = *self.boxed(node, "operand");
                if op == "*" {
                    Expr::star(operand)
                } else {
                    Expr::unary(&op, operand)
                }
            }

            "composite_literal" => Expr::CompositeLit {
                ty: self.field_expr(node, "type").map(Box::new),
                elts: node
                    .child_by_field_name("body")
                    .map(|body| self.literal_elements(body))
                    .unwrap_or_default(),
            },

            "literal_value" => Expr::composite(None, self.literal_elements(node)),

            "literal_element" | "variadic_argument" => self.first_child(node),

            "keyed_element" => Expr::KeyValue {
                key: self.boxed(node, "key"),
                value: self.boxed(node, "value"),
            },

            "func_literal" => Expr::FuncLit {
                params: node
                    .child_by_field_name("parameters")
                    .map(|list| self.fields(list))
                    .unwrap_or_default(),
                results: node
                    .child_by_field_name("result")
                    .map(|result| self.results(result))
                    .unwrap_or_default(),
                body: node
                    .child_by_field_name("body")
                    .map(|block| self.statements(block))
                    .unwrap_or_default(),
            },

            "type_elem" | "type_constraint" => {
                let mut parts: Vec<Expr> = named_children(node).into_iter().map(|t| self.expr(t)).collect();
                if parts.len() == 1 {
                    parts.remove(0)
                } else {
                    Expr::Other {
                        kind: "union".to_string(),
                        children: parts,
                    }
                }
            }

            kind => Expr::Other {
                kind: kind.to_string(),
                children: named_children(node).into_iter().map(|c| self.expr(c)).collect(),
            },
        }
    }
}
