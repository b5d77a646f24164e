//! Namespaces, module aliases and identifier hygiene.

use thrift_schema::{Field, Program, SchemaError, TypeRef};

use super::JsGenerator;
use crate::GenError;

impl<'a> JsGenerator<'a> {
    /// `ns.` prefix for names declared in `program`, empty if flattened.
    pub(super) fn js_namespace(&self, program: &Program) -> String {
        if self.syntax.no_ns() {
            return String::new();
        }
        match program.namespace("js") {
            Some(ns) => format!("{ns}."),
            None => String::new(),
        }
    }

    pub(super) fn has_js_namespace(&self, program: &Program) -> bool {
        !self.syntax.no_ns() && program.namespace("js").is_some()
    }

    /// The program a reference written in `scope` points into.
    pub(super) fn home(&self, scope: &Program, r: &TypeRef) -> Result<&'a Program, GenError> {
        let name = r.program.as_deref().unwrap_or(&scope.name);
        self.program.find_program(name).ok_or_else(|| {
            GenError::Schema(SchemaError::UnresolvedType {
                name: r.name.clone(),
            })
        })
    }

    /// How code in this run's modules reaches names declared in `home`:
    /// `ttypes.` or an include alias under node, the namespace otherwise.
    pub(super) fn type_prefix(&self, home: &Program) -> String {
        if self.syntax.node() {
            if home.name == self.program.name {
                "ttypes.".into()
            } else {
                format!("{}.", self.alias(home))
            }
        } else {
            self.js_namespace(home)
        }
    }

    /// Fully qualified name of a type referenced from the generated program.
    pub(super) fn qualified(&self, r: &TypeRef) -> Result<String, GenError> {
        self.qualified_in(self.program, r)
    }

    pub(super) fn qualified_in(&self, scope: &Program, r: &TypeRef) -> Result<String, GenError> {
        let home = self.home(scope, r)?;
        Ok(format!("{}{}", self.type_prefix(home), r.name))
    }

    /// `<ident>_ttypes`, the binding an include is required into.
    pub(super) fn alias(&self, include: &Program) -> String {
        self.aliases
            .borrow_mut()
            .entry(include.name.clone())
            .or_insert_with(|| format!("{}_ttypes", valid_identifier(&include.name)))
            .clone()
    }

    /// Where an include's types module is required from.
    pub(super) fn import_path(&self, include: &Program) -> String {
        let local = format!("./{}_types.js", include.name);
        if include.recursive {
            return local;
        }
        self.options
            .imports
            .get(&format!("{}_types", include.name))
            .cloned()
            .unwrap_or(local)
    }

    /// `require` lines for includes, node only.
    pub(super) fn include_imports(&self) -> String {
        if !self.syntax.node() {
            return String::new();
        }
        let c = self.syntax.const_kw();
        let mut out = String::new();
        for include in &self.program.includes {
            out.push_str(&format!(
                "{c}{} = require('{}');\n",
                self.alias(include),
                self.import_path(include)
            ));
        }
        if !self.program.includes.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Cumulative pieces of this program's namespace: `a`, `a.b`, `a.b.c`.
    pub(super) fn namespace_pieces(&self) -> Vec<String> {
        let Some(ns) = self.program.namespace("js") else {
            return Vec::new();
        };
        let mut pieces = Vec::new();
        let mut current = String::new();
        for part in ns.split('.') {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(part);
            pieces.push(current.clone());
        }
        pieces
    }
}

/// Make `name` usable as a node.js identifier.
pub(super) fn valid_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// `base`, underscored until no field already uses the name.
pub(super) fn unused_name(fields: &[Field], base: &str) -> String {
    let mut name = valid_identifier(base);
    while fields.iter().any(|f| f.name == name) {
        name = valid_identifier(&format!("_{name}"));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsOptions;
    use thrift_schema::Type;

    #[test]
    fn identifiers_are_sanitized() {
        assert_eq!(valid_identifier("shared"), "shared");
        assert_eq!(valid_identifier("2fast"), "_2fast");
        assert_eq!(valid_identifier("my-lib.v2"), "my_lib_v2");
        assert_eq!(valid_identifier("$cash_"), "$cash_");
    }

    #[test]
    fn params_avoids_argument_names() {
        let none: Vec<Field> = vec![];
        assert_eq!(unused_name(&none, "params"), "params");
        let args = vec![
            Field::new(1, "params", Type::I32),
            Field::new(2, "_params", Type::I32),
        ];
        assert_eq!(unused_name(&args, "params"), "__params");
    }

    fn with_namespace(ns: &str) -> Program {
        let mut p = Program::new("app");
        p.namespaces.insert("js".into(), ns.into());
        let mut dep = Program::new("1dep");
        dep.namespaces.insert("js".into(), "Dep".into());
        p.includes.push(dep);
        p
    }

    #[test]
    fn node_reaches_types_through_aliases() {
        let program = with_namespace("App.Core");
        let options = JsOptions::node();
        let g = JsGenerator::new(&program, &options);
        assert_eq!(g.qualified(&TypeRef::local("Point")).unwrap(), "ttypes.Point");
        assert_eq!(
            g.qualified(&TypeRef::in_program("Thing", "1dep")).unwrap(),
            "_1dep_ttypes.Thing"
        );
        assert_eq!(g.js_namespace(&program), "");
    }

    #[test]
    fn browser_reaches_types_through_namespaces() {
        let program = with_namespace("App.Core");
        let options = JsOptions::browser();
        let g = JsGenerator::new(&program, &options);
        assert_eq!(g.qualified(&TypeRef::local("Point")).unwrap(), "App.Core.Point");
        assert_eq!(
            g.qualified(&TypeRef::in_program("Thing", "1dep")).unwrap(),
            "Dep.Thing"
        );
        assert_eq!(g.namespace_pieces(), ["App", "App.Core"]);
    }

    #[test]
    fn import_paths_come_from_episodes_unless_recursive() {
        let mut program = with_namespace("App");
        let mut options = JsOptions::node();
        options
            .add_import("deps/dep", "1dep_types:gen/1dep_types")
            .unwrap();
        {
            let g = JsGenerator::new(&program, &options);
            assert_eq!(g.import_path(&program.includes[0]), "dep/gen/1dep_types");
            assert_eq!(
                g.include_imports(),
                "var _1dep_ttypes = require('dep/gen/1dep_types');\n\n"
            );
        }
        program.includes[0].recursive = true;
        let g = JsGenerator::new(&program, &options);
        assert_eq!(g.import_path(&program.includes[0]), "./1dep_types.js");
    }

    #[test]
    fn unresolved_references_are_fatal() {
        let program = Program::new("app");
        let options = JsOptions::node();
        let g = JsGenerator::new(&program, &options);
        assert!(g.qualified(&TypeRef::in_program("X", "nowhere")).is_err());
    }
}
