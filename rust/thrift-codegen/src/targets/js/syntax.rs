use crate::JsOptions;

/// The dialect-dependent bits of emitted code.
///
/// Built once from [`JsOptions`]; emitters ask it for keywords and
/// boilerplate instead of testing switches themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syntax {
    node: bool,
    es6: bool,
    no_ns: bool,
}

impl Syntax {
    pub fn new(options: &JsOptions) -> Self {
        Self {
            node: options.node,
            es6: options.es6,
            no_ns: options.no_ns(),
        }
    }

    pub fn node(self) -> bool {
        self.node
    }

    pub fn es6(self) -> bool {
        self.es6
    }

    /// Namespace objects are flattened away.
    pub fn no_ns(self) -> bool {
        self.no_ns
    }

    /// Declaration keyword for bindings that are never reassigned.
    pub fn const_kw(self) -> &'static str {
        if self.es6 { "const " } else { "var " }
    }

    pub fn let_kw(self) -> &'static str {
        if self.es6 { "let " } else { "var " }
    }

    /// Closes a method: a class member under es6, an assigned function
    /// expression otherwise.
    pub fn method_end(self) -> &'static str {
        if self.es6 { "}" } else { "};" }
    }

    /// Flat modules run in strict mode.
    pub fn strict(self) -> bool {
        (self.node || self.es6) && self.no_ns
    }

    /// Runtime imports every generated module starts with.
    pub fn runtime_imports(self) -> String {
        let c = self.const_kw();
        if self.node {
            let mut out = format!("{c}thrift = require('thrift');\n{c}Thrift = thrift.Thrift;\n");
            if !self.es6 {
                out.push_str(&format!("{c}Q = thrift.Q;\n"));
            }
            out.push_str(&format!("{c}Int64 = require('node-int64');\n"));
            out
        } else {
            format!(
                "if (typeof Int64 === 'undefined' && typeof require === 'function') {{\n  {c}Int64 = require('node-int64');\n}}\n"
            )
        }
    }

    /// The same imports for a declaration file.
    pub fn ts_runtime_imports(self) -> &'static str {
        if self.node {
            "import thrift = require('thrift');\nimport Thrift = thrift.Thrift;\nimport Q = thrift.Q;\nimport Int64 = require('node-int64');\n"
        } else {
            "import Int64 = require('node-int64');\n"
        }
    }

    /// How a receive routine surfaces a failure: to the pending callback
    /// under node, as a throw in the browser.
    pub fn recv_fail(self, value: &str) -> String {
        if self.node {
            format!("return callback({value});")
        } else {
            format!("throw {value};")
        }
    }

    pub fn recv_success(self, value: &str) -> String {
        if self.node {
            format!("return callback(null, {value});")
        } else {
            format!("return {value};")
        }
    }
}

/// The header every generated file carries.
pub fn banner(version: &str) -> String {
    format!(
        "//\n// Autogenerated by Thrift Compiler ({version})\n//\n// DO NOT EDIT UNLESS YOU ARE SURE THAT YOU KNOW WHAT YOU ARE DOING\n//\n"
    )
}
