//! The `<program>_types.js` module.

use thrift_schema::{Const, Enum};

use super::syntax::banner;
use super::{JsGenerator, Out, writer};
use crate::{GenError, cw_writeln};

pub(super) fn types_file(g: &JsGenerator<'_>) -> Result<String, GenError> {
    let syntax = g.syntax;
    let c = syntax.const_kw();
    let mut w = writer();

    w.write_lines(&banner(&g.options.compiler_version))?;
    if syntax.strict() {
        w.writeln("\"use strict\";")?;
        w.blank_line()?;
    }
    w.write_lines(&syntax.runtime_imports())?;
    w.blank_line()?;
    w.write_lines(&g.include_imports())?;
    w.blank_line()?;

    if syntax.node() {
        cw_writeln!(w, "{c}ttypes = module.exports = {{}};")?;
    }
    if !syntax.no_ns() {
        for piece in g.namespace_pieces() {
            cw_writeln!(w, "if (typeof {piece} === 'undefined') {{")?;
            cw_writeln!(w, "  {piece} = {{}};")?;
            w.writeln("}")?;
            w.writeln("if (typeof module !== 'undefined' && module.exports) {")?;
            cw_writeln!(w, "  module.exports.{piece} = {piece};")?;
            w.writeln("}")?;
        }
    }

    for e in &g.program.enums {
        enum_definition(g, &mut w, e)?;
    }
    for constant in &g.program.consts {
        const_definition(g, &mut w, constant)?;
    }
    for def in &g.program.structs {
        g.struct_definition(&mut w, def, true)?;
    }

    tracing::debug!(
        program = %g.program.name,
        enums = g.program.enums.len(),
        consts = g.program.consts.len(),
        structs = g.program.structs.len(),
        "types module"
    );
    Ok(w.into_inner())
}

fn enum_definition(g: &JsGenerator<'_>, w: &mut Out, e: &Enum) -> Result<(), GenError> {
    cw_writeln!(w, "{}{} = {{", g.type_prefix(g.program), e.name)?;
    {
        let _values = w.indent();
        let last = e.values.len().saturating_sub(1);
        for (i, v) in e.values.iter().enumerate() {
            // Reverse entries let TypeScript's enum lookup work both ways.
            if g.options.ts {
                cw_writeln!(w, "'{}' : '{}',", v.value, v.name)?;
            }
            let sep = if i == last { "" } else { "," };
            cw_writeln!(w, "'{}' : {}{sep}", v.name, v.value)?;
        }
    }
    w.writeln("};")?;
    Ok(())
}

fn const_definition(g: &JsGenerator<'_>, w: &mut Out, constant: &Const) -> Result<(), GenError> {
    let value = g.render_value(&constant.ty, &constant.value, w.indent_level())?;
    cw_writeln!(
        w,
        "{}{} = {value};",
        g.type_prefix(g.program),
        constant.name
    )?;
    Ok(())
}
