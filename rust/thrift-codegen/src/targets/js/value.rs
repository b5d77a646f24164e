//! Constant literals as JavaScript expressions.

use thrift_schema::{BaseType, ConstValue, Program, SchemaError, Type, TypeKind, category};

use super::JsGenerator;
use crate::GenError;
use crate::render;

impl JsGenerator<'_> {
    /// Render `value` as an expression of type `ty`.
    ///
    /// `level` is the indentation depth of the line the expression starts on;
    /// multi-line struct and map literals indent their entries one deeper.
    pub(super) fn render_value(
        &self,
        ty: &Type,
        value: &ConstValue,
        level: usize,
    ) -> Result<String, GenError> {
        self.render_in(self.program, ty, value, level)
    }

    fn render_in(
        &self,
        scope: &Program,
        ty: &Type,
        value: &ConstValue,
        level: usize,
    ) -> Result<String, GenError> {
        let context = || ty.display_name();
        match category(ty) {
            TypeKind::Base(BaseType::Void) => Err(GenError::VoidField {
                field: context(),
                serialize: true,
            }),
            TypeKind::Base(BaseType::String | BaseType::Binary) => match value {
                ConstValue::String(s) => Ok(render::quote(s)),
                other => Err(shape("string", other, context())),
            },
            TypeKind::Base(BaseType::Bool) => {
                let v = integer(value, context)?;
                Ok(if v > 0 { "true" } else { "false" }.into())
            }
            TypeKind::Base(BaseType::I8 | BaseType::I16 | BaseType::I32) | TypeKind::Enum(_) => {
                Ok(integer(value, context)?.to_string())
            }
            TypeKind::Base(BaseType::I64) => Ok(render::int64(integer(value, context)?)),
            TypeKind::Base(BaseType::Double) => match value {
                ConstValue::Integer(v) => Ok(v.to_string()),
                ConstValue::Double(v) => Ok(render::double(*v)),
                other => Err(shape("double", other, context())),
            },
            TypeKind::Struct(r) | TypeKind::Exception(r) => {
                let home = self.home(scope, r)?;
                let def = home.structs.iter().find(|s| s.name == r.name).ok_or_else(|| {
                    GenError::Schema(SchemaError::UnresolvedType {
                        name: r.name.clone(),
                    })
                })?;
                let ConstValue::Map(entries) = value else {
                    return Err(shape("map", value, context()));
                };
                let inner = "  ".repeat(level + 1);
                let mut out = format!("new {}{}({{", self.type_prefix(home), def.name);
                for (i, (key, v)) in entries.iter().enumerate() {
                    let Some(name) = key.as_str() else {
                        return Err(shape("string", key, format!("a field name of {}", def.name)));
                    };
                    let field = def.field(name).ok_or_else(|| GenError::NoSuchField {
                        struct_name: def.name.clone(),
                        field: name.to_string(),
                    })?;
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&format!(
                        "\n{inner}{} : {}",
                        render::quote(name),
                        self.render_in(home, &field.ty, v, level + 1)?
                    ));
                }
                out.push_str(&format!("\n{}}})", "  ".repeat(level)));
                Ok(out)
            }
            TypeKind::Map { key, value: value_ty } => {
                let ConstValue::Map(entries) = value else {
                    return Err(shape("map", value, context()));
                };
                let inner = "  ".repeat(level + 1);
                let mut rendered = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let key_text = match category(key) {
                        TypeKind::Base(BaseType::I64) => {
                            format!("\"{}\"", integer(k, || key.display_name())?)
                        }
                        _ => self.render_in(scope, key, k, level + 1)?,
                    };
                    let value_text = self.render_in(scope, value_ty, v, level + 1)?;
                    rendered.push(format!("{inner}{key_text} : {value_text}"));
                }
                Ok(format!(
                    "{{\n{}\n{}}}",
                    rendered.join(",\n"),
                    "  ".repeat(level)
                ))
            }
            TypeKind::List { element } | TypeKind::Set { element } => {
                let ConstValue::List(items) = value else {
                    return Err(shape("list", value, context()));
                };
                let rendered = items
                    .iter()
                    .map(|item| self.render_in(scope, element, item, level))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", rendered.join(",")))
            }
        }
    }
}

fn integer(value: &ConstValue, context: impl FnOnce() -> String) -> Result<i64, GenError> {
    match value {
        ConstValue::Integer(v) => Ok(*v),
        other => Err(shape("integer", other, context())),
    }
}

fn shape(expected: &str, found: &ConstValue, context: String) -> GenError {
    GenError::ConstShape {
        expected: expected.to_string(),
        context: format!("{context} (found a {})", found.shape_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsOptions;
    use thrift_schema::{Field, Struct, TypeRef};

    fn program() -> Program {
        let mut p = Program::new("geo");
        p.structs.push(Struct::new(
            "Point",
            vec![
                Field::new(1, "x", Type::I32),
                Field::new(2, "label", Type::String),
            ],
        ));
        p.structs.push(Struct::new(
            "Segment",
            vec![
                Field::new(1, "from", Type::struct_ref("Point")),
                Field::new(2, "to", Type::struct_ref("Point")),
            ],
        ));
        p
    }

    fn render(program: &Program, options: &JsOptions, ty: &Type, value: &ConstValue) -> String {
        JsGenerator::new(program, options)
            .render_value(ty, value, 0)
            .unwrap()
    }

    fn s(v: &str) -> ConstValue {
        ConstValue::String(v.into())
    }

    #[test]
    fn scalars() {
        let p = program();
        let o = JsOptions::node();
        assert_eq!(render(&p, &o, &Type::Bool, &ConstValue::Integer(1)), "true");
        assert_eq!(render(&p, &o, &Type::Bool, &ConstValue::Integer(0)), "false");
        assert_eq!(render(&p, &o, &Type::I16, &ConstValue::Integer(-3)), "-3");
        assert_eq!(render(&p, &o, &Type::String, &s("it's")), r"'it\'s'");
        assert_eq!(render(&p, &o, &Type::Double, &ConstValue::Integer(2)), "2");
        assert_eq!(render(&p, &o, &Type::Double, &ConstValue::Double(2.5)), "2.5");
        assert_eq!(
            render(&p, &o, &Type::enum_ref("Color"), &ConstValue::Integer(4)),
            "4"
        );
    }

    #[test]
    fn int64_constants_switch_to_hex_past_two_to_the_53() {
        let p = program();
        let o = JsOptions::node();
        assert_eq!(
            render(&p, &o, &Type::I64, &ConstValue::Integer(9_007_199_254_740_991)),
            "new Int64(9007199254740991)"
        );
        assert_eq!(
            render(&p, &o, &Type::I64, &ConstValue::Integer(9_007_199_254_740_992)),
            "new Int64('20000000000000')"
        );
    }

    #[test]
    fn nested_struct_literals_indent_per_level() {
        let p = program();
        let o = JsOptions::node();
        let value = ConstValue::Map(vec![
            (
                s("from"),
                ConstValue::Map(vec![(s("x"), ConstValue::Integer(1))]),
            ),
            (
                s("to"),
                ConstValue::Map(vec![
                    (s("x"), ConstValue::Integer(2)),
                    (s("label"), s("end")),
                ]),
            ),
        ]);
        assert_eq!(
            render(&p, &o, &Type::struct_ref("Segment"), &value),
            "new ttypes.Segment({\n  'from' : new ttypes.Point({\n    'x' : 1\n  }),\n  'to' : new ttypes.Point({\n    'x' : 2,\n    'label' : 'end'\n  })\n})"
        );
    }

    #[test]
    fn unknown_struct_keys_are_fatal() {
        let p = program();
        let o = JsOptions::node();
        let err = JsGenerator::new(&p, &o)
            .render_value(
                &Type::struct_ref("Point"),
                &ConstValue::Map(vec![(s("z"), ConstValue::Integer(0))]),
                0,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "type error: Point has no field z");
    }

    #[test]
    fn maps_quote_int64_keys() {
        let p = program();
        let o = JsOptions::node();
        let ty = Type::map(Type::I64, Type::list(Type::I32));
        let value = ConstValue::Map(vec![(
            ConstValue::Integer(7),
            ConstValue::List(vec![ConstValue::Integer(1), ConstValue::Integer(2)]),
        )]);
        assert_eq!(render(&p, &o, &ty, &value), "{\n  \"7\" : [1,2]\n}");

        let ty = Type::map(Type::String, Type::Bool);
        let value = ConstValue::Map(vec![
            (s("a"), ConstValue::Integer(1)),
            (s("b"), ConstValue::Integer(0)),
        ]);
        assert_eq!(render(&p, &o, &ty, &value), "{\n  'a' : true,\n  'b' : false\n}");
    }

    #[test]
    fn foreign_struct_literals_resolve_in_their_own_program() {
        let mut p = Program::new("app");
        p.includes.push(program());
        let o = JsOptions::node();
        let value = ConstValue::Map(vec![(
            s("from"),
            ConstValue::Map(vec![(s("x"), ConstValue::Integer(0))]),
        )]);
        let ty = Type::Struct(TypeRef::in_program("Segment", "geo"));
        assert_eq!(
            render(&p, &o, &ty, &value),
            "new geo_ttypes.Segment({\n  'from' : new geo_ttypes.Point({\n    'x' : 0\n  })\n})"
        );
    }

    #[test]
    fn shape_mismatches_are_fatal() {
        let p = program();
        let o = JsOptions::node();
        let err = JsGenerator::new(&p, &o)
            .render_value(&Type::list(Type::I32), &ConstValue::Integer(1), 0)
            .unwrap_err();
        assert!(matches!(err, GenError::ConstShape { .. }));
    }
}
