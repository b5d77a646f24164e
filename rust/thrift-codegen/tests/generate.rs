use thrift_codegen::{EPISODE_FILE_NAME, GenError, GeneratedFile, JsOptions, generate};
use thrift_schema::{ConstValue, Field, Program, SchemaError, Struct, Type};

const TUTORIAL: &str = include_str!("fixtures/tutorial.json");

fn tutorial() -> Program {
    serde_json::from_str(TUTORIAL).unwrap()
}

fn file<'a>(files: &'a [GeneratedFile], name: &str) -> &'a str {
    &files
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("{name} was not generated"))
        .contents
}

fn names(files: &[GeneratedFile]) -> Vec<&str> {
    files.iter().map(|f| f.name.as_str()).collect()
}

#[test]
fn node_run_produces_types_and_service_modules() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    assert_eq!(names(&files), ["tutorial_types.js", "Calculator.js"]);
}

#[test]
fn declarations_and_episode_follow_the_modules() {
    let options = JsOptions::node().ts().package_output_dir("gen-nodejs/");
    let files = generate(&tutorial(), &options).unwrap();
    assert_eq!(
        names(&files),
        [
            "tutorial_types.js",
            "Calculator.js",
            "tutorial_types.d.ts",
            "Calculator.d.ts",
            EPISODE_FILE_NAME,
        ]
    );
    assert_eq!(
        file(&files, EPISODE_FILE_NAME),
        "tutorial_types:gen-nodejs/tutorial_types\nCalculator:gen-nodejs/Calculator\n"
    );
}

#[test]
fn types_module_declares_everything_in_order() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");

    assert!(types.contains("var shared_ttypes = require('./shared_types.js');\n"));
    assert!(types.contains("var ttypes = module.exports = {};\n"));

    let operation = types.find("ttypes.Operation = {").unwrap();
    let constant = types.find("ttypes.INT32CONSTANT = 9853;").unwrap();
    let work = types.find("var Work = module.exports.Work = function(args) {").unwrap();
    let invalid = types
        .find("var InvalidOperation = module.exports.InvalidOperation = function(args) {")
        .unwrap();
    assert!(operation < constant && constant < work && work < invalid);

    assert!(types.contains(
        "ttypes.MAPCONSTANT = {\n  'hello' : 'world',\n  'goodnight' : 'moon'\n};\n"
    ));
}

#[test]
fn int64_constants_switch_to_hex_past_the_exact_range() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains("ttypes.MAX_EXACT = new Int64(9007199254740991);\n"));
    assert!(types.contains("ttypes.FIRST_INEXACT = new Int64('20000000000000');\n"));
}

#[test]
fn struct_reader_switches_on_field_id_and_checks_the_tag() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains("Work.prototype[Symbol.for(\"read\")] = function(input) {\n"));
    assert!(types.contains(
        "      case 3:\n      if (ftype == Thrift.Type.I32) {\n        this.op = input.readI32();\n      } else {\n        input.skip(ftype);\n      }\n      break;\n"
    ));
    assert!(types.contains(
        "      default:\n        input.skip(ftype);\n    }\n    input.readFieldEnd();\n"
    ));
}

#[test]
fn struct_writer_skips_unset_fields_and_always_stops() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains(
        "  if (this.comment !== null && this.comment !== undefined) {\n    output.writeFieldBegin('comment', Thrift.Type.STRING, 4);\n    output.writeString(this.comment);\n    output.writeFieldEnd();\n  }\n  output.writeFieldStop();\n  output.writeStructEnd();\n"
    ));
}

#[test]
fn defaults_are_assigned_before_arguments_are_copied() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains(
        "  this.num1 = 0;\n  this.num2 = null;\n  this.op = null;\n  this.comment = null;\n  if (args) {\n"
    ));
}

#[test]
fn exceptions_extend_the_runtime_exception() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains(
        "  Thrift.TException.call(this, \"InvalidOperation\");\n  this.name = \"InvalidOperation\";\n"
    ));
    assert!(types.contains("Thrift.inherits(InvalidOperation, Thrift.TException);\n"));

    let es6 = generate(&tutorial(), &JsOptions::node().es6()).unwrap();
    let types = file(&es6, "tutorial_types.js");
    assert!(types.contains(
        "const InvalidOperation = module.exports.InvalidOperation = class extends Thrift.TException {\n  constructor(args) {\n    super(args);\n"
    ));
}

#[test]
fn derived_service_layers_on_its_parent() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let service = file(&files, "Calculator.js");
    assert!(service.contains("var SharedService = require('./SharedService');\n"));
    assert!(service.contains("Thrift.inherits(CalculatorClient, SharedServiceClient);\n"));
    assert!(service.contains("Thrift.inherits(CalculatorProcessor, SharedServiceProcessor);\n"));
    assert!(service.contains("exports.Client = CalculatorClient;\n"));
    assert!(service.ends_with("exports.Processor = CalculatorProcessor;\n"));
}

#[test]
fn oneway_calls_send_oneway_and_skip_the_reply() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let service = file(&files, "Calculator.js");
    assert!(service.contains("output.writeMessageBegin('zip', Thrift.MessageType.ONEWAY, this.seqid());"));
    assert!(service.contains("output.writeMessageBegin('add', Thrift.MessageType.CALL, this.seqid());"));
    assert!(!service.contains("recv_zip"));
    assert!(service.contains("CalculatorClient.prototype.recv_calculate = function(input,mtype,rseqid) {"));
}

#[test]
fn client_surfaces_declared_exceptions_before_success() {
    let files = generate(&tutorial(), &JsOptions::node()).unwrap();
    let service = file(&files, "Calculator.js");
    assert!(service.contains(
        "  if (null !== result.ouch) {\n    return callback(result.ouch);\n  }\n  if (null !== result.success) {\n    return callback(null, result.success);\n  }\n  return callback('calculate failed: unknown result');\n"
    ));
}

#[test]
fn browser_run_reads_replies_synchronously() {
    let files = generate(&tutorial(), &JsOptions::browser()).unwrap();
    let service = file(&files, "Calculator.js");
    assert!(!service.contains("require('./"));
    assert!(!service.contains("Processor"));
    assert!(service.contains("CalculatorClient = function(input, output) {\n"));
    assert!(service.contains("    return this.recv_add();\n"));
    assert!(service.contains("  throw 'calculate failed: unknown result';\n"));
}

#[test]
fn namespaced_browser_output_is_qualified() {
    let mut program = tutorial();
    program.namespaces.insert("js".into(), "Tutorial".into());
    let files = generate(&program, &JsOptions::browser()).unwrap();
    let types = file(&files, "tutorial_types.js");
    assert!(types.contains("if (typeof Tutorial === 'undefined') {\n  Tutorial = {};\n}\n"));
    assert!(types.contains("Tutorial.Work = function(args) {\n"));
    let service = file(&files, "Calculator.js");
    assert!(service.contains("Tutorial.Calculator_add_args = function(args) {\n"));
    assert!(service.contains("var args = new Tutorial.Calculator_add_args(params);\n"));
}

#[test]
fn temporaries_stay_unique_across_files() {
    let mut program = tutorial();
    program.structs.push(Struct::new(
        "Bag",
        vec![Field::new(1, "items", Type::list(Type::String))],
    ));
    program.services[0].functions[1].return_type = Type::list(Type::I32);
    let files = generate(&program, &JsOptions::node()).unwrap();
    let types = file(&files, "tutorial_types.js");
    let service = file(&files, "Calculator.js");
    assert!(types.contains("_size0"));
    assert!(!service.contains("_size0"));
}

#[test]
fn void_fields_are_rejected() {
    let mut program = tutorial();
    program
        .structs
        .push(Struct::new("Broken", vec![Field::new(1, "nothing", Type::Void)]));
    let err = generate(&program, &JsOptions::node()).unwrap_err();
    assert!(matches!(
        err,
        GenError::VoidField { .. } | GenError::Schema(SchemaError::VoidType { .. })
    ));
}

#[test]
fn struct_constants_must_name_declared_fields() {
    let mut program = tutorial();
    program.consts.push(thrift_schema::Const {
        name: "BAD".into(),
        ty: Type::struct_ref("Work"),
        value: ConstValue::Map(vec![(
            ConstValue::String("nope".into()),
            ConstValue::Integer(1),
        )]),
        doc: None,
    });
    let err = generate(&program, &JsOptions::node()).unwrap_err();
    assert_eq!(err.to_string(), "type error: Work has no field nope");
}

#[test]
fn typescript_declarations_match_the_node_modules() {
    let files = generate(&tutorial(), &JsOptions::node().ts()).unwrap();
    let types = file(&files, "tutorial_types.d.ts");
    assert!(types.contains("declare enum Operation {\n  ADD = 1,\n"));
    assert!(types.contains("declare class Work {\n  public num1?: number;\n  public num2: number;\n"));
    let service = file(&files, "Calculator.d.ts");
    assert!(service.contains("declare class Client extends SharedService.Client {\n"));
    assert!(service.contains(
        "  calculate(logid: number, w: Work, callback: (error: ttypes.InvalidOperation, response: number)=>void): void;\n"
    ));
}
