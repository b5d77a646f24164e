//! Episode files: `module:path` lines telling later generation runs where
//! this package's modules can be required from.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use thrift_schema::Program;

use crate::GenError;

pub const EPISODE_FILE_NAME: &str = "thrift.js.episode";

/// Merge the episode of the package rooted at `root` into `imports`.
///
/// Paths are stored relative to the package's parent directory, so a line
/// `shared_types:gen/shared_types` under `deps/shared` maps `shared_types`
/// to `shared/gen/shared_types`.
pub(crate) fn parse(
    root: &str,
    contents: &str,
    imports: &mut BTreeMap<String, String>,
) -> Result<(), GenError> {
    let file = format!("{root}/{EPISODE_FILE_NAME}");
    let package = root.rsplit('/').next().unwrap_or(root);
    for line in contents.lines() {
        let malformed = |why: String| {
            GenError::InvalidOptions(format!("the episode file '{file}' is malformed, {why}"))
        };
        let Some((module, path)) = line.split_once(':') else {
            return Err(malformed(format!(
                "the line '{line}' does not have a key:value separator ':'"
            )));
        };
        if module.is_empty() {
            return Err(malformed("the module name is empty".into()));
        }
        if path.is_empty() {
            return Err(malformed("the import path is empty".into()));
        }
        let import_path = format!("{package}/{path}");
        match imports.entry(module.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(import_path);
            }
            Entry::Occupied(existing) => {
                return Err(GenError::InvalidOptions(format!(
                    "multiple providers of import path found for {module}\n\t{import_path}\n\t{}",
                    existing.get()
                )));
            }
        }
    }
    Ok(())
}

/// The episode for `program`: its types module first, then one line per
/// service.
pub(crate) fn render(program: &Program, package_dir: &str) -> String {
    let types_module = format!("{}_types", program.name);
    let mut out = format!("{types_module}:{package_dir}/{types_module}\n");
    for service in &program.services {
        out.push_str(&format!("{0}:{package_dir}/{0}\n", service.name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use thrift_schema::Service;

    #[test]
    fn paths_are_prefixed_with_the_package_name() {
        let mut imports = BTreeMap::new();
        parse(
            "node_modules/shared",
            "shared_types:gen/shared_types\nSharedService:gen/SharedService\n",
            &mut imports,
        )
        .unwrap();
        assert_eq!(imports["shared_types"], "shared/gen/shared_types");
        assert_eq!(imports["SharedService"], "shared/gen/SharedService");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let mut imports = BTreeMap::new();
        let err = parse("pkg", "no separator here", &mut imports).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the episode file 'pkg/thrift.js.episode' is malformed, the line 'no separator here' does not have a key:value separator ':'"
        );
        let err = parse("pkg", ":gen/x", &mut imports).unwrap_err();
        assert!(err.to_string().ends_with("the module name is empty"));
        let err = parse("pkg", "x:", &mut imports).unwrap_err();
        assert!(err.to_string().ends_with("the import path is empty"));
    }

    #[test]
    fn a_module_has_one_provider() {
        let mut imports = BTreeMap::new();
        parse("a", "common_types:gen/common_types", &mut imports).unwrap();
        let err = parse("b", "common_types:out/common_types", &mut imports).unwrap_err();
        assert_eq!(
            err.to_string(),
            "multiple providers of import path found for common_types\n\tb/out/common_types\n\ta/gen/common_types"
        );
    }

    #[test]
    fn services_follow_the_types_module() {
        let mut program = Program::new("tutorial");
        program.services.push(Service::new("Calculator", vec![]));
        assert_eq!(
            render(&program, "lib/gen"),
            "tutorial_types:lib/gen/tutorial_types\nCalculator:lib/gen/Calculator\n"
        );
    }
}
