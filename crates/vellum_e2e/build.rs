use std::path::PathBuf;
use std::{env, fs};

use vellum_codegen::{Options, Target};
use vellum_ir::Items;

fn main() -> Result<(), Box<dyn core::error::Error>> {
    println!("cargo::rerun-if-changed=kv.json");
    println!("cargo::rustc-check-cfg=cfg(vellum_shared)");
    println!("cargo::rustc-check-cfg=cfg(vellum_export)");

    let items: Items = serde_json::from_str(&fs::read_to_string("kv.json")?)?;
    let options = Options::new("kv")
        .targets([Target::Rust, Target::C])
        .link_name("kv")
        .symbol_prefix("kv_");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?);
    for file in vellum_codegen::generate(&items, &options)? {
        fs::write(out_dir.join(&file.name), file.contents)?;
    }

    // A second copy under other symbols, for the doc tests. They include it
    // through an exported macro holding the absolute path.
    let check = vellum_codegen::generate_rust(&items, &Options::new("kv_check").symbol_prefix("kv_check_"))?;
    let check_path = out_dir.join("kv_check.rs");
    fs::write(&check_path, check)?;
    let check_path = check_path.to_str().ok_or("OUT_DIR is not valid UTF-8")?;
    fs::write(
        out_dir.join("kv_check_macro.rs"),
        format!(
            "/// Declares the bindings again, exported under `kv_check_*`.\n\
             #[doc(hidden)]\n\
             #[macro_export]\n\
             macro_rules! kv_check_bindings {{\n    () => {{\n        include!({check_path:?});\n    }};\n}}\n"
        ),
    )?;
    Ok(())
}
