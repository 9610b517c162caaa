//! Walkthrough of the public surface against `demos/demo.ini`.
//!
//! Run with `cargo run --example demo`.

use inifold::{Ini, IniError};

fn main() -> Result<(), IniError> {
    let root = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/demo.ini");
    let mut ini = Ini::load(root)?;

    println!("--- expanded context ---");
    println!("{ini}");
    println!();

    println!("string       : {:?}", ini.find("Run~Name", &[])?);
    println!("int          : {:?}", ini.find_int("Run~Window", &[])?);
    println!("float        : {:?}", ini.find_float("Run~Threshold", &[])?);
    println!("bool         : {:?}", ini.find_bool("Run~Enabled", &[])?);
    println!("str vec      : {:?}", ini.find_str_vec("Run~Names", &[])?);
    println!("int vec      : {:?}", ini.find_int_vec("Run~Sizes", &[])?);
    println!("float vec    : {:?}", ini.find_float_vec("Run~Weights", &[])?);
    println!("shell        : {:?}", ini.find("Run~Host", &[])?);
    println!("none field   : {:?}", ini.find("Run~Optional", &[])?);
    println!("referenced   : {:?}", ini.find("Report~Target", &[])?);
    println!("deferred     : {:?}", ini.find("Run~Summary", &[])?);
    println!("from include : {:?}", ini.find_int("Limits~MaxOrders", &[])?);
    println!(
        "kwargs       : {:?}",
        ini.find("Report~Daily", &[("dt", "20260830")])?
    );
    println!(
        "get default  : {:?}",
        ini.get("Missing~Key", Some("fallback"), &[])?
    );

    ini.set("Run~Patched", 123);
    println!(
        "set + exists : {} -> {:?}",
        ini.exists("run~patched"),
        ini.find("Run~Patched", &[])?
    );

    Ok(())
}
