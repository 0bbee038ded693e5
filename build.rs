//! Embeds `templates/` so the binary works without a catalog directory.

use std::fmt::Write as _;
use std::path::Path;

use walkdir::WalkDir;

const CATALOG_DIR: &str = "templates";
/// Per-installation state that lives beside a disk catalog.
const SKIPPED_TOP_LEVEL: &[&str] = &["sources.json"];

fn main() {
    println!("cargo:rerun-if-changed={CATALOG_DIR}");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let root = Path::new(&manifest_dir).join(CATALOG_DIR);

    let mut table = String::from("&[\n");
    if root.is_dir() {
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.expect("catalog directory is readable");
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(&root).expect("entry is under the catalog root");
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if SKIPPED_TOP_LEVEL.contains(&key.as_str()) {
                continue;
            }
            println!("cargo:rerun-if-changed={}", entry.path().display());
            writeln!(
                table,
                "    ({key:?}, include_bytes!({:?}).as_slice()),",
                entry.path().display().to_string()
            )
            .expect("writing to a String cannot fail");
        }
    }
    table.push(']');

    std::fs::write(Path::new(&out_dir).join("embedded_catalog.rs"), table)
        .expect("OUT_DIR is writable");
}
