use std::env;
use std::fs;
use std::path::Path;

use reciprocal_core::frontmatter::extract_body;

fn main() {
    println!("cargo:rerun-if-changed=README.md");

    let readme = fs::read_to_string("README.md").expect("Failed to read README.md");

    // The README carries its own front matter; rustdoc gets the body only.
    let body = extract_body(&readme);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("README.md"), body).expect("Failed to write README.md");
}
