#![forbid(unsafe_code)]

// `embed_migrations!` cannot track the migration files itself.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}
