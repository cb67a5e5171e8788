fn main() {
    // Migrations are embedded with sqlx::migrate!, so a new SQL file must
    // trigger a rebuild even when no Rust source changed.
    println!("cargo:rerun-if-changed=migrations");
}
