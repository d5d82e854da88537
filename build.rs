pub fn main() {
    // Generate git version info using vergen
    generate_version_info();

    println!("cargo:rerun-if-changed=build.rs");
}

fn generate_version_info() {
    use vergen_git2::{BuildBuilder, CargoBuilder, Emitter, Git2Builder};

    let build = BuildBuilder::default()
        .build_timestamp(true)
        .build()
        .expect("Failed to configure build info");

    let cargo = CargoBuilder::default()
        .target_triple(true)
        .build()
        .expect("Failed to configure cargo info");

    let git2 = Git2Builder::default()
        .describe(true, true, None) // Enable describe with dirty flag, no pattern match
        .sha(true)
        .build()
        .expect("Failed to configure git info");

    // Outside a git checkout vergen falls back to default values and warns
    Emitter::default()
        .add_instructions(&build)
        .expect("Failed to add build instructions")
        .add_instructions(&cargo)
        .expect("Failed to add cargo instructions")
        .add_instructions(&git2)
        .expect("Failed to add git instructions")
        .emit()
        .expect("Failed to emit version info");
}
