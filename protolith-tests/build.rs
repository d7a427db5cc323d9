use std::env;
use std::path::PathBuf;

fn main() {
    let proto_dir = PathBuf::from("proto");
    let includes = &[proto_dir.clone()];

    let mut config = protolith_compiler::Config::new();
    config.file_descriptor_set_path(
        PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR environment variable not set"))
            .join("file_descriptor_set.bin"),
    );

    config
        .compile_protos(&[proto_dir.join("scenarios.proto")], includes)
        .unwrap();

    config
        .compile_protos(&[proto_dir.join("wrappers.proto")], includes)
        .unwrap();

    config
        .compile_protos(&[proto_dir.join("target_package.proto")], includes)
        .unwrap();
}
