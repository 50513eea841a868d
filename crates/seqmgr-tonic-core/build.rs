/// Builds the gRPC client and server code for `seqmgr.proto` using
/// `tonic-prost-build`.
///
/// The generated bindings land in `OUT_DIR` and are pulled in by `src/lib.rs`
/// through `tonic::include_proto!("seqmgr")`. A file descriptor set is emitted
/// alongside them so the server can register gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/seqmgr.proto`
/// - Includes: `proto/`
///
/// # Panics
///
/// Panics if `OUT_DIR` is unset or code generation fails; both abort the
/// build anyway.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("seqmgr_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/seqmgr.proto"], &["proto"])
        .unwrap();
}
