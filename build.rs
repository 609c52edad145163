//! Compiles `proto/seo.proto` into the gRPC server and client stubs used by `infra::grpc`.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/seo.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/seo.proto");

    Ok(())
}
