//! `s3deploy` binary.

fn main() {
    std::process::exit(s3deploy_cli::run());
}
