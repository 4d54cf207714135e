//! `listbucket [--bucket] [--matching]`.

use std::io::Write;

use s3deploy_app::BucketLister;
use s3deploy_config::DeployerConfig;
use s3deploy_storage::ObjectStore;
use tracing::debug;

use crate::cli::{ListBucketArgs, OutputFormat};
use crate::context::CliResult;
use crate::output::{render_key_line, render_keys_json};

pub(crate) fn handle_listbucket<S: ObjectStore>(
    store: S,
    config: &DeployerConfig,
    args: &ListBucketArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let bucket = args
        .bucket
        .as_deref()
        .unwrap_or(&config.storage.bucket);
    let lister = BucketLister::new(store);
    let listing = lister.list(bucket, args.matching.as_deref())?;

    match format {
        OutputFormat::Table => {
            let mut printed = 0_usize;
            for key in listing {
                render_key_line(out, &key?)?;
                printed += 1;
            }
            debug!(bucket, printed, "listing complete");
            Ok(())
        }
        OutputFormat::Json => {
            let keys = listing.collect::<Result<Vec<_>, _>>()?;
            render_keys_json(out, &keys)
        }
    }
}
