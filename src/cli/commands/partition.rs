//! Partition command - split an install root into a final prefix

use crate::cli::args::PartitionArgs;
use crate::error::{CrossnpmError, CrossnpmResult};
use crate::partition;
use console::style;

/// Execute the partition command
pub fn execute(args: PartitionArgs) -> CrossnpmResult<()> {
    if !args.install_root.is_dir() {
        return Err(CrossnpmError::PathNotFound(args.install_root));
    }

    let summary = partition::partition(&args.install_root, &args.prefix)?;

    println!(
        "{} Partitioned into {}: {} native addons, {} lock manifests stripped{}",
        style("✓").green(),
        args.prefix.display(),
        summary.native_modules,
        summary.stripped_manifests,
        if summary.binaries_copied {
            ", executables copied"
        } else {
            ""
        }
    );
    Ok(())
}
