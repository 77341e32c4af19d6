//! Arch command - print the Node.js architecture for a target

use crate::arch::map_node_arch;
use crate::cli::args::ArchArgs;
use crate::error::CrossnpmResult;

/// Execute the arch command
pub fn execute(args: ArchArgs) -> CrossnpmResult<()> {
    println!("{}", map_node_arch(&args.target_arch));
    Ok(())
}
