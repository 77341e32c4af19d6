//! Target architecture to Node.js architecture mapping
//!
//! Native addons are rebuilt with node-gyp, which speaks Node's own
//! architecture vocabulary (`x64`, `ia32`, `arm`, ...) rather than the
//! triplet-style names a cross-build configuration carries. This is the
//! single place an unmapped naming convention can silently produce
//! wrong-architecture addons.

use regex::Regex;
use std::sync::OnceLock;

fn ppc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^p(pc|owerpc)(64)?").expect("static regex"))
}

fn x86_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^i.86$").expect("static regex"))
}

/// Map a cross-build target architecture string to the Node.js name.
///
/// Rules are checked in order, first match wins; an unrecognized string is
/// returned unchanged. Note that `aarch64` has no rule and falls through
/// to the identity case: only the `arm64` spelling is mapped. This matches
/// the historical rule set and is deliberate until a target using the
/// `aarch64` spelling shows up with a broken addon build.
pub fn map_node_arch(target_arch: &str) -> &str {
    if ppc_re().is_match(target_arch) {
        "ppc"
    } else if x86_re().is_match(target_arch) {
        "ia32"
    } else if target_arch == "x86_64" {
        "x64"
    } else if target_arch == "arm64" {
        "arm"
    } else {
        target_arch
    }
}
