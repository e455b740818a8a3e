//! Build metadata accessors.
//! Includes the generated version.rs from the build script, providing a
//! single source of truth for the binary banner and `--version` output.

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Crate version string captured at build time
pub fn version() -> &'static str {
    KIOSK_VERSION
}

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// One-line banner used at startup
pub fn banner() -> String {
    format!(
        "visitor-kiosk {} ({} built {})",
        version(),
        git_hash(),
        build_time()
    )
}
