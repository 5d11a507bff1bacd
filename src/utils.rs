//! # Utility Functions Module
//!
//! Helpers for building external tool command lines without lossy
//! path-to-string conversions.

/// Builds a `Vec<OsString>` from a heterogeneous list of flags and paths.
///
/// Paths and string literals both implement `AsRef<OsStr>`, so a command line
/// mixing flags and file paths can be built without `to_string_lossy()`.
///
/// # Example
/// ```rust
/// use space_image_optimizer::os_args;
/// use std::path::Path;
///
/// let output = Path::new("/tmp/out.png");
/// let args = os_args!["-o7", "-out", output];
/// assert_eq!(args[2].as_os_str(), output.as_os_str());
/// ```
#[macro_export]
macro_rules! os_args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::ffi::OsStr::new($item).to_os_string()),*]
    };
}
