//! Embedded static assets with content-addressed output names.
//!
//! Asset filenames carry a digest fragment derived from their contents, so
//! browsers never serve a stale bundle after an upgrade while repeated
//! builds of the same version stay byte-identical.

use sha2::{Digest, Sha256};

/// Site stylesheet, compiled into the binary.
pub const STYLESHEET: &str = include_str!("../assets/bindery.css");

/// Sidebar/navigation script, compiled into the binary.
pub const SCRIPT: &str = include_str!("../assets/bindery.js");

/// Length of the digest fragment embedded in asset filenames.
const DIGEST_LEN: usize = 8;

/// Hex digest fragment for a content blob.
#[must_use]
pub fn digest_fragment(contents: &[u8]) -> String {
    let digest = Sha256::digest(contents);
    hex::encode(&digest[..DIGEST_LEN / 2])
}

/// Relative output paths of the versioned asset bundle.
#[derive(Clone, Debug)]
pub struct AssetPaths {
    /// Stylesheet path under the output root.
    pub stylesheet: String,
    /// Script path under the output root.
    pub script: String,
    /// Navigation-index artifact path under the output root.
    pub nav_index: String,
    /// Copied project logo path, when configured.
    pub logo: Option<String>,
}

impl AssetPaths {
    /// Compute the asset paths for this build.
    ///
    /// The navigation index depends on the corpus, so its digest is taken
    /// from the serialized index passed in.
    #[must_use]
    pub fn new(nav_index_json: &str) -> Self {
        Self {
            stylesheet: format!(
                "assets/bindery-{}.css",
                digest_fragment(STYLESHEET.as_bytes())
            ),
            script: format!("assets/bindery-{}.js", digest_fragment(SCRIPT.as_bytes())),
            nav_index: format!(
                "assets/nav-{}.js",
                digest_fragment(nav_index_json.as_bytes())
            ),
            logo: None,
        }
    }

    /// Record the copied logo's output path.
    #[must_use]
    pub fn with_logo(mut self, path: String) -> Self {
        self.logo = Some(path);
        self
    }
}
