//! Version information baked in at build time.

/// Identity of this build. Constructed once in `main` and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    /// Pre-release marker such as `dev` or `rc.1`; empty for releases.
    pub prerelease: String,
    /// Build metadata appended after `+`; empty when unset.
    pub metadata: String,
    /// Source revision the binary was built from.
    pub revision: String,
}

impl BuildInfo {
    /// Read the build identity from compile-time environment.
    ///
    /// `TRAWL_PRERELEASE`, `TRAWL_BUILD_METADATA` and `TRAWL_GIT_REVISION`
    /// are optional and may be set by the release pipeline.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            prerelease: option_env!("TRAWL_PRERELEASE").unwrap_or_default().to_string(),
            metadata: option_env!("TRAWL_BUILD_METADATA").unwrap_or_default().to_string(),
            revision: option_env!("TRAWL_GIT_REVISION").unwrap_or_default().to_string(),
        }
    }

    /// `v1.2.3-rc.1+meta (abc123)`; the revision is only shown when `with_revision`.
    pub fn full_version(&self, with_revision: bool) -> String {
        let mut out = format!("v{}", self.version);
        if !self.prerelease.is_empty() {
            out.push('-');
            out.push_str(&self.prerelease);
        }
        if !self.metadata.is_empty() {
            out.push('+');
            out.push_str(&self.metadata);
        }
        if with_revision && !self.revision.is_empty() {
            out.push_str(&format!(" ({})", self.revision));
        }
        out
    }

    pub fn user_agent(&self) -> String {
        format!("trawl/{}", self.full_version(false))
    }
}
