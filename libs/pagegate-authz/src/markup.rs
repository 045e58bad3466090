//! Markup inspection: locating a page's declared template reference.
//!
//! Pages declare their template in their markup header, e.g.
//! `<%@ page Template="/shared/site.tpl" %>`. Only the raw reference is
//! extracted here; combining it against the page's own location is
//! [`combine_reference`], and resolving the combined path to a handler
//! type is the registry's job.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

// The pattern is a literal; failure is only possible at first use and
// means a typo caught by this module's tests.
#[allow(clippy::expect_used)]
static TEMPLATE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Template\s*=\s*"(.+?)""#).expect("static regex should not panic")
});

/// Errors raised while reading page markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// The markup could not be read (missing file, permissions, I/O).
    #[error("failed to read markup at '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

/// Collaborator that reads a page's declared markup and returns its raw
/// template reference, or `None` when the page declares no template.
///
/// A read failure is an error for that single markup read only; callers
/// degrade it to "no template link" rather than failing the request.
pub trait MarkupInspector: Send + Sync {
    /// Raw template reference declared at `location`, if any.
    ///
    /// # Errors
    /// [`MarkupError::Io`] when the markup cannot be read.
    fn template_reference(&self, location: &str) -> Result<Option<String>, MarkupError>;
}

/// Filesystem-backed inspector rooted at a site directory. Site-root
/// locations (`/pages/index.pg`) resolve to files under the root.
pub struct FsMarkupInspector {
    root: PathBuf,
}

impl FsMarkupInspector {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, location: &str) -> PathBuf {
        self.root.join(location.trim_start_matches('/'))
    }
}

impl MarkupInspector for FsMarkupInspector {
    fn template_reference(&self, location: &str) -> Result<Option<String>, MarkupError> {
        let path = self.file_for(location);
        let markup = std::fs::read_to_string(&path).map_err(|source| MarkupError::Io {
            location: location.to_owned(),
            source,
        })?;
        Ok(extract_template_reference(&markup))
    }
}

/// First `Template="..."` declaration in the markup, line by line.
#[must_use]
pub fn extract_template_reference(markup: &str) -> Option<String> {
    markup.lines().find_map(|line| {
        TEMPLATE_REF
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    })
}

/// Combine a raw template reference against the declaring page's location.
///
/// Site-root (`/...`) and app-relative (`~/...`) references stand on their
/// own; anything else is taken relative to the page's directory.
#[must_use]
pub fn combine_reference(page_location: &str, reference: &str) -> String {
    if let Some(rooted) = reference.strip_prefix("~/") {
        return format!("/{rooted}");
    }
    if reference.starts_with('/') {
        return reference.to_owned();
    }
    let dir = page_location
        .rsplit_once('/')
        .map_or("", |(dir, _file)| dir);
    format!("{dir}/{reference}")
}
