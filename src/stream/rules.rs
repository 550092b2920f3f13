pub mod key_rewrite;
pub mod media_uri;

use super::{classifier::LineType, context::RewriteContext};

pub use key_rewrite::KeyUriRewriteRule;
pub use media_uri::MediaUriProxyRule;

/// Trait for transform rules.
///
/// A rule maps one input line to exactly one output line, so a rewrite
/// never changes the playlist's line count.
pub trait TransformRule: Send + Sync {
    /// Check if this rule should be applied.
    fn matches(&self, line_type: LineType) -> bool;

    /// Transform the line.
    fn transform(&self, line: &str, context: &RewriteContext) -> String;
}

/// Create default set of transform rules.
pub fn default_rules() -> Vec<Box<dyn TransformRule>> {
    vec![Box::new(KeyUriRewriteRule), Box::new(MediaUriProxyRule)]
}
