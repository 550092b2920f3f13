use super::{LineType, RewriteContext, TransformRule};

/// Rule for replacing media URI lines (segments, variant playlists) with relay URLs.
pub struct MediaUriProxyRule;

impl TransformRule for MediaUriProxyRule {
    fn matches(&self, line_type: LineType) -> bool {
        line_type.is_uri()
    }

    fn transform(&self, line: &str, context: &RewriteContext) -> String {
        context.relay_reference(line.trim())
    }
}
