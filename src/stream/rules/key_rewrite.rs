use super::{LineType, RewriteContext, TransformRule};
use crate::hls::find_uri_attribute;

/// Rule for routing the `URI` of `#EXT-X-KEY` tags through the relay.
///
/// Only the quoted URI value changes; METHOD, IV and key format attributes
/// are kept as written. Key tags without a URI pass through untouched.
pub struct KeyUriRewriteRule;

impl TransformRule for KeyUriRewriteRule {
    fn matches(&self, line_type: LineType) -> bool {
        line_type == LineType::ExtXKey
    }

    fn transform(&self, line: &str, context: &RewriteContext) -> String {
        let tag = line.trim();

        let Some(attr) = find_uri_attribute(tag) else {
            return line.to_string();
        };

        let relayed = context.relay_reference(attr.value);
        format!(
            "{}URI=\"{}\"{}",
            &tag[..attr.span.start],
            relayed,
            &tag[attr.span.end..]
        )
    }
}
