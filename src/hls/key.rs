use std::ops::Range;

const KEY_TAG: &str = "#EXT-X-KEY:";
const URI_ATTR: &[u8] = b"URI=\"";

/// Returns true if the (trimmed) line is an `#EXT-X-KEY:` tag, matched case-insensitively.
pub fn is_key_tag(line: &str) -> bool {
    line.get(..KEY_TAG.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(KEY_TAG))
}

/// Location of a quoted `URI="..."` attribute inside a tag line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriAttribute<'a> {
    /// Byte span of the whole attribute, from `URI` through the closing quote.
    pub span: Range<usize>,
    /// The unquoted value.
    pub value: &'a str,
}

/// Find the first `URI="<value>"` attribute with a non-empty value.
///
/// The attribute name is matched case-insensitively. Other attributes
/// (METHOD, IV, KEYFORMAT...) are not inspected.
pub fn find_uri_attribute(line: &str) -> Option<UriAttribute<'_>> {
    let bytes = line.as_bytes();

    for start in 0..bytes.len() {
        let Some(candidate) = bytes.get(start..start + URI_ATTR.len()) else {
            break;
        };
        if !candidate.eq_ignore_ascii_case(URI_ATTR) {
            continue;
        }

        let value_start = start + URI_ATTR.len();
        match line[value_start..].find('"') {
            Some(len) if len > 0 => {
                let value_end = value_start + len;
                return Some(UriAttribute {
                    span: start..value_end + 1,
                    value: &line[value_start..value_end],
                });
            }
            _ => continue,
        }
    }

    None
}
