use url::Url;

/// Resolve `reference` against `base`.
///
/// Absolute references come back normalized; relative ones are joined per
/// the WHATWG URL rules. When the join fails the reference is returned
/// unchanged so one bad line cannot abort a whole rewrite.
pub fn resolve_reference(base: &Url, reference: &str) -> String {
    match base.join(reference) {
        Ok(resolved) => resolved.into(),
        Err(e) => {
            tracing::debug!("Keeping unresolvable reference {:?}: {}", reference, e);
            reference.to_string()
        }
    }
}
