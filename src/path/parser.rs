use super::PathStep;

/// Parse a path expression into steps without consulting any cache.
///
/// Leading dots and surrounding whitespace are ignored, empty segments are
/// dropped, and index tokens that are not integers are skipped. The empty
/// path yields no steps, which addresses the root itself.
pub fn parse_uncached(path: &str) -> Vec<PathStep> {
    let path = path.trim().trim_start_matches('.');

    path.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(parse_segment)
        .collect()
}

fn parse_segment(segment: &str) -> PathStep {
    if let Some(key) = segment.strip_suffix("[]") {
        return PathStep::all(key.trim());
    }

    if segment.ends_with(']') {
        if let Some((key, rest)) = segment.split_once('[') {
            let body = &rest[..rest.len() - 1];
            return PathStep::indices(key.trim(), parse_indices(body));
        }
    }

    PathStep::dict(segment)
}

fn parse_indices(body: &str) -> Vec<i64> {
    body.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| tok.parse::<i64>().ok())
        .collect()
}
