//! 🔗 URL building. One slash of difference. Infinite suffering of difference.

/// 🔗 Join a base endpoint and path segments with `/`, dropping empty segments entirely.
///
/// No empty path components, no trailing slash artifacts, no double slashes where a base
/// ends in `/`. No validation of scheme or reachability either; that's the transport's problem.
///
/// ```
/// use es2es::build_url;
/// assert_eq!(build_url("http://a", ["b", "c"]), "http://a/b/c");
/// assert_eq!(build_url("a", ["", "c"]), "a/c");
/// assert_eq!(build_url("a", ["", ""]), "a");
/// ```
pub fn build_url<'a>(base: &str, segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(segment);
    }
    url
}
