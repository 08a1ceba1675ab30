/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
///
/// GitHub formats the header as
///   <https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        is_next.then(|| url.to_string())
    })
}
