//! URI parsing: `scheme://host/path`
//!
//! All results borrow from the input; nothing is copied.

/// The three components of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedUri<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub path: &'a str,
}

/// Length of a leading `letter (letter | digit | '.')* "://"` prefix, without the separator
fn scheme_len(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    let len = 1 + bytes[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'.')
        .count();
    input[len..].starts_with("://").then_some(len)
}

/// Split `input` into scheme, host and path
///
/// Without a `scheme://` prefix the whole input is the path. Otherwise the
/// host runs up to the first `/`, and the path starts at that `/` (it is
/// empty when there is none).
///
/// # Examples
/// ```
/// use hdfsio_core::parse_uri;
/// let uri = parse_uri("hdfs://nn1:8020/a/b");
/// assert_eq!((uri.scheme, uri.host, uri.path), ("hdfs", "nn1:8020", "/a/b"));
/// ```
pub fn parse_uri(input: &str) -> ParsedUri<'_> {
    let Some(len) = scheme_len(input) else {
        return ParsedUri {
            scheme: "",
            host: "",
            path: input,
        };
    };
    let rest = &input[len + 3..];
    let (host, path) = match rest.find('/') {
        Some(pos) => rest.split_at(pos),
        None => (rest, ""),
    };
    ParsedUri {
        scheme: &input[..len],
        host,
        path,
    }
}

/// Split an address into (directory, last component)
///
/// The directory keeps the scheme and host. A path with a single leading
/// `/` keeps that `/` as its directory.
pub fn split_path(uri: &str) -> (&str, &str) {
    let path = parse_uri(uri).path;
    // path is always a suffix of uri, and the host ends where it begins
    let path_start = uri.len() - path.len();
    match path.rfind('/') {
        None if path_start == 0 => ("", path),
        None => (&uri[..path_start], path),
        Some(0) => (&uri[..path_start + 1], &path[1..]),
        Some(pos) => (&uri[..path_start + pos], &path[pos + 1..]),
    }
}

/// Last component of the path part of `uri`
pub fn basename(uri: &str) -> &str {
    split_path(uri).1
}

/// Everything before the last component of `uri`
pub fn dirname(uri: &str) -> &str {
    split_path(uri).0
}
