use percent_encoding::percent_decode_str;
use url::{ParseError, Url};

/// Resolves a catalog link against the base origin
///
/// Links that already carry a scheme are used as-is; anything else (an
/// absolute path such as `/roms/nes` or a bare relative path) is joined onto
/// `base`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use romstash::url::resolve_url;
///
/// let base = Url::parse("https://roms.example.com").unwrap();
/// let url = resolve_url(&base, "/roms/nes/page/2").unwrap();
/// assert_eq!(url.as_str(), "https://roms.example.com/roms/nes/page/2");
///
/// let url = resolve_url(&base, "https://cdn.example.com/a.png").unwrap();
/// assert_eq!(url.as_str(), "https://cdn.example.com/a.png");
/// ```
pub fn resolve_url(base: &Url, href: &str) -> Result<Url, ParseError> {
    let href = href.trim();
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => base.join(href),
        Err(e) => Err(e),
    }
}

/// Returns the text after the last `/`, if it is non-empty
///
/// Used for catalog ids, tag ids and page counts, which the site encodes as
/// the final segment of an href.
pub fn last_segment(href: &str) -> Option<&str> {
    href.rsplit('/').next().filter(|segment| !segment.is_empty())
}

/// Derives a local file name from a download URL
///
/// The name is the final non-empty path segment, percent-decoded; query
/// strings and fragments are not part of it. A segment that decodes to
/// invalid UTF-8, a path separator or a dot name keeps its encoded form.
pub fn file_name_for(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    match percent_decode_str(segment).decode_utf8() {
        Ok(decoded)
            if !decoded.contains(['/', '\\']) && decoded != "." && decoded != ".." =>
        {
            Some(decoded.into_owned())
        }
        _ => Some(segment.to_string()),
    }
}
