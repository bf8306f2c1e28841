use url::Url;

/// Replaces every character that is not an ASCII letter or digit with `_`
///
/// # Examples
///
/// ```
/// use ton_harvest::url::sanitize_filename;
///
/// assert_eq!(sanitize_filename("ton.org/docs"), "ton_org_docs");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Builds the unsanitized file stem for a page: its host followed by its path
pub fn page_file_stem(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or_default(), url.path())
}

/// Returns the original basename of a document URL
///
/// Uses the last non-empty path segment as it appears in the URL. Returns None
/// when the path has no segments or the segment would escape the output
/// directory.
pub fn document_file_name(url: &Url) -> Option<String> {
    let name = url.path_segments()?.rev().find(|s| !s.is_empty())?;

    if name == "." || name == ".." {
        return None;
    }

    Some(name.replace(['/', '\\'], "_"))
}
