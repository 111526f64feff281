/// Extracts the trailing path segment of a link target
///
/// Query string and fragment are ignored, as are trailing slashes. The
/// result is not validated; whatever the site put there is the identifier.
///
/// # Examples
///
/// ```
/// use bookmeter_harvest::url::trailing_segment;
///
/// assert_eq!(trailing_segment("/users/116513"), "116513");
/// assert_eq!(trailing_segment("/books/4101010013?ref=log"), "4101010013");
/// assert_eq!(trailing_segment("https://bookmeter.com/users/7/"), "7");
/// ```
pub fn trailing_segment(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
}

/// Returns the text after the last `=` of a link target
///
/// Author links carry their identifier as the value of the final query
/// parameter (`/search?author=NAME`). A link without `=` is returned whole.
///
/// # Examples
///
/// ```
/// use bookmeter_harvest::url::value_after_last_eq;
///
/// assert_eq!(value_after_last_eq("/search?author=Soseki"), "Soseki");
/// assert_eq!(value_after_last_eq("/authors/9"), "/authors/9");
/// ```
pub fn value_after_last_eq(href: &str) -> &str {
    href.rsplit('=').next().unwrap_or(href)
}
