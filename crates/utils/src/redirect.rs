use url::Url;

pub const DEFAULT_AFTER_SIGN_IN: &str = "/feed";

/// Accept `next` only when it is a path on this origin.
///
/// Anything that could leave the site (`//host`, `https://host`, `/\host`)
/// falls back to [`DEFAULT_AFTER_SIGN_IN`].
pub fn safe_next_path(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => DEFAULT_AFTER_SIGN_IN.to_string(),
    }
}

/// `{base}{path}` with the given query pairs appended.
pub fn with_query(base: &Url, path: &str, pairs: &[(&str, &str)]) -> Result<Url, url::ParseError> {
    let mut url = base.join(path)?;
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_paths_are_kept() {
        assert_eq!(safe_next_path(Some("/my-log")), "/my-log");
        assert_eq!(
            safe_next_path(Some("/sessions/new?x=1")),
            "/sessions/new?x=1"
        );
    }

    #[test]
    fn foreign_or_missing_targets_fall_back() {
        assert_eq!(safe_next_path(None), "/feed");
        assert_eq!(safe_next_path(Some("")), "/feed");
        assert_eq!(safe_next_path(Some("//evil.example")), "/feed");
        assert_eq!(safe_next_path(Some("/\\evil.example")), "/feed");
        assert_eq!(safe_next_path(Some("https://evil.example")), "/feed");
        assert_eq!(safe_next_path(Some("feed")), "/feed");
    }

    #[test]
    fn query_pairs_are_encoded() {
        let base = Url::parse("http://localhost:3000").unwrap();
        let url = with_query(&base, "/auth/callback", &[("code", "a b"), ("next", "/my-log")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/auth/callback?code=a+b&next=%2Fmy-log"
        );
    }
}
