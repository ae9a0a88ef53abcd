/// Expand `${NAME}` placeholders from the process environment.
///
/// Placeholders naming unset variables stay in the output untouched, so a
/// missing secret shows up verbatim in the error that follows.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Expand placeholders through `lookup` instead of the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: copy the remainder as-is.
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let lookup = |name: &str| match name {
            "BRIDGEKEEPER_TEST_VAR" => Some("hello".to_string()),
            _ => None,
        };
        assert_eq!(
            substitute_env_with("key=${BRIDGEKEEPER_TEST_VAR}", lookup),
            "key=hello"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            substitute_env_with("${BRIDGEKEEPER_NONEXISTENT_XYZ}", lookup),
            "${BRIDGEKEEPER_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let lookup = |_: &str| Some("x".to_string());
        assert_eq!(substitute_env_with("url=${DB_URL", lookup), "url=${DB_URL");
    }

    #[test]
    fn substitutes_inside_toml_values() {
        let lookup = |name: &str| (name == "DATA").then(|| "/srv/bridges".to_string());
        assert_eq!(
            substitute_env_with("url = \"sqlite:${DATA}/db\"", lookup),
            "url = \"sqlite:/srv/bridges/db\""
        );
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
