// ABOUTME: Event-name parsing: sanitization, multi-name splitting, namespaces.
// ABOUTME: Grammar: "name", "name.namespace", or ".namespace" (whole-namespace form).

pub const DEFAULT_NAMESPACE: &str = "base";

/// A resolved event name. `value` may be empty only in the
/// whole-namespace form (".ns"), which unsubscribe uses to drop every
/// handler in a namespace at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub value: String,
    pub namespace: String,
}

impl Topic {
    pub fn is_namespace_only(&self) -> bool {
        self.value.is_empty() && self.namespace != DEFAULT_NAMESPACE
    }

    pub fn has_explicit_namespace(&self) -> bool {
        self.namespace != DEFAULT_NAMESPACE
    }
}

/// Split a subscription string into individual names. Commas, slashes
/// and whitespace separate names; characters outside
/// [a-zA-Z0-9_\- ,/.] are stripped.
pub fn resolve_names(input: &str) -> Vec<String> {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | ',' | '/' | '.' | '-' | '_'))
        .collect::<String>()
        .split([' ', ',', '/'])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Resolve one name into value + namespace. A missing or empty suffix
/// means the default namespace.
pub fn resolve_name(name: &str) -> Topic {
    let mut parts = name.splitn(2, '.');
    let value = parts.next().unwrap_or("").to_owned();
    let namespace = match parts.next() {
        Some(ns) if !ns.is_empty() => ns.to_owned(),
        _ => DEFAULT_NAMESPACE.to_owned(),
    };
    Topic { value, namespace }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_uses_default_namespace() {
        let t = resolve_name("background-ready");
        assert_eq!(t.value, "background-ready");
        assert_eq!(t.namespace, DEFAULT_NAMESPACE);
        assert!(!t.has_explicit_namespace());
    }

    #[test]
    fn suffix_selects_namespace() {
        let t = resolve_name("evt.ns1");
        assert_eq!(t.value, "evt");
        assert_eq!(t.namespace, "ns1");
    }

    #[test]
    fn trailing_dot_is_default_namespace() {
        let t = resolve_name("evt.");
        assert_eq!(t.value, "evt");
        assert_eq!(t.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn leading_dot_is_namespace_only() {
        let t = resolve_name(".ns1");
        assert!(t.is_namespace_only());
        assert_eq!(t.namespace, "ns1");
    }

    #[test]
    fn multiple_names_split_on_separators() {
        let names = resolve_names("a b,c/d");
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn invalid_characters_are_stripped() {
        let names = resolve_names("ev!t@.ns#1");
        assert_eq!(names, vec!["evt.ns1"]);
    }
}
