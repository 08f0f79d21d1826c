/// Table naming convention for entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingStrategy {
    /// Use `user_profile` rather than `user_profiles` for `UserProfile`.
    pub singular_table: bool,
}

impl NamingStrategy {
    /// Table name for an entity type name, e.g. `OrderItem` -> `order_item`.
    pub fn table_name(&self, entity: &str) -> String {
        let snake = to_snake_case(entity);
        if self.singular_table {
            snake
        } else {
            pluralize(&snake)
        }
    }
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || acronym_end {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with(['s', 'x', 'z']) || word.ends_with("ch") || word.ends_with("sh") {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Session behaviour attached to every handle opened by the manager.
///
/// Only `skip_default_transaction` changes what [`Db`](crate::Db) does.
/// The foreign-key and naming settings are advisory: code that creates
/// tables from entity types reads them from [`Db::session`](crate::Db::session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// When false, single write statements run inside their own transaction.
    pub skip_default_transaction: bool,

    /// Foreign-key constraints are left out when a schema is synchronised
    /// from entity definitions.
    pub disable_foreign_key_constraint_when_migrating: bool,

    pub naming: NamingStrategy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skip_default_transaction: false,
            disable_foreign_key_constraint_when_migrating: true,
            naming: NamingStrategy {
                singular_table: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_matches_manager_contract() {
        let cfg = SessionConfig::default();
        assert!(!cfg.skip_default_transaction);
        assert!(cfg.disable_foreign_key_constraint_when_migrating);
        assert!(cfg.naming.singular_table);
    }

    #[test]
    fn singular_names_are_snake_case() {
        let naming = NamingStrategy {
            singular_table: true,
        };
        assert_eq!(naming.table_name("User"), "user");
        assert_eq!(naming.table_name("OrderItem"), "order_item");
        assert_eq!(naming.table_name("HTTPRequestLog"), "http_request_log");
        assert_eq!(naming.table_name("Oauth2Token"), "oauth2_token");
    }

    #[test]
    fn plural_names_when_singular_is_off() {
        let naming = NamingStrategy {
            singular_table: false,
        };
        assert_eq!(naming.table_name("OrderItem"), "order_items");
        assert_eq!(naming.table_name("Category"), "categories");
        assert_eq!(naming.table_name("Key"), "keys");
        assert_eq!(naming.table_name("Address"), "addresses");
        assert_eq!(naming.table_name("Batch"), "batches");
    }
}
