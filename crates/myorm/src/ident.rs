//! MySQL identifier quoting.
//!
//! Identifiers are wrapped in backticks. Embedded backticks are stripped before re-quoting,
//! so a name can never break out of its quotes.
//!
//! - `name` becomes `` `name` ``
//! - `db.table` becomes `` `db`.`table` ``, and `t.*` becomes `` `t`.* ``
//! - `u.name AS n` quotes only the first and last tokens: `` `u`.`name` AS `n` ``
//! - expressions containing `(` (e.g. `COUNT(0)`) and a bare `*` are left alone
//!
//! [`quote_field`] is the strict variant for column names that come from conditions or
//! SET lists: it never passes anything through unquoted.
//!
//! # Example
//! ```
//! use myorm::ident::quote_ident;
//!
//! assert_eq!(quote_ident("user.id"), "`user`.`id`");
//! assert_eq!(quote_ident("COUNT(0) total"), "COUNT(0) total");
//! ```

/// Quote a table or column reference.
pub fn quote_ident(name: &str) -> String {
    let name = name.trim();
    if name.contains('(') {
        return name.to_string();
    }
    let name = name.replace('`', "");

    let tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => String::new(),
        [single] => quote_path(single),
        [first, middle @ .., last] => {
            let mut out = quote_path(first);
            for token in middle {
                out.push(' ');
                out.push_str(token);
            }
            out.push(' ');
            out.push_str(&quote_path(last));
            out
        }
    }
}

/// Quote a column reference used as a predicate or assignment target.
///
/// Backticks are stripped and every dotted segment is quoted, keeping a trailing `.*`.
/// Parentheses, spaces and operators end up inside the quotes, so the result is always a
/// plain identifier.
pub fn quote_field(name: &str) -> String {
    let name = name.replace('`', "");
    let name = name.trim();
    if name.is_empty() {
        return String::new();
    }
    quote_path(name)
}

/// Quote each entry and join with commas.
pub fn quote_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_path(path: &str) -> String {
    if path == "*" {
        return path.to_string();
    }
    let (head, wildcard) = match path.strip_suffix(".*") {
        Some(head) => (head, true),
        None => (path, false),
    };
    let mut out = head
        .split('.')
        .map(|seg| format!("`{seg}`"))
        .collect::<Vec<_>>()
        .join(".");
    if wildcard {
        out.push_str(".*");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names() {
        assert_eq!(quote_ident("name"), "`name`");
        assert_eq!(quote_ident("  name "), "`name`");
        assert_eq!(quote_ident(""), "");
        assert_eq!(quote_ident("*"), "*");
    }

    #[test]
    fn embedded_backticks_are_stripped() {
        assert_eq!(quote_ident("`name`"), "`name`");
        assert_eq!(quote_ident("na`me"), "`name`");
    }

    #[test]
    fn dotted_paths() {
        assert_eq!(quote_ident("shop.user"), "`shop`.`user`");
        assert_eq!(quote_ident("u.*"), "`u`.*");
        assert_eq!(quote_ident("shop.user.*"), "`shop`.`user`.*");
    }

    #[test]
    fn aliases_quote_first_and_last() {
        assert_eq!(quote_ident("user u"), "`user` `u`");
        assert_eq!(quote_ident("u.name AS n"), "`u`.`name` AS `n`");
    }

    #[test]
    fn expressions_pass_through() {
        assert_eq!(quote_ident("COUNT(0)"), "COUNT(0)");
        assert_eq!(quote_ident("SUM(`amount`) total"), "SUM(`amount`) total");
    }

    #[test]
    fn fields_are_always_quoted() {
        assert_eq!(quote_field("age"), "`age`");
        assert_eq!(quote_field("u.`age`"), "`u`.`age`");
        assert_eq!(quote_field("u.*"), "`u`.*");
        assert_eq!(quote_field("(1)or(1)"), "`(1)or(1)`");
        assert_eq!(quote_field("COUNT(0)"), "`COUNT(0)`");
        assert_eq!(quote_field(" ` ` "), "");
    }

    #[test]
    fn lists() {
        assert_eq!(quote_list(&["id", "name"]), "`id`,`name`");
        assert_eq!(quote_list::<&str>(&[]), "");
    }
}
