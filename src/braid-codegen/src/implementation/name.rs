use std::collections::HashSet;

use quote::ToTokens;
use syn::Type;

use crate::binding::Key;

/// Issues collision-free names for one generation pass.
///
/// One set is shared per name space (fields, methods, types) across an entire
/// shard tree, so a name issued for any unit is never issued again anywhere
/// in the tree. The set is owned by the component implementation and passed
/// by reference; it is never process-wide state.
#[derive(Debug, Default)]
pub struct UniqueNameSet {
    known: HashSet<String>,
}

impl UniqueNameSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a name based on `base` that has not been issued before,
    /// appending a numeric suffix on collision.
    pub fn unique_name(&mut self, base: &str) -> String {
        let mut candidate = base.to_owned();
        let mut suffix = 2usize;
        while !self.known.insert(candidate.clone()) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        candidate
    }

    /// Marks `name` as taken. Does nothing if it already is.
    pub fn claim(&mut self, name: &str) {
        self.known.insert(name.to_owned());
    }
}

/// Derives the base member name for a key, e.g. `replica_database` for a
/// `Database` key qualified with `replica`. Always yields a valid
/// identifier: non-path types and numeric qualifiers can sanitize down to
/// something empty or digit-leading, which `Ident::new` rejects.
pub(crate) fn variable_name(key: &Key) -> String {
    let base = match key.ty() {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_else(|| String::from("binding")),
        other => sanitize(&other.to_token_stream().to_string()),
    };
    let base = to_snake_case(&base);
    let name = match key.qualifier() {
        Some(qualifier) => format!("{}_{base}", to_snake_case(&sanitize(qualifier))),
        None => base,
    };
    if name.is_empty() {
        String::from("binding")
    } else if name.starts_with(|ch: char| ch.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

pub(super) fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i != 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn unique_name_set_disambiguates_with_numeric_suffixes() {
        let mut names = UniqueNameSet::new();
        assert_eq!(names.unique_name("database"), "database");
        assert_eq!(names.unique_name("database"), "database2");
        assert_eq!(names.unique_name("database"), "database3");
        assert_eq!(names.unique_name("config"), "config");
    }

    #[test]
    fn unique_name_set_claim_reserves_a_name() {
        let mut names = UniqueNameSet::new();
        names.claim("initialize");
        assert_eq!(names.unique_name("initialize"), "initialize2");
    }

    #[test]
    fn variable_name_reflects_type_and_qualifier() {
        assert_eq!(
            variable_name(&Key::of(parse_quote!(DatabasePool))),
            "database_pool"
        );
        assert_eq!(
            variable_name(&Key::named(parse_quote!(Database), "replica")),
            "replica_database"
        );
        assert_eq!(
            variable_name(&Key::of(parse_quote!(crate::db::Database))),
            "database"
        );
    }

    #[test]
    fn variable_name_falls_back_for_non_path_types() {
        assert_eq!(variable_name(&Key::of(parse_quote!(()))), "binding");
        assert_eq!(
            variable_name(&Key::of(parse_quote!((Database, Config)))),
            "database_config"
        );
    }

    #[test]
    fn variable_name_never_starts_with_a_digit() {
        let name = variable_name(&Key::named(parse_quote!(Database), "1st"));
        assert_eq!(name, "_1st_database");
        // `Ident::new` panics on invalid identifiers.
        proc_macro2::Ident::new(&name, proc_macro2::Span::call_site());
    }
}
