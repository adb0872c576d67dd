//! Table-name inflection for relation field defaults.
//!
//! `has_many` and `has_and_belongs_to_many` declarations without an explicit
//! field name use the conventional table name of the related entity:
//! `BlogPost` becomes `blog_posts`, `Category` becomes `categories`.

use convert_case::{Case, Casing};
use regex::Regex;
use std::sync::LazyLock;

/// Words with no distinct plural form, matched against the whole name.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "fish",
    "information",
    "jeans",
    "money",
    "rice",
    "series",
    "sheep",
    "species",
];

/// Irregular singular/plural pairs, matched against the whole name.
const IRREGULAR: &[(&str, &str)] = &[
    ("child", "children"),
    ("cow", "kine"),
    ("human", "humans"),
    ("man", "men"),
    ("move", "moves"),
    ("person", "people"),
    ("sex", "sexes"),
    ("zombie", "zombies"),
];

/// Suffix rules, most specific first. The first match wins.
static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)(quiz)$", "${1}zes"),
        (r"(?i)^(oxen)$", "${1}"),
        (r"(?i)^(ox)$", "${1}en"),
        (r"(?i)(m|l)ice$", "${1}ice"),
        (r"(?i)(m|l)ouse$", "${1}ice"),
        (r"(?i)(passer)s?by$", "${1}sby"),
        (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        (r"(?i)(x|ch|ss|sh)$", "${1}es"),
        (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
        (r"(?i)(hive)$", "${1}s"),
        (r"(?i)([lr])f$", "${1}ves"),
        (r"(?i)([^f])fe$", "${1}ves"),
        (r"(?i)sis$", "ses"),
        (r"(?i)([ti])a$", "${1}a"),
        (r"(?i)([ti])um$", "${1}a"),
        (r"(?i)(buffal|potat|tomat)o$", "${1}oes"),
        (r"(?i)(bu)s$", "${1}ses"),
        (r"(?i)(alias|status)$", "${1}es"),
        (r"(?i)(octop|vir)i$", "${1}i"),
        (r"(?i)(octop|vir)us$", "${1}i"),
        (r"(?i)^(ax|test)is$", "${1}es"),
        (r"(?i)s$", "s"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| {
        Regex::new(pattern).ok().map(|regex| (regex, replacement))
    })
    .collect()
});

/// Converts an entity name to snake_case: `BlogPost` -> `blog_post`.
pub fn underscore(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Pluralizes a snake_case name.
///
/// Uncountable and irregular words only match the whole name, so
/// `blue_fish` becomes `blue_fishes` and `sales_person` becomes
/// `sales_persons`. Suffix rules apply to the end of the name.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((singular, plural)) = IRREGULAR
        .iter()
        .find(|(singular, plural)| *singular == lower || *plural == lower)
    {
        return keep_initial(word, singular, plural);
    }

    for (rule, replacement) in PLURAL_RULES.iter() {
        if rule.is_match(word) {
            return rule.replace(word, *replacement).into_owned();
        }
    }

    format!("{}s", word)
}

// Irregular plurals keep the caller's first letter when both forms share it.
fn keep_initial(word: &str, singular: &str, plural: &str) -> String {
    let mut chars = word.chars();
    match (chars.next(), singular.chars().next(), plural.get(1..)) {
        (Some(initial), Some(first), Some(rest)) if plural.starts_with(first) => {
            format!("{}{}", initial, rest)
        }
        _ => plural.to_string(),
    }
}

/// Conventional table name of an entity: snake_case with a plural last word.
pub fn tableize(name: &str) -> String {
    pluralize(&underscore(name))
}
