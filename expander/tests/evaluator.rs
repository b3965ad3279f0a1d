use expander::evaluator::{
    evaluate_comparison, evaluate_logical, evaluate_print_tag, evaluate_ternary, is_true,
    resolve_variable,
};
use expander::{Meta, Scope};

fn meta(pairs: &[(&str, &str)]) -> Meta {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn overlay_over_page_over_config() {
    let page = meta(&[("post.title", "Y")]);
    let config = meta(&[("post.title", "Z"), ("site.name", "Site")]);
    let mut scope = Scope::new(&page, &config);

    scope.push_overlay(meta(&[("post.title", "X")]));
    assert_eq!(scope.get("post.title"), Some("X"));
    assert_eq!(scope.get("POST.TITLE"), Some("X"));
    assert_eq!(scope.get("site.name"), Some("Site"));

    scope.pop_overlay();
    assert_eq!(scope.get("post.title"), Some("Y"));
    assert_eq!(scope.depth(), 0);
}

#[test]
fn lookup_walks_every_overlay() {
    let page = Meta::new();
    let config = Meta::new();
    let mut scope = Scope::new(&page, &config);
    scope.push_overlay(meta(&[("outer.title", "O")]));
    scope.push_overlay(meta(&[("inner.title", "I")]));
    assert_eq!(scope.get("outer.title"), Some("O"));
    assert_eq!(scope.get("inner.title"), Some("I"));
}

#[test]
fn empty_values_fall_through() {
    let page = meta(&[("page.author", "")]);
    let config = meta(&[("page.author", "Config Author")]);
    let scope = Scope::new(&page, &config);
    assert_eq!(scope.get("page.author"), Some("Config Author"));
    assert!(!scope.exists("page.missing"));
}

#[test]
fn truthiness() {
    let page = meta(&[
        ("page.yes", "Yes"),
        ("page.zero", "0"),
        ("page.off", "FALSE"),
        ("page.blank", " "),
    ]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);

    assert!(is_true("page.yes", &scope));
    assert!(!is_true("page.zero", &scope));
    assert!(!is_true("page.off", &scope));
    assert!(!is_true("page.blank", &scope));
    assert!(!is_true("page.unset", &scope));
    assert!(is_true("anything else", &scope));
    assert!(!is_true("", &scope));
    assert!(!is_true("'false'", &scope));
    assert!(is_true("(page.yes == \"yes\")", &scope));
}

#[test]
fn is_true_is_idempotent() {
    let page = meta(&[("page.title", "T")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);
    for expr in ["page.title", "page.title == 't' || x", "page.none", "a < b"] {
        assert_eq!(is_true(expr, &scope), is_true(expr, &scope));
    }
}

#[test]
fn comparisons_are_lexicographic_and_case_insensitive() {
    let page = meta(&[("page.n", "10"), ("page.name", "Bob")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);

    assert!(evaluate_comparison("page.name == \"bob\"", &scope));
    assert!(evaluate_comparison("page.n < 9", &scope));
    assert!(evaluate_comparison("page.n >= 10", &scope));
    assert!(evaluate_comparison("page.n <= 10", &scope));
    assert!(evaluate_comparison("page.n != 11", &scope));
    assert!(!evaluate_comparison("page.n > 2", &scope));
    assert!(!evaluate_comparison("page.name", &scope));
    assert!(evaluate_comparison("page.n == 10 && page.name", &scope));
}

#[test]
fn logical_composition() {
    let page = meta(&[("page.a", "1")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);

    assert!(evaluate_logical("page.a && 'x'", &scope));
    assert!(!evaluate_logical("page.a && page.b", &scope));
    assert!(evaluate_logical("page.b || page.a", &scope));
    assert!(!evaluate_logical("page.a", &scope));
}

#[test]
fn variable_resolution() {
    let page = meta(&[("page.title", "Hello"), ("page.a + b", "exact")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);

    assert_eq!(resolve_variable(" page.title ", &scope), "Hello");
    assert_eq!(resolve_variable("page.a + b", &scope), "exact");
    assert_eq!(resolve_variable("page.title + \", world\"", &scope), "Hello, world");
    assert_eq!(resolve_variable("'quoted'", &scope), "quoted");
    assert_eq!(resolve_variable("page.unset", &scope), "");
    assert_eq!(resolve_variable("Just Text", &scope), "Just Text");
}

#[test]
fn ternary_evaluation() {
    let page = meta(&[("x", "1"), ("y", "2")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);

    assert_eq!(
        evaluate_ternary("(x == 1) ? (y == 2 ? \"a\" : \"b\") : \"c\"", &scope),
        "a"
    );
    assert_eq!(evaluate_ternary("x == 2 ? yes : no ? a : b", &scope), "a");
    assert_eq!(evaluate_ternary("  not a ternary ", &scope), "not a ternary");
}

#[test]
fn print_tag_evaluation() {
    let page = meta(&[("page.title", "T")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);
    let mut deferred = Vec::new();

    assert_eq!(evaluate_print_tag("{{ page.title }}", &scope, &mut deferred), "T");
    assert_eq!(evaluate_print_tag("{{   }}", &scope, &mut deferred), "");
    assert_eq!(
        evaluate_print_tag("{{ page.title ? 'set' : 'unset' }}", &scope, &mut deferred),
        "set"
    );
    assert_eq!(evaluate_print_tag("{{ unknown(x) }}", &scope, &mut deferred), "unknown(x)");
    assert!(deferred.is_empty());

    assert_eq!(evaluate_print_tag("{{ post_image(a.png) }}", &scope, &mut deferred), "a.png");
    assert_eq!(deferred.len(), 1);
}

#[test]
fn concatenation_inside_ternaries_and_comparisons() {
    let page = meta(&[("page.url", "/x")]);
    let config = Meta::new();
    let scope = Scope::new(&page, &config);
    let mut deferred = Vec::new();

    assert_eq!(
        evaluate_print_tag(
            "{{ page.url ? \"<a href='\" + page.url + \"'>go</a>\" : \"none\" }}",
            &scope,
            &mut deferred
        ),
        "<a href='/x'>go</a>"
    );
    assert_eq!(
        evaluate_print_tag("{{ page.missing ? 'yes' : \"[\" + page.url + \"]\" }}", &scope, &mut deferred),
        "[/x]"
    );
    assert!(evaluate_comparison("\"a\" + \"b\" == \"ab\"", &scope));
    assert!(evaluate_comparison("page.url + \"/\" == '/x/'", &scope));
}
