use pathstat_core::normalizer::RouteNormalizer;

// =============================================================================
// Placeholder replacement
// =============================================================================

#[test]
fn test_normalize_cases() {
    let n = RouteNormalizer::new();
    let cases = [
        ("/users/123", "/users/:id"),
        ("/users/123/posts/456", "/users/:id/posts/:id"),
        ("/items/550e8400-e29b-41d4-a716-446655440000", "/items/:id"),
        ("/items/550E8400-E29B-41D4-A716-446655440000", "/items/:id"),
        ("/blobs/a1b2c3d4e5f6", "/blobs/:id"),
        ("/blobs/DEADBEEF", "/blobs/:id"),
        ("/reports/2023-01-15", "/reports/:date"),
        ("/reports/2024-02-29", "/reports/:date"),
        ("/orders/ORD-2023-001", "/orders/:id"),
        ("/invoices/INV-42", "/invoices/:id"),
        ("/tickets/SUPPORT-A1B2-77", "/tickets/:id"),
        ("/users", "/users"),
        ("/", "/"),
        ("", ""),
    ];
    for (input, expected) in cases {
        assert_eq!(n.normalize(input), expected, "normalizing {input:?}");
    }
}

#[test]
fn test_segments_left_verbatim() {
    let n = RouteNormalizer::new();
    let cases = [
        // invalid calendar dates
        "/posts/2023-02-30",
        "/posts/2023-13-01",
        // too short for a hex id
        "/blobs/abc12",
        // no a-f letter and not all digits
        "/tags/rust-lang",
        // lowercase reference code
        "/orders/ord-2023-001",
        // two-letter prefix
        "/orders/OR-2023",
        "/users/123.json",
        "/users/me",
    ];
    for input in cases {
        assert_eq!(n.normalize(input), input, "{input:?} should stay verbatim");
    }
}

#[test]
fn test_query_string_is_dropped() {
    let n = RouteNormalizer::new();
    assert_eq!(n.normalize("/api/users?page=1&limit=10"), "/api/users");
    assert_eq!(n.normalize("/users/42?tab=posts?x=1"), "/users/:id");
    assert_eq!(n.normalize("/search?"), "/search");
    assert_eq!(n.normalize("?only=query"), "");
}

#[test]
fn test_empty_segments_are_preserved() {
    let n = RouteNormalizer::new();
    assert_eq!(n.normalize("//users//123/"), "//users//:id/");
    assert_eq!(n.normalize("users/123"), "users/:id");
}

#[test]
fn test_earliest_matcher_wins() {
    let n = RouteNormalizer::new();
    // digits (1) before hex (3)
    assert_eq!(n.normalize("/x/123456"), "/x/:id");
    // hex (3) catches this before anything else could
    assert_eq!(n.normalize("/x/abcdef"), "/x/:id");
    // date (4) is the only date placeholder source
    assert_eq!(n.normalize("/x/2023-01-01"), "/x/:date");
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_normalization_is_idempotent() {
    let n = RouteNormalizer::new();
    let paths = [
        "/users/123",
        "/users/123/posts/2023-01-01?x=1",
        "/orders/ORD-2023-001/items/550e8400-e29b-41d4-a716-446655440000",
        "/blobs/deadbeef99",
        "//a//b/",
        "/posts/2023-02-30",
        "/:id/:date",
    ];
    for path in paths {
        let once = n.normalize(path);
        assert_eq!(n.normalize(&once), once, "normalizing {path:?} twice");
    }
}

#[test]
fn test_output_never_contains_query() {
    let n = RouteNormalizer::new();
    for path in ["/a?b", "/a/1?b=2&c=3", "/?", "/a/b/c?d/e"] {
        assert!(!n.normalize(path).contains('?'));
    }
}
