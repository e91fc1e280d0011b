//! Template specificity ranking.
//!
//! Among several templates matching the same request, the one with the
//! highest rank wins. The rank starts at the segment count (root marker
//! included) and each segment adjusts it:
//!
//! | Segment                              | Adjustment |
//! |--------------------------------------|-----------:|
//! | wildcard `*`                         | -1         |
//! | literal                              | 0          |
//! | typed dynamic `{int:x}` etc.         | +1         |
//! | untyped dynamic `{x}`                | +2         |
//!
//! Untyped dynamics outrank typed ones, and both outrank literals of the same
//! depth. Route resolution for ambiguous registrations depends on this exact
//! ordering.

use crate::routing::template::Segment;

/// Rank of a compiled segment list. Higher is more specific.
pub fn rank(segments: &[Segment]) -> i32 {
    let base = segments.len() as i32;
    segments.iter().map(adjustment).sum::<i32>() + base
}

fn adjustment(segment: &Segment) -> i32 {
    match segment {
        Segment::Wildcard => -1,
        Segment::Literal { .. } => 0,
        Segment::Dynamic { explicit: true, .. } => 1,
        Segment::Dynamic { explicit: false, .. } => 2,
    }
}

#[cfg(test)]
mod tests {
    use crate::routing::template::{HttpMethod, TemplateCompiler, UriTemplate};

    fn rank(source: &str) -> i32 {
        UriTemplate::parse(HttpMethod::Get, source).unwrap().priority()
    }

    #[test]
    fn test_documented_adjustments() {
        // Root marker alone.
        assert_eq!(rank("/"), 1);
        // 3 segments, literals add nothing.
        assert_eq!(rank("/users/list"), 3);
        // 3 segments, typed dynamic +1.
        assert_eq!(rank("/users/{int:id}"), 4);
        // 3 segments, untyped dynamic +2.
        assert_eq!(rank("/users/{id}"), 5);
        // 3 segments, wildcard -1.
        assert_eq!(rank("/users/*"), 2);
        // 5 segments: +1 typed, +1 typed, -1 wildcard.
        assert_eq!(rank("/a/{int:b}/{float:c}/*"), 6);
    }

    #[test]
    fn test_untyped_outranks_typed() {
        assert!(rank("/users/{id}") > rank("/users/{int:id}"));
        assert!(rank("/users/{int:id}") > rank("/users/list"));
        assert!(rank("/users/list") > rank("/users/*"));
    }

    #[test]
    fn test_absolute_typing_keeps_untyped_rank() {
        let absolute = TemplateCompiler::new(true)
            .compile(HttpMethod::Get, "/users/{id}")
            .unwrap();
        assert_eq!(absolute.priority(), rank("/users/{id}"));
    }

    #[test]
    fn test_deeper_templates_rank_higher() {
        assert!(rank("/a/b/c") > rank("/a/b"));
        assert!(rank("/a/b/*") > rank("/a/*"));
    }
}
