use super::*;
use crate::markup::scanner::next_tag;

fn tag(s: &str) -> Tag {
    let chars: Vec<char> = s.chars().collect();
    next_tag(&chars, 0).unwrap()
}

#[test]
fn recognizes_only_the_reserved_name() {
    let e = EscapeTracker::default();
    assert!(e.is_escape_tag(&tag("<noparse>")));
    assert!(e.is_escape_tag(&tag("</noparse>")));
    assert!(!e.is_escape_tag(&tag("<?noparse>")));
    assert!(!e.is_escape_tag(&tag("<noparse x=1>")));
    assert!(!e.is_escape_tag(&tag("<wave>")));
}

#[test]
fn depth_counts_nesting() {
    let mut e = EscapeTracker::default();
    e.apply(&tag("<noparse>"));
    e.apply(&tag("<noparse>"));
    assert_eq!(e.depth(), 2);
    e.apply(&tag("</noparse>"));
    assert!(e.is_active());
    e.apply(&tag("</noparse>"));
    assert!(!e.is_active());
}

#[test]
fn close_is_floored_at_zero() {
    let mut e = EscapeTracker::default();
    e.apply(&tag("</noparse>"));
    e.apply(&tag("</noparse>"));
    assert_eq!(e.depth(), 0);
    e.apply(&tag("<noparse>"));
    assert!(e.is_active());
}

#[test]
fn remembers_outermost_unterminated_open() {
    let mut e = EscapeTracker::new("raw");
    let chars: Vec<char> = "ab<raw>c<raw>".chars().collect();
    let first = next_tag(&chars, 0).unwrap();
    let second = next_tag(&chars, first.raw_end).unwrap();
    e.apply(&first);
    e.apply(&second);
    assert_eq!(e.unterminated_at(), Some(2));
    e.reset();
    assert_eq!(e.unterminated_at(), None);
}
