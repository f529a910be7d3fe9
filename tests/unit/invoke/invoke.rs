use super::*;
use crate::markup::params::TagParams;
use crate::markup::registry::{InvokePolicy, TagArity};

#[derive(Default)]
struct Recorder {
    calls: Vec<(SpanFamily, String, usize)>,
}

impl TagInvoker for Recorder {
    fn invoke(&mut self, family: SpanFamily, span: &ResolvedSpan) {
        self.calls.push((family, span.name.clone(), span.start_index));
    }
}

fn span(name: &str, at: usize, policy: InvokePolicy) -> ResolvedSpan {
    ResolvedSpan {
        name: name.to_owned(),
        start_index: at,
        end_index: at + 1,
        order_at_index: 0,
        parameters: TagParams::default(),
        arity: TagArity::Index,
        policy,
    }
}

fn repeatable() -> InvokePolicy {
    InvokePolicy {
        repeatable: true,
        ..InvokePolicy::default()
    }
}

#[test]
fn non_repeatable_fires_once() {
    let mut rec = Recorder::default();
    let mut tag = InvocableTag::new(SpanFamily::Event, span("grant", 0, InvokePolicy::default()));
    assert!(tag.trigger(&mut rec));
    assert!(!tag.trigger(&mut rec));
    tag.reset();
    assert!(!tag.trigger(&mut rec));
    assert_eq!(rec.calls.len(), 1);
}

#[test]
fn repeatable_fires_again_after_reset() {
    let mut rec = Recorder::default();
    let mut tag = InvocableTag::new(SpanFamily::Event, span("sfx", 0, repeatable()));
    assert!(tag.trigger(&mut rec));
    assert!(!tag.trigger(&mut rec));
    tag.reset();
    assert!(!tag.is_triggered());
    assert!(tag.trigger(&mut rec));
    assert_eq!(rec.calls.len(), 2);
}

fn doc() -> CompiledText {
    let mut doc = CompiledText::default();
    doc.spans.insert(
        SpanFamily::Event,
        vec![
            span("a", 1, InvokePolicy::default()),
            span(
                "instant",
                4,
                InvokePolicy {
                    execute_instantly: true,
                    ..InvokePolicy::default()
                },
            ),
            span("sfx", 6, repeatable()),
        ],
    );
    doc.spans.insert(
        SpanFamily::Command,
        vec![
            span(
                "wait",
                1,
                InvokePolicy {
                    execute_on_skip: true,
                    ..InvokePolicy::default()
                },
            ),
            span("speed", 5, InvokePolicy::default()),
        ],
    );
    doc
}

#[test]
fn cache_orders_by_index_then_family() {
    let cache = TagCache::from_document(&doc());
    let names: Vec<&str> = cache.tags().iter().map(|t| t.span().name.as_str()).collect();
    assert_eq!(names, vec!["a", "wait", "instant", "speed", "sfx"]);
    assert_eq!(cache.tag(1).family(), SpanFamily::Command);
}

#[test]
fn instant_tags_fire_up_front() {
    let mut rec = Recorder::default();
    let mut cache = TagCache::from_document(&doc());
    assert_eq!(cache.trigger_instant(&mut rec), 1);
    assert_eq!(rec.calls, vec![(SpanFamily::Event, "instant".to_owned(), 4)]);
    // Reaching the index later does not fire it again.
    assert_eq!(cache.process_range(4, 5, false, &mut rec), 0);
}

#[test]
fn process_range_fires_each_tag_once() {
    let mut rec = Recorder::default();
    let mut cache = TagCache::from_document(&doc());
    assert_eq!(cache.process_range(0, 2, false, &mut rec), 2);
    assert_eq!(cache.process_range(0, 2, false, &mut rec), 0);
    assert_eq!(cache.process_range(2, 10, false, &mut rec), 3);
    assert_eq!(rec.calls.len(), 5);
}

#[test]
fn skipping_only_fires_skip_tags() {
    let mut rec = Recorder::default();
    let mut cache = TagCache::from_document(&doc());
    assert_eq!(cache.process_range(0, 10, true, &mut rec), 1);
    assert_eq!(rec.calls[0].1, "wait");
}

#[test]
fn rewind_resets_only_repeatables_after_index() {
    let mut rec = Recorder::default();
    let mut cache = TagCache::from_document(&doc());
    cache.process_range(0, 10, false, &mut rec);
    assert_eq!(rec.calls.len(), 5);

    cache.rewind_to(3);
    assert_eq!(cache.process_range(0, 10, false, &mut rec), 1);
    assert_eq!(rec.calls.last().unwrap().1, "sfx");

    cache.reset_all();
    assert_eq!(cache.process_range(0, 10, false, &mut rec), 1);
}

#[test]
fn closures_can_act_as_invokers() {
    let mut count = 0usize;
    let mut invoker = |_family: SpanFamily, _span: &ResolvedSpan| count += 1;
    let mut cache = TagCache::from_document(&doc());
    cache.process_range(0, 10, false, &mut invoker);
    assert_eq!(count, 5);
}

#[test]
#[should_panic]
fn triggering_missing_tag_panics() {
    let mut rec = Recorder::default();
    let mut cache = TagCache::from_document(&CompiledText::default());
    cache.trigger(0, &mut rec);
}
