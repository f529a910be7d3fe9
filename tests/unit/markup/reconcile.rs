use std::sync::Arc;

use super::*;
use crate::markup::processor::SpanProcessor;
use crate::markup::registry::{EffectDef, OpenRegistry, ParamSchema, ParamType, Registry};

fn pipeline() -> MarkupPipeline {
    let mut behaviors = Registry::new();
    for name in ["a", "b", "foo", "wave"] {
        behaviors.register(name, EffectDef::block(ParamSchema::none().with_default(ParamType::Float)));
    }
    let mut commands = Registry::new();
    commands.register("wait", EffectDef::index(ParamSchema::none().with_default(ParamType::Float)));

    MarkupPipeline::new(&PipelineSettings::default())
        .with_processor(SpanProcessor::new(SpanFamily::Behavior, Arc::new(behaviors)))
        .with_processor(SpanProcessor::new(SpanFamily::Event, Arc::new(OpenRegistry::default())))
        .with_processor(SpanProcessor::new(SpanFamily::Command, Arc::new(commands)))
}

fn span(c: &CompiledText, family: SpanFamily, i: usize) -> (String, usize, usize) {
    let s = &c.spans(family)[i];
    (s.name.clone(), s.start_index, s.end_index)
}

#[test]
fn tagless_text_passes_through() {
    let mut p = pipeline();
    let c = p.compile("plain text, no tags", "plain text, no tags");
    assert_eq!(c.text, "plain text, no tags");
    assert_eq!(c.char_count, 19);
    assert_eq!(c.span_count(), 0);
    assert!(c.diagnostics.is_empty());
}

#[test]
fn host_stripped_tag_reports_display_start() {
    let mut p = pipeline();
    let c = p.compile("AB<foo>CD", "ABCD");
    assert_eq!(c.text, "ABCD");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("foo".to_owned(), 2, 4));
}

#[test]
fn host_preserved_tag_is_removed_from_output() {
    let mut p = pipeline();
    let c = p.compile_raw("AB<foo>CD</foo>E");
    assert_eq!(c.text, "ABCDE");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("foo".to_owned(), 2, 4));
}

#[test]
fn nested_same_name_spans() {
    let mut p = pipeline();
    let c = p.compile_raw("<a>x<a>y</a>z</a>");
    assert_eq!(c.text, "xyz");
    let spans = c.spans(SpanFamily::Behavior);
    assert_eq!(spans.len(), 2);
    assert_eq!((spans[0].start_index, spans[0].end_index), (0, 3));
    assert_eq!((spans[1].start_index, spans[1].end_index), (1, 2));
    assert_eq!(&c.text[spans[1].start_index..spans[1].end_index], "y");
}

#[test]
fn escape_region_keeps_tags_literal() {
    let mut p = pipeline();
    let c = p.compile_raw("<noparse><a></noparse>");
    assert_eq!(c.text, "<a>");
    assert!(c.spans(SpanFamily::Behavior).is_empty());
    assert!(c.diagnostics.is_empty());
}

#[test]
fn nested_escape_regions_count_depth() {
    let mut p = pipeline();
    let c = p.compile_raw("<noparse>1<noparse>2</noparse><a>3</noparse><a>4");
    assert_eq!(c.text, "12<a>34");
    let spans = c.spans(SpanFamily::Behavior);
    assert_eq!(spans.len(), 1);
    assert_eq!((spans[0].start_index, spans[0].end_index), (6, 7));
}

#[test]
fn escape_tags_always_shift_offsets_even_when_host_strips_them() {
    let mut p = pipeline();
    // Host also understood and removed the escape tags.
    let c = p.compile("x<noparse><b></noparse><a>y", "x<b><a>y");
    assert_eq!(c.text, "x<b>y");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 4, 5));
}

#[test]
fn unterminated_escape_is_reported() {
    let mut p = pipeline();
    let c = p.compile_raw("ab<noparse><a>c");
    assert_eq!(c.text, "ab<a>c");
    assert_eq!(c.diagnostics.len(), 1);
    assert_eq!(c.diagnostics[0].kind, DiagnosticKind::UnterminatedEscape);
    assert_eq!(c.diagnostics[0].raw_index, 2);
}

#[test]
fn host_markup_and_own_markup_interleave() {
    let mut p = pipeline();
    let raw = "<i>Hi</i> <wave>yo</wave>";
    let display = "Hi <wave>yo</wave>";
    let c = p.compile(raw, display);
    assert_eq!(c.text, "Hi yo");
    assert_eq!(c.spans(SpanFamily::Behavior).len(), 1);
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("wave".to_owned(), 3, 5));
}

#[test]
fn unknown_tags_kept_by_host_stay_literal() {
    let mut p = pipeline();
    let c = p.compile_raw("x <zzz> <a>y</a>");
    assert_eq!(c.text, "x <zzz> y");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 8, 9));
}

#[test]
fn unmatched_close_stays_literal() {
    let mut p = pipeline();
    let c = p.compile_raw("a</b>c");
    assert_eq!(c.text, "a</b>c");
    assert_eq!(c.span_count(), 0);
}

#[test]
fn invalid_parameters_stay_literal() {
    let mut p = pipeline();
    let c = p.compile_raw("<wave=fast>x");
    assert_eq!(c.text, "<wave=fast>x");
    assert!(c.spans(SpanFamily::Behavior).is_empty());
}

#[test]
fn unclosed_spans_close_at_document_end() {
    let mut p = pipeline();
    let c = p.compile_raw("ab<a>cd<b>e");
    assert_eq!(c.text, "abcde");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 2, 5));
    assert_eq!(span(&c, SpanFamily::Behavior, 1), ("b".to_owned(), 4, 5));
}

#[test]
fn events_and_commands_resolve_by_prefix() {
    let mut p = pipeline();
    let c = p.compile_raw("He<?ping>llo<@wait=0.5> there<?done>");
    assert_eq!(c.text, "Hello there");
    assert_eq!(span(&c, SpanFamily::Event, 0), ("ping".to_owned(), 2, 3));
    assert_eq!(span(&c, SpanFamily::Command, 0), ("wait".to_owned(), 5, 6));
    assert_eq!(span(&c, SpanFamily::Event, 1), ("done".to_owned(), 11, 12));
}

#[test]
fn family_without_processor_is_literal() {
    let mut p = pipeline();
    let c = p.compile_raw("<+fade>x");
    assert_eq!(c.text, "<+fade>x");
}

#[test]
fn fully_stripped_document_yields_placeholder() {
    let mut p = pipeline();
    let c = p.compile("<a></a>", "");
    assert_eq!(c.text, " ");
    assert_eq!(c.char_count, 1);
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 0, 0));
}

#[test]
fn tail_tags_land_at_document_end() {
    let mut p = pipeline();
    // Host truncated everything after "ab".
    let c = p.compile("ab<a>cd<?end>", "ab");
    assert_eq!(c.text, "ab");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 2, 2));
    assert_eq!(c.spans(SpanFamily::Event)[0].start_index, 2);
}

#[test]
fn recompiling_discards_previous_state() {
    let mut p = pipeline();
    let first = p.compile_raw("<a>open forever");
    assert_eq!(first.spans(SpanFamily::Behavior).len(), 1);
    let second = p.compile_raw("x</a>");
    assert_eq!(second.text, "x</a>");
    assert_eq!(second.span_count(), 0);
}

#[test]
fn multibyte_text_uses_char_indices() {
    let mut p = pipeline();
    let c = p.compile_raw("héé<a>ü</a>");
    assert_eq!(c.text, "hééü");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 3, 4));
}

#[test]
fn coincidental_literal_is_resolved_at_most_once() {
    let mut p = pipeline();
    let c = p.compile_raw("1 <zzz> 2 <zzz>");
    assert_eq!(c.text, "1 <zzz> 2 <zzz>");
    assert_eq!(c.span_count(), 0);
}

#[test]
fn compile_runs_under_an_active_subscriber() {
    let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
    let c = tracing::subscriber::with_default(subscriber, || {
        pipeline().compile("x<a>yz</a>", "x<a>yz</a>")
    });
    assert_eq!(c.text, "xyz");
    assert_eq!(span(&c, SpanFamily::Behavior, 0), ("a".to_owned(), 1, 3));
}

#[test]
fn unterminated_escape_reports_open_depth() {
    let mut p = pipeline();
    let c = p.compile_raw("<noparse>a<noparse>b");
    assert_eq!(c.text, "ab");
    assert_eq!(c.diagnostics[0].raw_index, 0);
    assert!(c.diagnostics[0].message.contains("2 still open"));
}
