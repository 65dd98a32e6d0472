//! Tests for TapPoint

use super::*;
use crate::filter::CompiledFilter;
use crate::packet::PacketFields;
use crate::test_utils::{Recorder, Silent, call_log, calls};

/// Tap point with "ip", "tcp" and "udp" registered
fn tap_point() -> (TapPoint, TapId, TapId, TapId) {
    let mut taps = TapPoint::new();
    let ip = taps.register_tap("ip");
    let tcp = taps.register_tap("tcp");
    let udp = taps.register_tap("udp");
    (taps, ip, tcp, udp)
}

/// Compiler refusing every expression
#[derive(Debug)]
struct RejectAll;

impl FilterCompiler for RejectAll {
    fn compile(&self, _expr: &str) -> std::result::Result<Box<dyn CompiledFilter>, String> {
        Err("filters are disabled".into())
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_tap_point_is_empty() {
    let taps = TapPoint::new();
    assert!(!taps.has_listeners());
    assert!(!taps.has_filtering_listeners());
    assert_eq!(taps.listener_count(), 0);
    assert_eq!(taps.filter_count(), 0);
    assert!(taps.taps().is_empty());
    assert_eq!(taps.stats(), TapStats::default());
}

#[test]
fn test_from_config_applies_settings() {
    let config = TapConfig::default()
        .with_queue_capacity(1)
        .with_overflow(OverflowPolicy::Drop);
    let mut taps = TapPoint::from_config(&config).unwrap();
    let ip = taps.register_tap("ip");
    taps.subscribe("ip", None, Silent).unwrap();

    let (e1, e2) = (1u32, 2u32);
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    window.enqueue(ip, &e1);
    window.enqueue(ip, &e2);
    assert_eq!(window.len(), 1);
    assert_eq!(window.dropped(), 1);
}

#[test]
fn test_from_config_rejects_zero_capacity() {
    let config = TapConfig::default().with_queue_capacity(0);
    let err = TapPoint::from_config(&config).unwrap_err();
    assert!(matches!(err, TapError::InvalidConfig(_)));
    assert!(err.to_string().contains("queue_capacity"));
}

#[test]
fn test_from_config_rejects_zero_redraw_interval() {
    let config = TapConfig::default().with_redraw_interval_ms(0);
    let err = TapPoint::from_config(&config).unwrap_err();
    assert!(matches!(err, TapError::InvalidConfig(_)));
    assert!(err.to_string().contains("redraw_interval_ms"));
}

// ============================================================================
// Subscriptions
// ============================================================================

#[test]
fn test_register_and_find_tap() {
    let (taps, ip, tcp, _) = tap_point();
    assert_eq!(taps.find_tap("ip"), Some(ip));
    assert_eq!(taps.find_tap("tcp"), Some(tcp));
    assert_eq!(taps.find_tap("sctp"), None);
}

#[test]
fn test_subscribe_unknown_tap_fails() {
    let (mut taps, _, _, _) = tap_point();
    let err = taps.subscribe("sctp", None, Silent).unwrap_err();
    assert!(matches!(err, TapError::TapNotFound { ref name } if name == "sctp"));
    assert!(!taps.has_listeners());
}

#[test]
fn test_subscribe_invalid_filter_fails() {
    let (mut taps, _, _, _) = tap_point();
    let err = taps
        .subscribe("ip", Some("frame.len >"), Silent)
        .unwrap_err();
    match err {
        TapError::FilterInvalid { filter, message } => {
            assert_eq!(filter, "frame.len >");
            assert!(message.contains("expected a value"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!taps.has_listeners());
    assert_eq!(taps.filter_count(), 0);
}

#[test]
fn test_subscribe_deeply_nested_filter_fails() {
    let (mut taps, _, _, _) = tap_point();
    let expr = format!("{}tcp{}", "(".repeat(20_000), ")".repeat(20_000));

    let err = taps.subscribe("ip", Some(&expr), Silent).unwrap_err();
    match err {
        TapError::FilterInvalid { message, .. } => {
            assert!(message.starts_with("filter nested too deeply"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!taps.has_listeners());
}

#[test]
fn test_subscribe_with_filter_counts_filter() {
    let (mut taps, _, _, _) = tap_point();
    let plain = taps.subscribe("ip", None, Silent).unwrap();
    let filtered = taps.subscribe("tcp", Some("tcp.port == 80"), Silent).unwrap();
    assert_ne!(plain, filtered);
    assert_eq!(taps.listener_count(), 2);
    assert_eq!(taps.filter_count(), 1);
    assert!(taps.has_filtering_listeners());

    taps.unsubscribe(filtered).unwrap();
    assert_eq!(taps.filter_count(), 0);
    assert!(!taps.has_filtering_listeners());
    assert!(taps.has_listeners());
}

#[test]
fn test_unsubscribe_twice_is_ignored() {
    let (mut taps, _, _, _) = tap_point();
    let id = taps.subscribe("ip", None, Silent).unwrap();
    assert!(taps.unsubscribe(id).is_some());
    assert!(taps.unsubscribe(id).is_none());
    assert!(!taps.has_listeners());
}

#[test]
fn test_custom_compiler_is_used() {
    let mut taps = TapPoint::new().with_compiler(RejectAll);
    taps.register_tap("ip");

    let err = taps.subscribe("ip", Some("ip"), Silent).unwrap_err();
    assert!(err.to_string().contains("filters are disabled"));
    assert!(taps.subscribe("ip", None, Silent).is_ok());
}

#[test]
fn test_new_listener_is_dirty() {
    let (mut taps, _, _, _) = tap_point();
    let id = taps.subscribe("ip", None, Silent).unwrap();
    assert_eq!(taps.is_dirty(id), Some(true));

    taps.unsubscribe(id);
    assert_eq!(taps.is_dirty(id), None);
}

// ============================================================================
// Decode windows
// ============================================================================

#[test]
fn test_window_without_listeners_is_inactive() {
    let (mut taps, ip, _, _) = tap_point();
    let payload = 1u32;
    let mut packet = PacketFields::new(1);

    let mut window = taps.begin_window(&mut packet);
    assert!(!window.is_active());
    window.enqueue(ip, &payload);
    assert!(window.is_empty());
    assert_eq!(window.dispatch(&packet), 0);

    let stats = taps.stats();
    assert_eq!(stats.windows_opened, 1);
    assert_eq!(stats.windows_active, 0);
    assert_eq!(stats.events_queued, 0);
}

#[test]
fn test_dispatch_is_event_major() {
    let (mut taps, ip, tcp, _) = tap_point();
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();
    taps.subscribe("tcp", None, Recorder::new("l2", &log)).unwrap();

    let (e1, e2, e3) = (1u32, 2u32, 3u32);
    let mut packet = PacketFields::new(7);
    let mut window = taps.begin_window(&mut packet);
    window.enqueue(ip, &e1);
    window.enqueue(tcp, &e2);
    window.enqueue(ip, &e3);
    assert_eq!(window.dispatch(&packet), 3);

    assert_eq!(
        calls(&log),
        vec!["l1:packet:7:1", "l2:packet:7:2", "l1:packet:7:3"]
    );
}

#[test]
fn test_listeners_on_same_tap_run_in_subscription_order() {
    let (mut taps, ip, _, _) = tap_point();
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("first", &log)).unwrap();
    taps.subscribe("ip", None, Recorder::new("second", &log)).unwrap();

    let payload = 9u32;
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    window.enqueue(ip, &payload);
    window.dispatch(&packet);

    assert_eq!(calls(&log), vec!["first:packet:1:9", "second:packet:1:9"]);
}

#[test]
fn test_events_for_unwatched_tap_are_ignored() {
    let (mut taps, _, _, udp) = tap_point();
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let payload = 1u32;
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    assert!(window.is_active());
    window.enqueue(udp, &payload);
    assert_eq!(window.dispatch(&packet), 0);

    assert!(calls(&log).is_empty());
    assert_eq!(taps.stats().events_queued, 1);
    assert_eq!(taps.stats().events_delivered, 0);
}

#[test]
fn test_filter_gates_delivery() {
    let (mut taps, ip, _, _) = tap_point();
    let log = call_log();
    let id = taps
        .subscribe("ip", Some("frame.len > 100"), Recorder::new("big", &log))
        .unwrap();
    taps.redraw_all(false);

    let payload = 1u32;
    let mut small = PacketFields::new(1).with_uint("frame.len", 50);
    let mut window = taps.begin_window(&mut small);
    window.enqueue(ip, &payload);
    assert_eq!(window.dispatch(&small), 0);
    assert_eq!(taps.is_dirty(id), Some(false));

    let mut large = PacketFields::new(2).with_uint("frame.len", 150);
    let mut window = taps.begin_window(&mut large);
    window.enqueue(ip, &payload);
    assert_eq!(window.dispatch(&large), 1);
    assert_eq!(taps.is_dirty(id), Some(true));

    assert_eq!(calls(&log), vec!["big:draw", "big:packet:2:1"]);
    assert_eq!(taps.stats().events_filtered, 1);
    assert_eq!(taps.stats().events_delivered, 1);
}

#[test]
fn test_begin_window_primes_filter_fields() {
    let (mut taps, _, _, _) = tap_point();
    taps.subscribe("ip", None, Silent).unwrap();
    taps.subscribe("tcp", Some("tcp.port == 80 && tcp.flags.syn"), Silent)
        .unwrap();
    taps.subscribe("udp", Some("udp.port == 53"), Silent).unwrap();

    let mut packet = PacketFields::new(1);
    let window = taps.begin_window(&mut packet);
    drop(window);

    assert_eq!(packet.primed(), ["tcp.port", "tcp.flags.syn", "udp.port"]);
}

#[test]
fn test_begin_window_without_listeners_primes_nothing() {
    let (mut taps, _, _, _) = tap_point();
    let mut packet = PacketFields::new(1);
    drop(taps.begin_window(&mut packet));
    assert!(packet.primed().is_empty());
}

#[test]
fn test_dropped_window_discards_events() {
    let (mut taps, ip, _, _) = tap_point();
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let payload = 1u32;
    let mut packet = PacketFields::new(1);
    {
        let mut window = taps.begin_window(&mut packet);
        window.enqueue(ip, &payload);
    }

    assert!(calls(&log).is_empty());
    let stats = taps.stats();
    assert_eq!(stats.events_queued, 1);
    assert_eq!(stats.events_delivered, 0);

    // The next packet starts from an empty queue
    let mut packet = PacketFields::new(2);
    let mut window = taps.begin_window(&mut packet);
    assert!(window.is_empty());
    window.enqueue(ip, &payload);
    window.dispatch(&packet);
    assert_eq!(calls(&log), vec!["l1:packet:2:1"]);
}

#[test]
fn test_grow_policy_keeps_every_event() {
    let config = TapConfig::default().with_queue_capacity(2);
    let mut taps = TapPoint::from_config(&config).unwrap();
    let ip = taps.register_tap("ip");
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let payloads = [1u32, 2, 3, 4];
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    for payload in &payloads {
        window.enqueue(ip, payload);
    }
    assert_eq!(window.dropped(), 0);
    assert_eq!(window.dispatch(&packet), 4);
    assert_eq!(calls(&log).len(), 4);
}

#[test]
fn test_drop_policy_counts_dropped_events() {
    let config = TapConfig::default()
        .with_queue_capacity(2)
        .with_overflow(OverflowPolicy::Drop);
    let mut taps = TapPoint::from_config(&config).unwrap();
    let ip = taps.register_tap("ip");
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let payloads = [1u32, 2, 3, 4];
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    for payload in &payloads {
        window.enqueue(ip, payload);
    }
    assert_eq!(window.dispatch(&packet), 2);

    assert_eq!(calls(&log), vec!["l1:packet:1:1", "l1:packet:1:2"]);
    let stats = taps.stats();
    assert_eq!(stats.events_queued, 2);
    assert_eq!(stats.events_dropped, 2);
}

// ============================================================================
// Reset and redraw
// ============================================================================

#[test]
fn test_redraw_draws_dirty_listeners_once() {
    let (mut taps, ip, _, _) = tap_point();
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();
    taps.redraw_all(false);
    log.borrow_mut().clear();

    let payloads = [1u32, 2, 3];
    for (frame, payload) in payloads.iter().enumerate() {
        let mut packet = PacketFields::new(frame as u64 + 1);
        let mut window = taps.begin_window(&mut packet);
        window.enqueue(ip, payload);
        window.dispatch(&packet);
    }

    assert_eq!(taps.redraw_all(false), 1);
    assert_eq!(taps.redraw_all(false), 0);
    let draws = calls(&log).iter().filter(|c| c.ends_with(":draw")).count();
    assert_eq!(draws, 1);
}

#[test]
fn test_quiet_listener_stays_clean() {
    let (mut taps, ip, _, _) = tap_point();
    let log = call_log();
    let id = taps
        .subscribe("ip", None, Recorder::new("l1", &log).quiet())
        .unwrap();
    taps.redraw_all(false);

    let payload = 1u32;
    let mut packet = PacketFields::new(1);
    let mut window = taps.begin_window(&mut packet);
    window.enqueue(ip, &payload);
    window.dispatch(&packet);

    assert_eq!(taps.is_dirty(id), Some(false));
    assert_eq!(taps.redraw_all(false), 0);
    assert_eq!(taps.redraw_all(true), 1);
}

#[test]
fn test_reset_all_resets_and_marks_dirty() {
    let (mut taps, _, _, _) = tap_point();
    let log = call_log();
    let a = taps.subscribe("ip", None, Recorder::new("a", &log)).unwrap();
    let b = taps.subscribe("tcp", None, Recorder::new("b", &log)).unwrap();
    taps.redraw_all(false);
    log.borrow_mut().clear();

    taps.reset_all();

    assert_eq!(calls(&log), vec!["a:reset", "b:reset"]);
    assert_eq!(taps.is_dirty(a), Some(true));
    assert_eq!(taps.is_dirty(b), Some(true));
}

#[test]
fn test_poll_redraw_is_paced() {
    let config = TapConfig::default().with_redraw_interval_ms(1000);
    let mut taps = TapPoint::from_config(&config).unwrap();
    taps.register_tap("ip");
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let start = Instant::now();
    assert!(taps.poll_redraw(start));
    assert!(!taps.poll_redraw(start + Duration::from_millis(500)));
    assert!(taps.poll_redraw(start + Duration::from_millis(1000)));

    // Only the first pass found the listener dirty
    assert_eq!(calls(&log), vec!["l1:draw"]);
}

#[test]
fn test_reset_all_makes_next_poll_due() {
    let config = TapConfig::default().with_redraw_interval_ms(1000);
    let mut taps = TapPoint::from_config(&config).unwrap();
    taps.register_tap("ip");
    let log = call_log();
    taps.subscribe("ip", None, Recorder::new("l1", &log)).unwrap();

    let start = Instant::now();
    assert!(taps.poll_redraw(start));
    taps.reset_all();
    assert!(taps.poll_redraw(start + Duration::from_millis(10)));

    assert_eq!(calls(&log), vec!["l1:draw", "l1:reset", "l1:draw"]);
}

// ============================================================================
// Stats
// ============================================================================

#[test]
fn test_stats_accumulate_across_windows() {
    let (mut taps, ip, tcp, _) = tap_point();
    taps.subscribe("ip", None, Silent).unwrap();
    taps.subscribe("ip", None, Silent).unwrap();

    let payload = ();
    for frame in 1..=3 {
        let mut packet = PacketFields::new(frame);
        let mut window = taps.begin_window(&mut packet);
        window.enqueue(ip, &payload);
        window.enqueue(tcp, &payload);
        window.dispatch(&packet);
    }

    let stats = taps.stats();
    assert_eq!(stats.windows_opened, 3);
    assert_eq!(stats.windows_active, 3);
    assert_eq!(stats.events_queued, 6);
    assert_eq!(stats.events_delivered, 6);
    assert_eq!(stats.events_dropped, 0);
    assert_eq!(stats.events_filtered, 0);
}
