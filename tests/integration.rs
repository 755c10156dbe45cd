//! Integration tests for roster-facts.
//!
//! These exercise the public API end to end, the way a solver host would:
//! build a calendar and directory, construct an evaluator, rebuild the
//! index, hammer queries from worker threads, and run the sweeper.
//!
//! # Test Organization
//! - `session_*` - full solving-session lifecycle flows
//! - `cache_*`   - TieredCache contract through the public API
//! - `facts_*`   - evaluator fact semantics across modules

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use roster_facts::{
    AssignmentRecord, CacheConfig, EvaluatorConfig, FactEvaluator, HolidayCalendar,
    StaticDirectory, Sweeper, TieredCache,
};

// =============================================================================
// Fixture Helpers
// =============================================================================

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// October holiday week plus one make-up Sunday, as published calendars do.
fn national_day_calendar() -> HolidayCalendar {
    HolidayCalendar::with_dates(
        (1..=7).map(|day| NaiveDate::from_ymd_opt(2026, 10, day).unwrap()),
        [d("2026-09-27")],
    )
}

fn roster_directory() -> Arc<StaticDirectory> {
    Arc::new(
        StaticDirectory::new()
            .with_participant("zhang", Some("区域三室"), Some("甲班"))
            .with_participant("li", Some("三室"), Some("乙班"))
            .with_participant("wang", Some("五室"), Some("丙班"))
            .with_participant("zhao", Some("模拟机"), Some("甲班"))
            .with_participant("admin", None, None),
    )
}

fn evaluator() -> Arc<FactEvaluator> {
    Arc::new(FactEvaluator::new(
        national_day_calendar(),
        roster_directory(),
        EvaluatorConfig::default(),
    ))
}

// =============================================================================
// Session Lifecycle
// =============================================================================

#[test]
fn session_concurrent_constraint_evaluation() {
    let eval = evaluator();
    eval.rebuild_index(&[
        AssignmentRecord::new("2026-10-08", Some("zhang"), Some("li"), None),
        AssignmentRecord::new("2026-10-09", Some("wang"), None, Some("zhang")),
    ]);

    let mut handles = vec![];
    for _ in 0..8 {
        let eval = Arc::clone(&eval);
        handles.push(std::thread::spawn(move || {
            for _ in 0..500 {
                // The mix a constraint pass actually issues.
                assert!(eval.is_holiday("2026-10-01"));
                assert!(eval.is_workday("2026-10-08"));
                assert!(eval.are_same_organizational_unit("zhang", "li"));
                assert!(!eval.are_same_organizational_unit("zhang", "zhao"));
                assert!(eval.are_consecutive_dates("2026-10-08", "2026-10-09"));
                assert!(eval.is_participant_assigned_on_date("zhang", "2026-10-08"));
                assert!(eval.is_participant_assigned_on_date("zhang", "2026-10-09"));
                assert!(!eval.is_participant_assigned_on_date("li", "2026-10-09"));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let stats = eval.stats();
    // After the first pass everything is memoized: hits dwarf misses.
    assert!(stats.unit_cmp.hit_rate > 0.9, "hit rate {}", stats.unit_cmp.hit_rate);
    assert!(stats.day_diff.hit_rate > 0.9);
}

#[test]
fn session_sweeper_owned_by_orchestrator() {
    let eval = evaluator();
    let mut sweeper = Sweeper::new(Duration::from_millis(10));
    for target in eval.sweep_targets() {
        sweeper.register(target);
    }
    assert_eq!(sweeper.target_count(), 2);

    sweeper.start();
    // Queries keep working while the sweeper runs.
    for i in 1..=20 {
        eval.days_between("2026-10-01", &format!("2026-10-{i:02}"));
    }
    std::thread::sleep(Duration::from_millis(50));
    sweeper.stop();

    // Long-TTL entries survive the sweeps.
    assert!(eval.stats().day_diff.l1_entries > 0);
}

#[test]
fn session_two_solves_back_to_back() {
    let eval = evaluator();

    eval.rebuild_index(&[AssignmentRecord::new("2026-10-08", Some("zhang"), None, None)]);
    assert!(eval.is_participant_assigned_on_date("zhang", "2026-10-08"));

    // Second solve: fresh snapshot replaces the first wholesale.
    eval.rebuild_index(&[AssignmentRecord::new("2026-10-09", Some("li"), None, None)]);
    assert!(!eval.is_participant_assigned_on_date("zhang", "2026-10-08"));
    assert!(eval.is_participant_assigned_on_date("li", "2026-10-09"));

    // Harness reset between scenarios.
    eval.clear_all_caches();
    let stats = eval.stats();
    assert!(!stats.index_built);
    assert_eq!(stats.day_facts_entries, 0);
}

#[test]
fn session_stats_snapshot_serializes_for_monitoring() {
    let eval = evaluator();
    eval.is_holiday("2026-10-01");
    eval.are_same_organizational_unit("zhang", "li");

    let json = serde_json::to_value(eval.stats()).unwrap();
    assert_eq!(json["unit_cmp"]["name"], "unit_cmp");
    assert!(json["unit_cmp"]["hit_rate"].is_number());
    assert!(json["day_facts_entries"].as_u64().unwrap() >= 1);
}

// =============================================================================
// TieredCache Contract
// =============================================================================

#[test]
fn cache_concrete_spec_scenario() {
    // L1 max 4, eviction ratio 0.25: the 5th distinct insert leaves L1 at 4
    // and the demoted key still retrievable from L2.
    let cache: TieredCache<String, u32> = TieredCache::new(
        "scenario",
        CacheConfig {
            l1_max_entries: 4,
            l2_max_entries: 16,
            evict_fraction: 0.25,
            ..Default::default()
        },
    );

    for i in 0..5u32 {
        cache.put(format!("k{i}"), i, Duration::from_secs(60));
    }

    assert_eq!(cache.l1_len(), 4);
    for i in 0..5u32 {
        assert_eq!(cache.get(&format!("k{i}")), Some(i));
    }
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn cache_expiry_then_recompute() {
    let cache: TieredCache<String, u32> = TieredCache::new("exp", CacheConfig::default());
    let short = Duration::from_millis(15);

    let v = cache.get_or_compute("k".into(), short, || 1);
    assert_eq!(v, 1);

    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(cache.get(&"k".to_string()), None);
    assert_eq!(cache.get_or_compute("k".into(), short, || 2), 2);
}

#[test]
fn cache_invalidate_always_wins() {
    let cache: TieredCache<String, u32> = TieredCache::new(
        "inv",
        CacheConfig {
            l1_max_entries: 4,
            ..Default::default()
        },
    );
    for i in 0..12u32 {
        cache.put(format!("k{i}"), i, Duration::from_secs(60));
    }
    // Regardless of which tier a key landed in.
    for i in 0..12 {
        let key = format!("k{i}");
        cache.invalidate(&key);
        assert_eq!(cache.get(&key), None);
    }
}

// =============================================================================
// Fact Semantics
// =============================================================================

#[test]
fn facts_workday_identity_over_published_calendar() {
    let eval = evaluator();
    let mut date = d("2026-09-20");
    while date <= d("2026-10-12") {
        let s = date.format("%Y-%m-%d").to_string();
        assert_eq!(eval.is_workday(&s), !eval.is_holiday(&s) && !eval.is_weekend(&s), "{s}");
        date = date.succ_opt().unwrap();
    }
    // The make-up Sunday specifically.
    assert!(eval.is_workday("2026-09-27"));
    assert!(!eval.is_weekend("2026-09-27"));
}

#[test]
fn facts_normalization_triple_and_sentinel() {
    use roster_facts::evaluator::normalize;
    use roster_facts::OrgUnit;

    let a = normalize("区域三室");
    let b = normalize("三室");
    let c = normalize("三");
    assert_eq!(a, b);
    assert_eq!(b, c);

    let invalid = normalize("模拟机");
    assert_eq!(invalid, OrgUnit::Invalid);
    assert!(!invalid.same_as(&a));
    assert!(!invalid.same_as(&invalid));
}

#[test]
fn facts_degraded_inputs_never_abort() {
    let eval = evaluator();
    // Junk dates, unknown ids, empty everything: answers, not errors.
    assert!(!eval.is_holiday("not a date"));
    assert!(!eval.is_workday(""));
    assert_eq!(eval.days_between("??", "2026-10-01"), roster_facts::MAX_DAY_DISTANCE);
    assert!(!eval.are_consecutive_dates("??", "!!"));
    assert!(!eval.are_same_organizational_unit("ghost-1", "ghost-2"));
    assert!(!eval.is_participant_assigned_on_date("", ""));
    assert!(eval.is_administrative_participant("ghost-1"));
}

#[test]
fn facts_index_spec_membership_property() {
    let eval = evaluator();
    eval.rebuild_index(&[
        AssignmentRecord::new("2026-10-08", Some("P"), None, None),
        AssignmentRecord::new("2026-10-10", None, None, Some("P")),
    ]);

    assert!(eval.is_participant_assigned_on_date("P", "2026-10-08"));
    assert!(eval.is_participant_assigned_on_date("P", "2026-10-10"));
    for other in ["2026-10-09", "2026-10-11", "2025-10-08", "junk"] {
        assert!(!eval.is_participant_assigned_on_date("P", other), "{other}");
    }
}
