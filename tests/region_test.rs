//! Tests for the scoped region override

use dataforge::{current_region, push_region, with_region, DEFAULT_REGION};

#[test]
fn given_no_override_when_reading_then_default_region() {
    assert_eq!(current_region(), DEFAULT_REGION);
}

#[test]
fn given_scoped_override_when_body_runs_then_region_is_visible_and_restored() {
    let seen = with_region("dach", current_region);

    assert_eq!(seen, "dach");
    assert_eq!(current_region(), DEFAULT_REGION);
}

#[test]
fn given_nested_scopes_when_inner_ends_then_outer_is_back() {
    with_region("europe", || {
        with_region("dach", || {
            assert_eq!(current_region(), "dach");
        });
        assert_eq!(current_region(), "europe");
    });
    assert_eq!(current_region(), DEFAULT_REGION);
}

#[test]
fn given_panicking_body_when_unwinding_then_region_is_restored() {
    let result = std::panic::catch_unwind(|| {
        with_region("europe", || {
            panic!("boom");
        })
    });

    assert!(result.is_err());
    assert_eq!(current_region(), DEFAULT_REGION);
}

#[test]
fn given_guard_held_when_dropped_then_scope_ends() {
    let guard = push_region("asia");
    assert_eq!(current_region(), "asia");
    drop(guard);
    assert_eq!(current_region(), DEFAULT_REGION);
}

#[test]
fn given_override_on_one_thread_when_another_thread_reads_then_it_sees_its_own_state() {
    with_region("europe", || {
        let other = std::thread::spawn(current_region).join().unwrap();
        assert_eq!(other, DEFAULT_REGION);
        assert_eq!(current_region(), "europe");
    });
}

#[test]
fn given_concurrent_scopes_on_two_threads_then_neither_corrupts_the_other() {
    let a = std::thread::spawn(|| {
        with_region("north", || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            current_region()
        })
    });
    let b = std::thread::spawn(|| {
        with_region("south", || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            current_region()
        })
    });

    assert_eq!(a.join().unwrap(), "north");
    assert_eq!(b.join().unwrap(), "south");
}
