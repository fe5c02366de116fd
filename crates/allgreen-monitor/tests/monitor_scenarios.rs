//! End-to-end scenarios for [`AllActiveMonitor`] over a live collection.
//!
//! Each test drives the public surface only: mutate the list, emit item
//! states, and observe the published aggregate by polling and by watching.

use std::cell::RefCell;
use std::rc::Rc;

use allgreen_monitor::{AllActiveMonitor, Item, ItemId, ObservableList, StreamError, Subscription};

fn item(id: u64) -> Item {
    Item::new(ItemId::new(id))
}

/// Record every pushed aggregate transition.
fn transitions(monitor: &AllActiveMonitor) -> (Rc<RefCell<Vec<bool>>>, Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let log_clone = Rc::clone(&log);
    let sub = monitor.watch(move |value| log_clone.borrow_mut().push(*value));
    (log, sub)
}

#[test]
fn items_without_emissions_are_not_all_active() {
    for n in 1..=4u64 {
        let list = ObservableList::new();
        for id in 0..n {
            list.insert(item(id)).unwrap();
        }
        let monitor = AllActiveMonitor::new(&list);
        assert!(!monitor.all_active(), "{n} unset items must read false");
    }
}

#[test]
fn all_items_most_recently_active_reads_true() {
    let list = ObservableList::new();
    let items: Vec<Item> = (0..3).map(item).collect();
    for it in &items {
        list.insert(it.clone()).unwrap();
    }
    let monitor = AllActiveMonitor::new(&list);

    for it in &items {
        it.set_active(true);
    }
    assert!(monitor.all_active());

    // A stale earlier inactive emission does not matter, only the latest.
    items[1].set_active(false);
    items[1].set_active(true);
    assert!(monitor.all_active());
}

#[test]
fn emptiness_dominates_history() {
    let list = ObservableList::new();
    let a = item(1);
    list.insert(a.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    a.set_active(true);
    assert!(monitor.all_active());

    list.remove(&a).unwrap();
    assert!(!monitor.all_active());
}

#[test]
fn removing_the_only_inactive_item_flips_true_exactly_once() {
    let list = ObservableList::new();
    let good = item(1);
    let bad = item(2);
    list.insert(good.clone()).unwrap();
    list.insert(bad.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    good.set_active(true);
    bad.set_active(false);
    assert!(!monitor.all_active());

    let (log, _sub) = transitions(&monitor);
    list.remove(&bad).unwrap();

    // Synchronous with the removal, and pushed exactly once.
    assert!(monitor.all_active());
    assert_eq!(*log.borrow(), vec![true]);
}

#[test]
fn two_item_lifecycle_scenario() {
    let list = ObservableList::new();
    let a = item(1);
    let b = item(2);
    list.insert(a.clone()).unwrap();
    list.insert(b.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    a.set_active(true);
    b.set_active(true);
    assert!(monitor.all_active());

    b.set_active(false);
    assert!(!monitor.all_active());

    list.remove(&a).unwrap();
    assert!(!monitor.all_active());

    b.set_active(true);
    assert!(monitor.all_active());
}

#[test]
fn late_added_item_starts_unknown() {
    let list: ObservableList<Item> = ObservableList::new();
    let monitor = AllActiveMonitor::new(&list);
    assert!(!monitor.all_active());

    let c = item(3);
    list.insert(c.clone()).unwrap();
    assert!(!monitor.all_active());

    c.set_active(true);
    assert!(monitor.all_active());
}

#[test]
fn replace_resets_the_members_known_state() {
    let list = ObservableList::new();
    let a = item(1);
    list.insert(a.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    a.set_active(true);
    assert!(monitor.all_active());

    // The replacement has not emitted yet, so the aggregate drops.
    let b = item(2);
    list.replace(&a, b.clone()).unwrap();
    assert!(!monitor.all_active());

    // And the ex-member has no influence anymore.
    a.set_active(true);
    assert!(!monitor.all_active());

    b.set_active(true);
    assert!(monitor.all_active());
}

#[test]
fn double_teardown_is_silent() {
    let list = ObservableList::new();
    let a = item(1);
    list.insert(a.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);
    let (log, _sub) = transitions(&monitor);

    monitor.dispose();
    monitor.dispose();
    assert!(monitor.is_disposed());

    a.set_active(true);
    assert!(log.borrow().is_empty());
}

#[test]
fn emissions_after_teardown_do_not_change_the_published_value() {
    let list = ObservableList::new();
    let a = item(1);
    list.insert(a.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    a.set_active(true);
    assert!(monitor.all_active());

    monitor.dispose();
    a.set_active(false);
    assert!(monitor.all_active());
    assert!(monitor.published().get());
}

#[test]
fn upstream_failure_freezes_the_aggregate() {
    let list = ObservableList::new();
    let a = item(1);
    let b = item(2);
    list.insert(a.clone()).unwrap();
    list.insert(b.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);

    a.set_active(true);
    b.set_active(true);
    assert!(monitor.all_active());

    b.fail(StreamError::new("heartbeat lost"));
    assert_eq!(monitor.failure(), Some(StreamError::new("heartbeat lost")));

    a.set_active(false);
    assert!(monitor.all_active(), "no partial aggregate after failure");

    // Teardown after failure remains safe.
    monitor.dispose();
    monitor.dispose();
}

#[test]
fn watcher_observes_the_whole_story() {
    let list = ObservableList::new();
    let a = item(1);
    list.insert(a.clone()).unwrap();
    let monitor = AllActiveMonitor::new(&list);
    let (log, _sub) = transitions(&monitor);

    a.set_active(true);
    a.set_active(false);
    a.set_active(true);
    list.remove(&a).unwrap();

    assert_eq!(*log.borrow(), vec![true, false, true, false]);
}
