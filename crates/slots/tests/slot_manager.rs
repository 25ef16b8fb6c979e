#![forbid(unsafe_code)]

use config::Prefetch;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use slots::{
    ABSOLUTE_MAX_SLOTS, PrefetchHandle, PrefetchManager, PrefetchPipeline, PrefetchRequest,
    PrefetchSlotManager, SlotKey, StartFailure, StatusNotifier,
};
use std::{cell::RefCell, collections::BTreeSet, rc::Rc, time::Duration};

/// Records its URL into a shared log when released.
#[derive(Debug)]
struct TrackedHandle {
    url: String,
    released: Rc<RefCell<Vec<String>>>,
}

impl PrefetchHandle for TrackedHandle {
    fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TrackedHandle {
    fn drop(&mut self) {
        self.released.borrow_mut().push(self.url.clone());
    }
}

#[derive(Debug, Default)]
struct Tracker {
    released: Rc<RefCell<Vec<String>>>,
}

impl Tracker {
    fn handle(&self, url: &str) -> Box<dyn PrefetchHandle> {
        Box::new(TrackedHandle {
            url: url.into(),
            released: self.released.clone(),
        })
    }

    fn released(&self) -> Vec<String> {
        self.released.borrow().clone()
    }
}

fn keys(raw: impl IntoIterator<Item = i32>) -> Vec<SlotKey> {
    raw.into_iter().map(SlotKey::new).collect()
}

#[derive(Debug, Clone)]
enum Op {
    Insert,
    Cancel(i32),
    SetMaxSlots(i32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Insert),
        2 => (-2i32..40).prop_map(Op::Cancel),
        1 => (1i32..30).prop_map(Op::SetMaxSlots),
    ]
}

proptest! {
    #[test]
    fn keys_are_sequential_whatever_happens_in_between(ops in prop::collection::vec(op(), 0..200)) {
        let tracker = Tracker::default();
        let mut manager = PrefetchSlotManager::default();
        let mut returned = Vec::new();

        for op in ops {
            match op {
                Op::Insert => {
                    let key = manager.insert(tracker.handle("https://a.test/")).unwrap();
                    returned.push(key);
                    prop_assert!(manager.len() <= manager.max_slots() as usize);
                }
                Op::Cancel(raw) => {
                    manager.cancel(SlotKey::new(raw));
                }
                Op::SetMaxSlots(max) => manager.set_max_slots(max),
            }
            let held: BTreeSet<_> = manager.keys().into_iter().collect();
            prop_assert_eq!(held.len(), manager.len());
            if let Some(last) = held.last() {
                prop_assert!(*last <= manager.last_key());
                prop_assert!(*held.first().unwrap() >= SlotKey::FIRST);
            }
        }

        let expected = keys(0..returned.len() as i32);
        prop_assert_eq!(returned, expected);
    }

    #[test]
    fn fifo_eviction_keeps_newest(max in 1i32..=ABSOLUTE_MAX_SLOTS) {
        let tracker = Tracker::default();
        let mut manager = PrefetchSlotManager::default();
        manager.set_max_slots(max);

        for _ in 0..=max {
            manager.insert(tracker.handle("https://a.test/")).unwrap();
        }

        prop_assert_eq!(manager.keys(), keys(1..=max));
        prop_assert_eq!(tracker.released().len(), 1);
    }

    #[test]
    fn set_max_slots_clamps_from_above(value in any::<i32>()) {
        let mut manager = PrefetchSlotManager::default();
        manager.set_max_slots(value);
        prop_assert_eq!(manager.max_slots(), value.min(ABSOLUTE_MAX_SLOTS));
    }
}

#[test]
fn max_slots_above_absolute_cap() {
    let mut manager = PrefetchSlotManager::default();
    manager.set_max_slots(25);
    assert_eq!(manager.max_slots(), 20);
}

#[test]
fn cancel_twice_is_same_as_once() {
    let tracker = Tracker::default();
    let mut manager = PrefetchSlotManager::default();
    let a = manager.insert(tracker.handle("https://a.test/")).unwrap();
    manager.insert(tracker.handle("https://b.test/")).unwrap();

    manager.cancel(a);
    let after_once = manager.keys();
    manager.cancel(a);

    assert_eq!(manager.keys(), after_once);
    assert_eq!(tracker.released(), vec!["https://a.test/".to_owned()]);
}

#[test]
fn default_configuration_scenario() {
    let tracker = Tracker::default();
    let mut manager = PrefetchSlotManager::new(&Prefetch::default());
    assert_eq!(manager.ttl_secs(), 60);
    assert_eq!(manager.max_slots(), 10);

    let first: Vec<_> = (0..10)
        .map(|i| manager.insert(tracker.handle(&format!("https://{i}.test/"))))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(first, keys(0..10));

    let eleventh = manager.insert(tracker.handle("https://10.test/")).unwrap();
    assert_eq!(eleventh, SlotKey::new(10));
    assert!(!manager.contains(SlotKey::new(0)));
    assert_eq!(tracker.released(), vec!["https://0.test/".to_owned()]);

    manager.cancel(SlotKey::new(5));
    assert!(!manager.contains(SlotKey::new(5)));

    let twelfth = manager.insert(tracker.handle("https://11.test/")).unwrap();
    assert_eq!(twelfth, SlotKey::new(11));
    assert_eq!(manager.keys(), keys([1, 2, 3, 4, 6, 7, 8, 9, 10, 11]));
    assert_eq!(manager.last_key(), SlotKey::new(11));
    assert_eq!(
        tracker.released(),
        vec!["https://0.test/".to_owned(), "https://5.test/".to_owned()]
    );
}

/// Refuses every request whose URL ends in `/bad`.
struct PickyPipeline(Tracker);

impl PrefetchPipeline for PickyPipeline {
    fn start(
        &self,
        request: &PrefetchRequest,
        _ttl: Duration,
        _notifier: StatusNotifier,
    ) -> Result<Box<dyn PrefetchHandle>, StartFailure> {
        if request.url.ends_with("/bad") {
            Err(StartFailure::Generic)
        } else {
            Ok(self.0.handle(&request.url))
        }
    }
}

#[test]
fn failed_start_leaves_table_unchanged() {
    let (tx, _rx) = flume::unbounded();
    let mut manager = PrefetchManager::new(PickyPipeline(Tracker::default()), &Prefetch::default());
    for url in ["https://a.test/", "https://b.test/"] {
        manager
            .start_prefetch(PrefetchRequest::new(url), StatusNotifier::new(url, tx.clone()))
            .unwrap();
    }
    let before = manager.slots().keys();

    for url in ["", "not a url", "https://c.test/bad"] {
        let key = manager
            .start_prefetch(PrefetchRequest::new(url), StatusNotifier::new(url, tx.clone()))
            .unwrap();
        assert_eq!(key, SlotKey::NONE, "{url:?}");
        assert_eq!(manager.slots().keys(), before);
        assert_eq!(manager.slots().last_key(), SlotKey::new(1));
    }

    let next = manager
        .start_prefetch(
            PrefetchRequest::new("https://d.test/"),
            StatusNotifier::new("https://d.test/", tx),
        )
        .unwrap();
    assert_eq!(next, SlotKey::new(2));
}
