use medmap_core::{SelectionCommand, SelectionError, SelectionSnapshot, SelectionStore};
use std::sync::{Arc, Mutex};

fn store() -> SelectionStore {
    SelectionStore::new(["Alpha", "Beta", "Gamma", "Delta"].map(String::from))
}

fn recording(store: &mut SelectionStore) -> Arc<Mutex<Vec<SelectionSnapshot>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));
    seen
}

#[test]
fn double_toggle_restores_state_with_two_notifications() {
    let mut store = store();
    store.toggle("Gamma").unwrap();
    let seen = recording(&mut store);

    store.toggle("Alpha").unwrap();
    store.toggle("Alpha").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].keys, vec!["Alpha".to_string(), "Gamma".to_string()]);
    assert_eq!(seen[1].keys, vec!["Gamma".to_string()]);
    assert!(seen[0].revision < seen[1].revision);
}

#[test]
fn bulk_add_replaces_selection_and_notifies_once() {
    let mut store = store();
    store.toggle("Delta").unwrap();
    let seen = recording(&mut store);

    store
        .bulk_add(vec!["Beta".to_string(), "Alpha".to_string(), "Beta".to_string()])
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].keys, vec!["Alpha".to_string(), "Beta".to_string()]);
    assert!(!store.contains("Delta"));
}

#[test]
fn bulk_add_with_same_set_still_notifies() {
    let mut store = store();
    store.bulk_add(vec!["Alpha".to_string()]).unwrap();
    let seen = recording(&mut store);
    store.bulk_add(vec!["Alpha".to_string()]).unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn bulk_add_with_unknown_key_leaves_selection_untouched() {
    let mut store = store();
    store.toggle("Gamma").unwrap();
    let seen = recording(&mut store);

    let err = store
        .bulk_add(vec!["Alpha".to_string(), "Omega".to_string()])
        .unwrap_err();
    assert_eq!(err, SelectionError::InvalidSelectionKey("Omega".to_string()));
    assert_eq!(store.snapshot().keys, vec!["Gamma".to_string()]);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn remove_absent_key_and_clear_empty_are_silent() {
    let mut store = store();
    let seen = recording(&mut store);

    assert!(!store.remove("Alpha"));
    assert!(!store.remove("Omega"));
    assert!(!store.clear());
    assert!(seen.lock().unwrap().is_empty());

    store.toggle("Beta").unwrap();
    assert!(store.remove("Beta"));
    store.toggle("Gamma").unwrap();
    assert!(store.clear());
    assert_eq!(seen.lock().unwrap().len(), 4);
    assert!(store.is_empty());
}

#[test]
fn toggle_many_that_cancels_out_emits_nothing() {
    let mut store = store();
    let seen = recording(&mut store);
    assert!(!store.toggle_many(["Alpha", "Alpha"]));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn every_subscriber_sees_each_notification_before_return() {
    let mut store = store();
    let first = recording(&mut store);
    let second = recording(&mut store);

    store
        .apply(SelectionCommand::BulkSelect(vec!["Delta".to_string()]))
        .unwrap();

    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(*first.lock().unwrap(), *second.lock().unwrap());
}
