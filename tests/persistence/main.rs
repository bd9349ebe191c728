//! Integration tests for persistence delegation.

mod strategies;

use std::sync::Arc;
use std::time::Duration;

use models::{props, Contact};
use record_collection::{
    Collection, CollectionError, InMemoryPersistence, PersistenceError, PrimaryKey, RecordHandle,
};
use serde_json::json;
use strategies::{AssigningStrategy, Call, GatedStrategy, RejectingStrategy};

fn contact(id: i64, name: &str) -> Contact {
    Contact {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

#[tokio::test]
async fn load_one_resolves_after_the_strategy_has_set_the_record() {
    let strategy = Arc::new(GatedStrategy::default());
    let contacts = Collection::<Contact>::with_persistence_strategy(strategy.clone());
    let record = RecordHandle::new(contact(7, "Ada"));

    let pending = tokio::spawn(
        contacts
            .load_one(&record, Some(json!({"fields": "all"})), Some("s"))
            .unwrap(),
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished());
    assert!(!contacts.has(7).unwrap());

    strategy.release();
    let result = pending.await.unwrap().unwrap();

    assert_eq!(result, json!("loaded"));
    assert!(contacts.has(7).unwrap());
    let scope = contacts.get_scope("s").unwrap().unwrap();
    assert_eq!(scope.primary_keys().unwrap(), vec![PrimaryKey::Int(7)]);
    assert_eq!(
        strategy.calls(),
        vec![Call {
            method: "load_one",
            key: Some(PrimaryKey::Int(7)),
            params: Some(json!({"fields": "all"})),
            scope: Some("s".into()),
        }]
    );
}

#[tokio::test]
async fn calls_forward_params_and_scope_names() {
    let strategy = Arc::new(GatedStrategy::default());
    let contacts = Collection::<Contact>::new();
    contacts.set_persistence_strategy(strategy.clone()).unwrap();

    let loaded = contacts
        .load(Some(json!({"page": 2})), Some("page-2"))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(loaded, json!({"loaded": 2}));
    assert_eq!(contacts.size().unwrap(), 2);

    let ada = contacts.get(1).unwrap().unwrap();
    let saved = contacts.save_one(ada.clone(), None, None).unwrap().await.unwrap();
    assert_eq!(saved, json!("saved"));

    contacts.destroy_one(ada, None, Some("page-2")).unwrap().await.unwrap();
    assert!(!contacts.has(1).unwrap());

    let methods: Vec<&str> = strategy.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec!["load", "save_one", "destroy_one"]);
    assert_eq!(strategy.calls()[0].params, Some(json!({"page": 2})));
    assert_eq!(strategy.calls()[2].scope.as_deref(), Some("page-2"));
}

#[tokio::test]
async fn strategy_failures_come_back_unchanged() {
    let contacts = Collection::<Contact>::with_persistence_strategy(Arc::new(RejectingStrategy));
    let record = contacts
        .set(props(json!({"id": 1, "name": "Ada", "email": "ada@example.com"})))
        .unwrap();

    let err = contacts.load(None, None).unwrap().await.unwrap_err();
    assert_eq!(err, PersistenceError::Transport("connection refused".into()));

    let err = contacts.save_one(record.clone(), None, None).unwrap().await.unwrap_err();
    assert_eq!(err, PersistenceError::Rejected("quota exceeded".into()));

    let err = contacts.destroy_one(record, None, None).unwrap().await.unwrap_err();
    assert_eq!(err, PersistenceError::Rejected("read only".into()));

    assert_eq!(contacts.size().unwrap(), 1);
}

#[test]
fn missing_strategy_is_reported_before_any_future_exists() {
    let contacts = Collection::<Contact>::new();
    match contacts.load(None, None) {
        Err(CollectionError::MissingPersistenceStrategy { collection }) => {
            assert_eq!(collection, "contacts")
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected a configuration error"),
    }
}

#[tokio::test]
async fn saving_a_new_record_rekeys_it_to_the_server_id() {
    let contacts =
        Collection::<Contact>::with_persistence_strategy(AssigningStrategy::starting_at(100));
    let draft = contacts.set_record(contact(-1, "Ada")).unwrap();

    let id = contacts.save_one(draft.clone(), None, None).unwrap().await.unwrap();

    assert_eq!(id, json!(100));
    assert!(!contacts.has(-1).unwrap());
    assert!(contacts.get(100).unwrap().unwrap().same_instance(&draft));
    assert_eq!(draft.read().unwrap().id, 100);
}

#[tokio::test]
async fn one_in_memory_strategy_can_serve_two_collections() {
    let remote = InMemoryPersistence::<Contact>::new();
    remote
        .seed(vec![props(json!({"id": 1, "name": "Ada", "email": "ada@example.com"}))])
        .unwrap();
    let strategy = Arc::new(remote.clone());

    let primary = Collection::<Contact>::with_persistence_strategy(strategy.clone());
    let secondary = Collection::<Contact>::with_persistence_strategy(strategy);

    primary.load(None, None).unwrap().await.unwrap();
    let grace = primary.set_record(contact(2, "Grace")).unwrap();
    primary.save_one(grace, None, None).unwrap().await.unwrap();

    secondary.load(None, None).unwrap().await.unwrap();
    assert_eq!(
        secondary.items_primary_keys().unwrap(),
        vec![PrimaryKey::Int(1), PrimaryKey::Int(2)]
    );
    assert!(!primary
        .get(1)
        .unwrap()
        .unwrap()
        .same_instance(&secondary.get(1).unwrap().unwrap()));
    assert_eq!(remote.remote_len().unwrap(), 2);
}

#[tokio::test]
async fn reset_keeps_the_strategy_usable() {
    let remote = InMemoryPersistence::<Contact>::new();
    remote
        .seed(vec![props(json!({"id": 1, "name": "Ada", "email": "ada@example.com"}))])
        .unwrap();
    let contacts = Collection::<Contact>::with_persistence_strategy(Arc::new(remote));

    contacts.load(None, Some("all")).unwrap().await.unwrap();
    contacts.reset().unwrap();
    assert_eq!(contacts.size().unwrap(), 0);
    assert!(contacts.get_scope("all").unwrap().is_none());

    contacts.load(None, Some("all")).unwrap().await.unwrap();
    assert_eq!(contacts.size().unwrap(), 1);
    let all = contacts.get_scope("all").unwrap().unwrap();
    assert_eq!(all.items().unwrap().len(), 1);
}
