use bson::{Bson, doc};
use docmock::{
    futures::TryStreamExt,
    memory::InMemoryStore,
    prelude::*,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn client() -> Client<InMemoryStore> {
    Client::new(InMemoryStore::new())
}

async fn seeded(seed: serde_json::Value) -> Client<InMemoryStore> {
    Client::new(InMemoryStore::builder().seed(seed).build().await.unwrap())
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let client = client();

    for path in ["users/alice", "rooms/lobby/messages/m1", "a/b/c/d/e/f"] {
        let reference = client.document(path).unwrap();
        let data = doc! { "path": path, "nested": { "n": 1, "list": [1, "two", null] } };

        reference.set(data.clone()).await.unwrap();

        let snapshot = reference.get().await.unwrap();
        assert!(snapshot.exists());
        assert_eq!(snapshot.to_dict(), Some(data));
        assert_eq!(snapshot.id(), reference.id());
    }
}

#[tokio::test]
async fn references_to_the_same_path_alias() {
    let client = client();
    let first = client.collection("users").unwrap().document("alice").unwrap();
    let second = client.document("users/alice").unwrap();

    first.set(doc! { "x": 1 }).await.unwrap();
    assert_eq!(second.get().await.unwrap().get("x"), Some(&Bson::Int32(1)));

    second.update(doc! { "x": 2 }).await.unwrap();
    assert_eq!(first.get().await.unwrap().get("x"), Some(&Bson::Int32(2)));
    assert_eq!(first, second);
}

#[tokio::test]
async fn snapshots_are_disconnected() {
    let client = client();
    let reference = client.document("users/alice").unwrap();
    reference.set(doc! { "age": 30 }).await.unwrap();

    let snapshot = reference.get().await.unwrap();
    reference.update(doc! { "age": 31 }).await.unwrap();
    reference.delete().await.unwrap();

    assert!(snapshot.exists());
    assert_eq!(snapshot.to_dict(), Some(doc! { "age": 30 }));
}

#[tokio::test]
async fn path_arity_is_validated() {
    let client = client();

    assert!(matches!(client.collection("a/b"), Err(StoreError::InvalidCollectionPath(_))));
    assert!(client.collection("a").is_ok());
    assert!(client.collection("a/b/c").is_ok());

    assert!(matches!(client.document("a"), Err(StoreError::InvalidDocumentPath(_))));
    assert!(matches!(client.document("a/b/c"), Err(StoreError::InvalidDocumentPath(_))));
    assert!(matches!(client.document(""), Err(StoreError::InvalidDocumentPath(_))));

    let users = client.collection("users").unwrap();
    assert!(users.document("alice/posts").is_err());
    assert!(users.document("alice/posts/p1").is_ok());
    assert!(users.document("alice").unwrap().collection("posts/p1").is_err());
}

#[tokio::test]
async fn nested_collection_creates_missing_parents() {
    let client = client();
    let messages = client.collection("rooms/lobby/messages").unwrap();

    let lobby = messages.parent().unwrap();
    assert_eq!(lobby.path().to_string(), "rooms/lobby");
    assert!(!lobby.get().await.unwrap().exists());

    let ids = client
        .collection("rooms")
        .unwrap()
        .list_documents()
        .map_ok(|reference| reference.id().to_string())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();
    assert_eq!(ids, ["lobby"]);

    let sub = lobby
        .collections()
        .map_ok(|collection| collection.id().to_string())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();
    assert_eq!(sub, ["messages"]);
    assert!(client.collection("rooms").unwrap().parent().is_none());
}

#[tokio::test]
async fn opening_a_collection_keeps_existing_data() {
    let client = client();
    let lobby = client.document("rooms/lobby").unwrap();
    lobby.set(doc! { "topic": "hi" }).await.unwrap();

    lobby.collection("messages").unwrap();
    client.collection("rooms/lobby/messages").unwrap();

    assert_eq!(lobby.get().await.unwrap().to_dict(), Some(doc! { "topic": "hi" }));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let client = client();
    let reference = client.document("users/alice").unwrap();
    reference.set(doc! { "a": 1 }).await.unwrap();

    reference.delete().await.unwrap();
    reference.delete().await.unwrap();
    client.document("never/written").unwrap().delete().await.unwrap();

    assert!(!reference.get().await.unwrap().exists());
}

#[tokio::test]
async fn create_and_update_check_existence() {
    let client = client();
    let reference = client.document("users/alice").unwrap();

    assert_eq!(
        reference.update(doc! { "a": 1 }).await,
        Err(StoreError::DocumentNotFound("users/alice".to_string()))
    );

    reference.create(doc! { "a": 1 }).await.unwrap();
    assert_eq!(
        reference.create(doc! { "a": 2 }).await,
        Err(StoreError::DocumentAlreadyExists("users/alice".to_string()))
    );
    assert_eq!(reference.get().await.unwrap().get("a"), Some(&Bson::Int32(1)));
}

#[tokio::test]
async fn set_merges_when_asked() {
    let client = client();
    let reference = client.document("cities/SF").unwrap();
    reference
        .set(doc! { "name": "San Francisco", "stats": { "population": 860000, "area": 121 } })
        .await
        .unwrap();

    reference
        .set_with_options(doc! { "stats": { "population": 870000 }, "state": "CA" }, true)
        .await
        .unwrap();
    assert_eq!(
        reference.get().await.unwrap().to_dict(),
        Some(doc! { "name": "San Francisco", "stats": { "population": 870000, "area": 121 }, "state": "CA" })
    );

    reference
        .set_with_options(doc! { "name": "SF", "state": "ignored" }, SetOptions::merge_fields(["name"]))
        .await
        .unwrap();
    let snapshot = reference.get().await.unwrap();
    assert_eq!(snapshot.get("name"), Some(&Bson::String("SF".to_string())));
    assert_eq!(snapshot.get("state"), Some(&Bson::String("CA".to_string())));

    reference.set(doc! { "only": true }).await.unwrap();
    assert_eq!(reference.get().await.unwrap().to_dict(), Some(doc! { "only": true }));
}

#[tokio::test]
async fn update_applies_field_transforms() {
    let client = client();
    let reference = client.document("posts/p1").unwrap();
    reference
        .set(doc! { "likes": 1, "tags": ["a", "b"], "meta": { "draft": true, "rev": 1 } })
        .await
        .unwrap();

    reference
        .update(
            FieldUpdates::new()
                .increment("likes", 2)
                .array_union("tags", ["b", "c"])
                .array_remove("tags", ["a"])
                .delete("meta.draft")
                .set("meta.rev", 2)
                .server_timestamp("meta.edited"),
        )
        .await
        .unwrap();

    let snapshot = reference.get().await.unwrap();
    assert_eq!(snapshot.get("likes"), Some(&Bson::Int32(3)));
    assert_eq!(snapshot.get("tags"), Some(&Bson::Array(vec!["b".into(), "c".into()])));
    assert_eq!(snapshot.get("meta.draft"), None);
    assert_eq!(snapshot.get("meta.rev"), Some(&Bson::Int32(2)));
    assert!(matches!(snapshot.get("meta.edited"), Some(Bson::DateTime(_))));
}

#[tokio::test]
async fn invalid_update_leaves_document_untouched() {
    let client = client();
    let reference = client.document("posts/p1").unwrap();
    reference.set(doc! { "a": 1 }).await.unwrap();

    let result = reference.update(FieldUpdates::new().set("b", 2).set("c..d", 3)).await;
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    assert!(matches!(reference.update(FieldUpdates::new()).await, Err(StoreError::InvalidArgument(_))));

    assert_eq!(reference.get().await.unwrap().to_dict(), Some(doc! { "a": 1 }));
}

#[tokio::test]
async fn timestamps_track_writes() {
    let client = client();
    let reference = client.document("users/alice").unwrap();

    let created = reference.set(doc! { "a": 1 }).await.unwrap();
    let updated = reference.update(doc! { "a": 2 }).await.unwrap();

    let snapshot = reference.get().await.unwrap();
    assert_eq!(snapshot.create_time(), Some(created.update_time));
    assert_eq!(snapshot.update_time(), Some(updated.update_time));
    assert!(snapshot.read_time() >= updated.update_time);

    let missing = client.document("users/bob").unwrap().get().await.unwrap();
    assert_eq!(missing.create_time(), None);
    assert_eq!(missing.to_dict(), None);
}

#[tokio::test]
async fn add_generates_unique_ids() {
    let client = client();
    let users = client.collection("users").unwrap();

    let (_, first) = users.add(doc! { "n": 1 }).await.unwrap();
    let (_, second) = users.add(doc! { "n": 2 }).await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(users.get().await.unwrap().len(), 2);
}

#[tokio::test]
async fn typed_documents_round_trip() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: i32,
    }

    let client = client();
    let reference = client.document("users/alice").unwrap();
    let alice = User { name: "Alice".to_string(), age: 30 };

    reference.set_typed(&alice).await.unwrap();

    let snapshot = reference.get().await.unwrap();
    assert_eq!(snapshot.deserialize::<User>().unwrap(), Some(alice));
    assert_eq!(client.document("users/bob").unwrap().get().await.unwrap().deserialize::<User>().unwrap(), None);
}

#[tokio::test]
async fn get_all_matches_individual_reads() {
    let client = seeded(json!({ "foo": { "first": { "id": 1 }, "second": { "id": 2 } } })).await;
    let first = client.document("foo/first").unwrap();
    let second = client.document("foo/second").unwrap();
    let missing = client.document("foo/missing").unwrap();

    let snapshots = client
        .get_all([second.clone(), first.clone(), second.clone(), missing])
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    let ids = snapshots.iter().map(DocumentSnapshot::id).collect::<Vec<_>>();
    assert_eq!(ids, ["second", "first", "missing"]);
    assert_eq!(snapshots[1].to_dict(), first.get().await.unwrap().to_dict());
    assert!(!snapshots[2].exists());
}

#[tokio::test]
async fn collections_streams_root_collections() {
    let client = seeded(json!({ "foo": { "first": { "id": 1 }, "second": { "id": 2 } }, "bar": {} })).await;

    let ids = client
        .collections()
        .map_ok(|collection| collection.id().to_string())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    assert_eq!(ids, ["foo", "bar"]);
}

#[tokio::test]
async fn stream_yields_existing_documents_in_insertion_order() {
    let client = client();
    let foo = client.collection("foo").unwrap();
    foo.document("b").unwrap().set(doc! { "n": 1 }).await.unwrap();
    foo.document("a").unwrap().set(doc! { "n": 2 }).await.unwrap();
    foo.document("ghost").unwrap().collection("children").unwrap();

    let ids = foo
        .stream()
        .map_ok(|snapshot| snapshot.id().to_string())
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    assert_eq!(ids, ["b", "a"]);
}

#[tokio::test]
async fn query_filters_orders_and_limits() {
    let client = seeded(json!({
        "cities": {
            "SF": { "name": "San Francisco", "state": "CA", "population": 860000, "regions": ["west_coast", "norcal"] },
            "LA": { "name": "Los Angeles", "state": "CA", "population": 3900000, "regions": ["west_coast", "socal"] },
            "DC": { "name": "Washington", "state": null, "population": 680000, "regions": ["east_coast"] },
            "TOK": { "name": "Tokyo", "country": "Japan", "population": 9000000 }
        }
    }))
    .await;
    let cities = client.collection("cities").unwrap();

    let names = |query: Query| {
        cities
            .query(query)
            .map_ok(|snapshot| snapshot.id().to_string())
            .try_collect::<Vec<_>>()
    };

    let query = Query::builder()
        .filter(Filter::eq("state", "CA"))
        .sort("population", SortDirection::Asc)
        .build();
    assert_eq!(names(query).await.unwrap(), ["SF", "LA"]);

    let query = Query::builder()
        .filter(Filter::array_contains("regions", "west_coast").not())
        .build();
    assert_eq!(names(query).await.unwrap(), ["DC", "TOK"]);

    let query = Query::builder()
        .sort("population", SortDirection::Desc)
        .limit(2)
        .build();
    assert_eq!(names(query).await.unwrap(), ["TOK", "LA"]);

    let query = Query::builder()
        .sort("state", SortDirection::Asc)
        .build();
    assert_eq!(names(query).await.unwrap(), ["SF", "LA", "DC"]);
}

#[tokio::test]
async fn reset_clears_data_but_keeps_handles_usable() {
    let client = client();
    let reference = client.document("users/alice").unwrap();
    reference.set(doc! { "a": 1 }).await.unwrap();

    client.reset().await.unwrap();
    assert!(!reference.get().await.unwrap().exists());

    reference.set(doc! { "a": 2 }).await.unwrap();
    assert!(reference.get().await.unwrap().exists());
}

#[tokio::test]
async fn project_id_is_configurable() {
    assert_eq!(client().project(), "mock-project");

    let backend = InMemoryStore::builder().project_id("test-project").build().await.unwrap();
    assert_eq!(Client::new(backend).project(), "test-project");
}
