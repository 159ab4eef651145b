use std::sync::LazyLock;

use docmap::{
    bson::{self, Bson, doc},
    memory::InMemoryClient,
    prelude::*,
};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Membership {
    Basic,
    Intermediate,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(skip)]
    id: Option<String>,
    email_address: String,
    age: i32,
    membership: Membership,
    previous_levels: Vec<Membership>,
    nickname: Option<String>,
    joined: bson::DateTime,
}

static USER: LazyLock<Schema> = LazyLock::new(|| {
    let membership = || FieldKind::enumeration(
        EnumSchema::new("Membership")
            .member("Basic", 1)
            .member("Intermediate", 2)
            .member("Full", 3),
    );

    Schema::builder("User")
        .field("email_address", FieldKind::string())
        .field("age", FieldKind::int())
        .field("membership", membership())
        .field_with_default("previous_levels", FieldKind::list(membership()), Bson::Array(vec![]))
        .field("nickname", FieldKind::optional(FieldKind::string()))
        .field("joined", FieldKind::timestamp())
        .build()
        .unwrap()
});

impl Record for User {
    fn schema() -> &'static Schema {
        &USER
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

fn user(email: &str, age: i32, membership: Membership) -> User {
    User {
        id: None,
        email_address: email.to_string(),
        age,
        membership,
        previous_levels: vec![],
        nickname: None,
        joined: bson::DateTime::from_millis(1_700_000_000_000),
    }
}

async fn setup() -> (InMemoryClient, Mapper<User>) {
    let client = InMemoryClient::builder().build().await.unwrap();
    let handle = ClientHandle::new();
    handle.initialize(client.clone()).await;

    (client, Mapper::new(&handle))
}

async fn collect(query: &Query<User>) -> Vec<User> {
    query
        .stream()
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_assigns_an_id_and_get_returns_an_equal_record() {
    let (_, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Full);
    alice.previous_levels = vec![Membership::Basic, Membership::Intermediate];
    alice.nickname = Some("al".into());

    let id = users.create(&mut alice).await.unwrap();

    assert_eq!(alice.id(), Some(id.as_str()));
    assert_eq!(users.get_document(&id).await.unwrap(), Some(alice));
}

#[tokio::test]
async fn enums_are_stored_as_their_values() {
    let (client, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Full);
    alice.previous_levels = vec![Membership::Basic];

    let id = users.create(&mut alice).await.unwrap();
    let stored = client.get_document("user", &id).await.unwrap().unwrap();

    assert_eq!(stored.get("membership"), Some(&Bson::Int32(3)));
    assert_eq!(stored.get("previous_levels"), Some(&Bson::Array(vec![Bson::Int32(1)])));
    assert_eq!(stored.get("nickname"), Some(&Bson::Null));
}

#[tokio::test]
async fn create_under_a_taken_id_fails() {
    let (_, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Full);
    users.create(&mut alice).await.unwrap();

    let mut copy = alice.clone();
    let err = users.create(&mut copy).await.unwrap_err();

    assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(_, collection) if collection == "user"));
}

#[tokio::test]
async fn update_overwrites_the_stored_record() {
    let (_, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Basic);
    let id = users.create(&mut alice).await.unwrap();

    alice.age = 31;
    alice.membership = Membership::Intermediate;
    users.update(&alice).await.unwrap();

    let found = users.get_document(&id).await.unwrap().unwrap();
    assert_eq!(found.age, 31);
    assert_eq!(found.membership, Membership::Intermediate);
}

#[tokio::test]
async fn update_and_delete_require_an_id() {
    let (_, users) = setup().await;
    let never_created = user("bob@example.com", 25, Membership::Basic);

    let update = users.update(&never_created).await;
    let delete = users.delete(&never_created).await;

    assert!(matches!(update, Err(DocumentStoreError::MissingIdentifier(collection)) if collection == "user"));
    assert!(matches!(delete, Err(DocumentStoreError::MissingIdentifier(_))));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Full);
    let id = users.create(&mut alice).await.unwrap();

    users.delete(&alice).await.unwrap();
    users.delete(&alice).await.unwrap();
    users.delete_document(&id).await.unwrap();

    assert_eq!(users.get_document(&id).await.unwrap(), None);
    assert_eq!(alice.id(), Some(id.as_str()));
}

#[tokio::test]
async fn missing_documents_are_none() {
    let (_, users) = setup().await;

    assert_eq!(users.get_document("missing").await.unwrap(), None);
}

#[tokio::test]
async fn filters_on_enum_fields_match_stored_values() {
    let (_, users) = setup().await;

    for (email, membership) in [
        ("a@example.com", Membership::Basic),
        ("b@example.com", Membership::Full),
        ("c@example.com", Membership::Full),
    ] {
        users.create(&mut user(email, 30, membership)).await.unwrap();
    }

    let full = collect(&users.filter("membership", FilterOp::Eq, Membership::Full).unwrap()).await;
    let some = collect(
        &users
            .filter("membership", FilterOp::In, [Membership::Basic, Membership::Intermediate])
            .unwrap(),
    )
    .await;

    assert_eq!(full.len(), 2);
    assert!(full.iter().all(|found| found.membership == Membership::Full));
    assert_eq!(some.len(), 1);
    assert_eq!(some[0].email_address, "a@example.com");
}

#[tokio::test]
async fn array_contains_matches_enum_elements() {
    let (_, users) = setup().await;
    let mut upgraded = user("a@example.com", 30, Membership::Full);
    upgraded.previous_levels = vec![Membership::Basic, Membership::Intermediate];
    users.create(&mut upgraded).await.unwrap();
    users.create(&mut user("b@example.com", 30, Membership::Basic)).await.unwrap();

    let found = collect(
        &users
            .filter("previous_levels", FilterOp::ArrayContains, Membership::Intermediate)
            .unwrap(),
    )
    .await;

    assert_eq!(found, vec![upgraded]);
}

#[tokio::test]
async fn chained_filters_are_conjoined_and_independent() {
    let (_, users) = setup().await;

    for (email, age, membership) in [
        ("a@example.com", 20, Membership::Full),
        ("b@example.com", 40, Membership::Full),
        ("c@example.com", 40, Membership::Basic),
    ] {
        users.create(&mut user(email, age, membership)).await.unwrap();
    }

    let adults = users.filter("age", FilterOp::Gte, 30).unwrap();
    let full_adults = adults.filter("membership", FilterOp::Eq, Membership::Full).unwrap();

    assert_eq!(collect(&full_adults).await.len(), 1);
    assert_eq!(collect(&adults).await.len(), 2);
}

#[tokio::test]
async fn order_and_limit_are_honored() {
    let (_, users) = setup().await;

    for (email, age) in [("a@example.com", 35), ("b@example.com", 20), ("c@example.com", 50)] {
        users.create(&mut user(email, age, Membership::Basic)).await.unwrap();
    }

    let oldest_two = users
        .query()
        .order_by("age", Direction::Desc)
        .limit(2);
    let ages: Vec<i32> = collect(&oldest_two).await.into_iter().map(|found| found.age).collect();

    assert_eq!(ages, [50, 35]);
}

#[tokio::test]
async fn queries_run_again_on_each_stream() {
    let (_, users) = setup().await;
    let query = users.filter("membership", FilterOp::Eq, Membership::Basic).unwrap();

    assert!(collect(&query).await.is_empty());

    users.create(&mut user("a@example.com", 30, Membership::Basic)).await.unwrap();

    assert_eq!(collect(&query).await.len(), 1);
    assert_eq!(users.stream().await.unwrap().try_collect::<Vec<_>>().await.unwrap().len(), 1);
}

#[tokio::test]
async fn filter_on_null_optional_field() {
    let (_, users) = setup().await;
    let mut named = user("a@example.com", 30, Membership::Basic);
    named.nickname = Some("ace".into());
    users.create(&mut named).await.unwrap();
    users.create(&mut user("b@example.com", 30, Membership::Basic)).await.unwrap();

    let unnamed = collect(&users.filter("nickname", FilterOp::Eq, None::<String>).unwrap()).await;

    assert_eq!(unnamed.len(), 1);
    assert_eq!(unnamed[0].nickname, None);
}

#[tokio::test]
async fn missing_defaulted_fields_are_filled_on_read() {
    let (client, users) = setup().await;
    client
        .set_document("user", "legacy", doc! {
            "email_address": "old@example.com",
            "age": 60,
            "membership": 1,
            "joined": bson::DateTime::from_millis(0),
        })
        .await
        .unwrap();

    let legacy = users.get_document("legacy").await.unwrap().unwrap();

    assert_eq!(legacy.previous_levels, vec![]);
    assert_eq!(legacy.nickname, None);
    assert_eq!(legacy.id(), Some("legacy"));
}

#[tokio::test]
async fn undeclared_enum_values_fail_to_decode() {
    let (client, users) = setup().await;
    let mut alice = user("alice@example.com", 30, Membership::Full);
    let id = users.create(&mut alice).await.unwrap();

    let mut stored = client.get_document("user", &id).await.unwrap().unwrap();
    stored.insert("membership", 9);
    client.set_document("user", &id, stored).await.unwrap();

    assert!(matches!(users.get_document(&id).await, Err(DocumentStoreError::Decode(_))));

    let results: Vec<_> = users.stream().await.unwrap().collect().await;
    assert!(matches!(results.as_slice(), [Err(DocumentStoreError::Decode(_))]));
}

#[tokio::test]
async fn discarded_handle_rejects_operations() {
    let client = InMemoryClient::new();
    let handle = ClientHandle::with_client(client);
    let users = Mapper::<User>::new(&handle);

    handle.discard().await;

    assert!(matches!(users.get_document("x").await, Err(DocumentStoreError::NotInitialized)));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Player {
    #[serde(skip)]
    id: Option<String>,
    name: String,
    score: Option<i32>,
}

static PLAYER: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("Player")
        .field("name", FieldKind::string())
        .field("score", FieldKind::optional(FieldKind::int()))
        .build()
        .unwrap()
});

impl Record for Player {
    fn schema() -> &'static Schema {
        &PLAYER
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

async fn players(scores: &[Option<i32>]) -> Mapper<Player> {
    let handle = ClientHandle::with_client(InMemoryClient::new());
    let players = Mapper::<Player>::new(&handle);

    for (index, score) in scores.iter().enumerate() {
        let mut player = Player { id: None, name: format!("p{index}"), score: *score };
        players.create(&mut player).await.unwrap();
    }

    players
}

async fn scores(query: &Query<Player>) -> Vec<Option<i32>> {
    query
        .stream()
        .await
        .unwrap()
        .map_ok(|player| player.score)
        .try_collect()
        .await
        .unwrap()
}

#[tokio::test]
async fn order_by_optional_field_puts_nulls_first() {
    let players = players(&[
        Some(8), None, Some(1), Some(9), None, Some(4),
        Some(2), Some(7), None, Some(5), Some(3),
    ])
    .await;

    let ascending = scores(&players.query().order_by("score", Direction::Asc)).await;

    assert_eq!(ascending, [
        None, None, None,
        Some(1), Some(2), Some(3), Some(4), Some(5), Some(7), Some(8), Some(9),
    ]);
}

#[tokio::test]
async fn descending_order_with_limit_takes_the_highest() {
    let players = players(&[Some(50), None, Some(10), Some(90), None, Some(30)]).await;

    let top = players
        .query()
        .order_by("score", Direction::Desc)
        .limit(2);

    assert_eq!(scores(&top).await, [Some(90), Some(50)]);
}

#[tokio::test]
async fn later_orderings_break_ties() {
    let (_, users) = setup().await;

    for (email, age) in [
        ("a@example.com", 30),
        ("b@example.com", 20),
        ("c@example.com", 30),
        ("d@example.com", 20),
    ] {
        users.create(&mut user(email, age, Membership::Basic)).await.unwrap();
    }

    let query = users
        .query()
        .order_by("age", Direction::Asc)
        .order_by("email_address", Direction::Desc)
        .limit(3);
    let emails: Vec<String> = collect(&query)
        .await
        .into_iter()
        .map(|found| found.email_address)
        .collect();

    assert_eq!(emails, ["d@example.com", "b@example.com", "c@example.com"]);
}

#[tokio::test]
async fn zero_limit_returns_nothing() {
    let players = players(&[Some(1), Some(2)]).await;

    assert!(scores(&players.query().limit(0)).await.is_empty());
    assert_eq!(scores(&players.query().limit(1)).await.len(), 1);
}
