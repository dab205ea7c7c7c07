//! Macro-generated conformance suite for `DataAccess<Record>`
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_assigns_id`: nil ids are replaced, given ids are kept
//! - `test_find_by_id_unknown`: unknown id gives `None`
//! - `test_create_duplicate_id`: second insert with the same id fails
//! - `test_update_from_previous`: stored value replaced, id kept
//! - `test_update_unknown`: updating a missing resource fails
//! - `test_delete`: deleted resource is gone, second delete fails
//!
//! ## Filters
//! - `test_filter_string_integer_float_boolean`: exact match on every scalar kind
//! - `test_filter_combination`: conditions are combined with AND
//! - `test_filter_like_and_order`: substring match and descending sort
//! - `test_pagination_keeps_total`: limit/offset pages, total before paging
//! - `test_find_by`: exact-match shortcut
//!
//! ## Concurrency
//! - `test_concurrent_creates`: parallel creates from spawned tasks

/// Generate a full `DataAccess<Record>` conformance suite
///
/// `$factory` is evaluated once per test and must produce a value
/// implementing `DataAccess<Record> + 'static`.
#[macro_export]
macro_rules! data_access_tests {
    ($factory:expr) => {
        mod data_access_contract_tests {
            use super::*;
            use crudkit::prelude::*;
            use serde_json::json;

            async fn seeded() -> impl DataAccess<Record> {
                let store = $factory;
                for item in roster() {
                    store.create(item).await.unwrap();
                }
                store
            }

            fn names(items: &[Record]) -> Vec<&str> {
                items.iter().map(|r| r.name.as_str()).collect()
            }

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_assigns_id() {
                let store = $factory;

                let created = store.create(record("Alice", 30, 4.5, true)).await.unwrap();
                assert!(!created.id.is_nil());

                let given = Uuid::new_v4();
                let mut bob = record("Bob", 41, 3.0, false);
                bob.id = given;
                assert_eq!(store.create(bob).await.unwrap().id, given);

                let found = store.find_by_id(&created.id).await.unwrap();
                assert_eq!(found, Some(created));
            }

            #[tokio::test]
            async fn test_find_by_id_unknown() {
                let store = $factory;
                assert!(store.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_create_duplicate_id() {
                let store = $factory;
                let created = store.create(record("Alice", 30, 4.5, true)).await.unwrap();

                let mut copy = record("Alice II", 31, 4.0, true);
                copy.id = created.id;
                assert!(store.create(copy).await.is_err());
            }

            #[tokio::test]
            async fn test_update_from_previous() {
                let store = $factory;
                let previous = store.create(record("Alice", 30, 4.5, true)).await.unwrap();

                let mut next = previous.clone();
                next.id = Uuid::new_v4();
                next.age = 31;
                let updated = store.update_from_previous(&previous, next).await.unwrap();

                assert_eq!(updated.id, previous.id);
                let stored = store.find_by_id(&previous.id).await.unwrap().unwrap();
                assert_eq!(stored.age, 31);
            }

            #[tokio::test]
            async fn test_update_unknown() {
                let store = $factory;
                let mut ghost = record("Ghost", 1, 0.0, false);
                ghost.id = Uuid::new_v4();
                assert!(store.update_from_previous(&ghost, ghost.clone()).await.is_err());
            }

            #[tokio::test]
            async fn test_delete() {
                let store = $factory;
                let created = store.create(record("Alice", 30, 4.5, true)).await.unwrap();

                store.delete_by_id(&created.id).await.unwrap();
                assert!(store.find_by_id(&created.id).await.unwrap().is_none());
                assert!(store.delete_by_id(&created.id).await.is_err());
            }

            // ==================================================================
            // Filters
            // ==================================================================

            #[tokio::test]
            async fn test_filter_string_integer_float_boolean() {
                let store = seeded().await;

                for (field, value, expected) in [
                    ("email", "bob@test.com", vec!["Bob"]),
                    ("age", "40", vec!["Carol"]),
                    ("score", "3.5", vec!["Dave"]),
                    ("active", "true", vec!["Alice", "Carol", "Eve"]),
                    ("name", "Nobody", vec![]),
                    ("unknown_field", "x", vec![]),
                ] {
                    let result = store
                        .find_by_filter(&[exact(field, value)], None)
                        .await
                        .unwrap();
                    assert_eq!(names(&result.items), expected, "filter on {}", field);
                    assert_eq!(result.total, expected.len());
                }
            }

            #[tokio::test]
            async fn test_filter_combination() {
                let store = seeded().await;

                let result = store
                    .find_by_filter(&[exact("active", "true"), exact("age", "60")], None)
                    .await
                    .unwrap();
                assert_eq!(names(&result.items), vec!["Eve"]);
            }

            #[tokio::test]
            async fn test_filter_like_and_order() {
                let store = seeded().await;
                let filters = vec![
                    filters::like("email", "e@", &serde_json::Value::Null),
                    filters::order("sort", "-age", &json!(["age"])),
                ];

                let result = store.find_by_filter(&filters, None).await.unwrap();
                assert_eq!(names(&result.items), vec!["Eve", "Dave", "Alice"]);
            }

            #[tokio::test]
            async fn test_pagination_keeps_total() {
                let store = seeded().await;
                let page = PaginationFilter { limit: 2, offset: 2 };

                let result = store.find_by_filter(&[], Some(&page)).await.unwrap();
                assert_eq!(names(&result.items), vec!["Carol", "Dave"]);
                assert_eq!(result.total, 5);

                let beyond = PaginationFilter { limit: 2, offset: 10 };
                let result = store.find_by_filter(&[], Some(&beyond)).await.unwrap();
                assert!(result.items.is_empty());
                assert_eq!(result.total, 5);
            }

            #[tokio::test]
            async fn test_find_by() {
                let store = seeded().await;
                let params = vec![("name".to_string(), "Carol".to_string())];

                let result = store.find_by(&params, None).await.unwrap();
                assert_eq!(names(&result.items), vec!["Carol"]);
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_creates() {
                let store = std::sync::Arc::new($factory);

                let mut handles = Vec::new();
                for i in 0..20 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store
                            .create(record(&format!("User{}", i), i, 0.0, true))
                            .await
                            .unwrap()
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }

                let all = store.find_by_filter(&[], None).await.unwrap();
                assert_eq!(all.total, 20);
            }
        }
    };
}
