//! Shared fixtures: Publisher ◀── Author ◀── Book

#![allow(dead_code)]

use crudkit::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use validator::Validate;

// ============================================================================
// Publisher: plain resource
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publisher {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
}

impl Resource for Publisher {
    fn resource_name() -> &'static str {
        "publisher"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

// ============================================================================
// Author: bound to a publisher
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub publisher_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Bound::is_unset")]
    pub publisher: Bound<Publisher>,
}

impl Resource for Author {
    fn resource_name() -> &'static str {
        "author"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> {
        Some(self)
    }
}

impl UuidBinder for Author {
    fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
        vec![Binding::new(
            "publisher",
            self.publisher_id,
            &mut self.publisher,
        )]
    }
}

// ============================================================================
// Book: two bindings, validation, filters, pagination
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Book {
    #[serde(default)]
    pub id: Uuid,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[validate(range(min = 1450))]
    pub year: u32,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Bound::is_unset")]
    pub author: Bound<Author>,
    #[serde(default)]
    pub co_author_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Bound::is_unset")]
    pub co_author: Bound<Author>,
}

fn default_status() -> String {
    "available".to_string()
}

impl Resource for Book {
    fn resource_name() -> &'static str {
        "book"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> {
        Some(self)
    }

    fn as_validation_aware(&self) -> Option<&dyn ValidationAware> {
        Some(self)
    }

    fn pagination_config() -> Option<PaginationConfig> {
        Some(PaginationConfig {
            query_param_name: "p".to_string(),
            per_page: 2,
        })
    }

    fn query_filters() -> Option<QueryFilterSet> {
        Some(QueryFilterSet::new(vec![
            QueryFilter::new("title", filters::like),
            QueryFilter::new("status", filters::exact).with_default("available"),
            QueryFilter::new("sort", filters::order).with_args(json!(["title", "year"])),
        ]))
    }
}

impl UuidBinder for Book {
    fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
        vec![
            Binding::new("author", self.author_id, &mut self.author),
            Binding::new("co_author", self.co_author_id, &mut self.co_author),
        ]
    }
}

impl ValidationAware for Book {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = field_errors(self);
        if self.co_author_id.is_some() && self.co_author_id == self.author_id {
            errors.push(new_validation_error("distinct", "co_author_id", Some(self)));
        }
        errors
    }

    fn custom_validation_messages(&self) -> HashMap<String, String> {
        HashMap::from([(
            "title:length".to_string(),
            "A book needs a title".to_string(),
        )])
    }
}

// ============================================================================
// Node: self-referencing resource, for cyclic data
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub next_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Bound::is_unset")]
    pub next: Bound<Node>,
}

impl Resource for Node {
    fn resource_name() -> &'static str {
        "node"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn as_binder(&mut self) -> Option<&mut dyn UuidBinder> {
        Some(self)
    }
}

impl UuidBinder for Node {
    fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
        vec![Binding::new("next", self.next_id, &mut self.next)]
    }
}

// ============================================================================
// Stores
// ============================================================================

pub struct Library {
    pub publishers: Arc<InMemoryDataAccess<Publisher>>,
    pub authors: Arc<InMemoryDataAccess<Author>>,
    pub books: Arc<InMemoryDataAccess<Book>>,
}

impl Library {
    pub fn new() -> Self {
        Self {
            publishers: Arc::new(InMemoryDataAccess::new()),
            authors: Arc::new(InMemoryDataAccess::new()),
            books: Arc::new(InMemoryDataAccess::new()),
        }
    }

    pub fn registry(&self) -> DataAccessRegistry {
        DataAccessRegistry::new()
            .with::<Publisher>(self.publishers.clone())
            .with::<Author>(self.authors.clone())
            .with::<Book>(self.books.clone())
    }

    /// Builder with every store registered and all resources mounted
    pub fn api(&self) -> ApiBuilder {
        ApiBuilder::new()
            .with_data_access::<Publisher>(self.publishers.clone())
            .with_data_access::<Author>(self.authors.clone())
            .with_data_access::<Book>(self.books.clone())
            .resource::<Publisher>("/publishers", "")
            .resource::<Author>("/authors", "")
            .resource::<Book>("/books", "")
    }

    pub async fn publisher(&self, name: &str) -> Publisher {
        self.publishers
            .create(Publisher {
                id: Uuid::nil(),
                name: name.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn author(&self, name: &str, publisher_id: Option<Uuid>) -> Author {
        self.authors
            .create(Author {
                id: Uuid::nil(),
                name: name.to_string(),
                publisher_id,
                publisher: Bound::Unset,
            })
            .await
            .unwrap()
    }

    pub async fn book(&self, title: &str, year: u32, status: &str) -> Book {
        self.books.create(book(title, year, status)).await.unwrap()
    }
}

pub fn book(title: &str, year: u32, status: &str) -> Book {
    Book {
        id: Uuid::nil(),
        title: title.to_string(),
        status: status.to_string(),
        year,
        author_id: None,
        author: Bound::Unset,
        co_author_id: None,
        co_author: Bound::Unset,
    }
}
