//! Library API: authors and books with reference binding, listeners and
//! token-protected writes
//!
//! ```text
//! JWT_TOKEN_KEY=dev-secret cargo run --example library_api
//! curl -X POST localhost:3000/authors -d '{"name": "Ursula K. Le Guin"}'
//! curl -H "Authorization: Bearer <token printed at startup>" \
//!      -X POST localhost:3000/books -d '{"title": "The Dispossessed", "author_id": "<id>"}'
//! curl 'localhost:3000/books?title=Disp&sort=-title'
//! ```

use anyhow::Result;
use crudkit::prelude::*;
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Author {
    #[serde(default)]
    id: Uuid,
    name: String,
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Book {
    #[serde(default)]
    id: Uuid,
    title: String,
    #[serde(default)]
    author_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Bound::is_unset")]
    author: Bound<Author>,
    #[serde(default)]
    added_by: Option<String>,
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

    fn query_filters() -> Option<QueryFilterSet> {
        Some(QueryFilterSet::new(vec![
            QueryFilter::new("title", filters::like),
            QueryFilter::new("sort", filters::order).with_args(json!(["title"])),
        ]))
    }
}

impl UuidBinder for Book {
    fn uuid_bindings(&mut self) -> Vec<Binding<'_>> {
        vec![Binding::new("author", self.author_id, &mut self.author)]
    }
}

struct Librarian;

impl TokenSubject for Librarian {
    fn token_information(&self) -> serde_json::Value {
        json!({"name": "librarian"})
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = CrudConfig::from_env()?;
    if let Some(tokens) = config.token_service() {
        let token = tokens.generate_token(&Librarian, config.token_ttl())?;
        println!("Librarian token: {}", token.value);
    }

    let stamp_librarian = Listener::new(PRE_CREATE, 0, |ctx, event| {
        let name = ctx
            .token()
            .and_then(|token| token["name"].as_str().map(str::to_string));
        if let Some(action) = event.downcast_mut::<ResourceActionEvent<Book>>() {
            action.resource.added_by = name;
        }
        Ok(())
    });

    let audit = Listener::new(RESOURCE_ACTION, -10, |_, event| {
        tracing::info!(
            resource = event.resource_name().unwrap_or("?"),
            action = event.action().unwrap_or("?"),
            "resource action"
        );
        Ok(())
    });

    ApiBuilder::new()
        .with_config(config)
        .with_data_access::<Author>(Arc::new(InMemoryDataAccess::new()))
        .with_data_access::<Book>(Arc::new(InMemoryDataAccess::new()))
        .with_listener(stamp_librarian)
        .with_listener(audit)
        .resource::<Author>("/authors", "")
        .resource::<Book>("/books", "RL")
        .protected_resource::<Book>("/books", "CUD")
        .serve("127.0.0.1:3000")
        .await
}
