//! Model types and lazily loaded references.
//!
//! A [`Lazy<T>`] deserializes from a bare `{"id": ...}` link and fetches the
//! full object the first time it is asked for.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use uuid::Uuid;

use crate::client::{QueryArgs, QueryClient};
use crate::error::{QueryError, Result};
use crate::query::{QueryExecutor, QueryMethod};

/// A type that can be loaded by id.
pub trait Model: DeserializeOwned {
    /// Query returning exactly one object, with the id bound as `$1`.
    ///
    /// The id is sent as text, so Postgres queries should cast it
    /// (`WHERE id = $1::uuid`).
    const BY_ID_QUERY: &'static str;
}

/// A reference to a model that is only fetched on first access.
#[derive(Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct Lazy<T> {
    id: Uuid,
    #[serde(skip)]
    loaded: OnceCell<T>,
}

impl<T> Lazy<T> {
    /// Creates an unloaded reference.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            loaded: OnceCell::new(),
        }
    }

    /// The id of the referenced object.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns true once the object has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// The loaded object, if it has been fetched.
    pub fn loaded(&self) -> Option<&T> {
        self.loaded.get()
    }
}

impl<T: Model> Lazy<T> {
    /// Returns the referenced object, loading it through `client` on first use.
    pub fn get<C: QueryClient + ?Sized>(&self, client: &C) -> Result<&T> {
        if let Some(value) = self.loaded.get() {
            return Ok(value);
        }

        let value = QueryExecutor::new(client, QueryMethod::SingleRequired)?
            .execute(T::BY_ID_QUERY, &QueryArgs::new().arg(self.id.to_string()))?
            .parse::<T>()?
            .ok_or(QueryError::EmptyResult)?;

        Ok(self.loaded.get_or_init(|| value))
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("id", &self.id)
            .field("loaded", &self.loaded.get())
            .finish()
    }
}

impl<T> Clone for Lazy<T> {
    /// Clones the reference only; the clone loads on its own.
    fn clone(&self) -> Self {
        Self::new(self.id)
    }
}

impl<T> PartialEq for Lazy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
