//! Scope registry operations on a collection.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::{Collection, State};
use crate::error::CollectionError;
use crate::record::{Properties, Record, RecordHandle};
use crate::scope::Scope;

impl<R: Record> Collection<R> {
    pub fn get_scope(&self, name: &str) -> Result<Option<Scope<R>>, CollectionError> {
        Ok(self.shared.read_state()?.scopes.get(name).cloned())
    }

    pub fn scopes_names(&self) -> Result<Vec<String>, CollectionError> {
        Ok(self.shared.read_state()?.scopes.keys().cloned().collect())
    }

    /// Scopes whose name contains a match for `pattern`, in registry order.
    pub fn get_scopes_matching(&self, pattern: &Regex) -> Result<Vec<Scope<R>>, CollectionError> {
        Ok(self
            .shared
            .read_state()?
            .scopes
            .iter()
            .filter(|(name, _)| pattern.is_match(name))
            .map(|(_, scope)| scope.clone())
            .collect())
    }

    /// Items of every scope matching `pattern`, concatenated in scope order.
    /// A record in two matching scopes appears twice.
    pub fn combine_scope_items(
        &self,
        pattern: &Regex,
    ) -> Result<Vec<RecordHandle<R>>, CollectionError> {
        let mut items = Vec::new();
        for scope in self.get_scopes_matching(pattern)? {
            items.extend(scope.items()?);
        }
        Ok(items)
    }

    /// Get the scope called `name`, creating and registering it if needed.
    ///
    /// `params` are merged into an existing scope's parameters. Without a name
    /// a fresh `scope-<n>` name is generated.
    pub fn provide_scope(
        &self,
        name: Option<&str>,
        params: Option<Properties>,
    ) -> Result<Scope<R>, CollectionError> {
        let mut state = self.shared.write_state()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => self.next_scope_name(&state),
        };

        if let Some(existing) = state.scopes.get(&name) {
            if let Some(params) = params {
                existing.set_params(params)?;
            }
            return Ok(existing.clone());
        }

        let scope = Scope::bound(
            Arc::downgrade(&self.shared),
            name.clone(),
            params.unwrap_or_default(),
        );
        state.scopes.insert(name, scope.clone());
        debug!(collection = R::COLLECTION, scope = scope.name(), "scope created");
        Ok(scope)
    }

    /// Register `scope` under its name, replacing any scope already there.
    pub fn set_scope(&self, scope: Scope<R>) -> Result<(), CollectionError> {
        if !scope.belongs_to(&self.shared) {
            return Err(CollectionError::ForeignScope {
                name: scope.name().to_string(),
            });
        }
        debug!(collection = R::COLLECTION, scope = scope.name(), "scope set");
        self.shared
            .write_state()?
            .scopes
            .insert(scope.name().to_string(), scope);
        Ok(())
    }

    /// Unregister `scope`. A different scope registered under the same name
    /// is left alone.
    pub fn unset_scope(&self, scope: &Scope<R>) -> Result<(), CollectionError> {
        let mut state = self.shared.write_state()?;
        let registered = state
            .scopes
            .get(scope.name())
            .is_some_and(|current| current.same_instance(scope));
        if registered {
            state.scopes.remove(scope.name());
            debug!(collection = R::COLLECTION, scope = scope.name(), "scope unset");
        }
        Ok(())
    }

    fn next_scope_name(&self, state: &State<R>) -> String {
        loop {
            let seq = self.shared.scope_seq.fetch_add(1, Ordering::Relaxed) + 1;
            let name = format!("scope-{}", seq);
            if !state.scopes.contains_key(&name) {
                return name;
            }
        }
    }
}
