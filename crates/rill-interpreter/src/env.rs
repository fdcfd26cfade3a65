use crate::value::Value;

use rill_common::error::{Error, NameError, Result};
use rill_common::types::Span;
use rustc_hash::FxHashMap;

use std::collections::hash_map::Entry;

/// One scope frame. Lookups walk the parent chain outward; a frame borrows
/// its parent and is dropped when the block that created it finishes, so
/// bindings can never escape their scope.
#[derive(Debug, Default)]
pub struct Env<'a> {
    locals: FxHashMap<String, Value>,
    parent: Option<&'a Env<'a>>,
}

impl<'a> Env<'a> {
    pub fn with_parent(parent: &'a Env<'a>) -> Self {
        Self { locals: FxHashMap::default(), parent: Some(parent) }
    }

    /// Binds a name in this frame. Shadowing an outer frame is allowed,
    /// re-declaring within the same frame is not.
    pub fn bind(&mut self, name: &str, value: Value, span: &Span) -> Result<()> {
        match self.locals.entry(name.to_string()) {
            Entry::Occupied(_) => Err((
                Error::NameError(NameError::AlreadyDefined { name: name.to_string() }),
                span.clone(),
            )),
            Entry::Vacant(entry) => {
                entry.insert(value);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match self.locals.get(name) {
            Some(value) => Some(value),
            None => self.parent?.lookup(name),
        }
    }
}
