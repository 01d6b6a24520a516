//! Code buffer with write-through persistence
//!
//! `CodeBuffer` is the single source of truth for the code text during an
//! editing session. Every accepted edit is written to the session store before
//! the call returns. A fresh session starts from the template, which is only
//! persisted once the user edits (or resets) the buffer.

use std::sync::Arc;

use crate::error::Result;
use crate::pairing::{insert_pair, CursorPosition};
use crate::store::{KeyValueStore, CODE_KEY};
use crate::template::DEFAULT_TEMPLATE;

/// Session scope used to pick the storage key for the code text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub team_id: Option<String>,
    /// Keep one buffer per team instead of one per device
    pub scope_code_per_team: bool,
}

impl SessionContext {
    pub fn new(team_id: Option<String>, scope_code_per_team: bool) -> Self {
        Self {
            team_id,
            scope_code_per_team,
        }
    }

    /// Storage key for the code text
    ///
    /// Without per-team scoping (or without a team yet) every session on the
    /// device shares the `code` key.
    pub fn code_key(&self) -> String {
        match self.team_id.as_deref() {
            Some(id) if self.scope_code_per_team && !id.is_empty() => format!("{}:{}", CODE_KEY, id),
            _ => CODE_KEY.to_string(),
        }
    }
}

pub struct CodeBuffer {
    store: Arc<dyn KeyValueStore>,
    key: String,
    template: String,
    text: String,
}

impl std::fmt::Debug for CodeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeBuffer")
            .field("store", &self.store.backend_name())
            .field("key", &self.key)
            .field("len", &self.text.len())
            .finish()
    }
}

impl CodeBuffer {
    /// Load the buffer for `context`, falling back to the default template
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn initialize(store: Arc<dyn KeyValueStore>, context: &SessionContext) -> Result<Self> {
        Self::with_template(store, context, DEFAULT_TEMPLATE)
    }

    /// Like `initialize`, with a custom template
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn with_template(
        store: Arc<dyn KeyValueStore>,
        context: &SessionContext,
        template: impl Into<String>,
    ) -> Result<Self> {
        let key = context.code_key();
        let template = template.into();
        let text = match store.get(&key)? {
            Some(saved) => {
                tracing::debug!("Restored {} chars of code from '{}'", saved.chars().count(), key);
                saved
            }
            None => template.clone(),
        };

        Ok(Self {
            store,
            key,
            template,
            text,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Storage key this buffer writes to
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_template(&self) -> bool {
        self.text == self.template
    }

    /// Replace the code text and persist it
    ///
    /// The in-memory text is updated even if the write fails, so no edit is
    /// lost from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set(&mut self, new_text: impl Into<String>) -> Result<()> {
        self.text = new_text.into();
        self.store.set(&self.key, &self.text)
    }

    /// Replace the code text with `template` and persist it
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn reset(&mut self, template: &str) -> Result<()> {
        self.set(template)
    }

    /// Run the pairing transformer for `key` and commit the result
    ///
    /// Returns the new caret position, or `None` when `key` is not a pairing
    /// character and the buffer was left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn apply_keystroke(&mut self, key: char, cursor: CursorPosition) -> Result<Option<CursorPosition>> {
        match insert_pair(key, &self.text, cursor) {
            Some(edit) => {
                self.set(edit.text)?;
                Ok(Some(edit.cursor))
            }
            None => Ok(None),
        }
    }
}
