//! In-memory backend for unit tests.

use super::{Backend, Flag};
use crate::context::Context;
use crate::error::{FlagonError, Result};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    flags: Mutex<Vec<Flag>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(self, key: &str, enabled: bool, tags: &[&str]) -> Self {
        if let Ok(mut flags) = self.flags.lock() {
            flags.push(Flag {
                key: key.to_string(),
                name: key.to_string(),
                description: String::new(),
                kind: "boolean".to_string(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                archived: false,
                enabled,
            });
        }
        self
    }

    pub fn with_archived_flag(self, key: &str) -> Self {
        let backend = self.with_flag(key, false, &[]);
        if let Ok(mut flags) = backend.flags.lock()
            && let Some(flag) = flags.iter_mut().find(|f| f.key == key)
        {
            flag.archived = true;
        }
        backend
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_flags(&self, ctx: &Context) -> Result<Vec<Flag>> {
        ctx.check()?;
        Ok(self.flags.lock().map(|f| f.clone()).unwrap_or_default())
    }

    fn get_flag(&self, ctx: &Context, key: &str) -> Result<Flag> {
        self.list_flags(ctx)?
            .into_iter()
            .find(|f| f.key == key)
            .ok_or_else(|| FlagonError::FlagNotFound(key.to_string()))
    }

    fn set_enabled(
        &self,
        ctx: &Context,
        key: &str,
        enabled: bool,
        _comment: Option<&str>,
    ) -> Result<Flag> {
        ctx.check()?;
        let mut flags = self
            .flags
            .lock()
            .map_err(|_| FlagonError::Usage("memory backend poisoned".to_string()))?;
        let flag = flags
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| FlagonError::FlagNotFound(key.to_string()))?;
        flag.enabled = enabled;
        Ok(flag.clone())
    }
}
