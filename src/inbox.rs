use crate::error::AppError;
use crate::utils::{is_truthy, now_iso8601};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const WEB_APP_SOURCE: &str = "web_app";
pub const TELEGRAM_SOURCE: &str = "telegram";

const REQUIRED_FIELDS_MISSING: &str = "firstName and lastName are required";

/// A contact profile as submitted. Unknown fields are kept verbatim alongside the two required
/// name fields and the server-side `received_at`/`source` stamps.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Profile(Map<String, Value>);

impl Profile {
    /// Accept a submission if both `firstName` and `lastName` are present.
    pub fn from_submission(fields: Map<String, Value>) -> Result<Self, AppError> {
        let present = |key: &str| fields.get(key).map_or(false, is_truthy);
        if !present("firstName") || !present("lastName") {
            return Err(AppError::Validation(REQUIRED_FIELDS_MISSING));
        }
        Ok(Self(fields))
    }

    fn stamp(&mut self, received_at: String, source: &str) {
        self.0
            .insert("received_at".to_string(), Value::String(received_at));
        self.0
            .insert("source".to_string(), Value::String(source.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A present field rendered for display; strings bare, other values as JSON text.
    pub fn display(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            v if is_truthy(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

/// Process-local, append-only profile buffer. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct Inbox {
    profiles: Mutex<Vec<Profile>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Profile>> {
        self.profiles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate, stamp and append a submission. Returns the stored record and the inbox size
    /// after the append.
    pub fn receive(
        &self,
        fields: Map<String, Value>,
        source: &str,
    ) -> Result<(Profile, usize), AppError> {
        let mut profile = Profile::from_submission(fields)?;
        profile.stamp(now_iso8601()?, source);
        let count = self.push(profile.clone());
        Ok((profile, count))
    }

    fn push(&self, profile: Profile) -> usize {
        let mut profiles = self.lock();
        profiles.push(profile);
        profiles.len()
    }

    /// Snapshot of every profile in arrival order.
    pub fn profiles(&self) -> Vec<Profile> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
