//! User lookup capability consumed by the sale service
use super::error::LookupError;
use super::sale::TimeStamp;
use super::utils::{self, USER_HRP};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub address: String,
    pub nickname: Option<String>,
    pub created_at: TimeStamp,
    pub updated_at: TimeStamp,
    pub version: u64,
    pub active: bool,
}

/// Answers whether a user exists and is active.
pub trait UserLookup: Send + Sync {
    fn get(&self, user_id: &str) -> Result<User, LookupError>;
}

impl<T: UserLookup + ?Sized> UserLookup for Arc<T> {
    fn get(&self, user_id: &str) -> Result<User, LookupError> {
        (**self).get(user_id)
    }
}

/// In-memory user registry. Deactivated users stay stored but are not found.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: &str,
        address: &str,
        nickname: Option<&str>,
    ) -> Result<User, LookupError> {
        let now = TimeStamp::new();
        let user = User {
            id: utils::new_id(USER_HRP)?,
            name: name.to_string(),
            address: address.to_string(),
            nickname: nickname.map(str::to_string),
            created_at: now,
            updated_at: now,
            version: 1,
            active: true,
        };

        self.write()?.insert(user.id.clone(), user.clone());
        tracing::debug!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Logical delete: the record is kept with `active` cleared.
    pub fn deactivate(&self, user_id: &str) -> Result<User, LookupError> {
        let mut users = self.write()?;
        let user = users
            .get_mut(user_id)
            .filter(|u| u.active)
            .ok_or(LookupError::NotFound)?;

        user.active = false;
        user.updated_at = TimeStamp::after(&user.updated_at);
        user.version += 1;
        Ok(user.clone())
    }

    pub fn list_active(&self) -> Result<Vec<User>, LookupError> {
        Ok(self.read()?.values().filter(|u| u.active).cloned().collect())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, User>>, LookupError> {
        self.users
            .read()
            .map_err(|_| LookupError::Other(anyhow::anyhow!("user directory lock poisoned")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, User>>, LookupError> {
        self.users
            .write()
            .map_err(|_| LookupError::Other(anyhow::anyhow!("user directory lock poisoned")))
    }
}

impl UserLookup for UserDirectory {
    fn get(&self, user_id: &str) -> Result<User, LookupError> {
        self.read()?
            .get(user_id)
            .filter(|u| u.active)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}
