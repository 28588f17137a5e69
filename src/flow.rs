//! In-memory user list state driven by the API client.
//!
//! Loading the list and creating a user write failures into the `error`
//! slot instead of returning them. The lock is never held across an `.await`.

use crate::api::transport::{HttpTransport, Transport};
use crate::api::user::UserApi;
use crate::model::user::{CreateUserInput, User};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserState {
    pub users: Vec<User>,
    pub loading: bool,
    pub creating: bool,
    pub error: Option<String>,
}

pub struct UserFlow<T = HttpTransport> {
    api: UserApi<T>,
    state: RwLock<UserState>,
}

impl<T: Transport> UserFlow<T> {
    pub fn new(api: UserApi<T>) -> Self {
        Self {
            api,
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn api(&self) -> &UserApi<T> {
        &self.api
    }

    pub fn snapshot(&self) -> UserState {
        self.state.read().clone()
    }

    /// Replace the list with the remote one.
    pub async fn load_users(&self) {
        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let outcome = self.api.get_users().await;

        let mut state = self.state.write();
        state.loading = false;
        match outcome {
            Ok(users) => {
                debug!(count = users.len(), "user list refreshed");
                state.users = users;
            }
            Err(err) => state.error = Some(format!("failed to load users: {err}")),
        }
    }

    /// Fetch one user and swap it into the list in place.
    ///
    /// Only an entry already in the list is replaced. A failed fetch leaves
    /// the state untouched; the caller sees it as `None`.
    pub async fn load_single_user(&self, id: i64) -> Option<User> {
        let fetched = self.api.get_user_by_id(id).await;

        if let Some(user) = &fetched {
            let mut state = self.state.write();
            if let Some(existing) = state.users.iter_mut().find(|u| u.id == id as f64) {
                *existing = user.clone();
            }
        }
        fetched
    }

    pub async fn create_new_user(&self, input: &CreateUserInput) -> Option<User> {
        {
            let mut state = self.state.write();
            state.creating = true;
            state.error = None;
        }

        let outcome = self.api.create_user(input).await;

        let mut state = self.state.write();
        state.creating = false;
        match outcome {
            Ok(user) => {
                state.users.push(user.clone());
                Some(user)
            }
            Err(err) => {
                state.error = Some(format!("{err}: {}", err.source));
                None
            }
        }
    }

    pub fn clear_users(&self) {
        self.state.write().users.clear();
    }
}
