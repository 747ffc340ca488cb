//! In-process identity store.
//!
//! Implements both driven ports over one mutex so every uniqueness check and
//! insert happens atomically, mirroring the database constraints. Deletes
//! cascade exactly like the `ON DELETE CASCADE` foreign keys. Used when no
//! database URL is configured and by tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    AuthorizedKeyRepository, IdentityPersistenceError, IdentityRepository, NewAuthorizedKeyEntry,
    NewDomain, NewHost, NewUser,
};
use crate::domain::{
    AuthorizedKeyEntry, AuthorizedKeyEntryId, Domain, DomainId, Host, HostId, PublicKey, User,
    UserId,
};

#[derive(Debug, Default)]
struct State {
    domains: HashMap<DomainId, Domain>,
    hosts: HashMap<HostId, Host>,
    users: HashMap<UserId, User>,
    edges: Vec<AuthorizedKeyEntry>,
    last_edge_id: i64,
}

impl State {
    fn remove_user(&mut self, user_id: &UserId) -> bool {
        let removed = self.users.remove(user_id).is_some();
        if removed {
            self.edges
                .retain(|edge| edge.owner != *user_id && edge.authed_user != *user_id);
        }
        removed
    }

    fn remove_host(&mut self, host_id: &HostId) -> bool {
        if self.hosts.remove(host_id).is_none() {
            return false;
        }
        let users: Vec<UserId> = self
            .users
            .values()
            .filter(|user| user.host_id == *host_id)
            .map(|user| user.id)
            .collect();
        for user_id in &users {
            self.remove_user(user_id);
        }
        true
    }
}

/// Number of rows per table, for assertions and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub domains: usize,
    pub hosts: usize,
    pub users: usize,
    pub authorized_keys: usize,
}

/// Mutex-guarded identity store implementing [`IdentityRepository`] and
/// [`AuthorizedKeyRepository`].
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    state: Mutex<State>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current row counts.
    pub fn counts(&self) -> Result<StoreCounts, IdentityPersistenceError> {
        let state = self.lock()?;
        Ok(StoreCounts {
            domains: state.domains.len(),
            hosts: state.hosts.len(),
            users: state.users.len(),
            authorized_keys: state.edges.len(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, IdentityPersistenceError> {
        self.state
            .lock()
            .map_err(|_| IdentityPersistenceError::connection("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityStore {
    async fn create_domain(&self, domain: &NewDomain) -> Result<Domain, IdentityPersistenceError> {
        let mut state = self.lock()?;
        if state.domains.values().any(|d| d.name == domain.name) {
            return Err(IdentityPersistenceError::conflict("domains_name_key"));
        }
        let created = Domain {
            id: DomainId::random(),
            name: domain.name.clone(),
            comment: domain.comment.clone(),
        };
        state.domains.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_domain_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Domain>, IdentityPersistenceError> {
        let state = self.lock()?;
        Ok(state.domains.values().find(|d| d.name == name).cloned())
    }

    async fn create_host(&self, host: &NewHost) -> Result<Host, IdentityPersistenceError> {
        let mut state = self.lock()?;
        if !state.domains.contains_key(&host.domain_id) {
            return Err(IdentityPersistenceError::missing_reference(
                "hosts_domain_id_fkey",
            ));
        }
        let taken = state
            .hosts
            .values()
            .any(|h| h.domain_id == host.domain_id && h.name == host.name);
        if taken {
            return Err(IdentityPersistenceError::conflict("hosts_domain_id_name_key"));
        }
        let created = Host {
            id: HostId::random(),
            domain_id: host.domain_id,
            name: host.name.clone(),
            comment: host.comment.clone(),
        };
        state.hosts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_host_by_domain_and_name(
        &self,
        domain_id: &DomainId,
        name: &str,
    ) -> Result<Option<Host>, IdentityPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .hosts
            .values()
            .find(|h| h.domain_id == *domain_id && h.name == name)
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, IdentityPersistenceError> {
        let mut state = self.lock()?;
        if !state.hosts.contains_key(&user.host_id) {
            return Err(IdentityPersistenceError::missing_reference(
                "users_host_id_fkey",
            ));
        }
        let taken = state
            .users
            .values()
            .any(|u| u.host_id == user.host_id && u.name == user.name);
        if taken {
            return Err(IdentityPersistenceError::conflict("users_host_id_name_key"));
        }
        let created = User {
            id: UserId::random(),
            host_id: user.host_id,
            name: user.name.clone(),
            pub_key: user.pub_key.clone(),
            comment: user.comment.clone(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_host_and_name(
        &self,
        host_id: &HostId,
        name: &str,
    ) -> Result<Option<User>, IdentityPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|u| u.host_id == *host_id && u.name == name)
            .cloned())
    }

    async fn update_user_pub_key(
        &self,
        user_id: &UserId,
        pub_key: &PublicKey,
    ) -> Result<User, IdentityPersistenceError> {
        let mut state = self.lock()?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| IdentityPersistenceError::not_found(format!("user {user_id}")))?;
        user.pub_key = pub_key.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<bool, IdentityPersistenceError> {
        Ok(self.lock()?.remove_user(user_id))
    }

    async fn delete_host(&self, host_id: &HostId) -> Result<bool, IdentityPersistenceError> {
        Ok(self.lock()?.remove_host(host_id))
    }

    async fn delete_domain(&self, domain_id: &DomainId) -> Result<bool, IdentityPersistenceError> {
        let mut state = self.lock()?;
        if state.domains.remove(domain_id).is_none() {
            return Ok(false);
        }
        let hosts: Vec<HostId> = state
            .hosts
            .values()
            .filter(|host| host.domain_id == *domain_id)
            .map(|host| host.id)
            .collect();
        for host_id in &hosts {
            state.remove_host(host_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl AuthorizedKeyRepository for InMemoryIdentityStore {
    async fn create_edge(
        &self,
        entry: &NewAuthorizedKeyEntry,
    ) -> Result<AuthorizedKeyEntry, IdentityPersistenceError> {
        let mut state = self.lock()?;
        if !state.users.contains_key(&entry.owner) || !state.users.contains_key(&entry.authed_user)
        {
            return Err(IdentityPersistenceError::missing_reference(
                "authorized_keys_user_fkey",
            ));
        }
        let taken = state
            .edges
            .iter()
            .any(|edge| edge.owner == entry.owner && edge.authed_user == entry.authed_user);
        if taken {
            return Err(IdentityPersistenceError::conflict(
                "authorized_keys_owner_id_authed_user_id_key",
            ));
        }
        state.last_edge_id += 1;
        let created = AuthorizedKeyEntry {
            id: AuthorizedKeyEntryId::new(state.last_edge_id),
            owner: entry.owner,
            authed_user: entry.authed_user,
            options: entry.options.clone(),
        };
        state.edges.push(created.clone());
        Ok(created)
    }

    async fn delete_edge(
        &self,
        owner: &UserId,
        authed_user: &UserId,
    ) -> Result<bool, IdentityPersistenceError> {
        let mut state = self.lock()?;
        let before = state.edges.len();
        state
            .edges
            .retain(|edge| !(edge.owner == *owner && edge.authed_user == *authed_user));
        Ok(state.edges.len() < before)
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<AuthorizedKeyEntry>, IdentityPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .edges
            .iter()
            .filter(|edge| edge.owner == *owner)
            .cloned()
            .collect())
    }
}
