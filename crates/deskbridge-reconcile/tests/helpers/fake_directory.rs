//! In-memory directory that records every call it receives.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use deskbridge_directory::{
    DirectoryApi, DirectoryError, DirectoryResult, DirectoryUser, Identity, IdentityId,
    SearchQuery, UserId,
};

/// A call made against the fake, in order of arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search(SearchQuery),
    CreateOrUpdate(DirectoryUser),
    ListIdentities(UserId),
    DeleteIdentity(UserId, IdentityId),
    Merge { source: UserId, target: UserId },
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Search,
    Write,
    ListIdentities,
    DeleteIdentity,
    Merge,
}

#[derive(Default)]
struct State {
    users: Vec<DirectoryUser>,
    identities: HashMap<UserId, Vec<Identity>>,
    next_user_id: UserId,
    next_identity_id: IdentityId,
    calls: Vec<Call>,
    failing: HashSet<Op>,
}

#[derive(Default)]
pub struct FakeDirectory {
    state: Mutex<State>,
    /// External id whose lookup panics instead of answering.
    panic_on_external_id: Option<String>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        let directory = Self::default();
        {
            let mut state = directory.state.lock().unwrap();
            state.next_user_id = 1000;
            state.next_identity_id = 5000;
        }
        directory
    }

    /// Insert a user as-is (its id must be set).
    pub fn with_user(self, user: DirectoryUser) -> Self {
        self.state.lock().unwrap().users.push(user);
        self
    }

    pub fn with_identity(self, user_id: UserId, id: IdentityId, kind: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .identities
            .entry(user_id)
            .or_default()
            .push(identity(user_id, id, kind, value));
        self
    }

    pub fn panicking_for(mut self, external_id: &str) -> Self {
        self.panic_on_external_id = Some(external_id.to_string());
        self
    }

    pub fn failing(self, op: Op) -> Self {
        self.state.lock().unwrap().failing.insert(op);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn writes(&self) -> Vec<DirectoryUser> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateOrUpdate(user) => Some(user),
                _ => None,
            })
            .collect()
    }

    pub fn deletions(&self) -> Vec<IdentityId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteIdentity(_, id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn merges(&self) -> Vec<(UserId, UserId)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Merge { source, target } => Some((source, target)),
                _ => None,
            })
            .collect()
    }

    pub fn users(&self) -> Vec<DirectoryUser> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn identities_of(&self, user_id: UserId) -> Vec<Identity> {
        self.state
            .lock()
            .unwrap()
            .identities
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn identity(user_id: UserId, id: IdentityId, kind: &str, value: &str) -> Identity {
    Identity {
        id,
        user_id: Some(user_id),
        kind: kind.to_string(),
        value: value.to_string(),
        url: format!("https://desk.test/api/v2/users/{user_id}/identities/{id}.json"),
        primary: false,
        created_at: None,
        updated_at: None,
    }
}

fn injected(op: Op) -> DirectoryError {
    DirectoryError::Api {
        status: 503,
        detail: format!("injected failure for {op:?}"),
    }
}

impl State {
    fn record(&mut self, call: Call, op: Op) -> DirectoryResult<()> {
        self.calls.push(call);
        if self.failing.contains(&op) {
            return Err(injected(op));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryApi for FakeDirectory {
    async fn search_users(
        &self,
        query: &SearchQuery,
        per_page: u32,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        if let SearchQuery::ExternalId(token) = query {
            if self.panic_on_external_id.as_deref() == Some(token.as_str()) {
                panic!("directory lookup for {token} blew up");
            }
        }
        let mut state = self.state.lock().unwrap();
        state.record(Call::Search(query.clone()), Op::Search)?;

        let matches = state
            .users
            .iter()
            .filter(|user| match query {
                SearchQuery::Email(email) => user.email.eq_ignore_ascii_case(email),
                SearchQuery::ExternalId(token) => user.external_id.as_deref() == Some(token),
            })
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn create_or_update_user(&self, user: &DirectoryUser) -> DirectoryResult<DirectoryUser> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateOrUpdate(user.clone()), Op::Write)?;

        let position = state.users.iter().position(|existing| {
            (user.id.is_some() && existing.id == user.id)
                || (user.external_id.is_some() && existing.external_id == user.external_id)
                || existing.email.eq_ignore_ascii_case(&user.email)
        });

        let stored = match position {
            Some(index) => {
                let existing = &mut state.users[index];
                let role = existing.role.clone();
                let id = existing.id;
                *existing = user.clone();
                existing.id = id;
                existing.role = role;
                existing.clone()
            }
            None => {
                state.next_user_id += 1;
                let mut created = user.clone();
                created.id = Some(state.next_user_id);
                created.role = Some("end-user".to_string());
                state.users.push(created.clone());
                if let Some(phone) = created.phone.clone() {
                    state.next_identity_id += 1;
                    let (uid, iid) = (state.next_user_id, state.next_identity_id);
                    state
                        .identities
                        .entry(uid)
                        .or_default()
                        .push(identity(uid, iid, "phone_number", &phone));
                }
                created
            }
        };
        Ok(stored)
    }

    async fn list_identities(&self, user_id: UserId) -> DirectoryResult<Vec<Identity>> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::ListIdentities(user_id), Op::ListIdentities)?;
        Ok(state.identities.get(&user_id).cloned().unwrap_or_default())
    }

    async fn delete_identity(
        &self,
        user_id: UserId,
        identity_id: IdentityId,
    ) -> DirectoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteIdentity(user_id, identity_id), Op::DeleteIdentity)?;
        if let Some(list) = state.identities.get_mut(&user_id) {
            list.retain(|i| i.id != identity_id);
        }
        Ok(())
    }

    async fn merge_users(&self, source: UserId, target: UserId) -> DirectoryResult<()> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::Merge { source, target }, Op::Merge)?;
        state.users.retain(|u| u.id != Some(source));
        let moved = state.identities.remove(&source).unwrap_or_default();
        state.identities.entry(target).or_default().extend(moved);
        Ok(())
    }
}
