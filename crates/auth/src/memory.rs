use super::*;
use march_core::ID;
use march_core::Unique;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process member store. Used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct Memory {
    accounts: RwLock<HashMap<ID<Member>, (Member, String)>>,
}

impl Memory {
    /// First field of `member` that collides with some other account.
    fn collision(
        accounts: &HashMap<ID<Member>, (Member, String)>,
        member: &Member,
    ) -> Option<&'static str> {
        let taken = |field: fn(&Member) -> &str| {
            accounts
                .values()
                .any(|(m, _)| m.id() != member.id() && field(m) == field(member))
        };
        if taken(Member::username) {
            return Some("username");
        }
        if !member.email().is_empty() && taken(Member::email) {
            return Some("email");
        }
        None
    }
}

impl Directory for Memory {
    async fn find(&self, id: ID<Member>) -> Result<Option<(Member, String)>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, StoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|(m, _)| m.username() == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Member>, StoreError> {
        let mut members = self
            .accounts
            .read()
            .await
            .values()
            .map(|(m, _)| m.clone())
            .collect::<Vec<_>>();
        members.sort_by_key(|m| (m.created_at(), m.id()));
        Ok(members)
    }

    async fn create(&self, member: &Member, hashword: &str) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if let Some(field) = Self::collision(&accounts, member) {
            return Err(StoreError::Conflict(field));
        }
        if accounts.contains_key(&member.id()) {
            return Err(StoreError::Conflict("id"));
        }
        accounts.insert(member.id(), (member.clone(), hashword.to_string()));
        Ok(())
    }

    async fn update(&self, member: &Member, hashword: Option<&str>) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if let Some(field) = Self::collision(&accounts, member) {
            return Err(StoreError::Conflict(field));
        }
        let (stored, hash) = accounts
            .get_mut(&member.id())
            .ok_or(StoreError::NotFound)?;
        *stored = member.clone();
        if let Some(hashword) = hashword {
            *hash = hashword.to_string();
        }
        Ok(())
    }

    async fn delete(&self, id: ID<Member>) -> Result<(), StoreError> {
        self.accounts
            .write()
            .await
            .remove(&id)
            .map(std::mem::drop)
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    fn member(username: &str, email: &str) -> Member {
        Member::new(username.into(), String::new(), email.into(), Role::General)
    }
    #[tokio::test]
    async fn create_then_lookup() {
        let store = Memory::default();
        let bob = member("bob", "bob@example.com");
        store.create(&bob, "hash").await.unwrap();
        let (found, hash) = store.lookup("bob").await.unwrap().unwrap();
        assert_eq!(found, bob);
        assert_eq!(hash, "hash");
        assert_eq!(store.find(bob.id()).await.unwrap().unwrap().0, bob);
        assert!(store.lookup("alice").await.unwrap().is_none());
    }
    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = Memory::default();
        store.create(&member("bob", "a@x.io"), "h").await.unwrap();
        let result = store.create(&member("bob", "b@x.io"), "h").await;
        assert_eq!(result, Err(StoreError::Conflict("username")));
    }
    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = Memory::default();
        store.create(&member("bob", "a@x.io"), "h").await.unwrap();
        let result = store.create(&member("alice", "a@x.io"), "h").await;
        assert_eq!(result, Err(StoreError::Conflict("email")));
    }
    #[tokio::test]
    async fn empty_emails_do_not_conflict() {
        let store = Memory::default();
        store.create(&member("bob", ""), "h").await.unwrap();
        store.create(&member("alice", ""), "h").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
    #[tokio::test]
    async fn update_keeps_hash_unless_given() {
        let store = Memory::default();
        let mut bob = member("bob", "");
        store.create(&bob, "old").await.unwrap();
        bob.set_role(Role::Admin);
        store.update(&bob, None).await.unwrap();
        let (found, hash) = store.find(bob.id()).await.unwrap().unwrap();
        assert_eq!(found.role(), Role::Admin);
        assert_eq!(hash, "old");
        store.update(&bob, Some("new")).await.unwrap();
        assert_eq!(store.find(bob.id()).await.unwrap().unwrap().1, "new");
    }
    #[tokio::test]
    async fn update_into_taken_username_conflicts() {
        let store = Memory::default();
        store.create(&member("bob", ""), "h").await.unwrap();
        let mut alice = member("alice", "");
        store.create(&alice, "h").await.unwrap();
        alice.rename("bob".into());
        assert_eq!(
            store.update(&alice, None).await,
            Err(StoreError::Conflict("username"))
        );
    }
    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = Memory::default();
        assert_eq!(
            store.update(&member("ghost", ""), None).await,
            Err(StoreError::NotFound)
        );
    }
    #[tokio::test]
    async fn delete_removes_once() {
        let store = Memory::default();
        let bob = member("bob", "");
        store.create(&bob, "h").await.unwrap();
        store.delete(bob.id()).await.unwrap();
        assert!(store.find(bob.id()).await.unwrap().is_none());
        assert_eq!(store.delete(bob.id()).await, Err(StoreError::NotFound));
    }
}
