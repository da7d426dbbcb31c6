use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};

use crate::{auth::password::hash_password, config::AdminSeed, model::role::Role, store::AttendanceStore};

/// Creates the seed admin when the store has no admin at all. Returns whether
/// a login was created. An existing admin is never touched.
pub async fn ensure_admin<S: AttendanceStore>(store: &S, seed: Option<&AdminSeed>) -> Result<bool> {
    if store.admin_exists().await.context("failed to check for an admin")? {
        return Ok(false);
    }

    let Some(seed) = seed else {
        warn!("No admin account exists; set ADMIN_USERNAME and ADMIN_PASSWORD to create one");
        return Ok(false);
    };

    let hashed = hash_password(&seed.password).map_err(|e| anyhow!("failed to hash admin password: {e}"))?;

    let user_id = store
        .create_user(&seed.username, &hashed, Role::Admin, None)
        .await
        .with_context(|| format!("failed to create admin {:?}", seed.username))?;

    info!(user_id, username = %seed.username, "Seed admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::password::verify_password, store::memory::MemoryStore};

    fn seed(username: &str) -> AdminSeed {
        AdminSeed {
            username: username.into(),
            password: "s3cret".into(),
        }
    }

    #[actix_web::test]
    async fn empty_store_gets_a_working_admin() {
        let store = MemoryStore::default();

        assert!(ensure_admin(&store, Some(&seed("root"))).await.unwrap());

        let user = store.user("root").unwrap();
        assert_eq!(Role::from_id(user.role_id), Some(Role::Admin));
        assert!(verify_password("s3cret", &user.password).is_ok());
        assert!(store.admin_exists().await.unwrap());
    }

    #[actix_web::test]
    async fn existing_admin_is_left_alone() {
        let store = MemoryStore::default();
        ensure_admin(&store, Some(&seed("root"))).await.unwrap();

        assert!(!ensure_admin(&store, Some(&seed("other"))).await.unwrap());
        assert!(store.user("other").is_none());
    }

    #[actix_web::test]
    async fn no_seed_creates_nothing() {
        let store = MemoryStore::default();

        assert!(!ensure_admin(&store, None).await.unwrap());
        assert!(!store.admin_exists().await.unwrap());
    }

    #[actix_web::test]
    async fn seed_name_taken_by_a_member_is_an_error() {
        let store = MemoryStore::default();
        store.create_user("root", "hash", Role::Member, None).await.unwrap();

        assert!(ensure_admin(&store, Some(&seed("root"))).await.is_err());
        assert!(!store.admin_exists().await.unwrap());
    }
}
