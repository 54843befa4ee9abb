//! Shipping addresses under `users/{uid}/addresses`, keeping at most one
//! default per user. Every default change is a single multi-path update.

use serde_json::json;

use crate::{
    dto::addresses::AddressInput,
    error::{AppError, AppResult},
    models::{Address, keyed_children},
    store::{self, DocumentStore, Patch, paths},
};

/// All addresses ordered by id.
pub async fn list_addresses(store: &dyn DocumentStore, uid: &str) -> AppResult<Vec<Address>> {
    let path = paths::addresses(uid);
    let snapshot = store.read(&path).await?;
    let mut addresses: Vec<Address> = keyed_children(&path, snapshot)?;
    addresses.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(addresses)
}

pub async fn default_address(store: &dyn DocumentStore, uid: &str) -> AppResult<Option<Address>> {
    let addresses = list_addresses(store, uid).await?;
    Ok(addresses.into_iter().find(|a| a.is_default))
}

pub async fn get_address(store: &dyn DocumentStore, uid: &str, id: &str) -> AppResult<Address> {
    let mut address: Address = store::get(store, &paths::address(uid, id))
        .await?
        .ok_or(AppError::NotFound)?;
    address.id = id.to_string();
    Ok(address)
}

/// The first address a user adds becomes the default.
pub async fn add_address(store: &dyn DocumentStore, uid: &str, input: AddressInput) -> AppResult<Address> {
    input.validate()?;
    let has_default = default_address(store, uid).await?.is_some();

    let mut address = input.into_address();
    address.id = store.push_key();
    address.is_default = !has_default;

    store::put(store, &paths::address(uid, &address.id), &address).await?;
    tracing::info!(uid = %uid, address_id = %address.id, is_default = address.is_default, "address added");
    Ok(address)
}

/// Replaces the address fields; the default flag is untouched.
pub async fn update_address(
    store: &dyn DocumentStore,
    uid: &str,
    id: &str,
    input: AddressInput,
) -> AppResult<Address> {
    input.validate()?;
    let existing = get_address(store, uid, id).await?;

    let mut address = input.into_address();
    address.id = existing.id;
    address.is_default = existing.is_default;

    store::put(store, &paths::address(uid, id), &address).await?;
    Ok(address)
}

pub async fn set_default(store: &dyn DocumentStore, uid: &str, id: &str) -> AppResult<Vec<Address>> {
    let mut addresses = list_addresses(store, uid).await?;
    if !addresses.iter().any(|a| a.id == id) {
        return Err(AppError::NotFound);
    }

    let patch = addresses.iter().fold(Patch::new(), |patch, a| {
        patch.set(
            format!("{}/isDefault", paths::address(uid, &a.id)),
            json!(a.id == id),
        )
    });
    store.update(patch).await?;

    for address in &mut addresses {
        address.is_default = address.id == id;
    }
    tracing::info!(uid = %uid, address_id = %id, "default address changed");
    Ok(addresses)
}

/// Leaves the user with no default address.
pub async fn clear_default(store: &dyn DocumentStore, uid: &str) -> AppResult<Vec<Address>> {
    let mut addresses = list_addresses(store, uid).await?;
    let patch = addresses
        .iter()
        .filter(|a| a.is_default)
        .fold(Patch::new(), |patch, a| {
            patch.set(format!("{}/isDefault", paths::address(uid, &a.id)), json!(false))
        });
    if !patch.is_empty() {
        store.update(patch).await?;
    }
    for address in &mut addresses {
        address.is_default = false;
    }
    Ok(addresses)
}

/// Deleting a missing address succeeds. When the default goes, the first
/// remaining address by id takes over in the same update.
pub async fn delete_address(store: &dyn DocumentStore, uid: &str, id: &str) -> AppResult<Vec<Address>> {
    let addresses = list_addresses(store, uid).await?;
    let Some(deleted) = addresses.iter().find(|a| a.id == id) else {
        return Ok(addresses);
    };
    let was_default = deleted.is_default;

    let mut remaining: Vec<Address> = addresses.into_iter().filter(|a| a.id != id).collect();
    let mut patch = Patch::new().delete(paths::address(uid, id));

    if was_default && let Some(next) = remaining.first_mut() {
        next.is_default = true;
        patch = patch.set(format!("{}/isDefault", paths::address(uid, &next.id)), json!(true));
    }

    store.update(patch).await?;
    tracing::info!(uid = %uid, address_id = %id, was_default, "address deleted");
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    fn input(kodepos: &str) -> AddressInput {
        AddressInput {
            provinsi: "Jawa Timur".into(),
            kabupaten: "Malang".into(),
            kecamatan: "Klojen".into(),
            kelurahan: "Oro-oro Dowo".into(),
            detail: "Jl. Ijen 1".into(),
            kodepos: kodepos.into(),
        }
    }

    fn defaults(addresses: &[Address]) -> usize {
        addresses.iter().filter(|a| a.is_default).count()
    }

    #[tokio::test]
    async fn first_address_becomes_default() {
        let store = MemoryStore::new();
        let first = add_address(&store, "u1", input("65111")).await.unwrap();
        let second = add_address(&store, "u1", input("65112")).await.unwrap();
        assert!(first.is_default);
        assert!(!second.is_default);
    }

    #[tokio::test]
    async fn set_default_leaves_exactly_one() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for code in ["1", "2", "3"] {
            ids.push(add_address(&store, "u1", input(code)).await.unwrap().id);
        }

        for id in &ids {
            let addresses = set_default(&store, "u1", id).await.unwrap();
            assert_eq!(defaults(&addresses), 1);
            let stored = list_addresses(&store, "u1").await.unwrap();
            assert_eq!(defaults(&stored), 1);
            assert_eq!(default_address(&store, "u1").await.unwrap().unwrap().id, *id);
        }

        assert!(matches!(set_default(&store, "u1", "missing").await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn deleting_default_promotes_first_remaining() {
        let store = MemoryStore::with_root(json!({
            "users": { "u1": { "addresses": {
                "a": { "kodepos": "1", "isDefault": false },
                "b": { "kodepos": "2", "isDefault": true },
                "c": { "kodepos": "3", "isDefault": false }
            }}}
        }));

        let remaining = delete_address(&store, "u1", "b").await.unwrap();
        assert_eq!(remaining.len(), 2);
        let stored = list_addresses(&store, "u1").await.unwrap();
        assert_eq!(defaults(&stored), 1);
        assert_eq!(stored[0].id, "a");
        assert!(stored[0].is_default);

        delete_address(&store, "u1", "a").await.unwrap();
        delete_address(&store, "u1", "c").await.unwrap();
        assert!(list_addresses(&store, "u1").await.unwrap().is_empty());
        assert!(default_address(&store, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_missing_address_succeeds() {
        let store = MemoryStore::new();
        add_address(&store, "u1", input("1")).await.unwrap();
        let remaining = delete_address(&store, "u1", "ghost").await.unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_default_flag_and_clear_removes_it() {
        let store = MemoryStore::new();
        let first = add_address(&store, "u1", input("1")).await.unwrap();
        let updated = update_address(&store, "u1", &first.id, input("9")).await.unwrap();
        assert!(updated.is_default);
        assert_eq!(updated.kodepos, "9");

        let cleared = clear_default(&store, "u1").await.unwrap();
        assert_eq!(defaults(&cleared), 0);
        assert!(default_address(&store, "u1").await.unwrap().is_none());
    }
}
