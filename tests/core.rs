mod common;

use common::*;

#[cfg(test)]
mod tests {
    use super::*;
    use cookie::{CookieJar, SameSite};
    use sealstore::store::{self, MemoryStore, RecordStore};
    use sealstore::{Cause, Error, Id, KeyPair, SessionStore, codec};
    use std::time::Duration;

    /// A backend whose every call fails, as when the database is unreachable.
    struct UnreachableStore;

    impl RecordStore for UnreachableStore {
        async fn ensure_schema(&self, _table: &str) -> Result<(), store::Error> {
            Ok(())
        }

        async fn get(&self, _table: &str, _id: &Id) -> Result<Option<String>, store::Error> {
            Err(store::Error::Backend("connection refused".into()))
        }

        async fn put(
            &self,
            _table: &str,
            _id: &Id,
            _payload: &str,
            _ttl_secs: i64,
        ) -> Result<(), store::Error> {
            Err(store::Error::Backend("connection refused".into()))
        }

        async fn delete(&self, _table: &str, _id: &Id) -> Result<(), store::Error> {
            Err(store::Error::Backend("connection refused".into()))
        }
    }

    struct NoSchemaStore;

    impl RecordStore for NoSchemaStore {
        async fn ensure_schema(&self, _table: &str) -> Result<(), store::Error> {
            Err(store::Error::Backend("permission denied".into()))
        }

        async fn get(&self, _table: &str, _id: &Id) -> Result<Option<String>, store::Error> {
            Ok(None)
        }

        async fn put(&self, _: &str, _: &Id, _: &str, _: i64) -> Result<(), store::Error> {
            Ok(())
        }

        async fn delete(&self, _table: &str, _id: &Id) -> Result<(), store::Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_construction_provisions_table() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        assert!(backend.has_table(TABLE));
        assert_eq!(store.table(), TABLE);
        assert_eq!(store.options.path.as_deref(), Some("/"));
        assert_eq!(store.options.max_age, 86400 * 30);
    }

    #[tokio::test]
    async fn test_invalid_table_names_are_rejected() {
        for table in [r#"1"; DROP TABLE students; --"#, ";", "", "my-sessions"] {
            let backend = MemoryStore::new();
            let result = SessionStore::new(backend.clone(), table, [signing_keys()]).await;

            assert!(
                matches!(result, Err(Error::Create(Cause::InvalidTableName(_)))),
                "{table:?} should be rejected"
            );
            assert!(!backend.has_table(table));
        }
    }

    #[tokio::test]
    async fn test_construction_requires_keys() {
        let backend = MemoryStore::new();
        let result = SessionStore::new(backend.clone(), TABLE, Vec::<KeyPair>::new()).await;
        assert!(matches!(
            result,
            Err(Error::Create(Cause::Codec(codec::Error::NoCodecs)))
        ));
        assert!(!backend.has_table(TABLE));

        let result = SessionStore::new(
            MemoryStore::new(),
            TABLE,
            [signing_keys().with_block_key(b"too short")],
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::Create(Cause::Codec(codec::Error::InvalidBlockKey(9))))
        ));
    }

    #[tokio::test]
    async fn test_construction_reports_schema_failure() {
        let result = SessionStore::new(NoSchemaStore, TABLE, [signing_keys()]).await;
        assert!(matches!(
            result,
            Err(Error::Create(Cause::Store(store::Error::Backend(_))))
        ));
    }

    #[tokio::test]
    async fn test_no_cookie_yields_fresh_session() {
        let store = build_store(MemoryStore::new()).await;
        let jar = CookieJar::new();

        let loaded = store.load(&jar, SESSION_NAME).await;
        assert!(loaded.is_ok());
        assert!(loaded.session.is_new());
        assert!(loaded.session.id().is_none());
        assert!(loaded.session.values.is_empty());
        assert_eq!(loaded.session.name(), SESSION_NAME);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        let mut jar = CookieJar::new();

        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("user", &create_test_user()).unwrap();
        session.insert("preferences", &create_test_preferences()).unwrap();
        session.insert("count", &1).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();

        assert_eq!(backend.len(), 1);
        let id = session.id().unwrap();

        let jar = next_request(&jar);
        let loaded = store.load(&jar, SESSION_NAME).await;
        assert!(loaded.is_ok());

        let session = loaded.session;
        assert!(!session.is_new());
        assert_eq!(session.id(), Some(id));
        assert_eq!(session.values.len(), 3);
        assert_eq!(
            session.get::<TestUser>("user").unwrap(),
            Some(create_test_user())
        );
        assert_eq!(
            session.get::<TestPreferences>("preferences").unwrap(),
            Some(create_test_preferences())
        );
        assert_eq!(session.get::<i32>("count").unwrap(), Some(1));
        assert_eq!(session.get::<i32>("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn test_resaving_keeps_id_and_replaces_values() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        let mut jar = CookieJar::new();

        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("a", &1).unwrap();
        session.insert("b", &2).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();
        let id = session.id();

        let mut jar = next_request(&jar);
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        assert!(session.remove("a"));
        session.insert("b", &3).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();
        assert_eq!(session.id(), id);
        assert_eq!(backend.len(), 1);

        let jar = next_request(&jar);
        let session = store.load(&jar, SESSION_NAME).await.session;
        assert!(!session.values.contains_key("a"));
        assert_eq!(session.get::<i32>("b").unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_cookie_attributes() {
        let store = build_store(MemoryStore::new()).await;
        let mut jar = CookieJar::new();

        let mut session = store.load(&jar, SESSION_NAME).await.session;
        store.save(&mut jar, &mut session).await.unwrap();

        let cookie = response_cookie(&jar, SESSION_NAME).unwrap();
        assert_ne!(cookie.value(), session.id().unwrap().to_string());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::seconds(86400 * 30))
        );
    }

    #[tokio::test]
    async fn test_forged_cookie_yields_fresh_session_and_error() {
        let store = build_store(MemoryStore::new()).await;
        let mut jar = CookieJar::new();
        jar.add_original(cookie::Cookie::new(SESSION_NAME, "forged-session-cookie"));

        let loaded = store.load(&jar, SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(loaded.session.values.is_empty());
        assert!(matches!(loaded.error, Some(Error::Load(Cause::Codec(_)))));
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_rejected() {
        let store = build_store(MemoryStore::new()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("role", "user").unwrap();
        store.save(&mut jar, &mut session).await.unwrap();

        let value = response_cookie(&jar, SESSION_NAME).unwrap().value().to_owned();
        let mut bytes = value.into_bytes();
        let middle = bytes.len() / 2;
        bytes[middle] = if bytes[middle] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let mut jar = CookieJar::new();
        jar.add_original(cookie::Cookie::new(SESSION_NAME, tampered));
        let loaded = store.load(&jar, SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(matches!(loaded.error, Some(Error::Load(Cause::Codec(_)))));
    }

    #[tokio::test]
    async fn test_cookie_is_bound_to_session_name() {
        let store = build_store(MemoryStore::new()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, "admin").await.session;
        store.save(&mut jar, &mut session).await.unwrap();

        let value = response_cookie(&jar, "admin").unwrap().value().to_owned();
        let mut jar = CookieJar::new();
        jar.add_original(cookie::Cookie::new("guest", value));

        let loaded = store.load(&jar, "guest").await;
        assert!(matches!(loaded.error, Some(Error::Load(Cause::Codec(_)))));
    }

    #[tokio::test]
    async fn test_missing_record_is_reported() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        store.save(&mut jar, &mut session).await.unwrap();

        backend.delete(TABLE, &session.id().unwrap()).await.unwrap();

        let loaded = store.load(&next_request(&jar), SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(matches!(loaded.error, Some(Error::Load(Cause::NotFound))));
        assert!(loaded.into_result().is_err());
    }

    #[tokio::test]
    async fn test_deleting_a_session() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("user", &create_test_user()).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();
        assert_eq!(backend.len(), 1);

        let mut jar = next_request(&jar);
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.options.max_age = -1;
        store.save(&mut jar, &mut session).await.unwrap();

        assert!(backend.is_empty());
        assert!(session.values.contains_key("user"));

        let cookie = response_cookie(&jar, SESSION_NAME).unwrap();
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().unwrap().is_negative());
        assert_eq!(
            cookie.expires_datetime(),
            Some(cookie::time::OffsetDateTime::UNIX_EPOCH)
        );

        let loaded = store.load(&next_request(&jar), SESSION_NAME).await;
        assert!(loaded.is_ok());
        assert!(loaded.session.is_new());
    }

    #[tokio::test]
    async fn test_session_options_are_isolated() {
        let store = build_store(MemoryStore::new()).await;
        let jar = CookieJar::new();

        let mut first = store.load(&jar, SESSION_NAME).await.session;
        first.options.max_age = 60;
        first.options.path = Some("/admin".into());

        let second = store.load(&jar, SESSION_NAME).await.session;
        assert_eq!(second.options.max_age, store.options.max_age);
        assert_eq!(second.options.path.as_deref(), Some("/"));
        assert_eq!(store.options.max_age, 86400 * 30);
    }

    #[tokio::test]
    async fn test_store_options_apply_to_new_sessions() {
        let mut store = build_store(MemoryStore::new()).await;
        store.options.domain = Some("example.com".into());
        store.options.secure = false;

        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        store.save(&mut jar, &mut session).await.unwrap();

        let cookie = response_cookie(&jar, SESSION_NAME).unwrap();
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[tokio::test]
    async fn test_key_rotation() {
        let backend = MemoryStore::new();
        let old = KeyPair::new(b"the-old-authentication-key");
        let new = KeyPair::new(b"the-new-authentication-key");

        let old_store = SessionStore::new(backend.clone(), TABLE, [old.clone()])
            .await
            .unwrap();
        let mut jar = CookieJar::new();
        let mut session = old_store.load(&jar, SESSION_NAME).await.session;
        session.insert("count", &7).unwrap();
        old_store.save(&mut jar, &mut session).await.unwrap();

        let rotated = SessionStore::new(backend.clone(), TABLE, [new, old])
            .await
            .unwrap();
        let mut jar = next_request(&jar);
        let loaded = rotated.load(&jar, SESSION_NAME).await;
        assert!(loaded.is_ok());
        let mut session = loaded.session;
        assert_eq!(session.get::<i32>("count").unwrap(), Some(7));

        // Re-saving re-encodes under the new key.
        rotated.save(&mut jar, &mut session).await.unwrap();
        let jar = next_request(&jar);
        let loaded = old_store.load(&jar, SESSION_NAME).await;
        assert!(matches!(
            loaded.error,
            Some(Error::Load(Cause::Codec(codec::Error::InvalidMac)))
        ));
    }

    #[tokio::test]
    async fn test_storage_failures() {
        let store = SessionStore::new(UnreachableStore, TABLE, [signing_keys()])
            .await
            .unwrap();

        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        let result = store.save(&mut jar, &mut session).await;
        assert!(matches!(
            result,
            Err(Error::Save(Cause::Store(store::Error::Backend(_))))
        ));
        assert!(response_cookie(&jar, SESSION_NAME).is_none());

        let mut jar = CookieJar::new();
        let cookie = codec::Codec::new(&signing_keys())
            .unwrap()
            .encode(SESSION_NAME, &Id::new())
            .unwrap();
        jar.add_original(cookie::Cookie::new(SESSION_NAME, cookie));
        let loaded = store.load(&jar, SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(matches!(
            loaded.error,
            Some(Error::Load(Cause::Store(store::Error::Backend(_))))
        ));
    }

    #[tokio::test]
    async fn test_failed_delete_writes_no_cookie() {
        let store = build_store(MemoryStore::new()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        store.save(&mut jar, &mut session).await.unwrap();
        assert!(session.id().is_some());

        let unreachable = SessionStore::new(UnreachableStore, TABLE, [encryption_keys()])
            .await
            .unwrap();
        let mut jar = next_request(&jar);
        session.options.max_age = -1;
        let result = unreachable.save(&mut jar, &mut session).await;

        assert!(matches!(
            result,
            Err(Error::Save(Cause::Store(store::Error::Backend(_))))
        ));
        assert!(response_cookie(&jar, SESSION_NAME).is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_yields_fresh_session() {
        let backend = MemoryStore::new();
        let store = build_store(backend.clone()).await;
        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("user", &create_test_user()).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();

        let id = session.id().unwrap();
        backend.put(TABLE, &id, "garbage", 60).await.unwrap();

        let loaded = store.load(&next_request(&jar), SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(loaded.session.id().is_none());
        assert!(loaded.session.values.is_empty());
        assert!(matches!(loaded.error, Some(Error::Load(Cause::Codec(_)))));
    }

    #[tokio::test]
    async fn test_huge_max_age_is_saved() {
        for max_age in [1_000_000_000_000, i64::MAX] {
            let backend = MemoryStore::new();
            let store = build_store(backend.clone()).await;
            let mut jar = CookieJar::new();
            let mut session = store.load(&jar, SESSION_NAME).await.session;
            session.insert("count", &1).unwrap();
            session.options.max_age = max_age;

            store.save(&mut jar, &mut session).await.unwrap();
            assert_eq!(backend.len(), 1);

            let cookie = response_cookie(&jar, SESSION_NAME).unwrap();
            assert_eq!(
                cookie.max_age(),
                Some(cookie::time::Duration::seconds(max_age))
            );
            assert_eq!(cookie.expires_datetime(), None);

            let loaded = store.load(&next_request(&jar), SESSION_NAME).await;
            assert!(loaded.is_ok());
            assert_eq!(loaded.session.get::<i32>("count").unwrap(), Some(1));
        }
    }

    #[tokio::test]
    async fn test_expired_session() {
        let backend = MemoryStore::new();
        let mut store = build_store(backend.clone()).await;
        store.max_age(1);

        let mut jar = CookieJar::new();
        let mut session = store.load(&jar, SESSION_NAME).await.session;
        session.insert("user", &create_test_user()).unwrap();
        store.save(&mut jar, &mut session).await.unwrap();

        tokio::time::sleep(Duration::from_millis(2100)).await;

        let loaded = store.load(&next_request(&jar), SESSION_NAME).await;
        assert!(loaded.session.is_new());
        assert!(loaded.error.is_some());
        assert!(backend.is_empty());
    }
}
