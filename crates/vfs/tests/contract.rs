use std::sync::Arc;

use striper::Tunables;
use striper_adapter::mock::MemStore;
use striper_adapter::ObjectStore;
use striper_vfs::{access, delete, parse, CephSqliteFile, LockLevel, Pool, VfsError};

fn store() -> Arc<dyn ObjectStore> {
    Arc::new(MemStore::new())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().try_init();
}

#[test]
fn path_scenarios_from_the_contract_table() {
    let loc = parse("*42:ns/db").unwrap();
    assert_eq!(loc.pool, Pool::Numeric(42));
    assert_eq!(loc.namespace, "ns");
    assert_eq!(loc.name, "db");

    let loc = parse("mypool:/db").unwrap();
    assert_eq!(loc.pool, Pool::Named("mypool".to_string()));
    assert_eq!(loc.namespace, "");

    assert!(parse("mypool:ns/db-wal").is_err());
}

#[tokio::test]
async fn open_write_read_close_round_trip() {
    init_tracing();
    let store = store();
    let loc = parse("mypool:ns/db").unwrap();
    let mut f = CephSqliteFile::open(Arc::clone(&store), loc, true, Tunables::default())
        .await
        .unwrap();

    f.lock(LockLevel::Exclusive).await.unwrap();
    f.write(b"hello world", 0).await.unwrap();
    f.sync().await.unwrap();
    assert_eq!(f.file_size(), 11);

    let mut buf = [0u8; 11];
    let n = f.read(&mut buf, 0).await.unwrap();
    assert_eq!(n, 11);
    assert_eq!(&buf, b"hello world");

    f.unlock(LockLevel::None).await.unwrap();
    f.close().await.unwrap();
}

#[tokio::test]
async fn access_reports_false_before_creation() {
    let store = store();
    let loc = parse("mypool:ns/nope").unwrap();
    assert!(!access(Arc::clone(&store), loc.clone(), Tunables::default())
        .await
        .unwrap());

    let mut f = CephSqliteFile::open(Arc::clone(&store), loc.clone(), true, Tunables::default())
        .await
        .unwrap();
    f.close().await.unwrap();

    assert!(access(store, loc, Tunables::default()).await.unwrap());
}

#[tokio::test]
async fn delete_removes_the_head_object() {
    let store = store();
    let loc = parse("mypool:ns/gone").unwrap();
    let mut f = CephSqliteFile::open(Arc::clone(&store), loc.clone(), true, Tunables::default())
        .await
        .unwrap();
    f.close().await.unwrap();

    delete(Arc::clone(&store), loc.clone(), Tunables::default())
        .await
        .unwrap();

    assert!(!access(store, loc, Tunables::default()).await.unwrap());
}

#[tokio::test]
async fn short_read_zero_fills_and_reports() {
    init_tracing();
    let store = store();
    let loc = parse("mypool:ns/short").unwrap();
    let mut f = CephSqliteFile::open(Arc::clone(&store), loc, true, Tunables::default())
        .await
        .unwrap();
    f.lock(LockLevel::Exclusive).await.unwrap();
    f.write(b"hi", 0).await.unwrap();
    f.sync().await.unwrap();

    let mut buf = [0xFFu8; 5];
    let err = f.read(&mut buf, 0).await.unwrap_err();
    assert!(matches!(err, VfsError::ShortRead { got: 2, expected: 5 }));
    assert_eq!(&buf, b"hi\0\0\0");

    f.unlock(LockLevel::None).await.unwrap();
    f.close().await.unwrap();
}

#[tokio::test]
async fn sector_size_is_fixed() {
    let store = store();
    let loc = parse("mypool:ns/db").unwrap();
    let f = CephSqliteFile::open(store, loc, true, Tunables::default())
        .await
        .unwrap();
    assert_eq!(f.sector_size(), 65536);
}
