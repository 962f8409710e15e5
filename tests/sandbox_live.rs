//! Sandbox isolation scenarios against a live Neo4j server.
//!
//! All tests are ignored by default; run them with
//! `cargo test -- --ignored` against a server on `localhost:7687`
//! (credentials via `NEO4J_USER` / `NEO4J_PASSWORD`, defaulting to
//! `neo4j` / `password`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use boltline::{AcquireOptions, Config, OwnershipMode, SandboxPool, Value};

fn live_config() -> Config {
    let user = std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_owned());
    let password = std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "password".to_owned());
    Config::builder()
        .with_hostname("localhost")
        .with_port(7687)
        .with_basic_auth(user, password)
        .with_pool_size(4)
        .build()
}

fn no_params() -> HashMap<String, Value> {
    HashMap::new()
}

async fn count_nodes(sandbox: &SandboxPool, key: &str) -> i64 {
    let mut params = HashMap::new();
    params.insert("k".to_owned(), Value::from(key));
    let result = sandbox
        .run("MATCH (n:SandboxTest {k: $k}) RETURN count(n) AS c", params)
        .await
        .unwrap();
    result.single_value().unwrap().as_int().unwrap()
}

async fn create_node(sandbox: &SandboxPool, key: &str) {
    let mut params = HashMap::new();
    params.insert("k".to_owned(), Value::from(key));
    sandbox
        .run("CREATE (:SandboxTest {k: $k})", params)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn isolated_writes_roll_back_on_release() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    create_node(&sandbox, "isolated").await;
    assert_eq!(count_nodes(&sandbox, "isolated").await, 1);
    sandbox.release(owner).await.unwrap();

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    assert_eq!(count_nodes(&sandbox, "isolated").await, 0);
    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn concurrent_sandboxes_cannot_see_each_other() {
    let sandbox = SandboxPool::new(live_config());

    let (p1_ready_tx, p1_ready_rx) = tokio::sync::oneshot::channel();
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();

    let sb1 = Arc::clone(&sandbox);
    let p1 = tokio::spawn(async move {
        let owner = sb1.acquire(AcquireOptions::default()).await.unwrap();
        create_node(&sb1, "p1").await;
        p1_ready_tx.send(()).unwrap();
        // Hold the sandbox open until the other task has looked.
        done_rx.await.unwrap();
        assert_eq!(count_nodes(&sb1, "p2").await, 0);
        sb1.release(owner).await.unwrap();
    });

    let sb2 = Arc::clone(&sandbox);
    let p2 = tokio::spawn(async move {
        p1_ready_rx.await.unwrap();
        let owner = sb2.acquire(AcquireOptions::default()).await.unwrap();
        create_node(&sb2, "p2").await;
        assert_eq!(count_nodes(&sb2, "p1").await, 0);
        sb2.release(owner).await.unwrap();
        done_tx.send(()).unwrap();
    });

    p2.await.unwrap();
    p1.await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn allow_routes_a_child_through_the_owner() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    create_node(&sandbox, "shared").await;

    let (id_tx, id_rx) = tokio::sync::oneshot::channel();
    let (go_tx, go_rx) = tokio::sync::oneshot::channel();
    let sb = Arc::clone(&sandbox);
    let child = tokio::spawn(async move {
        id_tx.send(boltline::OwnerId::current().unwrap()).unwrap();
        go_rx.await.unwrap();
        count_nodes(&sb, "shared").await
    });

    let child_id = id_rx.await.unwrap();
    sandbox.allow(owner.id(), child_id).unwrap();
    go_tx.send(()).unwrap();

    assert_eq!(child.await.unwrap(), 1);
    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn ambient_scope_propagates_ownership() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    create_node(&sandbox, "ambient").await;

    let sb = Arc::clone(&sandbox);
    let seen = SandboxPool::scope(owner.id(), async move {
        tokio::spawn(async move { 0 }).await.unwrap();
        count_nodes(&sb, "ambient").await
    })
    .await;
    assert_eq!(seen, 1);

    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn nested_transactions_are_no_ops_inside_the_sandbox() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    sandbox
        .transaction(|| async {
            create_node(&sandbox, "nested").await;
            Ok(())
        })
        .await
        .unwrap();
    // The inner "commit" was a depth decrement; the write is visible
    // inside the sandbox...
    assert_eq!(count_nodes(&sandbox, "nested").await, 1);
    sandbox.release(owner).await.unwrap();

    // ...and gone after release.
    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    assert_eq!(count_nodes(&sandbox, "nested").await, 0);
    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn shared_mode_routes_everyone_to_the_owner() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox
        .acquire(AcquireOptions {
            shared: true,
            ownership_timeout: None,
        })
        .await
        .unwrap();
    assert_eq!(sandbox.mode(), OwnershipMode::Shared(owner.id()));
    create_node(&sandbox, "everyone").await;

    // A task with no ownership of its own sees the owner's
    // uncommitted write.
    let sb = Arc::clone(&sandbox);
    let seen = tokio::spawn(async move { count_nodes(&sb, "everyone").await })
        .await
        .unwrap();
    assert_eq!(seen, 1);

    sandbox.release(owner).await.unwrap();
    assert_eq!(sandbox.mode(), OwnershipMode::Manual);

    // Rolled back with the owner's release.
    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    assert_eq!(count_nodes(&sandbox, "everyone").await, 0);
    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn sixteen_hundred_cycles_keep_the_pool_healthy() {
    let sandbox = SandboxPool::new(live_config());

    for i in 0..1600i64 {
        let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
        let mut params = HashMap::new();
        params.insert("i".to_owned(), Value::Integer(i));
        let result = sandbox.run("RETURN $i AS n", params).await.unwrap();
        assert_eq!(result.single_value().unwrap().as_int(), Some(i));
        sandbox.release(owner).await.unwrap();
    }

    let owner = sandbox.acquire(AcquireOptions::default()).await.unwrap();
    let result = sandbox.run("RETURN 'ok' AS n", no_params()).await.unwrap();
    assert_eq!(result.single_value().unwrap().as_str(), Some("ok"));
    sandbox.release(owner).await.unwrap();
    sandbox.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a live Neo4j server"]
async fn expired_leases_are_reclaimed() {
    let sandbox = SandboxPool::new(live_config());

    let owner = sandbox
        .acquire(AcquireOptions {
            shared: false,
            ownership_timeout: Some(Duration::from_millis(500)),
        })
        .await
        .unwrap();
    create_node(&sandbox, "expiring").await;

    // The sweeper reclaims the lease once the timeout elapses.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(sandbox.run("RETURN 1", no_params()).await.is_err());

    // Releasing an already-reclaimed owner reports the fact.
    assert!(sandbox.release(owner).await.is_err());
    sandbox.shutdown().await;
}
