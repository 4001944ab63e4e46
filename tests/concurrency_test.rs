use std::sync::Arc;

use anyhow::Result;
use paybook::application::{AppError, LedgerService};
use tokio::task::JoinSet;

async fn funded_service(owners: &[&str], deposits: usize, amount: i64) -> Result<(Arc<LedgerService>, Vec<String>)> {
    let service = LedgerService::in_memory();
    let mut ids = Vec::new();
    for name in owners {
        let id = service.create_account(name, "Concurrent").await?.id;
        for _ in 0..deposits {
            service.deposit(&id, amount).await?;
        }
        ids.push(id);
    }
    Ok((Arc::new(service), ids))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, ids) = funded_service(&["Ada"], 5, 100).await?;
    let owner = ids[0].clone();

    let mut tasks = JoinSet::new();
    for _ in 0..10 {
        let service = service.clone();
        let owner = owner.clone();
        tasks.spawn(async move { service.withdraw(&owner, -100).await });
    }

    let mut succeeded = 0;
    let mut refused = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientBalance { .. }) => refused += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(refused, 5);
    assert_eq!(service.balance(&owner).await?, 0);

    let history = service.entries(&owner).await?;
    assert!(history.iter().all(|e| e.consumed));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossing_payments_do_not_deadlock() -> Result<()> {
    let (service, ids) = funded_service(&["Alice", "Bob"], 4, 250).await?;
    let (alice, bob) = (ids[0].clone(), ids[1].clone());

    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let service = service.clone();
        let (from, to) = if i % 2 == 0 {
            (alice.clone(), bob.clone())
        } else {
            (bob.clone(), alice.clone())
        };
        tasks.spawn(async move { service.pay(&from, &to, -50).await });
    }

    while let Some(joined) = tasks.join_next().await {
        joined??;
    }

    // Equal traffic both ways leaves both balances where they started.
    assert_eq!(service.balance(&alice).await?, 1000);
    assert_eq!(service.balance(&bob).await?, 1000);
    Ok(())
}
