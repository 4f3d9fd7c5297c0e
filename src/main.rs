use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use txflow::application::engine::TransactionEngine;
use txflow::domain::outcome::Outcome;
use txflow::domain::ports::{ProcessorRef, StateStoreRef};
use txflow::domain::retry::RetryPolicy;
use txflow::domain::transaction::{Transaction, TxState};
use txflow::infrastructure::in_memory::InMemoryStateStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of worker tasks
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Number of transactions to submit
    #[arg(long, default_value_t = 100)]
    count: usize,

    /// Number of distinct accounts to spread transactions over
    #[arg(long, default_value_t = 10)]
    accounts: usize,

    /// Retry budget per transaction
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Base backoff delay in milliseconds
    #[arg(long, default_value_t = 50)]
    base_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let policy = RetryPolicy::new(cli.max_retries, Duration::from_millis(cli.base_delay_ms))
        .into_diagnostic()?;

    // Simulated payment operation: 15% transient failures, 3% final failures.
    let processor: ProcessorRef = Arc::new(|_tx: &Transaction| {
        let roll = rand::thread_rng().gen_range(0..100);
        if roll < 3 {
            Outcome::fatal("permanent failure")
        } else if roll < 18 {
            Outcome::retryable("transient failure")
        } else {
            Outcome::ok("processed")
        }
    });

    let store: StateStoreRef = Arc::new(InMemoryStateStore::new());
    let engine =
        TransactionEngine::new(cli.workers, policy, processor, store.clone()).into_diagnostic()?;
    engine.start();

    for i in 0..cli.count {
        let account = format!("acct-{}", i % cli.accounts.max(1));
        engine
            .submit(Transaction::new(
                format!("tx-{i}"),
                account,
                i as u64,
                1000 + i as i64,
            ))
            .await
            .into_diagnostic()?;
    }

    // Poll until every transaction is terminal, or give up after the deadline.
    let deadline = Instant::now() + Duration::from_secs(30);
    let (succeeded, failed_final) = loop {
        let mut succeeded = 0usize;
        let mut failed_final = 0usize;
        for i in 0..cli.count {
            if let Some(record) = store.get(&format!("tx-{i}")).await.into_diagnostic()? {
                match record.state {
                    TxState::Succeeded => succeeded += 1,
                    TxState::FailedFinal => failed_final += 1,
                    _ => {}
                }
            }
        }
        if succeeded + failed_final == cli.count || Instant::now() > deadline {
            break (succeeded, failed_final);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    engine.stop();

    let summary = serde_json::json!({
        "submitted": cli.count,
        "succeeded": succeeded,
        "failed_final": failed_final,
        "stored_states": store.len().await.into_diagnostic()?,
    });
    println!("{summary}");

    Ok(())
}
