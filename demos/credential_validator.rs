//! # Example: credential_validator
//!
//! Runs a [`CredentialValidator`] against an in-memory facade and restarts it every time
//! it reports an expected outcome, the way an agent bounces a unit's workers.
//!
//! Shows how to:
//! - Implement the [`Facade`] trait on top of local state.
//! - Attach the built-in [`LogWriter`] and render it with `tracing_subscriber`.
//! - Turn [`Outcome`]s into launcher decisions.
//!
//! ## Flow
//! ```text
//! CredentialValidator::new(cfg)
//!     ├─► fetch_snapshot() ──► subscribe(key)
//!     ├─► [demo] flips validity, notifies     ──► Outcome::ValidityChanged ──► restart
//!     ├─► [demo] binds another credential     ──► Outcome::KeyChanged      ──► restart
//!     └─► [demo] unbinds the credential       ──► Outcome::NotApplicable   ──► done
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example credential_validator
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use fleetvisor::{
    BoxError, CredentialKey, CredentialValidator, Facade, LogWriter, Notifier, NotifyWatcher,
    Outcome, StoredCredential, Subscribe, ValidatorConfig, Watcher,
};
use tracing_subscriber::EnvFilter;

/// Credential store living in memory. Every write notifies the current subscriber.
#[derive(Default)]
struct MemoryFacade {
    current: Mutex<Option<StoredCredential>>,
    watcher: Mutex<Option<Notifier>>,
}

impl MemoryFacade {
    fn set(&self, cred: Option<StoredCredential>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = cred;
        if let Some(notifier) = self.watcher.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            notifier.notify();
        }
    }
}

#[async_trait]
impl Facade for MemoryFacade {
    async fn fetch_snapshot(&self) -> Result<Option<StoredCredential>, BoxError> {
        Ok(self.current.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn subscribe(&self, _key: &CredentialKey) -> Result<Box<dyn Watcher>, BoxError> {
        let (notifier, watcher) = NotifyWatcher::channel(4);
        *self.watcher.lock().unwrap_or_else(|e| e.into_inner()) = Some(notifier);
        Ok(Box::new(watcher))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let facade = Arc::new(MemoryFacade::default());
    facade.set(Some(StoredCredential::new("aws/alice/default", true)));

    // Changes the demo applies, one per validator generation.
    let script = vec![
        Some(StoredCredential::new("aws/alice/default", false)),
        Some(StoredCredential::new("aws/alice/rotated", false)),
        None,
    ];
    let mut script = script.into_iter();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    for generation in 1.. {
        let cfg = ValidatorConfig::new(facade.clone())
            .with_name(format!("unit-0/credential-{generation}"))
            .with_subscribers(subs.clone());
        let validator = CredentialValidator::new(cfg).context("starting validator")?;

        if let Some(next) = script.next() {
            let facade = facade.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                facade.set(next);
            });
        }

        let outcome = validator.await_outcome().await;
        println!("generation {generation}: {}", outcome.as_label());
        match outcome {
            Outcome::ValidityChanged | Outcome::KeyChanged => continue,
            Outcome::NotApplicable | Outcome::StoppedCleanly => break,
            other => anyhow::bail!("validator failed: {other:?}"),
        }
    }

    // Let the LogWriter drain the last supervisor's events.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
