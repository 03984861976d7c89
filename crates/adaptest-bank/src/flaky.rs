//! A failure-injecting item bank decorator for resilience tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use adaptest_core::error::BankError;
use adaptest_core::model::{Category, Item};
use adaptest_core::traits::ItemBank;

/// Wraps another bank and fails the first `failures` calls with
/// [`BankError::Unavailable`], then behaves normally. Lets tests drive the
/// engine's retryable-error path deterministically.
pub struct FlakyBank {
    inner: Arc<dyn ItemBank>,
    failures_remaining: AtomicU32,
}

impl FlakyBank {
    pub fn new(inner: Arc<dyn ItemBank>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: AtomicU32::new(failures),
        }
    }

    fn try_fail(&self) -> Result<(), BankError> {
        let remaining = self.failures_remaining.load(Ordering::Relaxed);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::Relaxed);
            return Err(BankError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemBank for FlakyBank {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn eligible_items(
        &self,
        exclude: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Item>, BankError> {
        self.try_fail()?;
        self.inner.eligible_items(exclude, categories).await
    }

    async fn item(&self, item_id: &str) -> Result<Item, BankError> {
        self.try_fail()?;
        self.inner.item(item_id).await
    }

    async fn record_administration(&self, item_id: &str) -> Result<u32, BankError> {
        self.try_fail()?;
        self.inner.record_administration(item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBank;

    fn sample_item() -> Item {
        Item {
            id: "a".into(),
            category: Category::ManagementOfCare,
            discrimination: 1.0,
            difficulty: 0.0,
            guessing: 0.2,
            times_administered: 0,
            active: true,
            key: "a".into(),
            stem: None,
        }
    }

    #[tokio::test]
    async fn fails_then_recovers() {
        let inner = Arc::new(MemoryBank::from_items([sample_item()]));
        let bank = FlakyBank::new(inner, 2);

        let first = bank.eligible_items(&[], None).await;
        assert!(matches!(first, Err(BankError::Unavailable(_))));
        assert!(first.err().map(|e| e.is_retryable()).unwrap_or(false));

        assert!(bank.item("a").await.is_err());
        assert_eq!(bank.eligible_items(&[], None).await.unwrap().len(), 1);
    }
}
