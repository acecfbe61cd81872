//! 指数バックオフ付きリトライ

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 初回以外の試行回数
    pub retries: u32,
    pub initial_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_delay: Duration::from_millis(500),
            factor: 1.5,
        }
    }
}

impl RetryPolicy {
    /// リトライなし
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// `retry` 回目（0始まり）のリトライ前の待ち時間
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.initial_delay.mul_f64(self.factor.powi(retry as i32))
    }
}

/// 成功するかリトライ回数を使い切るまで `operation` を繰り返す
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if retry < policy.retries => {
                let delay = policy.delay_for(retry);
                debug!(error = %e, retry = retry + 1, ?delay, "リトライ");
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetcherError;
    use std::cell::Cell;

    fn fast(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            initial_delay: Duration::from_millis(1),
            factor: 1.5,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 2);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(750));
        assert_eq!(policy.delay_for(2), Duration::from_micros(1_125_000));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let attempts = &Cell::new(0);

        let value = with_retry(&fast(2), || async move {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 3 {
                Err(FetcherError::NotFound("Foo".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(attempts.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let attempts = &Cell::new(0);

        let result: Result<()> = with_retry(&fast(2), || async move {
            attempts.set(attempts.get() + 1);
            Err(FetcherError::Extraction(format!("試行{}", attempts.get())))
        })
        .await;

        assert_eq!(attempts.get(), 3);
        assert_eq!(result.unwrap_err().to_string(), "アイコン抽出エラー: 試行3");
    }

    #[tokio::test]
    async fn test_no_retry() {
        let attempts = &Cell::new(0);

        let result: Result<()> = with_retry(&RetryPolicy::none(), || async move {
            attempts.set(attempts.get() + 1);
            Err(FetcherError::NotFound("Foo".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }
}
