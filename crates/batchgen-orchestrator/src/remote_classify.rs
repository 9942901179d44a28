use std::time::Duration;

use batchgen_remote::RemoteError;
use batchgen_retry::{Classification, Classify, ErrorClass};

/// Classifies a [`RemoteError`] for the shared retry executor.
pub struct RemoteErrorClassifier;

impl Classify<RemoteError> for RemoteErrorClassifier {
    fn classify(&self, error: &RemoteError) -> Classification {
        match error {
            RemoteError::RateLimited { retry_after_seconds } => {
                Classification::new(ErrorClass::RateLimit, retry_after_seconds.map(Duration::from_secs))
            }
            RemoteError::QuotaExceeded { retry_after_seconds } => {
                Classification::new(ErrorClass::Quota, retry_after_seconds.map(Duration::from_secs))
            }
            RemoteError::Http { status, .. } if *status == 429 => Classification::new(ErrorClass::RateLimit, None),
            RemoteError::Http { status, .. } if *status >= 500 => Classification::new(ErrorClass::Server, None),
            RemoteError::Http { .. } => Classification::new(ErrorClass::Permanent, None),
            RemoteError::Network(_) => Classification::new(ErrorClass::Network, None),
            RemoteError::Parse(_) => Classification::new(ErrorClass::Permanent, None),
        }
    }
}
