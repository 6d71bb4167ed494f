use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{LottoError, Result};

/// Nombre d'itérations entre deux vérifications dans l'énumération exhaustive.
pub const CANCEL_CHECK_INTERVAL: u64 = 1 << 16;

/// Signal d'arrêt coopératif : échéance optionnelle et drapeau posé par l'appelant.
/// Interrogé par les boucles longues, jamais bloquant.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    flag: Option<Arc<AtomicBool>>,
}

impl Cancellation {
    /// Aucune limite.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Échoue si l'appelant a annulé ou si l'échéance est passée.
    /// `iterations` est reporté dans l'erreur.
    pub fn check(&self, iterations: u64) -> Result<()> {
        if let Some(flag) = &self.flag {
            if flag.load(Ordering::Relaxed) {
                return Err(LottoError::Cancelled { iterations });
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(LottoError::DeadlineExceeded { iterations });
            }
        }
        Ok(())
    }
}
