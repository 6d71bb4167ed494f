//! Erreurs du moteur de combinaisons.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LottoError {
    /// Entrée malformée : taille de combinaison, numéro hors limites,
    /// fixes/exclus contradictoires, trop de numéros fixes.
    #[error("Entrée invalide : {0}")]
    InvalidInput(String),

    /// Le générateur n'a pas atteint sa cible dans son budget de tentatives.
    #[error("Génération épuisée : {accepted}/{target} combinaisons après {attempts} tentatives")]
    GenerationExhausted {
        target: usize,
        accepted: usize,
        attempts: u64,
    },

    /// Calcul interrompu par l'appelant.
    #[error("Calcul annulé après {iterations} itérations")]
    Cancelled { iterations: u64 },

    /// Échéance dépassée pendant un calcul long.
    #[error("Échéance dépassée après {iterations} itérations")]
    DeadlineExceeded { iterations: u64 },
}

impl LottoError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LottoError::InvalidInput(msg.into())
    }

    /// Vrai pour les interruptions (annulation ou échéance), qu'un appelant
    /// peut relancer avec un budget plus large.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            LottoError::Cancelled { .. } | LottoError::DeadlineExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LottoError>;
