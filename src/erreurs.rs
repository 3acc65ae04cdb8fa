// src/erreurs.rs
//
// Taxonomie d’erreurs du moteur.
// - registre : DuplicateName / UnknownConstant (fatal au démarrage)
// - par identité : Unsimplifiable / Domain (=> résultat indéterminé)
// - CrossCheckMismatch : bug d’un évaluateur (fatal, interrompt le run)
// - PeriodicityViolation : cycle non refermé (échec non fatal)

use thiserror::Error;

use crate::verif::rotation::RotationTrace;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("constante déjà enregistrée: {0}")]
    DuplicateName(String),

    #[error("constante inconnue: {0}")]
    UnknownConstant(String),

    #[error("pas de forme close: {0}")]
    Unsimplifiable(String),

    #[error("hors domaine: {0}")]
    Domain(String),

    #[error(
        "désaccord symbolique/numérique sur {identity}: résidu symbolique {symbolic_residual}, \
         résidu numérique {numeric_residual:e} (tolérance {tolerance:e})"
    )]
    CrossCheckMismatch {
        identity: String,
        symbolic_residual: String,
        numeric_residual: f64,
        tolerance: f64,
    },

    #[error("périodicité violée: {reason}")]
    PeriodicityViolation {
        reason: String,
        trace: RotationTrace,
    },

    #[error("lecture d’expression: {0}")]
    Parse(String),

    #[error("catalogue: {0}")]
    Config(String),

    #[error("écriture du rapport: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Vrai si l’erreur doit interrompre tout le run (et pas seulement une identité).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicateName(_)
                | EngineError::UnknownConstant(_)
                | EngineError::CrossCheckMismatch { .. }
                | EngineError::Parse(_)
                | EngineError::Config(_)
                | EngineError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
