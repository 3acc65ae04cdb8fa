//! Moteur de vérification
//!
//! Organisation interne :
//! - registre.rs   : constantes nommées, résolution des références
//! - numerique.rs  : contre-vérification flottante (Complex64, Simpson)
//! - identites.rs  : identités lhs = rhs, verdict et arbitrage exact/flottant
//! - rotation.rs   : cycle de rotation (module conservé, retour à la phase initiale)
//! - contexte.rs   : run complet -> Rapport
//! - catalogue.rs  : système τ intégré
//! - config.rs     : catalogue externe TOML
//! - rapport.rs    : sorties JSON / texte

pub mod catalogue;
pub mod config;
pub mod contexte;
pub mod identites;
pub mod numerique;
pub mod rapport;
pub mod registre;
pub mod rotation;

#[cfg(test)]
mod tests_scenarios;

use serde::Serializer;

use crate::noyau::{format_expr_pretty, Expr};

/// Les expressions sortent dans le rapport sous leur forme lisible.
pub(crate) fn serde_expr<S: Serializer>(e: &Expr, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_expr_pretty(e))
}

pub use catalogue::contexte_tau;
pub use config::{charge_catalogue, contexte_depuis_toml};
pub use contexte::{CycleDeclaration, Rapport, VerificationContext};
pub use identites::{CheckResult, EvaluateurExact, Identity, IdentityChecker, SymbolicEvaluator, Verdict};
pub use numerique::{EvaluateurFlottant, Liaisons, NumericEvaluator, NumericValue};
pub use rapport::{ReportSink, SortieJson, SortieTexte};
pub use registre::{Constant, ConstantRegistry};
pub use rotation::{verify_cycle, RotationStep, RotationTrace};
