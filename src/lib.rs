//! verif_tau : vérification d’identités sur des constantes exactes.
//!
//! - noyau : forme normale exacte (rationnels, radicaux, π, i, trig, exp/log,
//!   intégrales) + lecture décimale en entiers scalés
//! - verif : registre de constantes, contre-vérification flottante,
//!   identités, cycle de rotation, rapport

pub mod erreurs;
pub mod noyau;
pub mod verif;

pub use erreurs::{EngineError, Result};
pub use verif::{contexte_tau, Rapport, VerificationContext};
