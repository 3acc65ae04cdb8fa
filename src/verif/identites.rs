// src/verif/identites.rs
//
// Vérification d’identités lhs = rhs par deux voies indépendantes :
// - symbolique : simplify(lhs - rhs) doit être le zéro exact
// - numérique  : max |lhs - rhs| sur les échantillons, comparé à la tolérance
//
// Arbitrage quand les deux voies divergent : la voie exacte fait foi tant que
// le résidu numérique reste à moins d’un ordre de grandeur de la tolérance ;
// au-delà, c’est un bug d’évaluateur (CrossCheckMismatch, fatal).
//
// Exception : un résidu exact non nul qui garde sin/cos/exp/log d’une variable
// n’est pas une preuve (forme normale incomplète sur ces atomes) ; si la voie
// numérique le voit nul, le résultat est indéterminé.

use serde::Serialize;

use super::numerique::{Liaisons, NumericEvaluator};
use super::registre::ConstantRegistry;
use super::serde_expr;
use crate::erreurs::{EngineError, Result};
use crate::noyau::{self, parse_expr, Expr, LectureDecimale};

pub const TOLERANCE_DEFAUT: f64 = 1e-9;

/* ------------------------ Identité ------------------------ */

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Identity {
    pub name: String,
    #[serde(serialize_with = "serde_expr")]
    pub lhs: Expr,
    #[serde(serialize_with = "serde_expr")]
    pub rhs: Expr,
    pub tolerance: f64,
    /// Un échantillon par jeu de valeurs des variables libres ; vide = constante.
    pub samples: Vec<Liaisons>,
}

impl Identity {
    pub fn new(name: &str, lhs: Expr, rhs: Expr, tolerance: f64) -> Self {
        Self {
            name: name.to_string(),
            lhs,
            rhs,
            tolerance,
            samples: Vec::new(),
        }
    }

    pub fn depuis_texte(name: &str, lhs: &str, rhs: &str, tolerance: f64) -> Result<Self> {
        Ok(Self::new(name, parse_expr(lhs)?, parse_expr(rhs)?, tolerance))
    }

    /// Ajoute des échantillons `var -> valeur` (un jeu par échantillon).
    pub fn avec_echantillons<I>(mut self, samples: I) -> Self
    where
        I: IntoIterator<Item = Liaisons>,
    {
        self.samples.extend(samples);
        self
    }

    /// Échantillons d’une seule variable : `x ∈ {0.3, 1.7, …}`.
    pub fn echantillonne(self, var: &str, valeurs: &[f64]) -> Self {
        let jeux = valeurs.iter().map(|&v| {
            let mut l = Liaisons::new();
            l.insert(var.to_string(), v);
            l
        });
        self.avec_echantillons(jeux.collect::<Vec<_>>())
    }

    pub(crate) fn valide(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EngineError::Config(format!(
                "tolérance invalide pour {}: {}",
                self.name, self.tolerance
            )));
        }
        Ok(())
    }
}

/* ------------------------ Résultat ------------------------ */

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
    Indeterminate(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckResult {
    pub identity_name: String,
    #[serde(serialize_with = "serde_expr")]
    pub symbolic_residual: Expr,
    /// NaN si indéterminé.
    pub numeric_residual: f64,
    pub passed: bool,
    pub verdict: Verdict,
}

impl CheckResult {
    fn indetermine(id: &Identity, residu: Expr, raison: String) -> Self {
        tracing::warn!(identite = %id.name, %raison, "identité indéterminée");
        Self {
            identity_name: id.name.clone(),
            symbolic_residual: residu,
            numeric_residual: f64::NAN,
            passed: false,
            verdict: Verdict::Indeterminate(raison),
        }
    }
}

/* ------------------------ Évaluateur symbolique ------------------------ */

pub trait SymbolicEvaluator {
    fn simplify(&self, e: &Expr) -> Result<Expr>;
    fn evaluate_decimal(&self, e: &Expr, digits: usize) -> Result<LectureDecimale>;
}

/// Le noyau exact.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluateurExact;

impl SymbolicEvaluator for EvaluateurExact {
    fn simplify(&self, e: &Expr) -> Result<Expr> {
        noyau::simplify(e)
    }

    fn evaluate_decimal(&self, e: &Expr, digits: usize) -> Result<LectureDecimale> {
        noyau::evaluate_decimal(e, digits)
    }
}

/* ------------------------ Arbitrage ------------------------ */

/// Verdict à partir des deux résidus (NaN exclu en amont).
pub fn arbitre(
    nom: &str,
    residu: &Expr,
    symbolique_nul: bool,
    numerique: f64,
    tol: f64,
) -> Result<Verdict> {
    let numerique_ok = numerique <= tol;

    match (symbolique_nul, numerique_ok) {
        (true, true) => Ok(Verdict::Passed),
        (false, false) => Ok(Verdict::Failed),
        (true, false) if numerique <= 10.0 * tol => {
            tracing::warn!(identite = nom, numerique, tol, "bruit numérique au-dessus de la tolérance");
            Ok(Verdict::Passed)
        }
        (false, true) if numerique >= tol / 10.0 => {
            tracing::warn!(identite = nom, numerique, tol, "résidu exact non nul sous la tolérance");
            Ok(Verdict::Failed)
        }
        _ => {
            tracing::error!(identite = nom, symbolique_nul, numerique, tol, "évaluateurs en désaccord");
            Err(EngineError::CrossCheckMismatch {
                identity: nom.to_string(),
                symbolic_residual: noyau::format_expr_pretty(residu),
                numeric_residual: numerique,
                tolerance: tol,
            })
        }
    }
}

/* ------------------------ Vérificateur ------------------------ */

pub struct IdentityChecker<'a, S, N> {
    registre: &'a ConstantRegistry,
    symbolique: &'a S,
    numerique: &'a N,
}

impl<'a, S: SymbolicEvaluator, N: NumericEvaluator> IdentityChecker<'a, S, N> {
    pub fn new(registre: &'a ConstantRegistry, symbolique: &'a S, numerique: &'a N) -> Self {
        Self {
            registre,
            symbolique,
            numerique,
        }
    }

    /// Err seulement pour les erreurs fatales ; Domain / Unsimplifiable
    /// donnent un résultat indéterminé.
    pub fn check(&self, id: &Identity) -> Result<CheckResult> {
        id.valide()?;

        let lhs = self.registre.resolve(&id.lhs);
        let rhs = self.registre.resolve(&id.rhs);
        let difference = Expr::sub(lhs.clone(), rhs.clone());

        let residu = match self.symbolique.simplify(&difference) {
            Ok(r) => r,
            Err(e) if !e.is_fatal() => return Ok(CheckResult::indetermine(id, difference, e.to_string())),
            Err(e) => return Err(e),
        };

        let numerique = match self.residu_numerique(&lhs, &rhs, &id.samples) {
            Ok(x) => x,
            Err(e) if !e.is_fatal() => return Ok(CheckResult::indetermine(id, residu, e.to_string())),
            Err(e) => return Err(e),
        };
        if numerique.is_nan() {
            return Ok(CheckResult::indetermine(id, residu, "résidu numérique non défini".into()));
        }

        let symbolique_nul = residu.est_zero_exact();
        if !symbolique_nul && numerique < id.tolerance / 10.0 && residu.contient_fonction_de_variable() {
            return Ok(CheckResult::indetermine(
                id,
                residu,
                "résidu transcendant non réduit à zéro".into(),
            ));
        }

        let verdict = arbitre(&id.name, &residu, symbolique_nul, numerique, id.tolerance)?;
        let passed = verdict == Verdict::Passed;
        tracing::debug!(
            identite = %id.name,
            residu = %noyau::format_expr_pretty(&residu),
            numerique,
            passed,
            "identité vérifiée"
        );

        Ok(CheckResult {
            identity_name: id.name.clone(),
            symbolic_residual: residu,
            numeric_residual: numerique,
            passed,
            verdict,
        })
    }

    fn residu_numerique(&self, lhs: &Expr, rhs: &Expr, samples: &[Liaisons]) -> Result<f64> {
        let vide = [Liaisons::new()];
        let jeux = if samples.is_empty() { &vide[..] } else { samples };

        let mut pire = 0.0f64;
        for env in jeux {
            let a = self.numerique.evaluate(lhs, env)?;
            let b = self.numerique.evaluate(rhs, env)?;
            let d = (a.0 - b.0).norm();
            if d.is_nan() {
                return Ok(f64::NAN);
            }
            pire = pire.max(d);
        }
        Ok(pire)
    }
}
