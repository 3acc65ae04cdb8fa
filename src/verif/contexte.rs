// src/verif/contexte.rs
//
// Contexte de vérification : registre + identités + cycle déclaré.
// `run_all` produit le rapport complet :
// - chaque constante : forme exacte, lecture décimale, valeur flottante
//   (lecture et flottant doivent concorder, sinon CrossCheckMismatch)
// - chaque identité : CheckResult
// - le cycle éventuel : trace de rotation
//
// Le contexte n’est jamais modifié par un run : deux runs donnent le même rapport.

use serde::Serialize;

use super::identites::{CheckResult, EvaluateurExact, Identity, IdentityChecker, SymbolicEvaluator, Verdict};
use super::numerique::{EvaluateurFlottant, Liaisons, NumericEvaluator, NumericValue};
use super::registre::ConstantRegistry;
use super::rotation::{verify_cycle, RotationTrace};
use super::serde_expr;
use crate::erreurs::{EngineError, Result};
use crate::noyau::{format_expr_pretty, parse_expr, Expr, LectureDecimale};

/// Écart relatif admis entre lecture décimale et flottant pour une constante.
pub const TOLERANCE_CONSTANTE: f64 = 1e-9;

/// Chiffres significatifs de la lecture décimale par défaut.
pub const CHIFFRES_DEFAUT: usize = 15;

/* ------------------------ Déclarations ------------------------ */

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleDeclaration {
    pub name: String,
    #[serde(serialize_with = "serde_expr")]
    pub initial: Expr,
    #[serde(serialize_with = "serde_expr")]
    pub rotation: Expr,
    pub period: usize,
}

impl CycleDeclaration {
    pub fn depuis_texte(name: &str, initial: &str, rotation: &str, period: usize) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            initial: parse_expr(initial)?,
            rotation: parse_expr(rotation)?,
            period,
        })
    }
}

#[derive(Clone, Debug)]
pub struct VerificationContext {
    pub registre: ConstantRegistry,
    pub identites: Vec<Identity>,
    pub cycle: Option<CycleDeclaration>,
    pub chiffres: usize,
}

/* ------------------------ Rapport ------------------------ */

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstantReport {
    pub name: String,
    pub expression: String,
    /// Forme exacte, None si aucune forme close.
    pub exact: Option<String>,
    pub decimal: Option<LectureDecimale>,
    pub numeric: Option<NumericValue>,
    /// Raison de l’absence de forme exacte ou de valeur.
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RotationReport {
    pub name: String,
    pub period: usize,
    pub closed: bool,
    pub trace: RotationTrace,
    pub violation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rapport {
    pub constants: Vec<ConstantReport>,
    pub results: Vec<CheckResult>,
    pub rotation: Option<RotationReport>,
}

impl Rapport {
    /// Toutes les identités passent et le cycle (s’il existe) se referme.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
            && self.rotation.as_ref().map_or(true, |r| r.closed)
    }

    pub fn nb_passed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict == Verdict::Passed).count()
    }

    pub fn nb_failed(&self) -> usize {
        self.results.iter().filter(|r| r.verdict == Verdict::Failed).count()
    }

    pub fn nb_indeterminate(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.verdict, Verdict::Indeterminate(_)))
            .count()
    }

    /// 0 : tout passe ; 1 : au moins un échec / indéterminé / cycle ouvert.
    pub fn code_sortie(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/* ------------------------ Contexte ------------------------ */

impl Default for VerificationContext {
    fn default() -> Self {
        Self {
            registre: ConstantRegistry::new(),
            identites: Vec::new(),
            cycle: None,
            chiffres: CHIFFRES_DEFAUT,
        }
    }
}

impl VerificationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn avec_chiffres(mut self, chiffres: usize) -> Self {
        self.chiffres = chiffres.max(1);
        self
    }

    pub fn define_constant(&mut self, name: &str, texte: &str) -> Result<()> {
        self.registre.register_text(name, texte).map(|_| ())
    }

    pub fn declare_identity(&mut self, id: Identity) -> Result<()> {
        id.valide()?;
        if self.identites.iter().any(|x| x.name == id.name) {
            return Err(EngineError::DuplicateName(id.name));
        }
        self.identites.push(id);
        Ok(())
    }

    pub fn declare_cycle(&mut self, cycle: CycleDeclaration) {
        self.cycle = Some(cycle);
    }

    /// Run complet avec le noyau exact et l’évaluateur flottant.
    pub fn run_all(&self) -> Result<Rapport> {
        self.run_all_avec(&EvaluateurExact, &EvaluateurFlottant::default())
    }

    /// Run complet avec des évaluateurs fournis (injection de fautes en test).
    pub fn run_all_avec<S, N>(&self, symbolique: &S, numerique: &N) -> Result<Rapport>
    where
        S: SymbolicEvaluator,
        N: NumericEvaluator,
    {
        tracing::info!(
            constantes = self.registre.len(),
            identites = self.identites.len(),
            cycle = self.cycle.is_some(),
            "début de la vérification"
        );

        let constants = self
            .registre
            .iter()
            .map(|c| self.rapport_constante(&c.name, &c.expression, &c.resolved, symbolique, numerique))
            .collect::<Result<Vec<_>>>()?;

        let checker = IdentityChecker::new(&self.registre, symbolique, numerique);
        let results = self
            .identites
            .iter()
            .map(|id| checker.check(id))
            .collect::<Result<Vec<_>>>()?;

        let rotation = self
            .cycle
            .as_ref()
            .map(|c| self.rapport_rotation(c, numerique));

        let rapport = Rapport {
            constants,
            results,
            rotation,
        };
        tracing::info!(
            passed = rapport.nb_passed(),
            failed = rapport.nb_failed(),
            indetermines = rapport.nb_indeterminate(),
            "fin de la vérification"
        );
        Ok(rapport)
    }

    fn rapport_constante<S, N>(
        &self,
        name: &str,
        expression: &Expr,
        resolved: &Expr,
        symbolique: &S,
        numerique: &N,
    ) -> Result<ConstantReport>
    where
        S: SymbolicEvaluator,
        N: NumericEvaluator,
    {
        let mut note = None;
        let exact = garde(symbolique.simplify(resolved), &mut note)?.map(|e| format_expr_pretty(&e));
        let decimal = garde(symbolique.evaluate_decimal(resolved, self.chiffres), &mut note)?;
        let numeric = garde(numerique.evaluate(resolved, &Liaisons::new()), &mut note)?;

        if let (Some(d), Some(n)) = (&decimal, &numeric) {
            concorde(name, d, n)?;
        }

        Ok(ConstantReport {
            name: name.to_string(),
            expression: format_expr_pretty(expression),
            exact,
            decimal,
            numeric,
            note,
        })
    }

    fn rapport_rotation<N: NumericEvaluator>(&self, c: &CycleDeclaration, numerique: &N) -> RotationReport {
        let valeurs = numerique
            .evaluate(&self.registre.resolve(&c.initial), &Liaisons::new())
            .and_then(|init| {
                let rot = numerique.evaluate(&self.registre.resolve(&c.rotation), &Liaisons::new())?;
                verify_cycle(init, rot, c.period)
            });

        let (closed, trace, violation) = match valeurs {
            Ok(trace) => (true, trace, None),
            Err(EngineError::PeriodicityViolation { reason, trace }) => (false, trace, Some(reason)),
            Err(e) => (false, RotationTrace::default(), Some(e.to_string())),
        };

        RotationReport {
            name: c.name.clone(),
            period: c.period,
            closed,
            trace,
            violation,
        }
    }
}

/// Erreur non fatale -> None (la première raison est gardée dans `note`).
fn garde<T>(r: Result<T>, note: &mut Option<String>) -> Result<Option<T>> {
    match r {
        Ok(v) => Ok(Some(v)),
        Err(e) if !e.is_fatal() => {
            note.get_or_insert_with(|| e.to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Lecture décimale exacte et flottant doivent désigner le même nombre.
fn concorde(name: &str, d: &LectureDecimale, n: &NumericValue) -> Result<()> {
    let lit = |s: &str| s.parse::<f64>().unwrap_or(f64::NAN);
    let re = lit(&d.reel);
    let im = d.imag.as_deref().map_or(0.0, lit);

    let ecart = ((re - n.re()).powi(2) + (im - n.im()).powi(2)).sqrt();
    let echelle = n.magnitude().max(1.0);

    if ecart.is_nan() || ecart > TOLERANCE_CONSTANTE * echelle {
        tracing::error!(constante = name, lecture = %d, ecart, "lecture et flottant en désaccord");
        return Err(EngineError::CrossCheckMismatch {
            identity: format!("constante {name}"),
            symbolic_residual: d.to_string(),
            numeric_residual: ecart,
            tolerance: TOLERANCE_CONSTANTE,
        });
    }
    Ok(())
}
