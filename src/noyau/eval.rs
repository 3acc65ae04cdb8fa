//! Noyau : évaluation (pipeline réel)
//!
//! texte -> jetons -> RPN -> Expr -> forme normale exacte -> Expr canonique -> EXACT -> lecture
//!
//! `normalise` est le seul point d’entrée vers la forme normale : chaque nœud de
//! l’arbre est réduit récursivement (radicaux, trig exacte, exp/log, intégrales).

use super::canon::vers_expr;
use super::expr::Expr;
use super::format::format_expr_pretty;
use super::forme::{Atome, Forme};
use super::integrale::reduit;
use super::jetons::{format_tokens, tokenize};
use super::lecture::{lecture_decimale, LectureDecimale};
use super::rpn::{from_rpn, to_rpn};
use super::trig::{cosinus, exponentielle, logarithme, sinus, tangente};
use crate::erreurs::{EngineError, Result};

/* ------------------------ Forme normale ------------------------ */

/// Réduit une expression à sa forme normale exacte.
pub fn normalise(e: &Expr) -> Result<Forme> {
    use Expr::*;

    Ok(match e {
        Rat(r) => Forme::rationnel(r.clone()),
        Pi => Forme::atome(Atome::Pi),
        I => Forme::i(),
        Var(nom) => Forme::atome(Atome::Var(nom.clone())),

        Sqrt(x) => {
            let fx = normalise(x)?;
            match fx.comme_rationnel() {
                Some(r) => Forme::racine(&r)?,
                None => {
                    return Err(EngineError::Unsimplifiable(format!(
                        "√({}) : radicande non rationnel",
                        format_expr_pretty(&vers_expr(&fx))
                    )))
                }
            }
        }
        PowInt(x, n) => normalise(x)?.pow(*n)?,

        Sin(x) => sinus(&normalise(x)?)?,
        Cos(x) => cosinus(&normalise(x)?)?,
        Tan(x) => tangente(&normalise(x)?)?,
        Exp(x) => exponentielle(&normalise(x)?)?,
        Log(x) => logarithme(&normalise(x)?)?,

        Add(a, b) => normalise(a)?.plus(&normalise(b)?),
        Sub(a, b) => normalise(a)?.moins(&normalise(b)?),
        Mul(a, b) => normalise(a)?.fois(&normalise(b)?),
        Div(a, b) => normalise(a)?.fois(&normalise(b)?.inverse()?),

        Integrale {
            integrande,
            var,
            de,
            a,
        } => reduit(&normalise(integrande)?, var, &normalise(de)?, &normalise(a)?)?,
    })
}

/// Forme canonique exacte (idempotente).
pub fn simplify(e: &Expr) -> Result<Expr> {
    let forme = normalise(e)?;
    let out = vers_expr(&forme);
    tracing::debug!(entree = %e, canonique = %format_expr_pretty(&out), "simplification");
    Ok(out)
}

/// Lecture décimale à `digits` chiffres significatifs, arithmétique entière seulement.
pub fn evaluate_decimal(e: &Expr, digits: usize) -> Result<LectureDecimale> {
    lecture_decimale(&normalise(e)?, digits)
}

/* ------------------------ Pipeline texte (démarche) ------------------------ */

#[derive(Default, Clone, Debug)]
pub struct DemarcheNoyau {
    pub jetons: String,
    pub rpn: String,
    pub avant: String,
    pub apres: String,
}

#[derive(Clone, Debug)]
pub struct Evaluation {
    pub exact: Expr,
    pub joli: String,
    /// None si l’expression garde des variables libres
    pub lecture: Option<LectureDecimale>,
    pub demarche: DemarcheNoyau,
}

/// API texte : évalue une expression et retourne :
/// - EXACT (forme canonique + rendu joli)
/// - lecture décimale (None si variable libre)
/// - démarche (jetons, RPN, avant/après)
pub fn eval_expression(expr_str: &str, digits: usize) -> Result<Evaluation> {
    let s = expr_str.trim();
    if s.is_empty() {
        return Err(EngineError::Parse("entrée vide".into()));
    }

    // 1) Jetons
    let jetons = tokenize(s)?;

    // 2) RPN
    let rpn = to_rpn(&jetons)?;

    // 3) AST
    let expr0 = from_rpn(&rpn)?;

    // 4) Forme normale puis reconstruction canonique
    let forme = normalise(&expr0)?;
    let exact = vers_expr(&forme);

    // 5) Lecture (bloquée si variable)
    let lecture = if forme.est_constante() {
        Some(lecture_decimale(&forme, digits)?)
    } else {
        None
    };

    let demarche = DemarcheNoyau {
        jetons: format_tokens(&jetons),
        rpn: format_tokens(&rpn),
        avant: format_expr_pretty(&expr0),
        apres: format_expr_pretty(&exact),
    };

    Ok(Evaluation {
        joli: format_expr_pretty(&exact),
        exact,
        lecture,
        demarche,
    })
}
