//! Noyau exact Q-pur
//!
//! Organisation interne :
//! - expr.rs      : AST exact (valeur), substitution, variables libres
//! - jetons.rs    : tokenisation
//! - rpn.rs       : shunting-yard + construction Expr
//! - forme.rs     : forme normale Σ coeff·√n·monôme (radicaux, i, atomes)
//! - trig.rs      : angles spéciaux (multiples de π/12), exp / log exacts
//! - integrale.rs : intégrales définies (produits trig polynomiaux)
//! - canon.rs     : forme normale -> Expr canonique
//! - format.rs    : affichage EXACT “joli” (√2/2, 3π/4, 1 - i…)
//! - lecture.rs   : lecture décimale exacte (entiers scalés) + caches π / log
//! - eval.rs      : pipeline complet (normalise, simplify, evaluate_decimal)

pub mod canon;
pub mod eval;
pub mod expr;
pub mod format;
pub mod forme;
pub mod integrale;
pub mod jetons;
pub mod lecture;
pub mod rpn;
pub mod trig;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_proprietes;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique minimale
pub use eval::{eval_expression, evaluate_decimal, normalise, simplify};
pub use expr::Expr;
pub use format::format_expr_pretty;
pub use lecture::LectureDecimale;
pub use rpn::parse_expr;
