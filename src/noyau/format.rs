// src/noyau/format.rs
//
// Affichage EXACT “joli” : √2/2, 3π/4, 1 - i, sin(x)^2 …
// - parenthèses seulement là où la priorité l’exige
// - coefficient rationnel collé au facteur qui suit : (p/q)·X -> pX/q
// - intégrale réécrite sous la forme lisible par le parseur : int(f, t, a, b)

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::Expr;

/* ------------------------ Priorités ------------------------ */

const P_SOMME: u8 = 1;
const P_NEG: u8 = 2;
const P_PRODUIT: u8 = 3;
const P_PUISSANCE: u8 = 4;
const P_ATOME: u8 = 5;

fn priorite(e: &Expr) -> u8 {
    use Expr::*;
    match e {
        Add(_, _) => P_SOMME,
        Sub(a, _) if a.est_zero_exact() => P_NEG,
        Sub(_, _) => P_SOMME,
        Rat(r) if r.is_negative() => P_NEG,
        Rat(r) if !r.denom().is_one() => P_PRODUIT,
        Mul(a, _) if matches!(a.as_ref(), Rat(r) if r.is_negative()) => P_NEG,
        Mul(_, _) | Div(_, _) => P_PRODUIT,
        PowInt(_, _) => P_PUISSANCE,
        _ => P_ATOME,
    }
}

fn entoure(e: &Expr, min: u8) -> String {
    let s = format_expr_pretty(e);
    if priorite(e) < min {
        format!("({s})")
    } else {
        s
    }
}

/* ------------------------ Helpers rationnels ------------------------ */

fn format_rat_pretty(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else {
        format!("{n}/{d}")
    }
}

fn format_sqrt_of_int(n: &BigInt) -> String {
    format!("√{n}")
}

/// (p/q)·X -> pX/q ; X/q si p=1 ; -X/q si p=-1
fn format_coeff_facteur(r: &BigRational, x: &str) -> String {
    let p = r.numer();
    let q = r.denom();

    if p.is_zero() {
        return "0".to_string();
    }

    // séparateur explicite si X commence par un chiffre (2·3 et non 23)
    let sep = if x.starts_with(|c: char| c.is_ascii_digit()) {
        "·"
    } else {
        ""
    };

    let tete = if p.is_one() {
        x.to_string()
    } else if p == &BigInt::from(-1) {
        format!("-{x}")
    } else {
        format!("{p}{sep}{x}")
    };

    if q.is_one() {
        tete
    } else {
        format!("{tete}/{q}")
    }
}

/* ------------------------ Affichage EXACT “joli” ------------------------ */

pub fn format_expr_pretty(e: &Expr) -> String {
    use Expr::*;

    match e {
        Rat(r) => format_rat_pretty(r),
        Pi => "π".to_string(),
        I => "i".to_string(),
        Var(s) => s.clone(),

        // √2, √3, etc. si argument entier
        Sqrt(x) => match &**x {
            Rat(r) if r.denom().is_one() && !r.is_negative() => format_sqrt_of_int(r.numer()),
            _ => format!("√({})", format_expr_pretty(x)),
        },

        PowInt(x, n) if *n < 0 => format!("{}^({n})", entoure(x, P_ATOME)),
        PowInt(x, n) => format!("{}^{n}", entoure(x, P_ATOME)),

        Sin(x) => format!("sin({})", format_expr_pretty(x)),
        Cos(x) => format!("cos({})", format_expr_pretty(x)),
        Tan(x) => format!("tan({})", format_expr_pretty(x)),
        Exp(x) => format!("exp({})", format_expr_pretty(x)),
        Log(x) => format!("log({})", format_expr_pretty(x)),

        // cas joli : (p/q)·X => pX/q (donc √2/2, 3π/4, etc.)
        Mul(a, b) => match &**a {
            Rat(r) => format_coeff_facteur(r, &entoure(b, P_PRODUIT)),
            _ => format!("{}·{}", entoure(a, P_PRODUIT), entoure(b, P_PUISSANCE)),
        },

        Div(a, b) => format!("{}/{}", entoure(a, P_PRODUIT), entoure(b, P_PUISSANCE)),

        Add(a, b) => format!("{} + {}", entoure(a, P_SOMME), entoure(b, P_NEG)),

        // 0 - x => -x (rendu propre), sinon affichage normal
        Sub(a, b) => {
            if a.est_zero_exact() {
                format!("-{}", entoure(b, P_PRODUIT))
            } else {
                format!("{} - {}", entoure(a, P_SOMME), entoure(b, P_PRODUIT))
            }
        }

        Integrale {
            integrande,
            var,
            de,
            a,
        } => format!(
            "int({}, {var}, {}, {})",
            format_expr_pretty(integrande),
            format_expr_pretty(de),
            format_expr_pretty(a)
        ),
    }
}
