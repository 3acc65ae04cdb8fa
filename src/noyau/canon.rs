// src/noyau/canon.rs
//
// Reconstruction canonique Forme -> Expr (déterministe) :
// - un terme = coeff · radical · atomes^e (exposants négatifs au dénominateur)
// - radical : √n (n > 1), i (n = -1), i·√|n| (n < -1)
// - log p -> Log(p), sin/cos/exp/log(u) -> Sin/Cos/Exp/Log(u)
// - somme gauche -> droite dans l’ordre de la Forme, Sub quand le terme suivant est négatif
// - premier terme négatif : Sub(0, t) (“-t” canon)
//
// Propriété : normalise(vers_expr(f)) == f, donc simplify est idempotente.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};

use super::expr::Expr;
use super::forme::{Atome, Cle, Fonction, Forme, Radicande};

pub fn vers_expr(f: &Forme) -> Expr {
    let mut acc: Option<Expr> = None;

    for (cle, c) in f.termes() {
        let t = terme_en_expr(cle, &c.abs());
        acc = Some(match (acc, c.is_negative()) {
            (None, false) => t,
            (None, true) => Expr::sub(Expr::zero(), t),
            (Some(a), false) => Expr::add(a, t),
            (Some(a), true) => Expr::sub(a, t),
        });
    }

    acc.unwrap_or_else(Expr::zero)
}

/// c > 0
fn terme_en_expr(cle: &Cle, c: &BigRational) -> Expr {
    let mut num: Vec<Expr> = Vec::new();
    let mut den: Vec<Expr> = Vec::new();

    if let Some(r) = radical_en_expr(&cle.radicande) {
        num.push(r);
    }

    for (a, e) in &cle.monome {
        let x = atome_en_expr(a);
        let facteur = if e.abs() == 1 { x } else { Expr::pow(x, e.abs()) };
        if *e > 0 {
            num.push(facteur);
        } else {
            den.push(facteur);
        }
    }

    // coefficient en tête (omis s’il vaut 1 et qu’il reste un facteur)
    if !c.is_one() || num.is_empty() {
        num.insert(0, Expr::Rat(c.clone()));
    }

    let p = produit(num);
    if den.is_empty() {
        p
    } else {
        Expr::div(p, produit(den))
    }
}

fn produit(facteurs: Vec<Expr>) -> Expr {
    facteurs
        .into_iter()
        .reduce(Expr::mul)
        .unwrap_or_else(|| Expr::Rat(BigRational::one()))
}

fn radical_en_expr(r: &Radicande) -> Option<Expr> {
    let n = &r.0;
    if n.is_one() {
        return None;
    }
    if n == &BigInt::from(-1) {
        return Some(Expr::I);
    }
    let racine = Expr::sqrt(Expr::Rat(BigRational::from_integer(n.abs())));
    if n.is_negative() {
        Some(Expr::mul(Expr::I, racine))
    } else {
        Some(racine)
    }
}

fn atome_en_expr(a: &Atome) -> Expr {
    match a {
        Atome::Pi => Expr::Pi,
        Atome::LogPremier(p) => {
            Expr::Log(Box::new(Expr::Rat(BigRational::from_integer(p.clone()))))
        }
        Atome::Var(v) => Expr::Var(v.clone()),
        Atome::Fonction(f, u) => {
            let u = u.clone();
            match f {
                Fonction::Sin => Expr::Sin(u),
                Fonction::Cos => Expr::Cos(u),
                Fonction::Exp => Expr::Exp(u),
                Fonction::Log => Expr::Log(u),
            }
        }
    }
}
