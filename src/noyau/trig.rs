// src/noyau/trig.rs
//
// Trig / exp / log exacts sur la forme normale
// -------------------------------------------
// - Angles spéciaux : tout multiple de π/12 (donc tout multiple de 15°)
// - Réduction modulo période via mod_rationnel() (2 pour sin/cos/exp(iqπ))
// - Argument symbolique : addition d’angle si le terme qπ est spécial, parité,
//   addition d’angle terme à terme, sin/cos(k·v) développés (k entier),
//   sinon atome sin(u)/cos(u) ; un atome porte un argument à un seul terme
//   de coefficient non entier, ou un argument mêlant constante et variable
// - exp(u + i·v), u et v réels symboliques : exp(u)·(cos v + i·sin v)
// - tan(u) = sin(u)·cos(u)⁻¹ ; tan(±π/2) => hors domaine
// - exp(iqπ) = cos(qπ) + i·sin(qπ) ; exp(Σ k·log p) = Π p^k (k entier ou demi-entier)
// - log(r) rationnel > 0 => Σ e_p·log p ; log(c·√n) = log c + ½·log n

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::canon::vers_expr;
use super::expr::mod_rationnel;
use super::forme::{factorise, Atome, Fonction, Forme, Monome, Radicande, EXPOSANT_MAX};
use crate::erreurs::{EngineError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrigFn {
    Sin,
    Cos,
    Tan,
}

impl TrigFn {
    fn nom(self) -> &'static str {
        match self {
            TrigFn::Sin => "sin",
            TrigFn::Cos => "cos",
            TrigFn::Tan => "tan",
        }
    }
}

/* ------------------------ Table des angles spéciaux ------------------------ */

/// sin(jπ/12) pour j ∈ [0, 6] (premier quadrant).
fn sin_premier_quadrant(j: i64) -> Forme {
    let quart = BigRational::new(BigInt::one(), BigInt::from(4));
    let racine = |n: i64| Forme::terme(Monome::new(), Radicande(BigInt::from(n)), BigRational::one());
    let demi = |f: Forme| f.echelle(&BigRational::new(BigInt::one(), BigInt::from(2)));

    match j {
        0 => Forme::zero(),
        1 => racine(6).moins(&racine(2)).echelle(&quart), // (√6 - √2)/4
        2 => Forme::rationnel(BigRational::new(BigInt::one(), BigInt::from(2))),
        3 => demi(racine(2)),
        4 => demi(racine(3)),
        5 => racine(6).plus(&racine(2)).echelle(&quart), // (√6 + √2)/4
        _ => Forme::un(),
    }
}

/// sin(kπ/12), k quelconque (réduit modulo 24).
fn sin_douzieme(k: i64) -> Forme {
    let k = k.rem_euclid(24);
    match k {
        0..=6 => sin_premier_quadrant(k),
        7..=12 => sin_premier_quadrant(12 - k),
        13..=18 => sin_premier_quadrant(k - 12).oppose(),
        _ => sin_premier_quadrant(24 - k).oppose(),
    }
}

/// q (angle = qπ) -> k tel que q ≡ k/12 (mod 2), si q est un multiple de 1/12.
fn en_douziemes(q: &BigRational) -> Option<i64> {
    let r = mod_rationnel(q, 2) * BigRational::from_integer(BigInt::from(12));
    if !r.denom().is_one() {
        return None;
    }
    r.numer().to_i64()
}

/// Valeur exacte de f(qπ), si l’angle est spécial. tan au pôle => Err(Domain).
pub fn valeur_speciale(q: &BigRational, f: TrigFn) -> Option<Result<Forme>> {
    let k = en_douziemes(q)?;
    let s = sin_douzieme(k);
    let c = sin_douzieme(k + 6);
    let v = match f {
        TrigFn::Sin => Ok(s),
        TrigFn::Cos => Ok(c),
        TrigFn::Tan => {
            if c.est_zero() {
                Err(EngineError::Domain(format!(
                    "tan({}) non définie",
                    vers_expr(&Forme::atome(Atome::Pi).echelle(q))
                )))
            } else {
                c.inverse().map(|ci| s.fois(&ci))
            }
        }
    };
    Some(v)
}

/* ------------------------ sin / cos / tan d’une forme ------------------------ */

pub fn sinus(x: &Forme) -> Result<Forme> {
    trig(x, TrigFn::Sin)
}

pub fn cosinus(x: &Forme) -> Result<Forme> {
    trig(x, TrigFn::Cos)
}

pub fn tangente(x: &Forme) -> Result<Forme> {
    trig(x, TrigFn::Tan)
}

fn trig(x: &Forme, f: TrigFn) -> Result<Forme> {
    if x.est_constante() {
        if let Some(q) = x.comme_coeff_pi() {
            if let Some(v) = valeur_speciale(&q, f) {
                return v;
            }
        }
        return Err(EngineError::Unsimplifiable(format!(
            "{}({}) : angle sans valeur exacte",
            f.nom(),
            vers_expr(x)
        )));
    }

    // cos développé à plusieurs monômes (tan(2x)) : on garde sin(x)/cos(x) en atomes
    if f == TrigFn::Tan {
        let c = trig(x, TrigFn::Cos)?;
        return match c.inverse() {
            Ok(ci) => Ok(trig(x, TrigFn::Sin)?.fois(&ci)),
            Err(EngineError::Unsimplifiable(_)) => {
                let ci = atome_trig(x, TrigFn::Cos).inverse()?;
                Ok(atome_trig(x, TrigFn::Sin).fois(&ci))
            }
            Err(e) => Err(e),
        };
    }

    // addition d’angle : f(u + qπ) avec qπ spécial
    let (u, q) = x.separe_pi();
    if !q.is_zero() {
        if let (Some(Ok(sq)), Some(Ok(cq))) = (
            valeur_speciale(&q, TrigFn::Sin),
            valeur_speciale(&q, TrigFn::Cos),
        ) {
            let (su, cu) = sin_cos_symbolique(&u);
            return Ok(match f {
                // sin(u+a) = sin u cos a + cos u sin a
                TrigFn::Sin => su.fois(&cq).plus(&cu.fois(&sq)),
                // cos(u+a) = cos u cos a - sin u sin a
                _ => cu.fois(&cq).moins(&su.fois(&sq)),
            });
        }
    }

    let (s, c) = sin_cos_symbolique(x);
    Ok(if f == TrigFn::Sin { s } else { c })
}

/// Au-delà, sin/cos(k·v) reste un atome.
const MULTIPLE_MAX: u64 = 32;

/// (sin u, cos u) pour u symbolique sans terme qπ spécial.
fn sin_cos_symbolique(u: &Forme) -> (Forme, Forme) {
    let atomes = || (atome_trig(u, TrigFn::Sin), atome_trig(u, TrigFn::Cos));

    let (constante, _) = u.separe_constante();
    if !constante.est_zero() {
        return atomes();
    }

    // sin(t + r) = sin t cos r + cos t sin r ; cos(t + r) = cos t cos r - sin t sin r
    if u.nb_termes() > 1 {
        let t = match u.termes().next() {
            Some((cle, c)) => Forme::terme(cle.monome.clone(), cle.radicande.clone(), c.clone()),
            None => return atomes(),
        };
        let (st, ct) = sin_cos_symbolique(&t);
        let (sr, cr) = sin_cos_symbolique(&u.moins(&t));
        return (
            st.fois(&cr).plus(&ct.fois(&sr)),
            ct.fois(&cr).moins(&st.fois(&sr)),
        );
    }

    let k = match u.termes().next().map(|(_, c)| c) {
        Some(c) if c.is_integer() => c.to_integer().to_i64().unwrap_or(0),
        _ => 0,
    };
    let n = k.unsigned_abs();
    if !(2..=MULTIPLE_MAX).contains(&n) {
        return atomes();
    }

    // sin((n+1)v) = sin(nv) cos v + cos(nv) sin v ; cos((n+1)v) = cos(nv) cos v - sin(nv) sin v
    let v = u.echelle(&BigRational::new(BigInt::one(), BigInt::from(n)));
    let (s1, c1) = (atome_trig(&v, TrigFn::Sin), atome_trig(&v, TrigFn::Cos));
    let (mut s, mut c) = (s1.clone(), c1.clone());
    for _ in 1..n {
        (s, c) = (s.fois(&c1).plus(&c.fois(&s1)), c.fois(&c1).moins(&s.fois(&s1)));
    }
    if k < 0 {
        s = s.oppose();
    }
    (s, c)
}

/// Atome sin(u)/cos(u) avec parité : sin(-u) = -sin(u), cos(-u) = cos(u).
fn atome_trig(u: &Forme, f: TrigFn) -> Forme {
    let (negatif, u) = if u.premier_coeff_negatif() {
        (true, u.oppose())
    } else {
        (false, u.clone())
    };
    let fonction = match f {
        TrigFn::Cos => Fonction::Cos,
        _ => Fonction::Sin,
    };
    let a = Forme::atome(Atome::Fonction(fonction, Box::new(vers_expr(&u))));
    if negatif && fonction == Fonction::Sin {
        a.oppose()
    } else {
        a
    }
}

/* ------------------------ exp ------------------------ */

pub fn exponentielle(x: &Forme) -> Result<Forme> {
    if x.est_zero() {
        return Ok(Forme::un());
    }

    if x.est_constante() {
        return exp_constante(x);
    }

    // x = c + u + i·v : exp(c)·exp(u)·(cos v + i·sin v)
    let (c, s) = x.separe_constante();
    let (u, v) = s.parties_reelle_imaginaire();
    let euler = if v.est_zero() {
        Forme::un()
    } else {
        let (sin_v, cos_v) = sin_cos_symbolique(&v);
        cos_v.plus(&Forme::i().fois(&sin_v))
    };
    let reelle = match exp_constante(&c) {
        Ok(ec) if u.est_zero() => ec,
        Ok(ec) => ec.fois(&atome_exp(&u)?),
        Err(e) if u.est_zero() => return Err(e),
        Err(_) => atome_exp(&c.plus(&u))?,
    };
    Ok(reelle.fois(&euler))
}

/// exp(u) symbolique : exp(k·v) = exp(v)^k (k entier), exp(-u) = exp(u)⁻¹.
fn atome_exp(u: &Forme) -> Result<Forme> {
    let exp_de = |v: &Forme| Forme::atome(Atome::Fonction(Fonction::Exp, Box::new(vers_expr(v))));

    if u.nb_termes() == 1 {
        if let Some((_, c)) = u.termes().next() {
            if c.is_integer() {
                if let Some(k) = c.to_integer().to_i64() {
                    let v = u.echelle(&(BigRational::one() / c));
                    return exp_de(&v).pow(k);
                }
            }
        }
    }

    if u.premier_coeff_negatif() {
        return exp_de(&u.oppose()).inverse();
    }
    Ok(exp_de(u))
}

/// exp d’une constante : chaque terme doit être i·qπ (spécial) ou k·log p.
fn exp_constante(x: &Forme) -> Result<Forme> {
    let sans_forme_close = || {
        EngineError::Unsimplifiable(format!("exp({}) : pas de forme close", vers_expr(x)))
    };

    let mut acc = Forme::un();
    for (cle, c) in x.termes() {
        let terme = Forme::terme(cle.monome.clone(), cle.radicande.clone(), c.clone());

        if let Some(q) = terme.comme_i_coeff_pi() {
            let cos = valeur_speciale(&q, TrigFn::Cos).ok_or_else(sans_forme_close)??;
            let sin = valeur_speciale(&q, TrigFn::Sin).ok_or_else(sans_forme_close)??;
            acc = acc.fois(&cos.plus(&Forme::i().fois(&sin)));
            continue;
        }

        // k·log p avec k ∈ ½ℤ  =>  (√p)^(2k)
        let log_p = match (cle.radicande.est_un(), cle.monome.len(), cle.monome.iter().next()) {
            (true, 1, Some((Atome::LogPremier(p), 1))) => p.clone(),
            _ => return Err(sans_forme_close()),
        };
        let deux_k = c * BigRational::from_integer(BigInt::from(2));
        if !deux_k.denom().is_one() {
            return Err(sans_forme_close());
        }
        let n = deux_k
            .numer()
            .to_i64()
            .filter(|n| n.unsigned_abs() <= EXPOSANT_MAX)
            .ok_or_else(|| {
                EngineError::Unsimplifiable(format!("exp({}) : exposant hors borne", vers_expr(x)))
            })?;
        let racine_p = Forme::racine(&BigRational::from_integer(log_p))?;
        acc = acc.fois(&racine_p.pow(n)?);
    }
    Ok(acc)
}

/* ------------------------ log ------------------------ */

pub fn logarithme(x: &Forme) -> Result<Forme> {
    if !x.est_constante() {
        return Ok(Forme::atome(Atome::Fonction(
            Fonction::Log,
            Box::new(vers_expr(x)),
        )));
    }

    if let Some(r) = x.comme_rationnel() {
        if !r.is_positive() {
            return Err(EngineError::Domain(format!(
                "log({}) : argument non positif",
                vers_expr(x)
            )));
        }
        return Ok(log_rationnel(&r));
    }

    // c·√n, c > 0, n > 1
    if x.nb_termes() == 1 {
        if let Some((cle, c)) = x.termes().next() {
            if cle.monome.is_empty() && !cle.radicande.est_imaginaire() && c.is_positive() {
                let demi = BigRational::new(BigInt::one(), BigInt::from(2));
                let log_n = log_rationnel(&BigRational::from_integer(cle.radicande.0.clone()));
                return Ok(log_rationnel(c).plus(&log_n.echelle(&demi)));
            }
        }
    }

    Err(EngineError::Unsimplifiable(format!(
        "log({}) : pas de forme close",
        vers_expr(x)
    )))
}

/// log(a/b) = Σ e_p log p - Σ f_q log q
fn log_rationnel(r: &BigRational) -> Forme {
    let mut out = Forme::zero();
    for (p, k) in factorise(r.numer()) {
        out = out.plus(&Forme::atome(Atome::LogPremier(p)).echelle(&entier(k as i64)));
    }
    for (q, k) in factorise(r.denom()) {
        out = out.moins(&Forme::atome(Atome::LogPremier(q)).echelle(&entier(k as i64)));
    }
    out
}

fn entier(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}
