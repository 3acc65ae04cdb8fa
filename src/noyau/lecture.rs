// src/noyau/lecture.rs
//
// Lecture décimale exacte (aucun flottant) d’une forme constante.
// - chaque facteur est un entier “scalé” (×10^d) : π (Machin), log p (atanh), √n (Newton)
// - d = chiffres significatifs + chiffres de garde ; on remonte d tant que la valeur
//   n’a pas assez de chiffres (petites valeurs)
// - arrondi “demi vers le haut” (sur la valeur absolue) au nombre de chiffres demandé
// - complexe : a + bi (partie imaginaire absente si nulle)

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

use super::canon::vers_expr;
use super::forme::{Atome, Cle, Forme};
use crate::erreurs::{EngineError, Result};

/// Chiffres de garde au-delà des chiffres significatifs demandés.
const GARDE: usize = 20;

/// Au-delà, la valeur est lue comme 0 (forme non nulle mais sous la précision).
const ECHELLE_MAX: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LectureDecimale {
    pub reel: String,
    pub imag: Option<String>,
}

impl fmt::Display for LectureDecimale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.imag {
            None => write!(f, "{}", self.reel),
            Some(b) if self.reel == "0" => write!(f, "{b}i"),
            Some(b) => match b.strip_prefix('-') {
                Some(abs) => write!(f, "{} - {abs}i", self.reel),
                None => write!(f, "{} + {b}i", self.reel),
            },
        }
    }
}

/* ------------------------ Décimal (scaled -> texte) ------------------------ */

fn pow10(n: usize) -> BigInt {
    BigInt::from(10).pow(n as u32)
}

/// Convertit un entier “scalé” (×10^digits) en texte décimal tronqué.
pub fn scaled_to_decimal(mut scaled: BigInt, digits: usize) -> String {
    let neg = scaled.is_negative();
    if neg {
        scaled = -scaled;
    }

    let scale = pow10(digits);
    let int_part = &scaled / &scale;
    let frac_part = &scaled % &scale;

    if digits == 0 {
        return if neg {
            format!("-{int_part}")
        } else {
            format!("{int_part}")
        };
    }

    let mut frac = frac_part.to_str_radix(10);
    while frac.len() < digits {
        frac.insert(0, '0');
    }

    if neg {
        format!("-{int_part}.{frac}")
    } else {
        format!("{int_part}.{frac}")
    }
}

/// Arrondit un entier scalé (×10^d) à `sig` chiffres significatifs et le rend en texte.
pub fn arrondi_significatif(scaled: &BigInt, d: usize, sig: usize) -> String {
    let sig = sig.max(1);
    if scaled.is_zero() {
        return "0".to_string();
    }

    let neg = scaled.is_negative();
    let abs = scaled.abs();
    let longueur = abs.to_str_radix(10).len();

    // q = premiers `sig` chiffres (arrondis), valeur = q · 10^(exposant)
    let (mut q, mut exposant) = if longueur > sig {
        let coupe = pow10(longueur - sig);
        let mut q = &abs / &coupe;
        let reste = &abs % &coupe;
        if reste * 2 >= coupe {
            q += 1;
        }
        (q, (longueur - sig) as i64 - d as i64)
    } else {
        (abs, -(d as i64))
    };

    if q.to_str_radix(10).len() > sig && longueur > sig {
        q /= 10;
        exposant += 1;
    }

    let q = if neg { -q } else { q };
    if exposant >= 0 {
        format!("{}", q * pow10(exposant as usize))
    } else {
        scaled_to_decimal(q, (-exposant) as usize)
    }
}

/* ------------------------ π (Machin) + cache ------------------------ */

/// arctan(1/q) en entier scalé (troncature) via série:
/// atan(z) = z - z^3/3 + z^5/5 - ...
fn arctan_inv_q_scaled(q: i64, scale: &BigInt) -> BigInt {
    let q = BigInt::from(q);

    let mut k: usize = 0;
    let mut sign_pos = true;

    // q^(2k+1)
    let mut q_pow = q.clone();
    let mut sum = BigInt::zero();

    loop {
        let denom = BigInt::from((2 * k + 1) as i64);
        let d = &q_pow * &denom;

        let term = scale / &d;
        if term.is_zero() {
            break;
        }

        if sign_pos {
            sum += &term;
        } else {
            sum -= &term;
        }

        q_pow *= &q;
        q_pow *= &q;

        sign_pos = !sign_pos;
        k += 1;
    }

    sum
}

fn pi_scaled_compute(digits: usize) -> BigInt {
    // extra pour amortir les erreurs de troncature
    let extra = 10usize;
    let scale = pow10(digits + extra);

    // Machin : π = 16*atan(1/5) - 4*atan(1/239)
    let a = arctan_inv_q_scaled(5, &scale);
    let b = arctan_inv_q_scaled(239, &scale);

    let mut pi = BigInt::from(16) * a - BigInt::from(4) * b;

    pi /= pow10(extra);
    pi
}

static PI_CACHE: OnceLock<Mutex<HashMap<usize, BigInt>>> = OnceLock::new();

fn pi_scaled_cached(digits: usize) -> BigInt {
    let m = PI_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    // un cache empoisonné reste cohérent (insertion atomique)
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(v) = guard.get(&digits) {
        return v.clone();
    }

    let v = pi_scaled_compute(digits);
    guard.insert(digits, v.clone());
    v
}

/* ------------------------ log p (atanh) + cache ------------------------ */

/// atanh(a/b) scalé, 0 < a/b < 1 : Σ (a/b)^(2k+1) / (2k+1)
fn atanh_scaled(a: &BigInt, b: &BigInt, scale: &BigInt) -> BigInt {
    let a2 = a * a;
    let b2 = b * b;

    let mut puissance = scale * a / b; // (a/b)^(2k+1) scalé
    let mut sum = BigInt::zero();
    let mut k: u64 = 0;

    while !puissance.is_zero() {
        sum += &puissance / BigInt::from(2 * k + 1);
        puissance = puissance * &a2 / &b2;
        k += 1;
    }
    sum
}

/// ln p = k·ln 2 + 2·atanh((p - 2^k)/(p + 2^k)), 2^k ≤ p < 2^(k+1) ; ln 2 = 2·atanh(1/3)
fn ln_scaled_compute(p: &BigInt, digits: usize) -> BigInt {
    let extra = 10usize;
    let scale = pow10(digits + extra);

    let ln2 = atanh_scaled(&BigInt::one(), &BigInt::from(3), &scale) * 2;
    let k = p.bits().saturating_sub(1);
    let deux_k = BigInt::one() << k;

    let mut ln = ln2 * BigInt::from(k);
    if p != &deux_k {
        ln += atanh_scaled(&(p - &deux_k), &(p + &deux_k), &scale) * 2;
    }
    ln / pow10(extra)
}

static LN_CACHE: OnceLock<Mutex<HashMap<(BigInt, usize), BigInt>>> = OnceLock::new();

fn ln_scaled_cached(p: &BigInt, digits: usize) -> BigInt {
    let m = LN_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());

    let cle = (p.clone(), digits);
    if let Some(v) = guard.get(&cle) {
        return v.clone();
    }

    let v = ln_scaled_compute(p, digits);
    guard.insert(cle, v.clone());
    v
}

/* ------------------------ √ en lecture (approx scalée) ------------------------ */

/// sqrt(r) en entier scalé : floor( sqrt(r) * 10^digits )
/// r = n/d
fn rational_sqrt_scaled(r: &BigRational, digits: usize) -> BigInt {
    let n = r.numer().clone();
    let d = r.denom().clone();

    if n.is_zero() {
        return BigInt::zero();
    }

    // y^2 ≈ (n * 10^(2*digits)) / d
    let scale2 = pow10(2 * digits);
    let target = n * scale2;

    let mut y = pow10(digits);
    if y.is_zero() {
        y = BigInt::one();
    }

    // Newton sur y pour sqrt(target/d)
    loop {
        let denom = &d * &y;
        if denom.is_zero() {
            break;
        }

        let q = &target / denom;
        let y_next = (&y + q) >> 1;

        if y_next == y || y_next == (&y - 1u32) {
            // ajustement final (floor)
            let mut y_adj = y_next;

            while (&y_adj + 1u32) * (&y_adj + 1u32) * &d <= target {
                y_adj += 1u32;
            }
            while &y_adj * &y_adj * &d > target {
                y_adj -= 1u32;
            }
            return y_adj;
        }

        y = y_next;
    }

    y
}

/* ------------------------ Lecture d’une forme ------------------------ */

/// Lecture décimale à `sig` chiffres significatifs (parties réelle et imaginaire).
pub fn lecture_decimale(f: &Forme, sig: usize) -> Result<LectureDecimale> {
    if !f.est_constante() {
        return Err(EngineError::Unsimplifiable(format!(
            "lecture décimale de {} : variables libres",
            vers_expr(f)
        )));
    }

    let (re, im) = f.parties_reelle_imaginaire();
    let reel = lit_reel(&re, sig)?;
    let imag = if im.est_zero() {
        None
    } else {
        Some(lit_reel(&im, sig)?)
    };

    Ok(LectureDecimale { reel, imag })
}

fn lit_reel(f: &Forme, sig: usize) -> Result<String> {
    if f.est_zero() {
        return Ok("0".to_string());
    }

    let voulu = sig.max(1) + GARDE / 2;
    let mut d = sig.max(1) + GARDE;

    loop {
        let s = forme_scaled(f, d)?;
        let longueur = if s.is_zero() {
            0
        } else {
            s.abs().to_str_radix(10).len()
        };

        if longueur >= voulu {
            return Ok(arrondi_significatif(&s, d, sig));
        }
        if d >= ECHELLE_MAX {
            tracing::warn!(forme = %vers_expr(f), d, "valeur sous la précision de lecture");
            return Ok(arrondi_significatif(&s, d, sig));
        }
        d = (d + voulu - longueur + GARDE).min(ECHELLE_MAX);
    }
}

/// Σ c · √n · Π atome^e en entier scalé (×10^d). Radicandes positifs seulement.
fn forme_scaled(f: &Forme, d: usize) -> Result<BigInt> {
    let mut total = BigInt::zero();
    for (cle, c) in f.termes() {
        total += terme_scaled(cle, c, d)?;
    }
    Ok(total)
}

fn terme_scaled(cle: &Cle, c: &BigRational, d: usize) -> Result<BigInt> {
    let scale = pow10(d);
    let mut acc = scale.clone();

    if !cle.radicande.est_un() {
        if cle.radicande.est_imaginaire() {
            return Err(EngineError::Domain("radicande négatif en lecture réelle".into()));
        }
        let r = BigRational::from_integer(cle.radicande.0.clone());
        acc = acc * rational_sqrt_scaled(&r, d) / &scale;
    }

    for (a, e) in &cle.monome {
        let x = atome_scaled(a, d)?;
        let facteur = if *e > 0 {
            x
        } else {
            if x.is_zero() {
                return Err(EngineError::Domain("division par zéro en lecture".into()));
            }
            &scale * &scale / x
        };
        for _ in 0..e.unsigned_abs() {
            acc = acc * &facteur / &scale;
        }
    }

    Ok(acc * c.numer() / c.denom())
}

fn atome_scaled(a: &Atome, d: usize) -> Result<BigInt> {
    match a {
        Atome::Pi => Ok(pi_scaled_cached(d)),
        Atome::LogPremier(p) => Ok(ln_scaled_cached(p, d)),
        Atome::Var(v) => Err(EngineError::Unsimplifiable(format!(
            "lecture décimale : variable libre {v}"
        ))),
        Atome::Fonction(_, u) => Err(EngineError::Unsimplifiable(format!(
            "lecture décimale : argument symbolique {u}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat(p: i64, q: i64) -> BigRational {
        BigRational::new(BigInt::from(p), BigInt::from(q))
    }

    fn lit(f: &Forme, sig: usize) -> String {
        lecture_decimale(f, sig).unwrap().to_string()
    }

    #[test]
    fn pi_et_racines() {
        assert_eq!(lit(&Forme::atome(Atome::Pi), 20), "3.1415926535897932385");
        assert_eq!(
            lit(&Forme::racine(&rat(2, 1)).unwrap(), 15),
            "1.41421356237310"
        );
    }

    #[test]
    fn logarithmes() {
        let ln2 = Forme::atome(Atome::LogPremier(BigInt::from(2)));
        assert_eq!(lit(&ln2, 15), "0.693147180559945");
        let ln7 = Forme::atome(Atome::LogPremier(BigInt::from(7)));
        assert_eq!(lit(&ln7, 12), "1.94591014906");
    }

    #[test]
    fn arrondi_demi_vers_le_haut() {
        // 2/3 -> 0.6667 ; -2/3 -> -0.6667 ; 1/8 -> 0.13 (2 chiffres)
        assert_eq!(lit(&Forme::rationnel(rat(2, 3)), 4), "0.6667");
        assert_eq!(lit(&Forme::rationnel(rat(-2, 3)), 4), "-0.6667");
        assert_eq!(lit(&Forme::rationnel(rat(1, 8)), 2), "0.13");
        // 9.96 à 2 chiffres -> 10
        assert_eq!(lit(&Forme::rationnel(rat(996, 100)), 2), "10");
        assert_eq!(lit(&Forme::entier(1234), 2), "1200");
    }

    #[test]
    fn petites_valeurs() {
        // 10^-30 : la précision remonte
        let f = Forme::rationnel(BigRational::new(BigInt::one(), pow10(30)));
        assert_eq!(lit(&f, 3), "0.00000000000000000000000000000100");
    }

    #[test]
    fn complexes() {
        let mu = Forme::un()
            .plus(&Forme::i())
            .fois(&Forme::racine(&rat(1, 2)).unwrap());
        assert_eq!(lit(&mu, 6), "0.707107 + 0.707107i");
        assert_eq!(lit(&Forme::i().oppose(), 3), "-1.00i");
        assert_eq!(
            lit(&Forme::entier(2).moins(&Forme::i()), 2),
            "2.0 - 1.0i"
        );
    }

    #[test]
    fn variable_libre_refusee() {
        let x = Forme::atome(Atome::Var("x".into()));
        assert!(matches!(
            lecture_decimale(&x, 10),
            Err(EngineError::Unsimplifiable(_))
        ));
    }
}
