// src/noyau/forme.rs
//
// Forme normale exacte : Σ coeff · √n · monôme
// - coeff     : rationnel exact (jamais nul dans la table)
// - √n        : n entier signé sans facteur carré (1 = partie rationnelle, -1 = i)
// - monôme    : produit d’atomes à exposants entiers non nuls
//               (π, log p, variables libres, sin/cos/exp/log d’un argument symbolique)
//
// Deux expressions égales dans ce domaine ont la même Forme (BTreeMap => ordre total).
// Règles appliquées à chaque produit :
// - √a·√b = ±g·√(ab/g²)   (g = pgcd, signe - si a<0 et b<0)
// - cos(u)^k, k ≥ 2       -> cos(u)^(k-2)·(1 - sin(u)²)   (donc sin² + cos² s’annule)
//
// Limite : l’inverse n’existe que si tous les termes partagent un même monôme
// (1/(√2 + √3) se calcule, 1/(1 + π) ou 1/(x + 1) donnent Unsimplifiable).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::expr::Expr;
use crate::erreurs::{EngineError, Result};

/// Fonctions gardées comme atomes quand leur argument porte une variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fonction {
    Sin,
    Cos,
    Exp,
    Log,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Atome {
    Pi,
    LogPremier(BigInt),
    Var(String),
    Fonction(Fonction, Box<Expr>), // argument déjà canonique
}

impl Atome {
    pub fn contient_var(&self, nom: &str) -> bool {
        match self {
            Atome::Var(v) => v == nom,
            Atome::Fonction(_, u) => u.contient_var(nom),
            Atome::Pi | Atome::LogPremier(_) => false,
        }
    }

    fn est_symbolique(&self) -> bool {
        matches!(self, Atome::Var(_) | Atome::Fonction(_, _))
    }
}

pub type Monome = BTreeMap<Atome, i64>;

/// Radicande sans facteur carré. Ordre : |n| puis signe (1, i, √2, i√2, √3, …).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Radicande(pub BigInt);

impl Radicande {
    pub fn un() -> Self {
        Radicande(BigInt::one())
    }

    pub fn est_un(&self) -> bool {
        self.0.is_one()
    }

    pub fn est_imaginaire(&self) -> bool {
        self.0.is_negative()
    }
}

impl Ord for Radicande {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .abs()
            .cmp(&other.0.abs())
            .then_with(|| self.0.is_negative().cmp(&other.0.is_negative()))
    }
}

impl PartialOrd for Radicande {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cle {
    pub monome: Monome,
    pub radicande: Radicande,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Forme {
    termes: BTreeMap<Cle, BigRational>,
}

/* ------------------------ Constructeurs ------------------------ */

impl Forme {
    pub fn zero() -> Forme {
        Forme::default()
    }

    pub fn un() -> Forme {
        Forme::rationnel(BigRational::one())
    }

    pub fn rationnel(r: BigRational) -> Forme {
        Forme::terme(Monome::new(), Radicande::un(), r)
    }

    pub fn entier(n: i64) -> Forme {
        Forme::rationnel(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn i() -> Forme {
        Forme::terme(Monome::new(), Radicande(BigInt::from(-1)), BigRational::one())
    }

    pub fn atome(a: Atome) -> Forme {
        let mut m = Monome::new();
        m.insert(a, 1);
        Forme::terme(m, Radicande::un(), BigRational::one())
    }

    pub fn terme(monome: Monome, radicande: Radicande, coeff: BigRational) -> Forme {
        let mut f = Forme::zero();
        f.ajoute(Cle { monome, radicande }, coeff);
        f
    }

    /// √r exact pour r rationnel ≥ 0 : √(a/b) = √(ab)/b, puis extraction des carrés.
    pub fn racine(r: &BigRational) -> Result<Forme> {
        if r.is_negative() {
            return Err(EngineError::Domain(format!(
                "√({}) : argument négatif",
                Expr::Rat(r.clone())
            )));
        }
        if r.is_zero() {
            return Ok(Forme::zero());
        }
        let ab = r.numer() * r.denom();
        let (s, t) = extrait_carre_parfait(&ab);
        let coeff = BigRational::new(s, r.denom().clone());
        Ok(Forme::terme(Monome::new(), Radicande(t), coeff))
    }

    fn ajoute(&mut self, cle: Cle, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        let somme = match self.termes.remove(&cle) {
            Some(c) => c + coeff,
            None => coeff,
        };
        if !somme.is_zero() {
            self.termes.insert(cle, somme);
        }
    }
}

/* ------------------------ Lecture ------------------------ */

impl Forme {
    pub fn termes(&self) -> impl Iterator<Item = (&Cle, &BigRational)> {
        self.termes.iter()
    }

    pub fn nb_termes(&self) -> usize {
        self.termes.len()
    }

    pub fn est_zero(&self) -> bool {
        self.termes.is_empty()
    }

    pub fn comme_rationnel(&self) -> Option<BigRational> {
        match self.termes.len() {
            0 => Some(BigRational::zero()),
            1 => {
                let (cle, c) = self.termes.iter().next()?;
                (cle.monome.is_empty() && cle.radicande.est_un()).then(|| c.clone())
            }
            _ => None,
        }
    }

    /// q si la forme vaut exactement q·π (0 compris).
    pub fn comme_coeff_pi(&self) -> Option<BigRational> {
        self.comme_coeff_pi_sur(&Radicande::un())
    }

    /// q si la forme vaut exactement i·q·π (0 compris).
    pub fn comme_i_coeff_pi(&self) -> Option<BigRational> {
        self.comme_coeff_pi_sur(&Radicande(BigInt::from(-1)))
    }

    fn comme_coeff_pi_sur(&self, radicande: &Radicande) -> Option<BigRational> {
        match self.termes.len() {
            0 => Some(BigRational::zero()),
            1 => {
                let (cle, c) = self.termes.iter().next()?;
                (cle.radicande == *radicande && est_pi_seul(&cle.monome)).then(|| c.clone())
            }
            _ => None,
        }
    }

    /// Aucune variable libre ni fonction symbolique.
    pub fn est_constante(&self) -> bool {
        self.termes
            .keys()
            .all(|k| k.monome.keys().all(|a| !a.est_symbolique()))
    }

    pub fn contient_var(&self, nom: &str) -> bool {
        self.termes
            .keys()
            .any(|k| k.monome.keys().any(|a| a.contient_var(nom)))
    }

    /// Signe du premier terme (ordre canonique) : sert à la parité sin(-u) = -sin(u).
    pub fn premier_coeff_negatif(&self) -> bool {
        self.termes
            .values()
            .next()
            .map(|c| c.is_negative())
            .unwrap_or(false)
    }

    /// Sépare (partie réelle, partie imaginaire / i).
    pub fn parties_reelle_imaginaire(&self) -> (Forme, Forme) {
        let mut re = Forme::zero();
        let mut im = Forme::zero();
        for (cle, c) in &self.termes {
            if cle.radicande.est_imaginaire() {
                let n = -cle.radicande.0.clone();
                im.ajoute(
                    Cle {
                        monome: cle.monome.clone(),
                        radicande: Radicande(n),
                    },
                    c.clone(),
                );
            } else {
                re.ajoute(cle.clone(), c.clone());
            }
        }
        (re, im)
    }

    /// Retire le terme q·π (radicande 1) et le renvoie à part.
    pub fn separe_pi(&self) -> (Forme, BigRational) {
        let mut reste = self.clone();
        let cle_pi = Cle {
            monome: monome_pi(),
            radicande: Radicande::un(),
        };
        let q = reste.termes.remove(&cle_pi).unwrap_or_else(BigRational::zero);
        (reste, q)
    }

    /// Sépare les termes constants des termes symboliques : (constante, symbolique).
    pub fn separe_constante(&self) -> (Forme, Forme) {
        let mut constante = Forme::zero();
        let mut symbolique = Forme::zero();
        for (cle, c) in &self.termes {
            if cle.monome.keys().any(Atome::est_symbolique) {
                symbolique.ajoute(cle.clone(), c.clone());
            } else {
                constante.ajoute(cle.clone(), c.clone());
            }
        }
        (constante, symbolique)
    }
}

/// Borne des exposants entiers calculés exactement.
pub const EXPOSANT_MAX: u64 = 10_000;

fn monome_pi() -> Monome {
    let mut m = Monome::new();
    m.insert(Atome::Pi, 1);
    m
}

fn est_pi_seul(m: &Monome) -> bool {
    m.len() == 1 && m.get(&Atome::Pi) == Some(&1)
}

/* ------------------------ Arithmétique ------------------------ */

impl Forme {
    pub fn plus(&self, autre: &Forme) -> Forme {
        let mut out = self.clone();
        for (cle, c) in &autre.termes {
            out.ajoute(cle.clone(), c.clone());
        }
        out
    }

    pub fn oppose(&self) -> Forme {
        Forme {
            termes: self
                .termes
                .iter()
                .map(|(k, c)| (k.clone(), -c.clone()))
                .collect(),
        }
    }

    pub fn moins(&self, autre: &Forme) -> Forme {
        self.plus(&autre.oppose())
    }

    pub fn echelle(&self, r: &BigRational) -> Forme {
        if r.is_zero() {
            return Forme::zero();
        }
        Forme {
            termes: self
                .termes
                .iter()
                .map(|(k, c)| (k.clone(), c * r))
                .collect(),
        }
    }

    pub fn fois(&self, autre: &Forme) -> Forme {
        self.fois_brut(autre).reduit_pythagore()
    }

    fn fois_brut(&self, autre: &Forme) -> Forme {
        let mut out = Forme::zero();
        for (ka, ca) in &self.termes {
            for (kb, cb) in &autre.termes {
                let monome = produit_monomes(&ka.monome, &kb.monome);
                let (g, r) = produit_radicaux(&ka.radicande.0, &kb.radicande.0);
                let coeff = ca * cb * BigRational::from_integer(g);
                out.ajoute(
                    Cle {
                        monome,
                        radicande: Radicande(r),
                    },
                    coeff,
                );
            }
        }
        out
    }

    /// x^n, |n| ≤ EXPOSANT_MAX (au-delà : Unsimplifiable).
    pub fn pow(&self, n: i64) -> Result<Forme> {
        let e = n.unsigned_abs();
        if e > EXPOSANT_MAX {
            return Err(EngineError::Unsimplifiable(format!("exposant {n} hors borne")));
        }
        if n < 0 {
            return self.inverse()?.pow_naturel(e);
        }
        self.pow_naturel(e)
    }

    fn pow_naturel(&self, mut e: u64) -> Result<Forme> {
        let mut acc = Forme::un();
        let mut b = self.clone();
        while e > 0 {
            if (e & 1) == 1 {
                acc = acc.fois(&b);
            }
            e >>= 1;
            if e > 0 {
                b = b.fois(&b);
            }
        }
        Ok(acc)
    }

    /// Inverse exact.
    /// - un seul monôme commun m : 1/(m·x) = m⁻¹ · 1/x, x dans Q(√n₁, √n₂, …)
    /// - 1/x par conjugaisons successives (une par premier des radicandes, -1 compris)
    pub fn inverse(&self) -> Result<Forme> {
        if self.est_zero() {
            return Err(EngineError::Domain("division par zéro".into()));
        }

        let monome = match self.termes.keys().next() {
            Some(k) => k.monome.clone(),
            None => return Err(EngineError::Domain("division par zéro".into())),
        };
        if self.termes.keys().any(|k| k.monome != monome) {
            return Err(EngineError::Unsimplifiable(
                "inverse d’une somme de monômes distincts".into(),
            ));
        }

        let mut x = Forme::zero();
        for (cle, c) in &self.termes {
            x.ajoute(
                Cle {
                    monome: Monome::new(),
                    radicande: cle.radicande.clone(),
                },
                c.clone(),
            );
        }

        let mut num = Forme::un();
        for p in premiers_des_radicandes(&x) {
            let c = x.conjugue(&p);
            num = num.fois_brut(&c);
            x = x.fois_brut(&c);
        }

        let norme = x.comme_rationnel().ok_or_else(|| {
            EngineError::Unsimplifiable("norme non rationnelle après conjugaisons".into())
        })?;
        if norme.is_zero() {
            return Err(EngineError::Domain("division par zéro".into()));
        }

        let inv_monome: Monome = monome.into_iter().map(|(a, e)| (a, -e)).collect();
        let facteur = Forme::terme(inv_monome, Radicande::un(), BigRational::one());

        Ok(num.echelle(&(BigRational::one() / norme)).fois(&facteur))
    }

    /// Automorphisme √n -> -√n pour tout n divisible par p (p = -1 : conjugaison complexe).
    fn conjugue(&self, p: &BigInt) -> Forme {
        let touche = |n: &BigInt| {
            if p == &BigInt::from(-1) {
                n.is_negative()
            } else {
                (n.abs() % p).is_zero()
            }
        };
        Forme {
            termes: self
                .termes
                .iter()
                .map(|(k, c)| {
                    if touche(&k.radicande.0) {
                        (k.clone(), -c.clone())
                    } else {
                        (k.clone(), c.clone())
                    }
                })
                .collect(),
        }
    }

    /// cos(u)^k (k ≥ 2) -> cos(u)^(k-2) · (1 - sin(u)²), jusqu’à épuisement.
    fn reduit_pythagore(self) -> Forme {
        let a_reduire = |m: &Monome| {
            m.iter().find_map(|(a, e)| match a {
                Atome::Fonction(Fonction::Cos, u) if *e >= 2 => Some(u.clone()),
                _ => None,
            })
        };

        if !self.termes.keys().any(|k| a_reduire(&k.monome).is_some()) {
            return self;
        }

        let mut pile: Vec<(Cle, BigRational)> = self.termes.into_iter().collect();
        let mut out = Forme::zero();

        while let Some((cle, c)) = pile.pop() {
            let Some(u) = a_reduire(&cle.monome) else {
                out.ajoute(cle, c);
                continue;
            };

            let cos_u = Atome::Fonction(Fonction::Cos, u.clone());
            let sin_u = Atome::Fonction(Fonction::Sin, u);

            let mut m = cle.monome.clone();
            decale_exposant(&mut m, cos_u, -2);

            let mut m_sin = m.clone();
            decale_exposant(&mut m_sin, sin_u, 2);

            pile.push((
                Cle {
                    monome: m,
                    radicande: cle.radicande.clone(),
                },
                c.clone(),
            ));
            pile.push((
                Cle {
                    monome: m_sin,
                    radicande: cle.radicande,
                },
                -c,
            ));
        }

        out
    }
}

fn decale_exposant(m: &mut Monome, a: Atome, de: i64) {
    let e = m.get(&a).copied().unwrap_or(0) + de;
    if e == 0 {
        m.remove(&a);
    } else {
        m.insert(a, e);
    }
}

fn produit_monomes(a: &Monome, b: &Monome) -> Monome {
    let mut out = a.clone();
    for (atome, e) in b {
        decale_exposant(&mut out, atome.clone(), *e);
    }
    out
}

/// √a · √b = g·√r pour a, b sans facteur carré (signés). Renvoie (g, r).
fn produit_radicaux(a: &BigInt, b: &BigInt) -> (BigInt, BigInt) {
    if a.is_one() {
        return (BigInt::one(), b.clone());
    }
    if b.is_one() {
        return (BigInt::one(), a.clone());
    }
    let g = pgcd(&a.abs(), &b.abs());
    let r = (a * b) / (&g * &g);
    let signe = if a.is_negative() && b.is_negative() {
        -BigInt::one()
    } else {
        BigInt::one()
    };
    (g * signe, r)
}

fn premiers_des_radicandes(x: &Forme) -> BTreeSet<BigInt> {
    let mut out = BTreeSet::new();
    for cle in x.termes.keys() {
        let n = &cle.radicande.0;
        if n.is_negative() {
            out.insert(BigInt::from(-1));
        }
        for (p, _) in factorise(&n.abs()) {
            out.insert(p);
        }
    }
    out
}

/* ------------------------ Arithmétique entière ------------------------ */

pub(crate) fn pgcd(a: &BigInt, b: &BigInt) -> BigInt {
    let mut a = a.abs();
    let mut b = b.abs();
    while !b.is_zero() {
        let t = &a % &b;
        a = b;
        b = t;
    }
    a
}

/// Au-delà, le cofacteur restant est gardé tel quel (traité comme premier).
const BORNE_ESSAIS: u64 = 1_000_000;

/// Factorisation par essais : [(p, multiplicité)], n > 0.
pub(crate) fn factorise(n: &BigInt) -> Vec<(BigInt, u32)> {
    let mut out = Vec::new();
    if n <= &BigInt::one() {
        return out;
    }

    let mut reste = n.clone();
    let mut p = BigInt::from(2);
    let borne = BigInt::from(BORNE_ESSAIS);

    while &p * &p <= reste && p <= borne {
        let mut k = 0u32;
        while (&reste % &p).is_zero() {
            reste /= &p;
            k += 1;
        }
        if k > 0 {
            out.push((p.clone(), k));
        }
        if p == BigInt::from(2) {
            p = BigInt::from(3);
        } else {
            p += 2;
        }
    }

    if reste > BigInt::one() {
        out.push((reste, 1));
    }
    out
}

/// Décompose n >= 0 en n = s^2 * t, avec t sans facteur carré.
pub(crate) fn extrait_carre_parfait(n: &BigInt) -> (BigInt, BigInt) {
    if n.is_zero() {
        return (BigInt::zero(), BigInt::zero());
    }

    let mut s = BigInt::one();
    let mut t = BigInt::one();
    for (p, k) in factorise(n) {
        s *= p.pow(k / 2);
        if k % 2 == 1 {
            t *= p;
        }
    }
    (s, t)
}
