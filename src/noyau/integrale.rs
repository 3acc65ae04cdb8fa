// src/noyau/integrale.rs
//
// Intégrales définies exactes ∫ₐᵇ f(t) dt, f de la forme
//     Σ c · tᵐ · Π sin/cos(ω t + φ)     (c, ω, φ indépendants de t, m ≥ 0)
//
// 1) chaque terme de la forme normale est découpé : coefficient / tᵐ / ondes
// 2) produit d’ondes -> somme d’ondes simples (produit en somme)
//    une onde de pulsation nulle devient la constante sin(φ) ou cos(φ)
// 3) primitive exacte : règle des puissances, ou intégration par parties répétée
// 4) évaluation aux bornes par la table trig exacte
//
// Les variables libres au dénominateur (ω = 4πf, …) sont supposées non nulles.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

use super::eval::normalise;
use super::forme::{Atome, Cle, Fonction, Forme, Monome};
use super::trig::{cosinus, sinus};
use crate::erreurs::{EngineError, Result};

/// sin(ω t + φ) ou cos(ω t + φ)
#[derive(Clone, Debug, PartialEq)]
struct Onde {
    sinus: bool,
    omega: Forme,
    phi: Forme,
}

impl Onde {
    fn valeur_en(&self, t: &Forme) -> Result<Forme> {
        let angle = self.omega.fois(t).plus(&self.phi);
        if self.sinus {
            sinus(&angle)
        } else {
            cosinus(&angle)
        }
    }
}

fn non_reductible(msg: impl Into<String>) -> EngineError {
    EngineError::Unsimplifiable(format!("intégrale : {}", msg.into()))
}

/// ∫_de^a integrande d(var), exact.
pub fn reduit(integrande: &Forme, var: &str, de: &Forme, a: &Forme) -> Result<Forme> {
    let mut total = Forme::zero();

    for (cle, c) in integrande.termes() {
        let (coeff, m, ondes) = decoupe(cle, c, var)?;

        for (k, onde) in produit_en_somme(&ondes)? {
            let partiel = match onde {
                None => puissance_definie(m, de, a)?,
                Some(o) => onde_definie(m, &o, de, a)?,
            };
            total = total.plus(&partiel.fois(&k).fois(&coeff));
        }
    }

    tracing::debug!(var, termes = total.nb_termes(), "intégrale réduite");
    Ok(total)
}

/// Terme c·√n·monôme -> (partie constante en t, m, ondes)
fn decoupe(cle: &Cle, c: &BigRational, var: &str) -> Result<(Forme, u32, Vec<Onde>)> {
    let t = Atome::Var(var.to_string());
    let mut reste = Monome::new();
    let mut m: u32 = 0;
    let mut ondes = Vec::new();

    for (atome, e) in &cle.monome {
        if *atome == t {
            m = u32::try_from(*e).map_err(|_| non_reductible(format!("{var}^{e}")))?;
            continue;
        }
        if !atome.contient_var(var) {
            reste.insert(atome.clone(), *e);
            continue;
        }

        let (sinus, u) = match atome {
            Atome::Fonction(Fonction::Sin, u) => (true, u),
            Atome::Fonction(Fonction::Cos, u) => (false, u),
            _ => return Err(non_reductible("facteur hors sin/cos polynomial")),
        };
        let k = usize::try_from(*e).map_err(|_| non_reductible("puissance négative d’une onde"))?;

        let (omega, phi) = lineaire(&normalise(u)?, var)?;
        for _ in 0..k {
            ondes.push(Onde {
                sinus,
                omega: omega.clone(),
                phi: phi.clone(),
            });
        }
    }

    let coeff = Forme::terme(reste, cle.radicande.clone(), c.clone());
    Ok((coeff, m, ondes))
}

/// u = ω·t + φ, ω et φ indépendants de t.
fn lineaire(u: &Forme, var: &str) -> Result<(Forme, Forme)> {
    let t = Atome::Var(var.to_string());
    let mut omega = Forme::zero();
    let mut phi = Forme::zero();

    for (cle, c) in u.termes() {
        let mut monome = cle.monome.clone();
        let e = monome.remove(&t).unwrap_or(0);
        if monome.keys().any(|a| a.contient_var(var)) {
            return Err(non_reductible("argument non linéaire"));
        }
        let terme = Forme::terme(monome, cle.radicande.clone(), c.clone());
        match e {
            0 => phi = phi.plus(&terme),
            1 => omega = omega.plus(&terme),
            _ => return Err(non_reductible("argument non linéaire")),
        }
    }
    Ok((omega, phi))
}

/// Π ondes -> Σ kᵢ · ondeᵢ (None = constante 1).
fn produit_en_somme(ondes: &[Onde]) -> Result<Vec<(Forme, Option<Onde>)>> {
    let mut somme: Vec<(Forme, Option<Onde>)> = vec![(Forme::un(), None)];

    for b in ondes {
        let mut suivante = Vec::new();
        for (k, a) in somme {
            match a {
                None => suivante.push((k, Some(b.clone()))),
                Some(a) => {
                    for (s, o) in produit_deux(&a, b) {
                        suivante.push((k.echelle(&s), Some(o)));
                    }
                }
            }
        }
        somme = suivante
            .into_iter()
            .map(|(k, o)| match o {
                Some(o) if o.omega.est_zero() => Ok((k.fois(&o.valeur_en(&Forme::zero())?), None)),
                autre => Ok((k, autre)),
            })
            .collect::<Result<_>>()?;
    }

    Ok(somme)
}

/// sin A sin B = ½[cos(A-B) - cos(A+B)]
/// cos A cos B = ½[cos(A-B) + cos(A+B)]
/// sin A cos B = ½[sin(A+B) + sin(A-B)]
/// cos A sin B = ½[sin(A+B) - sin(A-B)]
fn produit_deux(a: &Onde, b: &Onde) -> [(BigRational, Onde); 2] {
    let demi = BigRational::new(BigInt::one(), BigInt::from(2));
    let onde = |sinus: bool, somme: bool| Onde {
        sinus,
        omega: if somme {
            a.omega.plus(&b.omega)
        } else {
            a.omega.moins(&b.omega)
        },
        phi: if somme {
            a.phi.plus(&b.phi)
        } else {
            a.phi.moins(&b.phi)
        },
    };

    match (a.sinus, b.sinus) {
        (true, true) => [
            (demi.clone(), onde(false, false)),
            (-demi, onde(false, true)),
        ],
        (false, false) => [
            (demi.clone(), onde(false, false)),
            (demi, onde(false, true)),
        ],
        (true, false) => [
            (demi.clone(), onde(true, true)),
            (demi, onde(true, false)),
        ],
        (false, true) => [
            (demi.clone(), onde(true, true)),
            (-demi, onde(true, false)),
        ],
    }
}

/// ∫_de^a tᵐ dt = (a^(m+1) - de^(m+1)) / (m+1)
fn puissance_definie(m: u32, de: &Forme, a: &Forme) -> Result<Forme> {
    let n = i64::from(m) + 1;
    let diff = a.pow(n)?.moins(&de.pow(n)?);
    Ok(diff.echelle(&BigRational::new(BigInt::one(), BigInt::from(n))))
}

/// ∫_de^a tᵐ·onde(t) dt par parties :
///   ∫ tᵐ sin = [-tᵐ cos / ω] + (m/ω) ∫ tᵐ⁻¹ cos
///   ∫ tᵐ cos = [ tᵐ sin / ω] - (m/ω) ∫ tᵐ⁻¹ sin
fn onde_definie(m: u32, onde: &Onde, de: &Forme, a: &Forme) -> Result<Forme> {
    let omega_inv = onde.omega.inverse()?;
    let conjuguee = Onde {
        sinus: !onde.sinus,
        ..onde.clone()
    };

    let bord = |t: &Forme| -> Result<Forme> {
        Ok(t.pow(i64::from(m))?.fois(&conjuguee.valeur_en(t)?))
    };
    let crochet = bord(a)?.moins(&bord(de)?).fois(&omega_inv);

    let recursion = if m == 0 {
        Forme::zero()
    } else {
        onde_definie(m - 1, &conjuguee, de, a)?
            .fois(&omega_inv)
            .echelle(&BigRational::from_integer(BigInt::from(m)))
    };

    Ok(if onde.sinus {
        crochet.oppose().plus(&recursion)
    } else {
        crochet.moins(&recursion)
    })
}
