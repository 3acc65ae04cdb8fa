// src/verif/numerique.rs
//
// Contre-vérification flottante : évaluation complexe double précision,
// indépendante du noyau exact (aucun appel à normalise / simplify).
// - variables libres liées par échantillon (x, f, t…)
// - intégrales définies par Simpson composite
// - hors domaine : même classe d’erreur que le noyau (Domain)

use std::collections::BTreeMap;
use std::f64::consts::PI;

use num_complex::Complex64;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};

use crate::erreurs::{EngineError, Result};
use crate::noyau::Expr;

/// Valeurs des variables libres pour un échantillon.
pub type Liaisons = BTreeMap<String, f64>;

/// En dessous : zéro numérique (pôle de tan, division, partie imaginaire parasite).
pub const ZERO_NUMERIQUE: f64 = 1e-12;

/// Nombre de panneaux Simpson par défaut (pair).
pub const PANNEAUX_DEFAUT: usize = 2048;

/* ------------------------ Valeur numérique ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumericValue(pub Complex64);

impl NumericValue {
    pub fn reel(x: f64) -> Self {
        NumericValue(Complex64::new(x, 0.0))
    }

    pub fn re(&self) -> f64 {
        self.0.re
    }

    pub fn im(&self) -> f64 {
        self.0.im
    }

    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }

    /// Phase en degrés dans ]-180, 180].
    pub fn phase_degrees(&self) -> f64 {
        self.0.arg().to_degrees()
    }

    /// (module, phase en degrés)
    pub fn polar(&self) -> (f64, f64) {
        (self.magnitude(), self.phase_degrees())
    }

    pub fn est_reel(&self) -> bool {
        self.0.im.abs() <= ZERO_NUMERIQUE * self.0.re.abs().max(1.0)
    }
}

impl From<Complex64> for NumericValue {
    fn from(z: Complex64) -> Self {
        NumericValue(z)
    }
}

impl Serialize for NumericValue {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut st = s.serialize_struct("NumericValue", 2)?;
        st.serialize_field("re", &self.0.re)?;
        st.serialize_field("im", &self.0.im)?;
        st.end()
    }
}

/* ------------------------ Évaluateur ------------------------ */

pub trait NumericEvaluator {
    fn evaluate(&self, e: &Expr, liaisons: &Liaisons) -> Result<NumericValue>;
}

#[derive(Clone, Debug)]
pub struct EvaluateurFlottant {
    pub panneaux: usize,
}

impl Default for EvaluateurFlottant {
    fn default() -> Self {
        Self {
            panneaux: PANNEAUX_DEFAUT,
        }
    }
}

impl NumericEvaluator for EvaluateurFlottant {
    fn evaluate(&self, e: &Expr, liaisons: &Liaisons) -> Result<NumericValue> {
        let z = self.eval(e, liaisons)?;
        if !z.re.is_finite() || !z.im.is_finite() {
            return Err(EngineError::Domain(format!("valeur non finie: {e}")));
        }
        Ok(NumericValue(z))
    }
}

fn hors_domaine(msg: impl Into<String>) -> EngineError {
    EngineError::Domain(msg.into())
}

fn est_nul(z: Complex64) -> bool {
    z.norm() < ZERO_NUMERIQUE
}

/// Partie réelle si la valeur est réelle (imaginaire parasite toléré).
fn reel(z: Complex64, quoi: &str) -> Result<f64> {
    if NumericValue(z).est_reel() {
        Ok(z.re)
    } else {
        Err(hors_domaine(format!("{quoi} : argument complexe {z}")))
    }
}

impl EvaluateurFlottant {
    fn eval(&self, e: &Expr, env: &Liaisons) -> Result<Complex64> {
        use Expr::*;

        Ok(match e {
            Rat(r) => Complex64::new(
                r.to_f64()
                    .ok_or_else(|| hors_domaine(format!("rationnel hors f64: {r}")))?,
                0.0,
            ),
            Pi => Complex64::new(PI, 0.0),
            I => Complex64::i(),
            Var(nom) => Complex64::new(
                *env
                    .get(nom)
                    .ok_or_else(|| hors_domaine(format!("variable non liée: {nom}")))?,
                0.0,
            ),

            Sqrt(x) => {
                let v = reel(self.eval(x, env)?, "sqrt")?;
                if v < 0.0 {
                    return Err(hors_domaine(format!("sqrt({v})")));
                }
                Complex64::new(v.sqrt(), 0.0)
            }
            PowInt(x, n) => {
                let v = self.eval(x, env)?;
                if *n < 0 && est_nul(v) {
                    return Err(hors_domaine("0 à une puissance négative"));
                }
                let n = i32::try_from(*n).map_err(|_| hors_domaine(format!("exposant {n}")))?;
                v.powi(n)
            }

            Sin(x) => self.eval(x, env)?.sin(),
            Cos(x) => self.eval(x, env)?.cos(),
            Tan(x) => {
                let v = self.eval(x, env)?;
                let c = v.cos();
                if est_nul(c) {
                    return Err(hors_domaine(format!("tan : pôle en {v}")));
                }
                v.sin() / c
            }
            Exp(x) => self.eval(x, env)?.exp(),
            Log(x) => {
                let v = reel(self.eval(x, env)?, "log")?;
                if v <= 0.0 {
                    return Err(hors_domaine(format!("log({v})")));
                }
                Complex64::new(v.ln(), 0.0)
            }

            Add(a, b) => self.eval(a, env)? + self.eval(b, env)?,
            Sub(a, b) => self.eval(a, env)? - self.eval(b, env)?,
            Mul(a, b) => self.eval(a, env)? * self.eval(b, env)?,
            Div(a, b) => {
                let d = self.eval(b, env)?;
                if est_nul(d) {
                    return Err(hors_domaine("division par zéro"));
                }
                self.eval(a, env)? / d
            }

            Integrale {
                integrande,
                var,
                de,
                a,
            } => {
                let bas = reel(self.eval(de, env)?, "borne")?;
                let haut = reel(self.eval(a, env)?, "borne")?;
                self.simpson(integrande, var, bas, haut, env)?
            }
        })
    }

    fn simpson(&self, f: &Expr, var: &str, a: f64, b: f64, env: &Liaisons) -> Result<Complex64> {
        let n = (self.panneaux.max(2) + 1) & !1;
        let h = (b - a) / n as f64;

        let mut local = env.clone();
        let mut en = |t: f64| -> Result<Complex64> {
            local.insert(var.to_string(), t);
            self.eval(f, &local)
        };

        let mut somme = en(a)? + en(b)?;
        for k in 1..n {
            let poids = if k % 2 == 1 { 4.0 } else { 2.0 };
            somme += en(a + h * k as f64)? * poids;
        }
        Ok(somme * (h / 3.0))
    }
}
