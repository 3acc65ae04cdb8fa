// src/noyau/expr.rs
//
// AST exact (sans flottants).
// - Rat : rationnel exact
// - Pi  : symbole π
// - I   : unité imaginaire
// - Var : variable symbolique (constante du registre ou variable libre)
// - Integrale : intégrale définie ∫ₐᵇ f(t) dt (variable liée)
//
// L’AST est une valeur : aucune opération ne le modifie, chaque réécriture
// produit un nouvel arbre. La simplification vit dans forme.rs / eval.rs.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    Rat(BigRational),
    Pi,
    I,

    Var(String),

    Sqrt(Box<Expr>),        // √(x)
    PowInt(Box<Expr>, i64), // x^n (n entier)

    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Tan(Box<Expr>),
    Exp(Box<Expr>),
    Log(Box<Expr>), // logarithme naturel

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),

    Integrale {
        integrande: Box<Expr>,
        var: String,
        de: Box<Expr>,
        a: Box<Expr>,
    },
}

/* ------------------------ Constructeurs ------------------------ */

impl Expr {
    pub fn entier(n: i64) -> Expr {
        Expr::Rat(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn fraction(p: i64, q: i64) -> Expr {
        Expr::Rat(BigRational::new(BigInt::from(p), BigInt::from(q)))
    }

    pub fn zero() -> Expr {
        Expr::Rat(BigRational::zero())
    }

    pub fn var(nom: &str) -> Expr {
        Expr::Var(nom.to_string())
    }

    pub fn sqrt(x: Expr) -> Expr {
        Expr::Sqrt(Box::new(x))
    }

    pub fn add(a: Expr, b: Expr) -> Expr {
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Expr {
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::Div(Box::new(a), Box::new(b))
    }

    pub fn pow(x: Expr, n: i64) -> Expr {
        Expr::PowInt(Box::new(x), n)
    }

    pub fn integrale(integrande: Expr, var: &str, de: Expr, a: Expr) -> Expr {
        Expr::Integrale {
            integrande: Box::new(integrande),
            var: var.to_string(),
            de: Box::new(de),
            a: Box::new(a),
        }
    }

    /// Zéro exact structurel (forme canonique du résidu nul).
    pub fn est_zero_exact(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_zero())
    }
}

/* ------------------------ Substitution ------------------------ */

impl Expr {
    /// Remplace chaque variable libre `nom` par `valeur`.
    /// La variable liée d’une intégrale n’est jamais remplacée dans l’intégrande.
    pub fn substitute(&self, nom: &str, valeur: &Expr) -> Expr {
        self.substitute_avec(&|v| (v == nom).then(|| valeur.clone()))
    }

    /// Substitution générale : `f(nom)` renvoie Some(remplacement) ou None (on garde).
    pub fn substitute_avec(&self, f: &dyn Fn(&str) -> Option<Expr>) -> Expr {
        use Expr::*;

        let un = |x: &Expr| Box::new(x.substitute_avec(f));

        match self {
            Rat(_) | Pi | I => self.clone(),
            Var(nom) => f(nom).unwrap_or_else(|| self.clone()),

            Sqrt(x) => Sqrt(un(x)),
            PowInt(x, n) => PowInt(un(x), *n),
            Sin(x) => Sin(un(x)),
            Cos(x) => Cos(un(x)),
            Tan(x) => Tan(un(x)),
            Exp(x) => Exp(un(x)),
            Log(x) => Log(un(x)),

            Add(a, b) => Add(un(a), un(b)),
            Sub(a, b) => Sub(un(a), un(b)),
            Mul(a, b) => Mul(un(a), un(b)),
            Div(a, b) => Div(un(a), un(b)),

            Integrale {
                integrande,
                var,
                de,
                a,
            } => {
                let lie = var.clone();
                let interieur = |v: &str| if v == lie { None } else { f(v) };
                Integrale {
                    integrande: Box::new(integrande.substitute_avec(&interieur)),
                    var: var.clone(),
                    de: un(de),
                    a: un(a),
                }
            }
        }
    }

    /// Variables libres (hors variables liées d’intégrales), ordre déterministe.
    pub fn variables_libres(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collecte_vars(self, &mut Vec::new(), &mut out);
        out
    }

    pub fn contient_var(&self, nom: &str) -> bool {
        self.variables_libres().contains(nom)
    }

    /// sin/cos/tan/exp/log d’un argument portant une variable libre, à n’importe quelle profondeur.
    pub fn contient_fonction_de_variable(&self) -> bool {
        use Expr::*;
        match self {
            Rat(_) | Pi | I | Var(_) => false,
            Sin(x) | Cos(x) | Tan(x) | Exp(x) | Log(x) => {
                !x.variables_libres().is_empty() || x.contient_fonction_de_variable()
            }
            Sqrt(x) | PowInt(x, _) => x.contient_fonction_de_variable(),
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) => {
                a.contient_fonction_de_variable() || b.contient_fonction_de_variable()
            }
            Integrale { .. } => true,
        }
    }
}

fn collecte_vars(e: &Expr, liees: &mut Vec<String>, out: &mut BTreeSet<String>) {
    use Expr::*;
    match e {
        Rat(_) | Pi | I => {}
        Var(nom) => {
            if !liees.iter().any(|l| l == nom) {
                out.insert(nom.clone());
            }
        }
        Sqrt(x) | PowInt(x, _) | Sin(x) | Cos(x) | Tan(x) | Exp(x) | Log(x) => {
            collecte_vars(x, liees, out)
        }
        Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) => {
            collecte_vars(a, liees, out);
            collecte_vars(b, liees, out);
        }
        Integrale {
            integrande,
            var,
            de,
            a,
        } => {
            collecte_vars(de, liees, out);
            collecte_vars(a, liees, out);
            liees.push(var.clone());
            collecte_vars(integrande, liees, out);
            liees.pop();
        }
    }
}

/* ------------------------ Modulo rationnel exact (sans flottants) ------------------------ */

/// Réduction modulo `periode` sur un coefficient rationnel (ex: periode=2 pour un angle en π).
/// Retourne un rationnel dans [0, periode).
///
/// Si coeff = n/d, alors coeff mod periode = (n mod (periode*d))/d.
pub(crate) fn mod_rationnel(coeff: &BigRational, periode: i64) -> BigRational {
    if periode <= 0 || coeff.is_zero() {
        return coeff.clone();
    }

    let d = coeff.denom().clone(); // denom > 0 (num_rational)
    let n = coeff.numer().clone();
    let m = BigInt::from(periode) * &d;

    let mut r = &n % &m;
    if r.is_negative() {
        r += &m;
    }
    BigRational::new(r, d)
}

/* ------------------------ Affichage debug (pas “joli” final) ------------------------ */

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expr::*;
        match self {
            Rat(r) => {
                let n = r.numer();
                let d = r.denom();
                if d.is_one() {
                    write!(f, "{n}")
                } else {
                    write!(f, "{n}/{d}")
                }
            }
            Pi => write!(f, "π"),
            I => write!(f, "i"),
            Var(s) => write!(f, "{s}"),
            Sqrt(x) => write!(f, "√({x})"),
            PowInt(x, n) => write!(f, "({x})^{n}"),
            Sin(x) => write!(f, "sin({x})"),
            Cos(x) => write!(f, "cos({x})"),
            Tan(x) => write!(f, "tan({x})"),
            Exp(x) => write!(f, "exp({x})"),
            Log(x) => write!(f, "log({x})"),
            Add(a, b) => write!(f, "({a}+{b})"),
            Sub(a, b) => write!(f, "({a}-{b})"),
            Mul(a, b) => write!(f, "({a}*{b})"),
            Div(a, b) => write!(f, "({a}/{b})"),
            Integrale {
                integrande,
                var,
                de,
                a,
            } => write!(f, "∫[{de},{a}]({integrande})d{var}"),
        }
    }
}
