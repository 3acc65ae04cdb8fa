// src/noyau/rpn.rs
//
// Shunting-yard -> RPN -> AST
// Objectif:
// - Convertir une suite de Tok en RPN (postfix)
// - Puis reconstruire Expr
//
// Règles:
// - Ident(name):
//    - si name ∈ {sin, cos, tan, sqrt, exp, log, ln} => fonction unaire
//    - si name == int => intégrale définie int(f, t, a, b) (4 arguments)
//    - si name == i => unité imaginaire
//    - sinon => variable/atome (Expr::Var)
// - Moins unaire:
//    - si '-' arrive quand on n’attend PAS une valeur, c’est Neg (préfixe),
//      plus fort que * et / mais plus faible que ^ : "-2^2" = -(2^2), "2^-1*3" = (2^-1)*3
//    - Neg x est reconstruit en Sub(0, x)
// - Degré: '°' est postfixe, il s’applique à la valeur qui précède (x° = x·π/180)
//
// NOTE:
// - Les fonctions sont traitées comme des opérateurs “collés” à leur argument
//   et sont sorties après la parenthèse fermante.

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};

use super::expr::Expr;
use super::jetons::{format_tokens, tokenize, Tok};
use crate::erreurs::{EngineError, Result};

fn err(msg: impl Into<String>) -> EngineError {
    EngineError::Parse(msg.into())
}

fn precedence(t: &Tok) -> i32 {
    match t {
        Tok::Plus | Tok::Minus => 10,
        Tok::Star | Tok::Slash => 20,
        Tok::Neg => 25,
        Tok::Caret => 30,
        _ => 0,
    }
}

fn is_right_associative(t: &Tok) -> bool {
    matches!(t, Tok::Caret | Tok::Neg)
}

/// Arité des identificateurs reconnus comme fonctions (None => pas une fonction).
fn arite_fonction(name: &str) -> Option<usize> {
    match name.to_ascii_lowercase().as_str() {
        "sin" | "cos" | "tan" | "sqrt" | "exp" | "log" | "ln" => Some(1),
        "int" => Some(4),
        _ => None,
    }
}

fn is_fonction_ident(name: &str) -> bool {
    arite_fonction(name).is_some()
}

/// Pipeline complet texte -> Expr (non simplifiée).
pub fn parse_expr(s: &str) -> Result<Expr> {
    let s = s.trim();
    if s.is_empty() {
        return Err(err("entrée vide"));
    }
    let jetons = tokenize(s)?;
    let rpn = to_rpn(&jetons)?;
    tracing::trace!(entree = s, rpn = %format_tokens(&rpn), "expression lue");
    from_rpn(&rpn)
}

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Ident("sin"), LPar, Pi, Slash, Num(2), RPar]
///   rpn:    [Pi, Num(2), Slash, Ident("sin")]
pub fn to_rpn(tokens: &[Tok]) -> Result<Vec<Tok>> {
    let mut out: Vec<Tok> = Vec::new();
    let mut ops: Vec<Tok> = Vec::new();

    // “valeur” = un atome ou une expression fermée.
    // Sert à détecter le moins unaire.
    let mut prev_was_value = false;

    // Dépile vers la sortie jusqu’à '(' ou une fonction (qui reste collée à son argument).
    fn bloque(top: &Tok) -> bool {
        match top {
            Tok::LPar => true,
            Tok::Ident(name) => is_fonction_ident(name),
            _ => false,
        }
    }

    for tok in tokens.iter().cloned() {
        match tok {
            Tok::Num(_) | Tok::Pi => {
                out.push(tok);
                prev_was_value = true;
            }

            Tok::Ident(name) => {
                if is_fonction_ident(&name) {
                    ops.push(Tok::Ident(name));
                    prev_was_value = false;
                } else {
                    out.push(Tok::Ident(name));
                    prev_was_value = true;
                }
            }

            Tok::Degre => {
                if !prev_was_value {
                    return Err(err("'°' sans valeur"));
                }
                out.push(Tok::Degre);
            }

            Tok::LPar => {
                ops.push(tok);
                prev_was_value = false;
            }

            Tok::Virgule => {
                // vide jusqu’à la '(' de la fonction courante (sans la retirer)
                loop {
                    match ops.last() {
                        Some(Tok::LPar) => break,
                        Some(_) => {
                            if let Some(op) = ops.pop() {
                                out.push(op);
                            }
                        }
                        None => return Err(err("virgule hors d’un appel de fonction")),
                    }
                }
                prev_was_value = false;
            }

            Tok::RPar => {
                let mut ouverte = false;
                while let Some(top) = ops.pop() {
                    if matches!(top, Tok::LPar) {
                        ouverte = true;
                        break;
                    }
                    out.push(top);
                }
                if !ouverte {
                    return Err(err("parenthèse fermante sans ouvrante"));
                }

                // si une fonction est au sommet, on la sort aussi
                if matches!(ops.last(), Some(Tok::Ident(name)) if is_fonction_ident(name)) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }

                prev_was_value = true;
            }

            Tok::Minus if !prev_was_value => {
                // préfixe : ne dépile rien
                ops.push(Tok::Neg);
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret | Tok::Neg => {
                while let Some(top) = ops.last() {
                    if bloque(top) {
                        break;
                    }

                    let p_top = precedence(top);
                    let p_tok = precedence(&tok);

                    let doit_pop = if is_right_associative(&tok) {
                        p_top > p_tok
                    } else {
                        p_top >= p_tok
                    };

                    if !doit_pop {
                        break;
                    }
                    if let Some(op) = ops.pop() {
                        out.push(op);
                    }
                }

                ops.push(tok);
                prev_was_value = false;
            }
        }
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar) {
            return Err(err("parenthèses non fermées"));
        }
        out.push(op);
    }

    Ok(out)
}

/// Construit une Expr à partir d’une RPN.
pub fn from_rpn(rpn: &[Tok]) -> Result<Expr> {
    let mut st: Vec<Expr> = Vec::new();

    let invalide = || err("expression invalide");

    for tok in rpn.iter().cloned() {
        match tok {
            Tok::Num(r) => st.push(Expr::Rat(r)),
            Tok::Pi => st.push(Expr::Pi),

            Tok::Degre => {
                let x = st.pop().ok_or_else(invalide)?;
                st.push(Expr::mul(x, Expr::div(Expr::Pi, Expr::entier(180))));
            }

            Tok::Neg => {
                let x = st.pop().ok_or_else(invalide)?;
                st.push(Expr::sub(Expr::zero(), x));
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                let b = st.pop().ok_or_else(invalide)?;
                let a = st.pop().ok_or_else(invalide)?;

                let e = match tok {
                    Tok::Plus => Expr::add(a, b),
                    Tok::Minus => Expr::sub(a, b),
                    Tok::Star => Expr::mul(a, b),
                    Tok::Slash => Expr::div(a, b),
                    _ => Expr::pow(a, exposant_entier(&b)?),
                };

                st.push(e);
            }

            Tok::Ident(name) => match arite_fonction(&name) {
                Some(4) => {
                    let a = st.pop().ok_or_else(invalide)?;
                    let de = st.pop().ok_or_else(invalide)?;
                    let var = st.pop().ok_or_else(invalide)?;
                    let f = st.pop().ok_or_else(invalide)?;
                    let Expr::Var(t) = var else {
                        return Err(err("int(f, t, a, b) : t doit être une variable"));
                    };
                    st.push(Expr::integrale(f, &t, de, a));
                }
                Some(_) => {
                    let x = Box::new(st.pop().ok_or_else(|| err("fonction sans argument"))?);
                    let e = match name.to_ascii_lowercase().as_str() {
                        "sqrt" => Expr::Sqrt(x),
                        "sin" => Expr::Sin(x),
                        "cos" => Expr::Cos(x),
                        "tan" => Expr::Tan(x),
                        "exp" => Expr::Exp(x),
                        _ => Expr::Log(x),
                    };
                    st.push(e);
                }
                None if name == "i" => st.push(Expr::I),
                None => st.push(Expr::Var(name)),
            },

            Tok::LPar | Tok::RPar | Tok::Virgule => {
                return Err(err("séparateur inattendu en RPN"))
            }
        }
    }

    if st.len() != 1 {
        return Err(invalide());
    }
    st.pop().ok_or_else(invalide)
}

/// Exposant : entier exact seulement (éventuellement négatif : "x^-1" donne 0 - 1).
fn exposant_entier(b: &Expr) -> Result<i64> {
    let r = match b {
        Expr::Rat(r) => r.clone(),
        Expr::Sub(z, x) if z.est_zero_exact() => match x.as_ref() {
            Expr::Rat(r) => -r.clone(),
            _ => return Err(err("exposant doit être entier")),
        },
        _ => return Err(err("exposant doit être entier")),
    };
    if !r.denom().is_one() {
        return Err(err("exposant doit être entier"));
    }
    big_to_i64(r.numer()).ok_or_else(|| err("exposant trop grand"))
}

fn big_to_i64(x: &BigInt) -> Option<i64> {
    x.to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorites_et_moins_unaire() {
        let e = parse_expr("-2^2 + 3*4").unwrap();
        assert_eq!(
            e,
            Expr::add(
                Expr::sub(Expr::zero(), Expr::pow(Expr::entier(2), 2)),
                Expr::mul(Expr::entier(3), Expr::entier(4))
            )
        );
    }

    #[test]
    fn fonctions_et_unite_imaginaire() {
        let e = parse_expr("(1+i)/sqrt(2)").unwrap();
        assert_eq!(
            e,
            Expr::div(
                Expr::add(Expr::entier(1), Expr::I),
                Expr::sqrt(Expr::entier(2))
            )
        );
        assert!(matches!(parse_expr("SIN(pi)").unwrap(), Expr::Sin(_)));
    }

    #[test]
    fn integrale_quatre_arguments() {
        let e = parse_expr("int(sin(2*pi*f*t)*cos(2*pi*f*t), t, 0, 1/f)").unwrap();
        match e {
            Expr::Integrale { var, de, .. } => {
                assert_eq!(var, "t");
                assert!(de.est_zero_exact());
            }
            autre => panic!("intégrale attendue, obtenu {autre}"),
        }
    }

    #[test]
    fn degres_postfixes() {
        let e = parse_expr("exp(i*45°)").unwrap();
        let attendu = Expr::Exp(Box::new(Expr::mul(
            Expr::I,
            Expr::mul(Expr::entier(45), Expr::div(Expr::Pi, Expr::entier(180))),
        )));
        assert_eq!(e, attendu);
    }

    #[test]
    fn moins_unaire_dans_un_exposant() {
        assert_eq!(
            parse_expr("2^-1*3").unwrap(),
            Expr::mul(
                Expr::PowInt(Box::new(Expr::entier(2)), -1),
                Expr::entier(3)
            )
        );
        assert_eq!(
            parse_expr("2*-3").unwrap(),
            Expr::mul(Expr::entier(2), Expr::sub(Expr::zero(), Expr::entier(3)))
        );
    }

    #[test]
    fn exposant_negatif() {
        assert_eq!(
            parse_expr("x^-1").unwrap(),
            Expr::pow(Expr::var("x"), -1)
        );
    }

    #[test]
    fn erreurs_de_syntaxe() {
        for s in ["", "(1+2", "1+2)", "2^(1/2)", "int(x, 2, 0, 1)", "1,2", "*3"] {
            assert!(
                matches!(parse_expr(s), Err(EngineError::Parse(_))),
                "attendu une erreur de lecture pour {s:?}"
            );
        }
    }
}
