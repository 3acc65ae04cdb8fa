// src/noyau/jetons.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::erreurs::{EngineError, Result};

#[derive(Clone, Debug)]
pub enum Tok {
    Num(BigRational),
    Pi,

    // Fonctions + variables (tout ce qui n’est pas pi / opérateur / nombre)
    // NOTE: le parse (RPN->Expr) décidera si c’est une fonction, `i` ou une variable.
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Caret,   // ^
    Neg,     // moins unaire (produit par le parseur, jamais par tokenize)
    Degre,   // ° (postfixe)
    Virgule, // séparateur d’arguments

    LPar,
    RPar,
}

fn err(msg: impl Into<String>) -> EngineError {
    EngineError::Parse(msg.into())
}

/// Tokenize une chaîne en jetons.
/// Supporte:
/// - entiers (ex: 12) et décimaux exacts (ex: 0.592 -> 592/1000)
/// - fractions littérales sans espaces (ex: 12/34) -> Num(12/34)
/// - opérateurs + - * / ^, degré ° postfixe, virgule
/// - parenthèses ( )
/// - π ou pi
/// - identifiants [a-zA-Z_][a-zA-Z0-9_]* (casse conservée : les noms de constantes comptent)
/// - √ (équivaut à ident("sqrt"))
pub fn tokenize(s: &str) -> Result<Vec<Tok>> {
    let mut out = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let simple = match c {
            '(' => Some(Tok::LPar),
            ')' => Some(Tok::RPar),
            '+' => Some(Tok::Plus),
            '-' | '−' => Some(Tok::Minus),
            '*' | '·' => Some(Tok::Star),
            '/' => Some(Tok::Slash),
            '^' => Some(Tok::Caret),
            '°' => Some(Tok::Degre),
            ',' => Some(Tok::Virgule),
            'π' => Some(Tok::Pi),
            '√' => Some(Tok::Ident("sqrt".to_string())),
            _ => None,
        };
        if let Some(t) = simple {
            out.push(t);
            i += 1;
            continue;
        }

        // Identifiants ASCII : [a-zA-Z_][a-zA-Z0-9_]*
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            // "pi" / "PI" => Tok::Pi ; les autres noms gardent leur casse (delta ≠ Delta)
            if word.eq_ignore_ascii_case("pi") {
                out.push(Tok::Pi);
            } else {
                out.push(Tok::Ident(word));
            }
            continue;
        }

        // Nombre : entier, décimal exact, ou fraction littérale a/b (sans espaces)
        if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit())
        {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let int_str: String = chars[start..i].iter().collect();

            let mut frac_str = String::new();
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    frac_str.push(chars[i]);
                    i += 1;
                }
            }

            let mut rat = decimal_exact(&int_str, &frac_str)?;

            // fraction immédiate: 12/34 (entiers seulement, pas d’espaces)
            if frac_str.is_empty() && i < chars.len() && chars[i] == '/' {
                let save = i;
                i += 1;
                let start_d = i;

                // si pas un chiffre après '/', c’est une division normale (on recule)
                if start_d >= chars.len() || !chars[start_d].is_ascii_digit() {
                    i = save;
                } else {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    // "1/2.5" : pas une fraction littérale, on laisse la division au parseur
                    if i < chars.len() && chars[i] == '.' {
                        i = save;
                    } else {
                        let d_str: String = chars[start_d..i].iter().collect();
                        let d = BigInt::parse_bytes(d_str.as_bytes(), 10)
                            .ok_or_else(|| err("dénominateur invalide"))?;
                        if d.is_zero() {
                            return Err(err("division par zéro dans une fraction"));
                        }
                        rat /= BigRational::from_integer(d);
                    }
                }
            }

            out.push(Tok::Num(rat));
            continue;
        }

        return Err(err(format!("caractère inattendu: '{c}'")));
    }

    Ok(out)
}

/// "12" + "345" => 12345/1000 (exact, aucune conversion flottante)
fn decimal_exact(int_str: &str, frac_str: &str) -> Result<BigRational> {
    let chiffres = format!("{int_str}{frac_str}");
    let chiffres = if chiffres.is_empty() { "0" } else { &chiffres };
    let n = BigInt::parse_bytes(chiffres.as_bytes(), 10).ok_or_else(|| err("nombre invalide"))?;
    let d = BigInt::from(10).pow(frac_str.len() as u32);
    Ok(BigRational::new(n, d))
}

/// Format utilitaire (trace) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Tok]) -> String {
    fn format_rat(r: &BigRational) -> String {
        let n = r.numer();
        let d = r.denom();
        if d.is_one() {
            format!("{n}")
        } else {
            format!("{n}/{d}")
        }
    }

    tokens
        .iter()
        .map(|t| match t {
            Tok::Num(r) => format_rat(r),
            Tok::Pi => "π".to_string(),
            Tok::Ident(name) => name.clone(),
            Tok::Plus => "+".to_string(),
            Tok::Minus => "-".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Slash => "/".to_string(),
            Tok::Caret => "^".to_string(),
            Tok::Neg => "neg".to_string(),
            Tok::Degre => "°".to_string(),
            Tok::Virgule => ",".to_string(),
            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
