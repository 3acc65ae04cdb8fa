// src/verif/registre.rs
//
// Registre des constantes nommées (τ, η, δ, μ…).
// - ordre d’insertion conservé (rapport déterministe)
// - une constante ne peut référencer que des constantes déjà enregistrées
// - `resolved` : expression où chaque référence est remplacée par sa définition

use std::collections::HashMap;

use serde::Serialize;

use super::serde_expr;
use crate::erreurs::{EngineError, Result};
use crate::noyau::{parse_expr, Expr};

/// Noms réservés par la grammaire (fonctions, π, i).
const RESERVES: &[&str] = &["i", "pi", "sqrt", "sin", "cos", "tan", "exp", "log", "int"];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Constant {
    pub name: String,
    #[serde(serialize_with = "serde_expr")]
    pub expression: Expr,
    #[serde(serialize_with = "serde_expr")]
    pub resolved: Expr,
}

#[derive(Clone, Debug, Default)]
pub struct ConstantRegistry {
    constantes: Vec<Constant>,
    index: HashMap<String, usize>,
}

fn nom_valide(nom: &str) -> bool {
    let mut cs = nom.chars();
    matches!(cs.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && cs.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVES.iter().any(|r| r.eq_ignore_ascii_case(nom))
}

impl ConstantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre `name = expression`. Toute variable libre doit être une
    /// constante déjà connue.
    pub fn register(&mut self, name: &str, expression: Expr) -> Result<&Constant> {
        if !nom_valide(name) {
            return Err(EngineError::Parse(format!("nom de constante invalide: {name:?}")));
        }
        if self.index.contains_key(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        if let Some(inconnue) = expression
            .variables_libres()
            .into_iter()
            .find(|v| !self.index.contains_key(v))
        {
            return Err(EngineError::UnknownConstant(format!(
                "{inconnue} (dans la définition de {name})"
            )));
        }

        let resolved = self.resolve(&expression);
        tracing::debug!(constante = name, definition = %expression, "constante enregistrée");

        let rang = self.constantes.len();
        self.constantes.push(Constant {
            name: name.to_string(),
            expression,
            resolved,
        });
        self.index.insert(name.to_string(), rang);
        Ok(&self.constantes[rang])
    }

    /// Variante texte : `register_text("tau", "sqrt(2)")`.
    pub fn register_text(&mut self, name: &str, texte: &str) -> Result<&Constant> {
        let e = parse_expr(texte)?;
        self.register(name, e)
    }

    pub fn lookup(&self, name: &str) -> Result<&Constant> {
        self.index
            .get(name)
            .map(|&k| &self.constantes[k])
            .ok_or_else(|| EngineError::UnknownConstant(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remplace chaque constante connue par sa définition résolue.
    /// Les autres variables (x, f, t…) restent libres.
    pub fn resolve(&self, e: &Expr) -> Expr {
        e.substitute_avec(&|v| {
            self.index
                .get(v)
                .map(|&k| self.constantes[k].resolved.clone())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.constantes.iter()
    }

    pub fn len(&self) -> usize {
        self.constantes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constantes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registre_tau() -> ConstantRegistry {
        let mut r = ConstantRegistry::new();
        r.register_text("tau", "sqrt(2)").unwrap();
        r.register_text("eta", "1/tau").unwrap();
        r.register_text("delta", "1 + tau").unwrap();
        r
    }

    #[test]
    fn ordre_et_resolution() {
        let r = registre_tau();
        let noms: Vec<_> = r.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(noms, ["tau", "eta", "delta"]);
        assert_eq!(
            r.lookup("eta").unwrap().resolved,
            parse_expr("1/sqrt(2)").unwrap()
        );
        // la définition déclarée reste intacte
        assert_eq!(r.lookup("eta").unwrap().expression, parse_expr("1/tau").unwrap());
    }

    #[test]
    fn doublon() {
        let mut r = registre_tau();
        assert!(matches!(
            r.register_text("tau", "sqrt(3)"),
            Err(EngineError::DuplicateName(n)) if n == "tau"
        ));
        // l’échec n’altère pas le registre
        assert_eq!(r.len(), 3);
        assert_eq!(r.lookup("tau").unwrap().expression, parse_expr("sqrt(2)").unwrap());
    }

    #[test]
    fn inconnues() {
        let mut r = registre_tau();
        assert!(matches!(r.lookup("omega"), Err(EngineError::UnknownConstant(_))));
        // référence vers l’avant : interdite
        assert!(matches!(
            r.register_text("a", "b + 1"),
            Err(EngineError::UnknownConstant(_))
        ));
        // casse significative
        assert!(matches!(r.lookup("Tau"), Err(EngineError::UnknownConstant(_))));
    }

    #[test]
    fn noms_reserves() {
        let mut r = ConstantRegistry::new();
        for nom in ["pi", "i", "sin", "2x", ""] {
            assert!(
                matches!(r.register_text(nom, "1"), Err(EngineError::Parse(_))),
                "nom accepté: {nom:?}"
            );
        }
    }

    #[test]
    fn resolution_garde_les_variables_libres() {
        let r = registre_tau();
        let e = r.resolve(&parse_expr("tau*x").unwrap());
        assert_eq!(e, parse_expr("sqrt(2)*x").unwrap());
    }
}
