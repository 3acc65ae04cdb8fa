// src/verif/config.rs
//
// Catalogue externe (TOML) :
//
//   [[constant]]
//   name = "tau"
//   expression = "sqrt(2)"
//
//   [[identity]]
//   name = "orthogonality"
//   lhs = "int(sin(2*pi*f*t)*cos(2*pi*f*t), t, 0, 1/f)"
//   rhs = "0"
//   tolerance = 1e-9          # optionnel
//   samples = [{ f = 1.0 }]   # optionnel
//
//   [cycle]                   # optionnel
//   name = "octal"
//   initial = "mu"
//   rotation = "exp(i*45°)"
//   period = 8

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::contexte::{CycleDeclaration, VerificationContext};
use super::identites::{Identity, TOLERANCE_DEFAUT};
use super::numerique::Liaisons;
use crate::erreurs::{EngineError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueToml {
    #[serde(default, rename = "constant")]
    constantes: Vec<ConstanteToml>,
    #[serde(default, rename = "identity")]
    identites: Vec<IdentiteToml>,
    #[serde(default)]
    cycle: Option<CycleToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstanteToml {
    name: String,
    expression: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IdentiteToml {
    name: String,
    lhs: String,
    rhs: String,
    #[serde(default = "tolerance_defaut")]
    tolerance: f64,
    #[serde(default)]
    samples: Vec<Liaisons>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CycleToml {
    #[serde(default = "nom_cycle_defaut")]
    name: String,
    initial: String,
    rotation: String,
    period: usize,
}

fn tolerance_defaut() -> f64 {
    TOLERANCE_DEFAUT
}

fn nom_cycle_defaut() -> String {
    "cycle".to_string()
}

/// Construit un contexte depuis le texte TOML d’un catalogue.
pub fn contexte_depuis_toml(texte: &str) -> Result<VerificationContext> {
    let cat: CatalogueToml =
        toml::from_str(texte).map_err(|err| EngineError::Config(err.to_string()))?;

    let mut ctx = VerificationContext::new();
    for c in &cat.constantes {
        ctx.define_constant(&c.name, &c.expression)?;
    }
    for id in cat.identites {
        ctx.declare_identity(
            Identity::depuis_texte(&id.name, &id.lhs, &id.rhs, id.tolerance)?
                .avec_echantillons(id.samples),
        )?;
    }
    if let Some(c) = cat.cycle {
        ctx.declare_cycle(CycleDeclaration::depuis_texte(
            &c.name,
            &c.initial,
            &c.rotation,
            c.period,
        )?);
    }
    Ok(ctx)
}

/// Lit un catalogue TOML sur disque.
pub fn charge_catalogue(path: &Path) -> Result<VerificationContext> {
    let contenu = fs::read_to_string(path).map_err(|err| {
        EngineError::Config(format!("lecture de {} impossible: {err}", path.display()))
    })?;
    tracing::info!(chemin = %path.display(), "catalogue externe");
    contexte_depuis_toml(&contenu).map_err(|err| match err {
        EngineError::Config(msg) => EngineError::Config(format!("{}: {msg}", path.display())),
        autre => autre,
    })
}
