// src/verif/catalogue.rs
//
// Catalogue intégré : le système τ.
//   τ = √2, η = 1/τ, δ = 1 + τ, μ = (1 + i)/√2
//   écart Δ = 2τ - √5, horizon 12·log₂10, réduction 1 - η⁸, impédance (4 + √10)/3
// plus le cycle octal μ -> μ·e^(iπ/4) (période 8).

use super::contexte::{CycleDeclaration, VerificationContext};
use super::identites::{Identity, TOLERANCE_DEFAUT};
use crate::erreurs::Result;

const CONSTANTES: &[(&str, &str)] = &[
    ("tau", "sqrt(2)"),
    ("eta", "1/tau"),
    ("delta", "1 + tau"),
    ("mu", "(1 + i)/sqrt(2)"),
    ("gap", "2*tau - sqrt(5)"),
    ("horizon", "12*log(10)/log(2)"),
    ("mass_reduction", "1 - eta^8"),
    ("impedance", "(4 + sqrt(10))/3"),
];

/// (nom, lhs, rhs) : identités constantes, tolérance par défaut.
const IDENTITES: &[(&str, &str, &str)] = &[
    ("silver ratio: δ² - 2δ - 1 = 0", "delta^2 - 2*delta - 1", "0"),
    ("reciprocity: δ - 2 = 1/δ", "delta - 2", "1/delta"),
    ("silver bridge: 1 + 1/δ = τ", "1 + 1/delta", "tau"),
    ("critical line: η² = 1/2", "eta^2", "1/2"),
    ("born rule: η² = cos(60°)", "eta^2", "cos(60°)"),
    ("octal heartbeat: μ⁸ = 1", "mu^8", "1"),
    ("mu phase: e^(iπ/4) = μ", "exp(i*pi/4)", "mu"),
    ("gap product: Δ·(2τ + √5) = 3", "gap*(2*tau + sqrt(5))", "3"),
    ("horizon: 12·log₂10 = 12 + 12·log₂5", "horizon", "12 + 12*log(5)/log(2)"),
    ("mass reduction: 1 - η⁸ = 15/16", "mass_reduction", "15/16"),
    ("impedance: 9Z² - 24Z + 6 = 0", "9*impedance^2 - 24*impedance + 6", "0"),
    ("sin 15° = (√6 - √2)/4", "sin(15°)", "(sqrt(6) - sqrt(2))/4"),
    (
        "viviani: 0.592 + 0.123456789 + 0.2845 + 0.000043211 = 1",
        "0.592 + 0.123456789 + 0.2845 + 0.000043211",
        "1",
    ),
];

/// Contexte complet du système τ.
pub fn contexte_tau() -> Result<VerificationContext> {
    let mut ctx = VerificationContext::new();

    for (nom, def) in CONSTANTES {
        ctx.define_constant(nom, def)?;
    }
    for (nom, lhs, rhs) in IDENTITES {
        ctx.declare_identity(Identity::depuis_texte(nom, lhs, rhs, TOLERANCE_DEFAUT)?)?;
    }

    // identités à variables libres : échantillonnées
    ctx.declare_identity(
        Identity::depuis_texte("pythagorean: sin²x + cos²x = 1", "sin(x)^2 + cos(x)^2", "1", TOLERANCE_DEFAUT)?
            .echantillonne("x", &[0.3, 1.7, -2.4]),
    )?;
    ctx.declare_identity(
        Identity::depuis_texte(
            "orthogonality: ∫₀^(1/f) sin(2πft)·cos(2πft) dt = 0",
            "int(sin(2*pi*f*t)*cos(2*pi*f*t), t, 0, 1/f)",
            "0",
            TOLERANCE_DEFAUT,
        )?
        .echantillonne("f", &[0.5, 1.0, 3.0]),
    )?;

    ctx.declare_cycle(CycleDeclaration::depuis_texte("octal heartbeat", "mu", "exp(i*45°)", 8)?);

    tracing::debug!(
        constantes = ctx.registre.len(),
        identites = ctx.identites.len(),
        "catalogue τ chargé"
    );
    Ok(ctx)
}
