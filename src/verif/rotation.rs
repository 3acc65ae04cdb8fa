// src/verif/rotation.rs
//
// Validateur de rotation : un état complexe de module 1, multiplié `period`
// fois par un opérateur de rotation unitaire, doit revenir à son point de départ.
// - module conservé à chaque pas (1e-9)
// - phase finale = phase initiale modulo 360° (1e-6°)
// - aucune fermeture anticipée : `period` est la période minimale

use num_complex::Complex64;
use serde::Serialize;

use super::numerique::NumericValue;
use crate::erreurs::{EngineError, Result};

pub const TOLERANCE_MODULE: f64 = 1e-9;
pub const TOLERANCE_PHASE_DEGRES: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RotationStep {
    pub step: usize,
    pub magnitude: f64,
    pub phase_degrees: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RotationTrace {
    pub steps: Vec<RotationStep>,
}

impl RotationTrace {
    fn note(&mut self, step: usize, z: Complex64) {
        let v = NumericValue(z);
        self.steps.push(RotationStep {
            step,
            magnitude: v.magnitude(),
            phase_degrees: v.phase_degrees(),
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Écart de phase ramené dans ]-180, 180].
fn ecart_phase(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

fn violation(reason: String, trace: RotationTrace) -> EngineError {
    tracing::warn!(%reason, pas = trace.len(), "cycle non refermé");
    EngineError::PeriodicityViolation { reason, trace }
}

/// Applique `period` rotations à `initial` et vérifie la fermeture du cycle.
/// La trace contient le pas 0 (état initial) puis un relevé par rotation.
pub fn verify_cycle(
    initial: NumericValue,
    rotation: NumericValue,
    period: usize,
) -> Result<RotationTrace> {
    let mut trace = RotationTrace::default();
    trace.note(0, initial.0);

    if period == 0 {
        return Err(violation("période nulle".into(), trace));
    }
    if (initial.magnitude() - 1.0).abs() > TOLERANCE_MODULE {
        return Err(violation(
            format!("état initial de module {}", initial.magnitude()),
            trace,
        ));
    }

    let phase0 = initial.phase_degrees();
    let mut etat = initial.0;

    for pas in 1..=period {
        etat *= rotation.0;
        trace.note(pas, etat);

        let module = etat.norm();
        if (module - 1.0).abs() > TOLERANCE_MODULE {
            return Err(violation(
                format!("module {module} au pas {pas}"),
                trace,
            ));
        }

        let ecart = ecart_phase(NumericValue(etat).phase_degrees(), phase0);
        if pas < period && ecart.abs() <= TOLERANCE_PHASE_DEGRES {
            return Err(violation(
                format!("retour anticipé au pas {pas} (période {period} attendue)"),
                trace,
            ));
        }
        if pas == period && ecart.abs() > TOLERANCE_PHASE_DEGRES {
            return Err(violation(
                format!("phase finale décalée de {ecart}° après {period} pas"),
                trace,
            ));
        }
    }

    tracing::debug!(period, "cycle refermé");
    Ok(trace)
}
