// src/verif/rapport.rs
//
// Sorties du rapport : JSON (serde_json) ou texte ligne à ligne.

use std::io::Write;

use super::contexte::Rapport;
use super::identites::Verdict;
use crate::erreurs::{EngineError, Result};

pub trait ReportSink {
    fn emit(&mut self, rapport: &Rapport) -> Result<()>;
}

/* ------------------------ JSON ------------------------ */

pub struct SortieJson<W: Write> {
    out: W,
    pub indente: bool,
}

impl<W: Write> SortieJson<W> {
    pub fn new(out: W) -> Self {
        Self { out, indente: true }
    }
}

impl<W: Write> ReportSink for SortieJson<W> {
    fn emit(&mut self, rapport: &Rapport) -> Result<()> {
        let ecrit = if self.indente {
            serde_json::to_writer_pretty(&mut self.out, rapport)
        } else {
            serde_json::to_writer(&mut self.out, rapport)
        };
        ecrit.map_err(|err| EngineError::Io(err.into()))?;
        writeln!(self.out)?;
        Ok(())
    }
}

/* ------------------------ Texte ------------------------ */

pub struct SortieTexte<W: Write> {
    out: W,
}

impl<W: Write> SortieTexte<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

fn etiquette(v: &Verdict) -> &'static str {
    match v {
        Verdict::Passed => "PASS",
        Verdict::Failed => "FAIL",
        Verdict::Indeterminate(_) => "????",
    }
}

impl<W: Write> ReportSink for SortieTexte<W> {
    fn emit(&mut self, rapport: &Rapport) -> Result<()> {
        let o = &mut self.out;

        if !rapport.constants.is_empty() {
            writeln!(o, "== constantes ==")?;
        }
        for c in &rapport.constants {
            let exact = c.exact.as_deref().unwrap_or("?");
            let dec = c
                .decimal
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "?".into());
            writeln!(o, "{:<16} = {:<28} ≈ {dec}", c.name, exact)?;
            if let Some(n) = &c.note {
                writeln!(o, "{:<16}   ({n})", "")?;
            }
        }

        if !rapport.results.is_empty() {
            writeln!(o, "== identités ==")?;
        }
        for r in &rapport.results {
            match &r.verdict {
                Verdict::Indeterminate(raison) => {
                    writeln!(o, "[{}] {} : {raison}", etiquette(&r.verdict), r.identity_name)?
                }
                v => writeln!(
                    o,
                    "[{}] {} : résidu exact {}, numérique {:.3e}",
                    etiquette(v),
                    r.identity_name,
                    crate::noyau::format_expr_pretty(&r.symbolic_residual),
                    r.numeric_residual
                )?,
            }
        }

        if let Some(rot) = &rapport.rotation {
            writeln!(o, "== cycle {} (période {}) ==", rot.name, rot.period)?;
            for pas in &rot.trace.steps {
                writeln!(
                    o,
                    "  pas {:>2} : |z| = {:.12}, arg = {:>11.6}°",
                    pas.step, pas.magnitude, pas.phase_degrees
                )?;
            }
            match &rot.violation {
                None => writeln!(o, "  cycle refermé")?,
                Some(raison) => writeln!(o, "  cycle ouvert : {raison}")?,
            }
        }

        writeln!(
            o,
            "bilan : {}/{} passées, {} échouées, {} indéterminées",
            rapport.nb_passed(),
            rapport.results.len(),
            rapport.nb_failed(),
            rapport.nb_indeterminate()
        )?;
        Ok(())
    }
}
