// src/main.rs
//
// verif-tau : point d’entrée en ligne de commande.
// - sans sous-commande : vérifie le catalogue (intégré ou --catalogue FILE)
// - `eval EXPR`        : démarche complète du noyau sur une expression
//
// Codes de sortie : 0 tout passe, 1 échec / indéterminé / cycle ouvert,
// 2 erreur fatale (désaccord d’évaluateurs, registre, catalogue).

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verif_tau::noyau::eval_expression;
use verif_tau::verif::{charge_catalogue, contexte_tau, ReportSink, SortieJson, SortieTexte};
use verif_tau::{EngineError, Result};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Vérification symbolique + numérique du système τ
#[derive(Parser)]
#[command(name = "verif-tau")]
#[command(about = "Vérifie des identités exactes et leur contre-épreuve flottante", long_about = None)]
#[command(version)]
struct Cli {
    /// Catalogue TOML (sinon le système τ intégré)
    #[arg(short, long, env = "VERIF_TAU_CATALOGUE")]
    catalogue: Option<PathBuf>,

    /// Format du rapport
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Chiffres significatifs des lectures décimales
    #[arg(short, long, default_value_t = 15)]
    digits: usize,

    /// Niveau de journalisation (si RUST_LOG absent)
    #[arg(long, env = "VERIF_TAU_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Journal au format JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    commande: Option<Commande>,
}

#[derive(Subcommand)]
enum Commande {
    /// Évalue une expression : jetons, RPN, forme exacte, lecture décimale
    Eval {
        expression: String,
    },
}

fn installer_journal(cli: &Cli) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn verifier(cli: &Cli) -> Result<i32> {
    let ctx = match &cli.catalogue {
        Some(chemin) => charge_catalogue(chemin)?,
        None => contexte_tau()?,
    }
    .avec_chiffres(cli.digits);

    let rapport = ctx.run_all()?;

    let sortie = io::stdout().lock();
    match cli.format {
        Format::Json => SortieJson::new(sortie).emit(&rapport)?,
        Format::Text => SortieTexte::new(sortie).emit(&rapport)?,
    }
    Ok(rapport.code_sortie())
}

fn evaluer(expression: &str, digits: usize) -> Result<i32> {
    let ev = eval_expression(expression, digits)?;
    let mut o = io::stdout().lock();
    writeln!(o, "Jetons : {}", ev.demarche.jetons)?;
    writeln!(o, "RPN    : {}", ev.demarche.rpn)?;
    writeln!(o, "Avant  : {}", ev.demarche.avant)?;
    writeln!(o, "EXACT  : {}", ev.joli)?;
    match &ev.lecture {
        Some(l) => writeln!(o, "≈        {l}")?,
        None => writeln!(o, "≈        (variables libres)")?,
    }
    Ok(0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    installer_journal(&cli);

    let issue = match &cli.commande {
        Some(Commande::Eval { expression }) => evaluer(expression, cli.digits),
        None => verifier(&cli),
    };

    match issue {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            tracing::error!(%err, "arrêt");
            eprintln!("erreur: {err}");
            match err {
                // une expression hors domaine en `eval` n’est pas un bug du moteur
                EngineError::Domain(_) | EngineError::Unsimplifiable(_) => ExitCode::from(1),
                _ => ExitCode::from(2),
            }
        }
    }
}
