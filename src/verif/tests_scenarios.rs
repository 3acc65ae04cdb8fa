//! Scénarios bout à bout : registre -> identités -> cycle -> rapport.
//!
//! - catalogue τ complet : tout passe, code de sortie 0
//! - identité fausse : échec franc, sans désaccord d’évaluateurs
//! - injection de fautes : un évaluateur menteur est détecté (fatal)
//! - sorties JSON / texte

use super::contexte::{CycleDeclaration, VerificationContext};
use super::identites::{EvaluateurExact, Identity, SymbolicEvaluator, Verdict};
use super::numerique::{EvaluateurFlottant, Liaisons, NumericEvaluator, NumericValue};
use super::rapport::{ReportSink, SortieJson, SortieTexte};
use super::{contexte_depuis_toml, contexte_tau};
use crate::erreurs::{EngineError, Result};
use crate::noyau::{Expr, LectureDecimale};

fn mini_tau() -> VerificationContext {
    let mut ctx = VerificationContext::new();
    ctx.define_constant("tau", "sqrt(2)").unwrap();
    ctx.define_constant("eta", "1/tau").unwrap();
    ctx.define_constant("delta", "1 + tau").unwrap();
    ctx
}

fn identite(nom: &str, lhs: &str, rhs: &str) -> Identity {
    Identity::depuis_texte(nom, lhs, rhs, 1e-9).unwrap()
}

/* ------------------------ Évaluateurs menteurs ------------------------ */

/// Prétend que tout résidu est nul.
struct ToujoursZero;

impl SymbolicEvaluator for ToujoursZero {
    fn simplify(&self, _e: &Expr) -> Result<Expr> {
        Ok(Expr::zero())
    }

    fn evaluate_decimal(&self, e: &Expr, digits: usize) -> Result<LectureDecimale> {
        EvaluateurExact.evaluate_decimal(e, digits)
    }
}

/// Décale chaque valeur de 1e-3.
struct Decale;

impl NumericEvaluator for Decale {
    fn evaluate(&self, e: &Expr, liaisons: &Liaisons) -> Result<NumericValue> {
        let v = EvaluateurFlottant::default().evaluate(e, liaisons)?;
        Ok(NumericValue::reel(v.re() + 1e-3))
    }
}

/* ------------------------ Scénarios ------------------------ */

#[test]
fn catalogue_tau_passe_entierement() {
    let rapport = contexte_tau().unwrap().run_all().unwrap();

    for r in &rapport.results {
        assert!(r.passed, "{} : {:?}", r.identity_name, r.verdict);
    }
    assert!(rapport.all_passed());
    assert_eq!(rapport.code_sortie(), 0);

    let rot = rapport.rotation.as_ref().unwrap();
    assert!(rot.closed);
    assert_eq!(rot.trace.steps.len(), 9);

    // constantes : forme exacte + lecture 15 chiffres + flottant
    let tau = &rapport.constants[0];
    assert_eq!(tau.exact.as_deref(), Some("√2"));
    assert_eq!(tau.decimal.as_ref().unwrap().reel, "1.41421356237310");
    let mu = rapport.constants.iter().find(|c| c.name == "mu").unwrap();
    assert_eq!(mu.exact.as_deref(), Some("√2/2 + i·√2/2"));
    assert!(mu.decimal.as_ref().unwrap().imag.is_some());
    let gap = rapport.constants.iter().find(|c| c.name == "mass_reduction").unwrap();
    assert_eq!(gap.exact.as_deref(), Some("15/16"));
}

#[test]
fn deux_runs_identiques() {
    let ctx = contexte_tau().unwrap();
    assert_eq!(ctx.run_all().unwrap(), ctx.run_all().unwrap());
}

#[test]
fn systeme_minimal_bout_a_bout() {
    let mut ctx = mini_tau();
    ctx.declare_identity(identite("reciprocity", "delta - 2", "1/delta")).unwrap();
    ctx.declare_identity(identite("bridge", "1 + 1/delta", "tau")).unwrap();
    ctx.declare_identity(identite("critical", "eta^2", "1/2")).unwrap();

    let rapport = ctx.run_all().unwrap();
    assert_eq!(rapport.nb_passed(), 3);
    assert!(rapport.rotation.is_none());
    assert!(rapport.all_passed());
}

#[test]
fn argent_et_born_bout_a_bout() {
    let mut ctx = mini_tau();
    ctx.declare_identity(identite("silver", "delta^2 - 2*delta - 1", "0")).unwrap();
    ctx.declare_identity(identite("born", "eta^2 - 1/2", "0")).unwrap();

    let rapport = ctx.run_all().unwrap();
    assert_eq!(rapport.results.len(), 2);
    for r in &rapport.results {
        assert!(r.passed, "{} : {:?}", r.identity_name, r.verdict);
        assert!(r.numeric_residual < 1e-9, "{} : {}", r.identity_name, r.numeric_residual);
    }
    assert_eq!(rapport.code_sortie(), 0);
}

#[test]
fn eta_carre_flottant() {
    let ctx = mini_tau();
    let eta2 = ctx.registre.resolve(&Expr::pow(Expr::var("eta"), 2));
    let v = EvaluateurFlottant::default().evaluate(&eta2, &Liaisons::new()).unwrap();
    assert!((v.re() - 0.5).abs() < 1e-12);
    assert!(v.im().abs() < 1e-12);
}

#[test]
fn identites_trigonometriques_echantillonnees() {
    let mut ctx = VerificationContext::new();
    for (nom, lhs, rhs) in [
        ("double angle", "sin(2*x)", "2*sin(x)*cos(x)"),
        ("euler", "exp(i*x)", "cos(x) + i*sin(x)"),
    ] {
        ctx.declare_identity(identite(nom, lhs, rhs).echantillonne("x", &[0.3, 1.7])).unwrap();
    }

    let rapport = ctx.run_all().unwrap();
    assert_eq!(rapport.nb_passed(), 2);
}

#[test]
fn identite_fausse_echoue_sans_desaccord() {
    let mut ctx = VerificationContext::new();
    ctx.declare_identity(identite("faux", "sqrt(2)", "sqrt(3)")).unwrap();

    let rapport = ctx.run_all().unwrap();
    let r = &rapport.results[0];
    assert_eq!(r.verdict, Verdict::Failed);
    assert!((r.numeric_residual - 0.3178372451957822).abs() < 1e-12);
    assert_eq!(rapport.code_sortie(), 1);
}

#[test]
fn indetermine_ne_bloque_pas_le_run() {
    let mut ctx = mini_tau();
    ctx.declare_identity(identite("sans forme close", "sin(1)", "0")).unwrap();
    ctx.declare_identity(identite("pôle", "tan(pi/2)", "0")).unwrap();
    ctx.declare_identity(identite("vraie", "tau^2", "2")).unwrap();

    let rapport = ctx.run_all().unwrap();
    assert_eq!(rapport.nb_indeterminate(), 2);
    assert_eq!(rapport.nb_passed(), 1);
    assert!(!rapport.all_passed());
}

#[test]
fn injection_symbolique_detectee() {
    let mut ctx = VerificationContext::new();
    ctx.declare_identity(identite("faux", "sqrt(2)", "sqrt(3)")).unwrap();

    let err = ctx
        .run_all_avec(&ToujoursZero, &EvaluateurFlottant::default())
        .unwrap_err();
    assert!(err.is_fatal());
    match err {
        EngineError::CrossCheckMismatch { identity, .. } => assert_eq!(identity, "faux"),
        autre => panic!("attendu CrossCheckMismatch, reçu {autre}"),
    }
}

#[test]
fn injection_numerique_detectee_sur_les_constantes() {
    let ctx = mini_tau();
    assert!(matches!(
        ctx.run_all_avec(&EvaluateurExact, &Decale),
        Err(EngineError::CrossCheckMismatch { identity, .. }) if identity == "constante tau"
    ));
}

#[test]
fn cycle_ouvert_est_rapporte() {
    let mut ctx = mini_tau();
    ctx.define_constant("mu", "(1 + i)/sqrt(2)").unwrap();
    ctx.declare_cycle(CycleDeclaration::depuis_texte("faux cycle", "mu", "exp(i*45°)", 4).unwrap());

    let rapport = ctx.run_all().unwrap();
    let rot = rapport.rotation.as_ref().unwrap();
    assert!(!rot.closed);
    assert!(rot.violation.is_some());
    assert_eq!(rot.trace.steps.len(), 5);
    assert_eq!(rapport.code_sortie(), 1);
}

#[test]
fn erreurs_de_registre() {
    let mut ctx = mini_tau();
    assert!(matches!(
        ctx.define_constant("tau", "sqrt(3)"),
        Err(EngineError::DuplicateName(_))
    ));
    assert!(matches!(
        ctx.registre.lookup("omega"),
        Err(EngineError::UnknownConstant(_))
    ));
    ctx.declare_identity(identite("a", "1", "1")).unwrap();
    assert!(matches!(
        ctx.declare_identity(identite("a", "2", "2")),
        Err(EngineError::DuplicateName(_))
    ));
}

#[test]
fn catalogue_toml_bout_a_bout() {
    let ctx = contexte_depuis_toml(
        r#"
        [[constant]]
        name = "mu"
        expression = "(1 + i)/sqrt(2)"

        [[identity]]
        name = "heartbeat"
        lhs = "mu^8"
        rhs = "1"

        [[identity]]
        name = "pythagorean"
        lhs = "sin(x)^2 + cos(x)^2"
        rhs = "1"
        samples = [{ x = 0.3 }, { x = 2.0 }]

        [cycle]
        name = "octal"
        initial = "mu"
        rotation = "exp(i*pi/4)"
        period = 8
        "#,
    )
    .unwrap();
    let rapport = ctx.run_all().unwrap();
    assert!(rapport.all_passed());
}

#[test]
fn sortie_json() {
    let mut ctx = mini_tau();
    ctx.declare_identity(identite("critical", "eta^2", "1/2")).unwrap();
    ctx.declare_identity(identite("sans forme close", "exp(1)", "0")).unwrap();
    let rapport = ctx.run_all().unwrap();

    let mut buf = Vec::new();
    SortieJson::new(&mut buf).emit(&rapport).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();

    assert_eq!(v["results"][0]["verdict"]["kind"], "passed");
    assert_eq!(v["results"][0]["symbolic_residual"], "0");
    assert_eq!(v["results"][1]["verdict"]["kind"], "indeterminate");
    assert!(v["results"][1]["numeric_residual"].is_null());
    assert_eq!(v["constants"][1]["exact"], "√2/2");
    assert!(v["rotation"].is_null());
}

#[test]
fn sortie_texte() {
    let rapport = contexte_tau().unwrap().run_all().unwrap();
    let mut buf = Vec::new();
    SortieTexte::new(&mut buf).emit(&rapport).unwrap();
    let texte = String::from_utf8(buf).unwrap();

    assert!(texte.contains("[PASS] octal heartbeat: μ⁸ = 1"));
    assert!(texte.contains("cycle refermé"));
    assert!(!texte.contains("[FAIL]"));
    assert!(texte.lines().last().unwrap().starts_with("bilan : 15/15"));
}
