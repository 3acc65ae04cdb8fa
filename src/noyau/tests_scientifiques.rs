//! Tests scientifiques (campagne) : invariants + robustesse + limites contrôlées.
//!
//! But : trouver les limites sans faire chauffer la machine.
//! - budget temps global
//! - tailles bornées (profondeur, longueur)
//! - digits limités pour la lecture décimale
//!
//! Notes (alignées avec l’état actuel du noyau) :
//! - Les angles spéciaux sont tous les multiples de π/12, réduits modulo 2π :
//!   "pi/4 + 2*pi" est donc reconnu au même titre que 9π/4.
//! - L’annulation A - A => 0 est structurelle (forme normale) pour tout A simplifiable.
//! - tan aux pôles est hors domaine (Err(Domain)), et l’erreur contamine tout calcul.

use std::time::{Duration, Instant};

use super::eval::eval_expression;
use crate::erreurs::EngineError;

fn exact(expr: &str) -> String {
    eval_expression(expr, 30)
        .unwrap_or_else(|e| panic!("expr={expr:?} err={e}"))
        .joli
}

fn assert_exact_eq(expr: &str, attendu: &str) {
    assert_eq!(exact(expr), attendu, "expr={expr:?}");
}

fn assert_hors_domaine(expr: &str) {
    assert!(
        matches!(eval_expression(expr, 30), Err(EngineError::Domain(_))),
        "attendu Domain pour expr={expr:?}"
    );
}

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Invariants trig (angles spéciaux) ------------------------ */

#[test]
fn sci_tan_aux_poles() {
    assert_hors_domaine("tan(pi/2)");
    assert_hors_domaine("tan(3*pi/2)");
    assert_hors_domaine("tan(-pi/2)");
    assert_hors_domaine("tan(90°)");
}

#[test]
fn sci_identites_symetrie() {
    // sin(-x) = -sin(x)
    assert_exact_eq("sin(-pi/4)", "-√2/2");
    assert_exact_eq("sin(pi/4)", "√2/2");

    // cos(-x) = cos(x)
    assert_exact_eq("cos(-pi/3)", "1/2");
    assert_exact_eq("cos(pi/3)", "1/2");

    // tan(-x) = -tan(x)
    assert_exact_eq("tan(-pi/6)", "-√3/3");
    assert_exact_eq("tan(pi/6)", "√3/3");
}

#[test]
fn sci_periodicite_angles() {
    assert_exact_eq("sin(pi/4 + 2*pi)", "√2/2");
    assert_exact_eq("sin(9*pi/4)", "√2/2");
    assert_exact_eq("cos(7*pi/3)", "1/2");
    assert_exact_eq("tan(7*pi/6)", "√3/3");
    assert_exact_eq("cos(-1080°)", "1");
}

#[test]
fn sci_table_des_quinze_degres() {
    // sin(k·15°) et cos(k·15°) : sin² + cos² = 1 exactement, k = 0..24
    for k in 0..=24 {
        let e = format!("sin({k}*15°)^2 + cos({k}*15°)^2");
        assert_exact_eq(&e, "1");
    }
    assert_exact_eq("sin(75°)", "√2/4 + √6/4");
    assert_exact_eq("cos(105°)", "√2/4 - √6/4");
    assert_exact_eq("tan(15°)", "2 - √3");
}

#[test]
fn sci_propagation_hors_domaine() {
    assert_hors_domaine("1 + tan(pi/2)");
    assert_hors_domaine("tan(pi/2) + 1");
    assert_hors_domaine("2 * tan(pi/2)");
    assert_hors_domaine("tan(pi/2) / 3");
    assert_hors_domaine("log(0)");
    assert_hors_domaine("sqrt(-2)");
}

/* ------------------------ Cohérence algébrique (zéro) ------------------------ */

#[test]
fn sci_zero_algebrique() {
    assert_exact_eq("(1/2 + 1/3) - 5/6", "0");
    assert_exact_eq("(2/3 * 3/4) - 1/2", "0");
    assert_exact_eq("sqrt(2)*sqrt(2) - 2", "0");

    // rationalisation : 1/√3 = √3/3, et l’annulation est structurelle
    assert_exact_eq("1/sqrt(3)", "√3/3");
    assert_exact_eq("1/sqrt(3) - sqrt(3)/3", "0");
    assert_exact_eq("(sin(x) + pi) - (pi + sin(x))", "0");
}

#[test]
fn sci_systeme_tau() {
    // δ = 1 + √2 : δ² - 2δ - 1 = 0 ; δ - 2 = 1/δ ; 1 + 1/δ = √2
    assert_exact_eq("(1+sqrt(2))^2 - 2*(1+sqrt(2)) - 1", "0");
    assert_exact_eq("((1+sqrt(2)) - 2) - 1/(1+sqrt(2))", "0");
    assert_exact_eq("1 + 1/(1+sqrt(2))", "√2");
    // η = 1/√2 : η² = 1/2, η⁸ = 1/16
    assert_exact_eq("(1/sqrt(2))^2", "1/2");
    assert_exact_eq("1 - (1/sqrt(2))^8", "15/16");
    // (2√2 - √5)(2√2 + √5) = 3
    assert_exact_eq("(2*sqrt(2) - sqrt(5))*(2*sqrt(2) + sqrt(5))", "3");
}

#[test]
fn sci_viviani_decimaux_exacts() {
    assert_exact_eq("0.592 + 0.123456789 + 0.2845 + 0.000043211", "1");
}

/* ------------------------ Stress contrôlé (sans brûler) ------------------------ */

#[test]
fn sci_stress_profondeur_sqrt_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(2);

    // alternance sqrt / carré : reste rationnel à chaque étape
    let mut expr = "4".to_string();
    for k in 0..60 {
        expr = if k % 2 == 0 {
            format!("sqrt({expr})")
        } else {
            format!("({expr})^2")
        };
        budget(t0, max);
    }

    // 60 étapes : la dernière est un carré
    assert_exact_eq(&expr, "4");
    budget(t0, max);
}

#[test]
fn sci_stress_taille_somme_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(2);

    let expr = vec!["1/2"; 80].join(" + ");
    assert_exact_eq(&expr, "40");
    budget(t0, max);
}

#[test]
fn sci_stress_bigint_safe() {
    let t0 = Instant::now();
    let max = Duration::from_secs(2);

    // gros numérateur contrôlé (100 chiffres) : (10^100 - 1)/7 + 1/7 = 10^100/7
    let big = "9".repeat(100);
    let expr = format!("{big}/7 + 1/7");
    let attendu = format!("1{}/7", "0".repeat(100));
    assert_exact_eq(&expr, &attendu);
    budget(t0, max);
}

#[test]
fn sci_stress_radicaux_multiples() {
    let t0 = Instant::now();
    let max = Duration::from_secs(3);

    // (√2 + √3 + √5)·(1/(√2 + √3 + √5)) = 1 : trois conjugaisons successives
    assert_exact_eq("(sqrt(2)+sqrt(3)+sqrt(5)) * (1/(sqrt(2)+sqrt(3)+sqrt(5)))", "1");
    budget(t0, max);
}

/* ------------------------ Lecture décimale : cohérence minimale ------------------------ */

#[test]
fn sci_lecture_coherence_basic() {
    let ev = eval_expression("sin(pi/4)", 30).unwrap();
    assert_ne!(ev.joli, "0");
    let lecture = ev.lecture.expect("lecture attendue pour une constante");
    assert!(lecture.reel.starts_with("0.70710678118654752440084436"));
    assert!(lecture.imag.is_none());

    // 30 chiffres significatifs exactement
    let chiffres: String = lecture.reel.chars().filter(|c| c.is_ascii_digit()).collect();
    assert_eq!(chiffres.trim_start_matches('0').len(), 30);
}

#[test]
fn sci_lecture_pi_cent_chiffres() {
    let ev = eval_expression("pi", 100).unwrap();
    let lecture = ev.lecture.unwrap().reel;
    assert!(lecture.starts_with(
        "3.14159265358979323846264338327950288419716939937510\
         582097494459230781640628620899862803482534211706"
    ));
}
