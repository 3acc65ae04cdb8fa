//! Propriétés (proptest) : idempotence de la forme canonique, annulation A - A,
//! orthogonalité exacte pour des fréquences quelconques.

use proptest::prelude::*;

use super::eval::{normalise, simplify};
use super::expr::Expr;
use super::rpn::parse_expr;

fn feuille() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-9i64..10, 1i64..7).prop_map(|(p, q)| Expr::fraction(p, q)),
        (2i64..13).prop_map(|n| Expr::sqrt(Expr::entier(n))),
        Just(Expr::Pi),
        Just(Expr::I),
        Just(Expr::var("x")),
        (0i64..24).prop_map(|k| Expr::Sin(Box::new(Expr::mul(Expr::fraction(k, 12), Expr::Pi)))),
        Just(Expr::Cos(Box::new(Expr::var("x")))),
    ]
}

fn arbre() -> impl Strategy<Value = Expr> {
    feuille().prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::add(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::sub(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::mul(a, b)),
            (inner, 0i64..4).prop_map(|(a, n)| Expr::pow(a, n)),
        ]
    })
}

proptest! {
    #[test]
    fn simplify_est_idempotente(e in arbre()) {
        let s = simplify(&e).unwrap();
        prop_assert_eq!(simplify(&s).unwrap(), s);
    }

    #[test]
    fn difference_avec_soi_est_nulle(e in arbre()) {
        let d = simplify(&Expr::sub(e.clone(), e)).unwrap();
        prop_assert!(d.est_zero_exact());
    }

    #[test]
    fn orthogonalite_pour_toute_frequence(p in 1i64..200, q in 1i64..200) {
        let integrale = parse_expr("int(sin(2*pi*f*t)*cos(2*pi*f*t), t, 0, 1/f)").unwrap();
        let e = integrale.substitute("f", &Expr::fraction(p, q));
        prop_assert!(normalise(&e).unwrap().est_zero());
    }

    #[test]
    fn produit_et_inverse(a in 1i64..30, b in 2i64..30, c in 2i64..30) {
        // (a + √b + i√c) · 1/(a + √b + i√c) = 1
        let x = Expr::add(
            Expr::add(Expr::entier(a), Expr::sqrt(Expr::entier(b))),
            Expr::mul(Expr::I, Expr::sqrt(Expr::entier(c))),
        );
        let un = simplify(&Expr::mul(x.clone(), Expr::div(Expr::entier(1), x))).unwrap();
        prop_assert_eq!(un, Expr::entier(1));
    }
}
