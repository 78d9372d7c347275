use tracing::debug;

use crate::term::{alpha_rename, Term, TermRef};

/// Picks a name derived from `base` by appending quote marks that clashes
/// with nothing in `avoid`.
fn fresh_name(base: &str, avoid: impl Fn(&str) -> bool) -> String {
    let mut name = format!("{base}'");
    while avoid(&name) {
        name.push('\'');
    }
    name
}

/// `term[target := value]`, renaming binders that would capture a free
/// variable of `value`.
///
/// Subterms without a free `target` come back as the very same `Rc`, which is
/// what lets the reducer detect a step that changed nothing.
pub fn substitute(term: &TermRef, target: &str, value: &TermRef) -> TermRef {
    match term.as_ref() {
        Term::Var(name) if name == target => value.clone(),
        Term::Var(_) => term.clone(),
        Term::Apply(lhs, rhs) => {
            let new_lhs = substitute(lhs, target, value);
            let new_rhs = substitute(rhs, target, value);
            if TermRef::ptr_eq(&new_lhs, lhs) && TermRef::ptr_eq(&new_rhs, rhs) {
                term.clone()
            } else {
                Term::apply(new_lhs, new_rhs)
            }
        }
        // `target` is rebound here, nothing below refers to the outer one.
        Term::Abs(param, _) if param == target => term.clone(),
        Term::Abs(_, body) if !body.is_free(target) => term.clone(),
        Term::Abs(param, body) if value.is_free(param) => {
            let fresh = {
                let value_fv = value.free_variables();
                let names = body.names();
                fresh_name(param, |name| {
                    name == target || value_fv.contains(name) || names.contains(name)
                })
            };
            debug!(binder = %param, renamed = %fresh, "renaming binder to avoid capture");
            let body = alpha_rename(body, param, &fresh);
            Term::abs(fresh, substitute(&body, target, value))
        }
        Term::Abs(param, body) => Term::abs(param.as_str(), substitute(body, target, value)),
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;
    use crate::parser::parse;

    macro_rules! var {
        ($x:expr) => {
            Term::var($x)
        };
    }
    macro_rules! lambda {
        ($x:expr, $body:expr) => {
            Term::abs($x, $body)
        };
    }
    macro_rules! apply {
        ($lhs:expr, $rhs:expr) => {
            Term::apply($lhs, $rhs)
        };
    }

    /// Structural equality up to the names of bound variables.
    fn alpha_eq(lhs: &Term, rhs: &Term) -> bool {
        fn rec<'a>(
            lhs: &'a Term,
            rhs: &'a Term,
            scope: &mut Vec<(&'a str, &'a str)>,
        ) -> bool {
            match (lhs, rhs) {
                (Term::Var(x), Term::Var(y)) => {
                    match scope.iter().rev().find(|(l, r)| l == x || r == y) {
                        Some((l, r)) => l == x && r == y,
                        None => x == y,
                    }
                }
                (Term::Abs(x, lbody), Term::Abs(y, rbody)) => {
                    scope.push((x.as_str(), y.as_str()));
                    let eq = rec(lbody, rbody, scope);
                    scope.pop();
                    eq
                }
                (Term::Apply(l1, r1), Term::Apply(l2, r2)) => {
                    rec(l1, l2, scope) && rec(r1, r2, scope)
                }
                _ => false,
            }
        }
        rec(lhs, rhs, &mut vec![])
    }

    #[test]
    fn test_substitute_variable() {
        let y = var!("y");
        assert_eq!(substitute(&var!("x"), "x", &y), y);
        let z = var!("z");
        assert!(Rc::ptr_eq(&substitute(&z, "x", &y), &z));
    }

    #[test]
    fn test_substitute_application() {
        let t = apply!(var!("x"), apply!(var!("z"), var!("x")));
        assert_eq!(
            substitute(&t, "x", &lambda!("a", var!("a"))),
            apply!(
                lambda!("a", var!("a")),
                apply!(var!("z"), lambda!("a", var!("a")))
            )
        );
    }

    #[test]
    fn test_substitute_stops_at_shadowing_binder() {
        let t = lambda!("x", var!("x"));
        assert!(Rc::ptr_eq(&substitute(&t, "x", &var!("y")), &t));
    }

    #[test]
    fn test_substitute_absent_variable_is_identity() {
        for src in ["λy.y", "a b c", "(λa.λb.b a) (λc.c)", "λx.x"] {
            let t = parse(src).unwrap();
            let result = substitute(&t, "x", &parse("λq.q q").unwrap());
            assert_eq!(result, t, "{src}");
            assert!(Rc::ptr_eq(&result, &t), "{src}");
        }
    }

    #[test]
    fn test_substitute_avoids_capture() {
        let t = parse("λy.x").unwrap();
        let result = substitute(&t, "x", &parse("y").unwrap());
        assert_ne!(result, lambda!("y", var!("y")));
        assert_eq!(result, lambda!("y'", var!("y")));
        assert!(alpha_eq(&result, &lambda!("z", var!("y"))));
    }

    #[test]
    fn test_substitute_avoids_capture_under_renamed_binder() {
        // The fresh name must not collide with a name already used in the body.
        let t = lambda!("y", lambda!("y'", apply!(var!("x"), var!("y"))));
        let result = substitute(&t, "x", &var!("y"));
        assert_eq!(
            result,
            lambda!("y''", lambda!("y'", apply!(var!("y"), var!("y''"))))
        );
    }

    #[test]
    fn test_substitute_avoids_capture_of_primed_value() {
        let t = lambda!("y", apply!(var!("x"), var!("y")));
        let value = apply!(var!("y"), var!("y'"));
        let result = substitute(&t, "x", &value);
        assert_eq!(
            result,
            lambda!(
                "y''",
                apply!(apply!(var!("y"), var!("y'")), var!("y''"))
            )
        );
    }
}
