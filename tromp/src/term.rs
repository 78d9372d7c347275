use std::{collections::HashSet, rc::Rc};

pub type TermRef = Rc<Term>;

/// A lambda term. Nodes are never mutated; every transformation builds new
/// nodes and shares untouched subterms, so `Rc::ptr_eq` tells whether a
/// transformation left a term alone.
#[derive(PartialEq, Eq, Debug)]
pub enum Term {
    /// `x`
    Var(String),
    /// `λx. t`
    Abs(String, TermRef),
    /// `t t`
    Apply(TermRef, TermRef),
}

impl Term {
    pub fn var(name: impl Into<String>) -> TermRef {
        Rc::new(Term::Var(name.into()))
    }

    pub fn abs(param: impl Into<String>, body: TermRef) -> TermRef {
        Rc::new(Term::Abs(param.into(), body))
    }

    pub fn apply(lhs: TermRef, rhs: TermRef) -> TermRef {
        Rc::new(Term::Apply(lhs, rhs))
    }

    pub fn free_variables(&self) -> HashSet<String> {
        fn fv_rec(term: &Term, set: &mut HashSet<String>) {
            match term {
                Term::Var(name) => {
                    set.insert(name.clone());
                }
                Term::Abs(param, body) => {
                    let mut inner = HashSet::new();
                    fv_rec(body, &mut inner);
                    inner.remove(param);
                    set.extend(inner);
                }
                Term::Apply(lhs, rhs) => {
                    fv_rec(lhs, set);
                    fv_rec(rhs, set);
                }
            }
        }
        let mut set = HashSet::new();
        fv_rec(self, &mut set);
        set
    }

    /// Every name mentioned anywhere in the term, binders included.
    pub fn names(&self) -> HashSet<&str> {
        fn names_rec<'a>(term: &'a Term, set: &mut HashSet<&'a str>) {
            match term {
                Term::Var(name) => {
                    set.insert(name.as_str());
                }
                Term::Abs(param, body) => {
                    set.insert(param.as_str());
                    names_rec(body, set);
                }
                Term::Apply(lhs, rhs) => {
                    names_rec(lhs, set);
                    names_rec(rhs, set);
                }
            }
        }
        let mut set = HashSet::new();
        names_rec(self, &mut set);
        set
    }

    pub fn is_free(&self, name: &str) -> bool {
        match self {
            Term::Var(x) => x == name,
            Term::Abs(param, body) => param != name && body.is_free(name),
            Term::Apply(lhs, rhs) => lhs.is_free(name) || rhs.is_free(name),
        }
    }
}

/// Replaces every occurrence of `old` with `new`, binders included.
///
/// This is a raw renaming: it does not stop at an inner binder of the same
/// name, so it is only capture-safe when `new` does not appear in `term`.
pub fn alpha_rename(term: &TermRef, old: &str, new: &str) -> TermRef {
    match term.as_ref() {
        Term::Var(name) if name == old => Term::var(new),
        Term::Var(_) => term.clone(),
        Term::Abs(param, body) => {
            let param = if param == old { new } else { param.as_str() };
            Term::abs(param, alpha_rename(body, old, new))
        }
        Term::Apply(lhs, rhs) => Term::apply(
            alpha_rename(lhs, old, new),
            alpha_rename(rhs, old, new),
        ),
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(name) => f.write_str(name),
            Term::Abs(param, body) => f.write_fmt(format_args!("(λ{param}.{body})")),
            Term::Apply(lhs, rhs) => f.write_fmt(format_args!("({lhs} {rhs})")),
        }
    }
}
