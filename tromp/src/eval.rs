use tracing::{debug, trace};

use crate::{
    subst::substitute,
    term::{Term, TermRef},
};

/// One leftmost-outermost beta step, or `None` if no redex was found.
pub fn reduce(term: &TermRef) -> Option<TermRef> {
    use Term::*;
    match term.as_ref() {
        Var(_) => None,
        Apply(lhs, rhs) => {
            if let Abs(param, body) = lhs.as_ref() {
                return Some(substitute(body, param, rhs));
            }
            if let Some(lhs) = reduce(lhs) {
                return Some(Term::apply(lhs, rhs.clone()));
            }
            reduce(rhs).map(|rhs| Term::apply(lhs.clone(), rhs))
        }
        Abs(param, body) => reduce(body).map(|body| Term::abs(param.as_str(), body)),
    }
}

/// Like [`reduce`], but hands back `term` itself when it is already in
/// normal form, so `Rc::ptr_eq(&beta_reduce_step(&t), &t)` is the "nothing
/// left to do" signal.
pub fn beta_reduce_step(term: &TermRef) -> TermRef {
    reduce(term).unwrap_or_else(|| term.clone())
}

#[derive(Debug)]
pub struct Normalized {
    pub term: TermRef,
    pub steps: usize,
    /// `false` when the step budget ran out first.
    pub normal_form: bool,
}

/// Reduces until no redex is left or `max_steps` steps have been taken.
/// `None` means no limit, so a term without normal form never returns.
pub fn normalize(mut term: TermRef, max_steps: Option<usize>) -> Normalized {
    let mut steps = 0;
    loop {
        if max_steps.map_or(false, |max| steps >= max) {
            debug!(steps, "step budget exhausted");
            return Normalized {
                term,
                steps,
                normal_form: false,
            };
        }
        let next = beta_reduce_step(&term);
        if TermRef::ptr_eq(&next, &term) {
            debug!(steps, "reached normal form");
            return Normalized {
                term,
                steps,
                normal_form: true,
            };
        }
        steps += 1;
        trace!(step = steps, term = %next, "beta step");
        term = next;
    }
}
