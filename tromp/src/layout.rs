//! Tromp-style diagrams: every abstraction is a horizontal bar, every
//! variable occurrence a vertical line hanging from the bar of its binder,
//! and every application a horizontal link between the leftmost variables of
//! its two sides.
//!
//! The term is left untouched; per-occurrence data lives in side tables
//! indexed by the position of the occurrence in a left-to-right walk.

use crate::term::Term;

pub const PADDING: u32 = 30;
pub const VAR_SPACING: u32 = 40;
pub const LEVEL_HEIGHT: u32 = 30;
/// Room below the last level for the variable lines and their labels.
pub const LABEL_SPACE: u32 = 100;

/// Horizontal line of an abstraction.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Bar {
    pub x1: u32,
    pub x2: u32,
    pub y: u32,
    pub label: String,
}

/// Vertical line of a bound variable occurrence.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Line {
    pub x: u32,
    pub y1: u32,
    pub y2: u32,
}

/// Horizontal link drawn for an application.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Connector {
    pub x1: u32,
    pub x2: u32,
    pub y: u32,
}

/// Name printed under a variable occurrence.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Label {
    pub x: u32,
    pub y: u32,
    pub text: String,
    pub bound: bool,
}

#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub bars: Vec<Bar>,
    pub lines: Vec<Line>,
    pub connectors: Vec<Connector>,
    pub labels: Vec<Label>,
}

/// `PADDING + index * step`, clamped to `u32::MAX` for huge terms.
fn grid(index: usize, step: u32) -> u32 {
    u32::try_from(index)
        .map_or(u32::MAX, |index| index.saturating_mul(step))
        .saturating_add(PADDING)
}

struct Occurrence<'a> {
    name: &'a str,
    x: u32,
    binding_depth: Option<u32>,
}

struct Binder<'a> {
    name: &'a str,
    depth: u32,
}

#[derive(Default)]
struct Walker<'a> {
    occurrences: Vec<Occurrence<'a>>,
    binders: Vec<Binder<'a>>,
    /// Occurrence indices of the leftmost variables on both sides.
    applications: Vec<(usize, usize)>,
}

impl<'a> Walker<'a> {
    /// Visits `term` left to right. Returns the range of occurrence indices
    /// found under it; subterms always cover a contiguous range.
    fn walk(
        &mut self,
        term: &'a Term,
        depth: u32,
        scope: &mut Vec<(&'a str, u32)>,
    ) -> std::ops::Range<usize> {
        let start = self.occurrences.len();
        match term {
            Term::Var(name) => {
                let binding_depth = scope
                    .iter()
                    .rev()
                    .find(|(bound, _)| bound == name)
                    .map(|(_, depth)| *depth);
                self.occurrences.push(Occurrence {
                    name: name.as_str(),
                    x: grid(start, VAR_SPACING),
                    binding_depth,
                });
            }
            Term::Abs(param, body) => {
                self.binders.push(Binder {
                    name: param.as_str(),
                    depth,
                });
                scope.push((param.as_str(), depth));
                self.walk(body, depth + 1, scope);
                scope.pop();
            }
            Term::Apply(lhs, rhs) => {
                // Reserve the slot so the outer link precedes the inner ones.
                let slot = self.applications.len();
                let lhs = self.walk(lhs, depth, scope);
                let rhs = self.walk(rhs, depth, scope);
                if !lhs.is_empty() && !rhs.is_empty() {
                    self.applications.insert(slot, (lhs.start, rhs.start));
                }
            }
        }
        start..self.occurrences.len()
    }
}

/// Places `term` on a grid. Deterministic: equal terms give equal scenes.
pub fn layout(term: &Term) -> Scene {
    let mut walker = Walker::default();
    walker.walk(term, 0, &mut vec![]);
    let Walker {
        occurrences,
        binders,
        applications,
    } = walker;

    let width = occurrences
        .last()
        .map_or(PADDING, |last| last.x)
        .saturating_add(VAR_SPACING);
    let height = grid(binders.len(), LEVEL_HEIGHT).saturating_add(LABEL_SPACE);
    let bottom = height - 50;
    let link_y = height - 60;
    let bar_y = |depth: u32| grid(depth as usize, LEVEL_HEIGHT);

    // A bar spans every variable hanging from its level.
    let bars = binders
        .iter()
        .filter_map(|binder| {
            let xs = occurrences
                .iter()
                .filter(|v| v.binding_depth == Some(binder.depth))
                .map(|v| v.x);
            let x1 = xs.clone().min()?;
            let x2 = xs.max()?;
            Some(Bar {
                x1,
                x2,
                y: bar_y(binder.depth),
                label: format!("λ{}", binder.name),
            })
        })
        .collect();

    let lines = occurrences
        .iter()
        .filter_map(|v| {
            v.binding_depth.map(|depth| Line {
                x: v.x,
                y1: bar_y(depth),
                y2: bottom,
            })
        })
        .collect();

    let connectors = applications
        .iter()
        .map(|&(lhs, rhs)| Connector {
            x1: occurrences[lhs].x,
            x2: occurrences[rhs].x,
            y: link_y,
        })
        .collect();

    let labels = occurrences
        .iter()
        .map(|v| Label {
            x: v.x,
            y: bottom + 15,
            text: v.name.to_string(),
            bound: v.binding_depth.is_some(),
        })
        .collect();

    Scene {
        width,
        height,
        bars,
        lines,
        connectors,
        labels,
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("scene {}x{}", self.width, self.height))?;
        for bar in &self.bars {
            f.write_fmt(format_args!(
                "\n  bar       {} x={}..{} y={}",
                bar.label, bar.x1, bar.x2, bar.y
            ))?;
        }
        for line in &self.lines {
            f.write_fmt(format_args!(
                "\n  line      x={} y={}..{}",
                line.x, line.y1, line.y2
            ))?;
        }
        for link in &self.connectors {
            f.write_fmt(format_args!(
                "\n  connector x={}..{} y={}",
                link.x1, link.x2, link.y
            ))?;
        }
        for label in &self.labels {
            let free = if label.bound { "" } else { " (free)" };
            f.write_fmt(format_args!(
                "\n  label     {} x={} y={}{free}",
                label.text, label.x, label.y
            ))?;
        }
        Ok(())
    }
}
