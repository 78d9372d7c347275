use std::path::{Path, PathBuf};

use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use clap::Parser as _;
use tracing_subscriber::EnvFilter;
use tromp::{
    eval,
    layout::layout,
    parser::{self, ParseError, Spanned},
    term::TermRef,
};
use util::repl;

#[derive(clap::Parser)]
#[command(name = "tromp")]
#[command(about = "Untyped lambda calculus REPL drawing Tromp diagrams")]
struct Cli {
    /// REPL history file
    #[arg(long, default_value = "/tmp/tromp.history")]
    history: PathBuf,
    /// Step budget of `:normalize`
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,
    /// Run a single REPL command and exit
    command: Option<String>,
}

fn build_report(e: &ParseError) -> Report {
    Report::build(ReportKind::Error, (), e.position())
        .with_message(format!("Invalid lambda expression: {}", e.kind))
        .with_label(
            Label::new(e.span.clone())
                .with_message(format!("{}", e.message.as_str().fg(Color::Red)))
                .with_color(Color::Red),
        )
        .finish()
}

type CommandResult<'a> = Result<(), (&'a str, ParseError)>;

struct Repl {
    /// The term the last command produced; `:step` and friends work on it
    /// when no term is given.
    current: Option<TermRef>,
    max_steps: usize,
    history: PathBuf,
}
impl Repl {
    fn new(max_steps: usize, history: PathBuf) -> Self {
        Self {
            current: None,
            max_steps,
            history,
        }
    }

    fn term_or_current<'i>(
        &self,
        input: &'i str,
    ) -> Result<Option<TermRef>, (&'i str, ParseError)> {
        if input.trim().is_empty() {
            if self.current.is_none() {
                println!("Please enter a term first.");
            }
            return Ok(self.current.clone());
        }
        parser::parse(input).map(Some).map_err(|e| (input, e))
    }

    fn tokenize(input: &str) -> CommandResult<'_> {
        let tokens = parser::tokenize(input)
            .map_err(|e| (input, e))?
            .iter()
            .map(Spanned::value)
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        println!("{}", tokens.join(" "));
        Ok(())
    }

    fn show<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let term = parser::parse(input).map_err(|e| (input, e))?;
        println!("{term}");
        println!("{}", layout(&term));
        self.current = Some(term);
        Ok(())
    }

    fn parse<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let term = parser::parse(input).map_err(|e| (input, e))?;
        println!("{term}");
        self.current = Some(term);
        Ok(())
    }

    fn layout<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        if let Some(term) = self.term_or_current(input)? {
            println!("{}", layout(&term));
            self.current = Some(term);
        }
        Ok(())
    }

    fn step<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let Some(term) = self.term_or_current(input)? else {
            return Ok(());
        };
        let reduced = eval::beta_reduce_step(&term);
        if TermRef::ptr_eq(&reduced, &term) {
            println!("No further beta-reductions possible.");
        } else {
            println!("{reduced}");
            println!("{}", layout(&reduced));
        }
        self.current = Some(reduced);
        Ok(())
    }

    fn normalize<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let Some(term) = self.term_or_current(input)? else {
            return Ok(());
        };
        let result = eval::normalize(term, Some(self.max_steps));
        if result.normal_form {
            println!("{}", result.term);
            println!("({} steps)", result.steps);
        } else {
            println!("{}", result.term);
            println!(
                "(stopped after {} steps without reaching a normal form)",
                result.steps
            );
        }
        self.current = Some(result.term);
        Ok(())
    }

    fn show_help() {
        println!(
            "{}",
            r#"
term                -- parse the term, show it and its diagram
:tokenize   term    -- show tokenized term
:parse      term    -- show parsed term
:layout    [term]   -- show the diagram of the term
:step      [term]   -- perform one beta reduction
:normalize [term]   -- reduce until normal form or the step budget runs out
:help               -- show this message

Without a term, :layout, :step and :normalize use the last result.
`\` can be typed in place of `λ`.
        "#
            .trim()
        );
    }

    fn handle_repl_input<'i>(&mut self, input: &'i str) -> CommandResult<'i> {
        let (cmd, input) = if let Some(stripped) = input.strip_prefix(':') {
            stripped
                .trim_start()
                .split_once(' ')
                .unwrap_or((stripped, ""))
        } else {
            ("", input)
        };
        match cmd {
            "" => self.show(input)?,
            "to" | "tokenize" => Self::tokenize(input)?,
            "p" | "parse" => self.parse(input)?,
            "l" | "layout" => self.layout(input)?,
            "s" | "step" | "b" | "beta" => self.step(input)?,
            "n" | "normalize" => self.normalize(input)?,
            "h" | "he" | "hel" | "help" => Self::show_help(),
            _ => {
                eprintln!("Unknown command {cmd}");
                Self::show_help();
            }
        }
        Ok(())
    }
}
impl repl::Repl for Repl {
    type Error = anyhow::Error;
    fn prompt(&self) -> &str {
        "λ> "
    }
    fn history(&self) -> Option<&Path> {
        Some(self.history.as_path())
    }
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if input.trim().is_empty() {
            return Ok(());
        }
        if let Err((input, e)) = self.handle_repl_input(&input) {
            build_report(&e).eprint(Source::from(input))?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let mut session = Repl::new(cli.max_steps, cli.history);
    if let Some(command) = cli.command {
        return repl::Repl::evaluate(&mut session, command);
    }
    println!("Hi, this is an untyped lambda calculus REPL. :h to show help");
    println!();
    repl::start_repl(session)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use tromp::parser::{parse, ParseErrorKind};

    use super::*;

    fn session(max_steps: usize) -> Repl {
        Repl::new(max_steps, PathBuf::from("/tmp/tromp-test.history"))
    }

    #[test]
    fn test_entered_term_becomes_current() {
        let mut repl = session(10);
        repl.handle_repl_input("λx.x").unwrap();
        assert_eq!(repl.current, Some(parse("λx.x").unwrap()));
    }

    #[test]
    fn test_step_on_normal_form_keeps_current() {
        let mut repl = session(10);
        repl.handle_repl_input("λx.x").unwrap();
        let before = repl.current.clone().unwrap();
        repl.handle_repl_input(":step").unwrap();
        let after = repl.current.clone().unwrap();
        assert!(TermRef::ptr_eq(&before, &after));
    }

    #[test]
    fn test_step_reduces_current() {
        let mut repl = session(10);
        repl.handle_repl_input("((λx.(λw.xw))(λa.(λf.f)))").unwrap();
        repl.handle_repl_input(":step").unwrap();
        assert_eq!(repl.current, Some(parse("λw.(λa.λf.f) w").unwrap()));
        repl.handle_repl_input(":s").unwrap();
        assert_eq!(repl.current, Some(parse("λw.λf.f").unwrap()));
    }

    #[test]
    fn test_step_with_term_replaces_current() {
        let mut repl = session(10);
        repl.handle_repl_input("λx.x").unwrap();
        repl.handle_repl_input(":step (λx.x) y").unwrap();
        assert_eq!(repl.current, Some(parse("y").unwrap()));
    }

    #[test]
    fn test_step_without_any_term() {
        let mut repl = session(10);
        repl.handle_repl_input(":step").unwrap();
        assert!(repl.current.is_none());
        repl.handle_repl_input(":normalize").unwrap();
        assert!(repl.current.is_none());
        repl.handle_repl_input(":layout").unwrap();
        assert!(repl.current.is_none());
    }

    #[test]
    fn test_normalize_stops_at_step_budget() {
        let omega = "(λx.x x)(λx.x x)";
        let mut repl = session(5);
        repl.handle_repl_input(&format!(":normalize {omega}")).unwrap();
        assert_eq!(repl.current, Some(parse(omega).unwrap()));
    }

    #[test]
    fn test_normalize_reaches_normal_form() {
        let mut repl = session(100);
        repl.handle_repl_input("(λf.λx.f (f x)) (λy.y) z").unwrap();
        repl.handle_repl_input(":n").unwrap();
        assert_eq!(repl.current, Some(parse("z").unwrap()));
    }

    #[test]
    fn test_parse_error_keeps_current() {
        let mut repl = session(10);
        repl.handle_repl_input("λx.x").unwrap();
        let (input, e) = repl.handle_repl_input(":step (λx.x").unwrap_err();
        assert_eq!(input, "(λx.x");
        assert_eq!(e.kind, ParseErrorKind::MismatchedParens);
        assert_eq!(repl.current, Some(parse("λx.x").unwrap()));
    }
}
