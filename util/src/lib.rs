pub mod repl;
