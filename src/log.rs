use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
  VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
  VERBOSE.load(Ordering::Relaxed)
}

pub fn log(msg: &str) {
  println!("{} {}", "•".bright_black(), msg);
}

pub fn ok(msg: &str) {
  println!("{} {}", "✓".green(), msg.bold());
}

pub fn warn(msg: &str) {
  eprintln!("{} {}", "!".yellow(), msg);
}

pub fn err(msg: &str) {
  eprintln!("{} {}", "x".red(), msg);
}

/// Printed only in verbose mode, to stderr so it never mixes with progress output.
pub fn debug(msg: &str) {
  if is_verbose() {
    eprintln!("{} {}", "debug".bright_black(), msg.bright_black());
  }
}
