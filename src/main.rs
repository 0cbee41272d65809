use colored::*;
use modecalc::{AngleUnit, Calculator, Response, Settings};
use rustyline::{error::ReadlineError, Config, DefaultEditor};
use tracing::debug;

const HELP: &str = "\
Buttons are entered as tokens separated by spaces; bare numbers are fed
digit by digit. Examples:

  12 + 8 × 2 =
  sin 90 =
  ( 2 + 3 ) x² =

Shared tokens:   0-9 . + - × ÷ ( ) = % ± AC CE backspace MC MR M+ M- MS
Programmer:      BIN OCT DEC HEX << >>  (hex digits A-F)
Scientific:      sin cos tan asin ... ln log exp sqrt x² x³ 1/x xʸ yroot
                 π e DEG HYP F-E

Commands:
  :standard | :programmer | :scientific   switch mode (state is reset)
  :base <BIN|OCT|DEC|HEX>                 switch programmer base
  :degrees | :radians | :gradians         set the scientific angle unit
  :help                                   this text
  :quit                                   exit";

fn main() -> rustyline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::builder().build();
    let mut rl = DefaultEditor::with_config(config)?;
    let mut calc = Calculator::standard(Settings::default());

    println!("{}", "modecalc - :help for usage, :quit to exit".dimmed());
    loop {
        match rl.readline(&prompt(&calc)) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if let Some(command) = line.strip_prefix(':') {
                    if !run_command(command, &mut calc) {
                        break;
                    }
                } else {
                    feed_line(line, &mut calc);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {:?}", "read error:".red(), err);
                break;
            }
        }
    }
    Ok(())
}

fn prompt(calc: &Calculator) -> String {
    let mode = match calc {
        Calculator::Standard(_) => "std".to_owned(),
        Calculator::Programmer(p) => format!("prog/{}", p.active_base().label()),
        Calculator::Scientific(s) => format!("sci/{}", s.angle_unit().label()),
    };
    format!("{mode}> ")
}

/// Returns false when the session should end.
fn run_command(command: &str, calc: &mut Calculator) -> bool {
    let mut words = command.split_whitespace();
    match words.next() {
        Some("standard") => *calc = Calculator::standard(Settings::default()),
        Some("programmer") => *calc = Calculator::programmer(Settings::default()),
        Some("scientific") => *calc = Calculator::scientific(Settings::default()),
        Some("base") => match (&mut *calc, words.next()) {
            (Calculator::Programmer(p), Some(token)) => {
                report(&p.handle_base_change(token), true);
            }
            (Calculator::Programmer(_), None) => {
                eprintln!("{}", "usage: :base <BIN|OCT|DEC|HEX>".yellow());
            }
            _ => eprintln!("{}", ":base only applies to programmer mode".yellow()),
        },
        Some(unit @ ("degrees" | "radians" | "gradians")) => match calc {
            Calculator::Scientific(s) => {
                let unit = match unit {
                    "degrees" => AngleUnit::Degrees,
                    "radians" => AngleUnit::Radians,
                    _ => AngleUnit::Gradians,
                };
                s.set_angle_unit(unit);
            }
            _ => eprintln!("{}", "angle units only apply to scientific mode".yellow()),
        },
        Some("help") => println!("{HELP}"),
        Some("quit") | Some("exit") => return false,
        Some(other) => eprintln!("{} {}", "unknown command:".yellow(), other),
        None => {}
    }
    true
}

fn feed_line(line: &str, calc: &mut Calculator) {
    let show_bases = calc.is_programmer_variant();
    for token in line.split_whitespace().flat_map(tokenize_word) {
        debug!(token = %token, "dispatch");
        let response = calc.handle_button_click(&token);
        if response.error.is_some() || token == "=" {
            report(&response, show_bases);
        }
    }
    println!("  {} {}", "».".dimmed(), calc.input().bold());
}

/// A word of digits is fed one button at a time; everything else is
/// already a single token.
fn tokenize_word(word: &str) -> Vec<String> {
    if word.len() > 1 && word.chars().all(|c| c.is_ascii_hexdigit() || c == '.') {
        word.chars().map(|c| c.to_string()).collect()
    } else {
        vec![word.to_owned()]
    }
}

fn report(response: &Response, show_bases: bool) {
    if let Some(error) = &response.error {
        eprintln!("  {}", error.red());
        return;
    }
    if let Some(result) = &response.result {
        match &response.expression {
            Some(expression) => {
                println!(
                    "  {} {} {}",
                    expression.dimmed(),
                    "=".dimmed(),
                    result.green()
                )
            }
            None => println!("  {}", result.green()),
        }
    }
    if show_bases {
        if let Some(values) = &response.display_values {
            println!(
                "  {} {}  {} {}  {} {}  {} {}",
                "BIN".cyan(),
                values.bin,
                "OCT".cyan(),
                values.oct,
                "DEC".cyan(),
                values.dec,
                "HEX".cyan(),
                values.hex,
            );
        }
    }
}
