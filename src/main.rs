#[macro_use]
extern crate log;

use std::io::{self, Write};
use std::process;

use clap::{Parser, ValueEnum};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use lineinput::{Scanner, SplitPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Print the lines of files (or stdin) in reverse order")]
struct Args {
    /// Input files. No files or "-" reads stdin
    #[arg(value_name = "FILE")]
    input: Vec<String>,

    /// Cut input into lines, words or chars
    #[arg(short, long, default_value = "lines")]
    split: SplitPolicy,

    /// Treat files that can't be opened as empty
    #[arg(short = 'k', long)]
    skip_unreadable: bool,

    /// Colorize line numbers. Auto means only when output is a tty
    #[arg(short, long, value_enum, default_value = "auto")]
    color: ColorWhen,
}

fn color_choice(when: ColorWhen) -> ColorChoice {
    match when {
        ColorWhen::Always => ColorChoice::Always,
        ColorWhen::Never => ColorChoice::Never,
        ColorWhen::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorWhen::Auto => ColorChoice::Never,
    }
}

fn print_reversed<W: WriteColor>(out: &mut W, lines: &[String]) -> io::Result<()> {
    let mut num = ColorSpec::new();
    num.set_fg(Some(Color::Yellow));
    for (i, line) in lines.iter().enumerate().rev() {
        out.set_color(&num)?;
        write!(out, "{:02}", i + 1)?;
        out.reset()?;
        writeln!(out, ": {line}")?;
    }
    out.flush()
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut sc = Scanner::new(args.input).with_split(args.split);
    if args.skip_unreadable {
        sc = sc.skip_unreadable();
    }
    let mut lines = Vec::new();
    while sc.advance() {
        lines.push(sc.text().to_string());
    }
    if let Some(err) = sc.error() {
        eprintln!("{err}");
        process::exit(1);
    }
    debug!("read {} lines from {} sources", sc.line_no(), sc.sources().len());

    let stdout = StandardStream::stdout(color_choice(args.color));
    let mut stdout = stdout.lock();
    if let Err(err) = print_reversed(&mut stdout, &lines) {
        if err.kind() == io::ErrorKind::BrokenPipe {
            debug!("write error {err}");
        }
        else {
            error!("write error {err}");
            process::exit(1);
        }
    }
}
