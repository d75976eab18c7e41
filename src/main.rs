use std::fs;
use std::io::{self, Read, Write};
use std::ops::Range;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use log::debug;

use ere::{Regex, RegexBuilder};

/// Print lines that match a POSIX extended regular expression.
#[derive(Parser, Debug)]
#[command(name = "ere", author, version, about, long_about = None)]
struct Args {
    /// Pattern syntax is ERE; accepted for grep compatibility
    #[arg(short = 'E')]
    extended: bool,

    /// Ignore case
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Select lines that do not match
    #[arg(short = 'v', long)]
    invert_match: bool,

    /// Print only a count of selected lines
    #[arg(short = 'c', long)]
    count: bool,

    /// Print only the matched parts of each line
    #[arg(short = 'o', long)]
    only_matching: bool,

    /// Prefix output with the line number
    #[arg(short = 'n', long)]
    line_number: bool,

    /// Select only matches that span the whole line
    #[arg(short = 'x', long)]
    line_regexp: bool,

    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Files to search; standard input when none are given
    #[arg(value_name = "FILE")]
    files: Vec<String>,
}

// Usage: echo <input_text> | ere -E <pattern>
fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("ere: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let regex = RegexBuilder::new(&args.pattern)
        .case_insensitive(args.ignore_case)
        .build()
        .with_context(|| format!("invalid pattern {:?}", args.pattern))?;
    debug!("compiled {regex:?} with {} groups", regex.captures_len());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut any = false;
    if args.files.is_empty() {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("failed to read stdin")?;
        any |= search(args, &regex, None, Bytes::from(buf), &mut out)?;
    } else {
        let labelled = args.files.len() > 1;
        for path in &args.files {
            let data = fs::read(path).with_context(|| format!("failed to read {path}"))?;
            let label = labelled.then_some(path.as_str());
            any |= search(args, &regex, label, Bytes::from(data), &mut out)?;
        }
    }
    out.flush()?;
    Ok(any)
}

/// Split `data` into lines without copying; a trailing newline does not
/// start another line.
fn lines(data: &Bytes) -> Vec<Bytes> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &byte) in data.iter().enumerate() {
        if byte == b'\n' {
            lines.push(data.slice(start..i));
            start = i + 1;
        }
    }
    if start < data.len() {
        lines.push(data.slice(start..));
    }
    lines
}

fn search(
    args: &Args,
    regex: &Regex,
    label: Option<&str>,
    data: Bytes,
    out: &mut impl Write,
) -> Result<bool> {
    let mut selected = 0usize;
    for (number, line) in lines(&data).iter().enumerate() {
        let spans = matching_spans(args, regex, line)?;
        if spans.is_empty() == args.invert_match {
            selected += 1;
            if args.count {
                continue;
            }
            let prefix = |out: &mut dyn Write| -> io::Result<()> {
                if let Some(label) = label {
                    write!(out, "{label}:")?;
                }
                if args.line_number {
                    write!(out, "{}:", number + 1)?;
                }
                Ok(())
            };
            if args.only_matching && !args.invert_match {
                for span in spans.into_iter().filter(|span| !span.is_empty()) {
                    prefix(out)?;
                    out.write_all(&line[span])?;
                    out.write_all(b"\n")?;
                }
            } else if !args.only_matching {
                prefix(out)?;
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
        }
    }
    if args.count {
        match label {
            Some(label) => writeln!(out, "{label}:{selected}")?,
            None => writeln!(out, "{selected}")?,
        }
    }
    Ok(selected > 0)
}

fn matching_spans(args: &Args, regex: &Regex, line: &[u8]) -> Result<Vec<Range<usize>>> {
    if args.line_regexp {
        // The leftmost-longest match covers the whole line whenever any match does.
        return Ok(match regex.find(line)? {
            Some(m) if m.start() == 0 && m.end() == line.len() => vec![m.range()],
            _ => vec![],
        });
    }
    if !args.only_matching {
        return Ok(regex.find(line)?.map(|m| m.range()).into_iter().collect());
    }
    let mut spans = Vec::new();
    for m in regex.find_iter(line) {
        spans.push(m?.range());
    }
    Ok(spans)
}
