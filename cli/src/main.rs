use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::Parser;
use json_overlay::{Document, DocumentOptions, Element, Indent, Segment};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "jsonov", version, about = "Edit JSON documents in place")]
struct Args {
    /// Input file path. Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// Replace or add a value: PATH=JSON. Repeatable.
    #[arg(long = "set", value_name = "path=json", value_parser = parse_assignment)]
    sets: Vec<(String, String)>,

    /// Replace or add a string value: PATH=TEXT. Repeatable.
    #[arg(long = "set-string", value_name = "path=text", value_parser = parse_assignment)]
    string_sets: Vec<(String, String)>,

    /// Remove a property that exists in the input. Repeatable.
    #[arg(long = "remove", value_name = "path")]
    removals: Vec<String>,

    /// Print only the value at this path after edits are applied.
    #[arg(long, value_name = "path")]
    get: Option<String>,

    /// Indentation size; 0 writes compact output (default: 2).
    #[arg(long, value_name = "number", default_value_t = 2)]
    indent: usize,

    /// Log each recorded change to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug)]
enum InputSource {
    Stdin,
    File(String),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose);

    let (input, input_source) = read_input(args.input.as_deref())?;
    let indent = if args.indent == 0 {
        Indent::None
    } else {
        Indent::spaces(args.indent)
    };
    let options = DocumentOptions::default().with_indent(indent);
    let doc = Document::parse_with_options(&input, options)?;

    for (path, json) in &args.sets {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| format!("invalid JSON for {path}: {err}"))?;
        assign(&doc, path, value.into())?;
    }
    for (path, text) in &args.string_sets {
        assign(&doc, path, text.as_str().into())?;
    }
    for path in &args.removals {
        remove(&doc, path)?;
    }

    let output_target = OutputTarget::from_arg(args.output.as_deref());
    let selected = match &args.get {
        Some(path) => doc.select(path)?,
        None => doc.root(),
    };
    with_output_writer(output_target.path(), |writer| {
        selected.write_to(writer)?;
        Ok(())
    })?;
    if let OutputTarget::File(path) = &output_target {
        report_status(&input_source, path, doc.changes().len());
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((path, value)) => Ok((path.to_string(), value.to_string())),
        None => Err(format!("expected PATH=VALUE, got \"{raw}\"")),
    }
}

/// Navigates to the parent of `path` and splits off the last segment.
fn split_target<'a>(
    doc: &'a Document,
    path: &str,
) -> Result<Option<(Element<'a>, Segment)>, Box<dyn Error>> {
    let mut segments = json_overlay::path::parse(path)?;
    let Some(last) = segments.pop() else {
        return Ok(None);
    };
    let mut parent = doc.root();
    for segment in segments {
        parent = match segment {
            Segment::Property(name) => parent.get_property(&name)?,
            Segment::Index(index) => parent.get_index(index)?,
        };
    }
    Ok(Some((parent, last)))
}

fn assign(doc: &Document, path: &str, value: json_overlay::Value) -> Result<(), Box<dyn Error>> {
    match split_target(doc, path)? {
        None => doc.root().set(value)?,
        Some((parent, Segment::Property(name))) => parent.set_property(&name, value)?,
        Some((parent, Segment::Index(index))) => parent.get_index(index)?.set(value)?,
    }
    Ok(())
}

fn remove(doc: &Document, path: &str) -> Result<(), Box<dyn Error>> {
    match split_target(doc, path)? {
        Some((parent, Segment::Property(name))) => parent.remove_property(&name)?,
        _ => return Err(format!("cannot remove \"{path}\": only properties can be removed").into()),
    }
    Ok(())
}

fn read_input(input: Option<&str>) -> Result<(Vec<u8>, InputSource), Box<dyn Error>> {
    match input {
        None | Some("-") => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok((buf, InputSource::Stdin))
        }
        Some(path) => {
            let buf = fs::read(path)?;
            Ok((buf, InputSource::File(path.to_string())))
        }
    }
}

#[derive(Clone, Debug)]
enum OutputTarget {
    Stdout,
    File(String),
}

impl OutputTarget {
    fn from_arg(output: Option<&str>) -> Self {
        match output {
            Some(path) if path != "-" => OutputTarget::File(path.to_string()),
            _ => OutputTarget::Stdout,
        }
    }

    fn path(&self) -> Option<&str> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path.as_str()),
        }
    }
}

fn with_output_writer<F>(path: Option<&str>, f: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
{
    match path {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            f(&mut file)
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            f(&mut handle)
        }
    }
}

fn report_status(input_source: &InputSource, output_path: &str, changes: usize) {
    let input_label = match input_source {
        InputSource::Stdin => "stdin".to_string(),
        InputSource::File(path) => display_path(path),
    };
    let output_label = display_path(output_path);
    let noun = if changes == 1 { "change" } else { "changes" };
    println!("✔ Applied {changes} {noun} {input_label} → {output_label}");
}

fn display_path(path: &str) -> String {
    let path = Path::new(path);
    let Ok(cwd) = std::env::current_dir() else {
        return path.to_string_lossy().into_owned();
    };
    match path.strip_prefix(&cwd) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
