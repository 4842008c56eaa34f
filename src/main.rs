use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tagpress::render::TextTransforms;
use tagpress::source::{ColumnSelection, ReaderOptions};
use tagpress::style::BaseStyles;
use tagpress::{ConversionBuilder, ConvertOptions, Direction, PipelineError};

/// Converts documents to InDesign Tagged Text.
///
/// Styles are remembered in `<output>.ini`; edit names, markup and rules
/// there and run again.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Document to convert (.md, .csv or .json)
    input: PathBuf,

    /// Documents appended after the first one
    #[arg(short, long = "append", value_name = "PATH")]
    append: Vec<PathBuf>,

    /// Output file [default: the input with a .txt extension]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Base paragraph style
    #[arg(long, default_value = "NormalParagraphStyle")]
    base_paragraph: String,

    /// Base character style
    #[arg(long, default_value = "NormalCharacterStyle")]
    base_character: String,

    /// Create styles from manual formatting of paragraphs and text
    #[arg(short, long)]
    manual: bool,

    /// Create styles from manual formatting of text only
    #[arg(long, conflicts_with = "manual")]
    manual_light: bool,

    /// The document is right-to-left by default
    #[arg(long)]
    rtl: bool,

    /// Stop converting where this text appears; remembered for later runs
    #[arg(long, value_name = "TEXT")]
    stop_marker: Option<String>,

    /// Convert comments into footnotes
    #[arg(long)]
    comments: bool,

    /// Bind a paragraph style to a text variable
    #[arg(long, value_name = "STYLE=VAR", value_parser = parse_binding)]
    style_to_variable: Vec<(String, String)>,

    /// Replace `=` by the Hebrew maqaf
    #[arg(long)]
    maqaf: bool,

    /// Replace vav + holam by its ligature
    #[arg(long)]
    vav: bool,

    /// Ignore the existing settings and start over
    #[arg(long)]
    fresh_start: bool,

    /// Debug logging, plus a UTF-8 copy of the output
    #[arg(short, long)]
    debug: bool,

    /// Artifact cache directory [default: `cache` next to the output]
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Do not cache images and formulas
    #[arg(long)]
    no_cache: bool,

    /// Spreadsheets: keep only the first N columns
    #[arg(long, value_name = "N", conflicts_with = "columns")]
    first_columns: Option<usize>,

    /// Spreadsheets: keep only these columns (1-based)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    columns: Vec<usize>,
}

fn parse_binding(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((style, var)) if !style.trim().is_empty() && !var.trim().is_empty() => {
            Ok((style.trim().to_string(), var.trim().to_string()))
        }
        _ => Err(format!("expected STYLE=VAR, got {:?}", text)),
    }
}

impl Args {
    fn options(&self) -> ConvertOptions {
        ConvertOptions {
            base_styles: BaseStyles {
                paragraph: self.base_paragraph.clone(),
                character: self.base_character.clone(),
                ..BaseStyles::default()
            },
            manual: self.manual,
            manual_light: self.manual_light,
            direction: if self.rtl { Direction::Rtl } else { Direction::Ltr },
            stop_marker: self.stop_marker.clone(),
            convert_comments: self.comments,
            style_to_variable: self.style_to_variable.iter().cloned().collect::<HashMap<_, _>>(),
            transforms: TextTransforms {
                maqaf: self.maqaf,
                vav: self.vav,
            },
        }
    }

    fn reader_options(&self) -> ReaderOptions {
        let columns = match (self.first_columns, self.columns.is_empty()) {
            (Some(n), _) => ColumnSelection::First(n),
            (None, false) => ColumnSelection::Indexes(self.columns.clone()),
            (None, true) => ColumnSelection::All,
        };
        ReaderOptions { columns }
    }

    fn builder(&self) -> ConversionBuilder {
        let mut builder = self
            .append
            .iter()
            .fold(ConversionBuilder::new(&self.input), |b, path| b.with_input(path))
            .with_options(self.options())
            .with_reader_options(self.reader_options())
            .with_fresh_start(self.fresh_start)
            .with_debug(self.debug)
            .with_cache(!self.no_cache);
        if let Some(output) = &self.output {
            builder = builder.with_output(output);
        }
        if let Some(dir) = &self.cache_dir {
            builder = builder.with_cache_dir(dir);
        }
        builder
    }
}

fn run(args: &Args) -> Result<(), PipelineError> {
    let report = args.builder().build()?.run()?;
    log::info!("Wrote {}", report.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
