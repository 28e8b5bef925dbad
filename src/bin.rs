use anyhow::{bail, Context};
use clap::Parser;
use crossword_csp::backtracking_search::{find_fill, FillOptions, ValueOrdering};
use crossword_csp::grid_config::{render_grid, GridConfig};
use crossword_csp::grid_image::{load_font, load_system_font, save_grid_image};
use crossword_csp::word_list::WordList;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// crossword_csp: fill a crossword structure from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ representing writable cells and anything else a block
    structure: PathBuf,

    /// Path to the word list, one word per line
    words: PathBuf,

    /// Also draw the filled grid as an image (PNG or JPEG, by extension) at this path
    output: Option<PathBuf>,

    /// Font used for the letters in the image; a common system font is used if not given
    #[arg(long)]
    font: Option<PathBuf>,

    /// Re-run arc consistency after every choice during the search
    #[arg(long)]
    mac: bool,

    /// Try the least constraining words first
    #[arg(long)]
    lcv: bool,

    /// Shuffle candidate words with this seed to get a different fill
    #[arg(long)]
    seed: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let structure = fs::read_to_string(&args.structure)
        .with_context(|| format!("Couldn't read file '{}'", args.structure.display()))?;
    let config = GridConfig::from_structure_string(&structure)?;

    let (height, width) = config.dimensions();
    let word_list = WordList::from_file(&args.words, Some(height.max(width)))?;

    let options = FillOptions {
        maintain_arc_consistency: args.mac,
        value_ordering: if args.lcv {
            ValueOrdering::LeastConstraining
        } else {
            ValueOrdering::DomainOrder
        },
        shuffle_seed: args.seed,
        timeout: args.timeout.map(Duration::from_secs),
        ..FillOptions::default()
    };

    let result = match find_fill(&config, &word_list, &options) {
        Ok(result) => result,
        Err(failure) if failure.is_no_solution() => {
            println!("No solution.");
            return Ok(());
        }
        Err(failure) => bail!("Fill failed: {failure}"),
    };

    info!("{:?}", result.statistics);

    let rendered = render_grid(&config, &word_list, &result.assignment);
    println!("{rendered}");

    if let Some(output) = &args.output {
        let font = match &args.font {
            Some(path) => Some(load_font(path)?),
            None => load_system_font(),
        };
        if font.is_none() {
            warn!("No font found, so the image will show the grid without letters; use --font");
        }

        save_grid_image(
            &config,
            &word_list,
            &result.assignment,
            font.as_ref(),
            output,
        )
        .with_context(|| format!("Couldn't write image '{}'", output.display()))?;
    }

    Ok(())
}
