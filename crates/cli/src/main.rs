//! CLI tool for turning saved web articles (MHTML) into slide decks.

mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::pack::DEFAULT_CAPACITY;
use deck_core::segment::DEFAULT_MAX_CHUNK_LEN;
use deck_core::SlidePacker;
use deck_mhtml::extract::{DEFAULT_CONTENT_CLASS, DEFAULT_CONTENT_ID};
use deck_mhtml::{ArchiveParser, BlockExtractor};
use deck_render::CoverInfo;
use pipeline::Pipeline;
use std::path::PathBuf;

/// Build an HTML slide deck from saved article pages.
#[derive(Parser, Debug)]
#[command(name = "mhtml2deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input archive file(s) (.mhtml), in deck order
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "deck")]
    output: PathBuf,

    /// Maximum text weight per slide
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Text blocks longer than this are split at sentence ends
    #[arg(short, long, default_value_t = DEFAULT_MAX_CHUNK_LEN)]
    segment_threshold: usize,

    /// Id of the element holding the article body
    #[arg(long, default_value = DEFAULT_CONTENT_ID)]
    content_id: String,

    /// Class of the element holding the article body (tried after the id)
    #[arg(long, default_value = DEFAULT_CONTENT_CLASS)]
    content_class: String,

    /// Deck title shown on the cover
    #[arg(short, long, default_value = "Slide Deck")]
    title: String,

    /// Cover subtitle
    #[arg(long)]
    subtitle: Option<String>,

    /// Small print on the cover (e.g. a date)
    #[arg(long)]
    note: Option<String>,

    /// Banner image for the cover
    #[arg(long)]
    cover_image: Option<PathBuf>,

    /// Print slide descriptors as JSON instead of rendering slides.
    /// Archive images are still extracted under the output directory, since
    /// the descriptors point at them
    #[arg(short, long)]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let pipeline = build_pipeline(&args);

    if args.print {
        pipeline.prepare()?;
        let articles = pipeline.read_articles(&args.input);
        let slides = pipeline.slides(&articles);
        let json = serde_json::to_string_pretty(&slides).context("Failed to serialize slides")?;
        println!("{}", json);
        return Ok(());
    }

    let manifest = pipeline.run(&args.input)?;
    if args.verbose {
        eprintln!(
            "Written {} slides to {}",
            manifest.slides_count,
            manifest.slides_dir.display()
        );
    }

    Ok(())
}

/// Map command line options onto the pipeline stages.
fn build_pipeline(args: &Args) -> Pipeline {
    let extractor = BlockExtractor::new()
        .with_content_id(args.content_id.as_str())
        .with_content_class(args.content_class.as_str());
    let packer = SlidePacker::new()
        .with_capacity(args.capacity)
        .with_segment_threshold(args.segment_threshold);

    let mut cover = CoverInfo::new(args.title.as_str());
    if let Some(subtitle) = &args.subtitle {
        cover = cover.with_subtitle(subtitle.as_str());
    }
    if let Some(note) = &args.note {
        cover = cover.with_note(note.as_str());
    }

    let mut pipeline = Pipeline::new(&args.output)
        .with_parser(ArchiveParser::new().with_extractor(extractor))
        .with_packer(packer)
        .with_cover(cover);
    if let Some(image) = &args.cover_image {
        pipeline = pipeline.with_cover_image(image);
    }
    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["mhtml2deck", "a.mhtml", "b.mhtml"]);
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.output, PathBuf::from("deck"));
        assert_eq!(args.capacity, 300);
        assert_eq!(args.segment_threshold, 180);
        assert_eq!(args.content_id, "js_content");
        assert_eq!(args.content_class, "rich_media_content");
        assert!(!args.print);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::parse_from([
            "mhtml2deck",
            "--capacity",
            "200",
            "--segment-threshold",
            "90",
            "--content-id",
            "post",
            "--subtitle",
            "Sub",
            "-o",
            "out",
            "-p",
            "a.mhtml",
        ]);
        assert_eq!(args.capacity, 200);
        assert_eq!(args.segment_threshold, 90);
        assert_eq!(args.content_id, "post");
        assert_eq!(args.subtitle.as_deref(), Some("Sub"));
        assert_eq!(args.output, PathBuf::from("out"));
        assert!(args.print);
    }

    #[test]
    fn test_print_help_mentions_extracted_assets() {
        let cmd = Args::command();
        let print = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "print")
            .unwrap();
        let help = print.get_long_help().or(print.get_help()).unwrap().to_string();
        assert!(help.contains("still extracted under the output directory"));
    }

    #[test]
    fn test_input_required() {
        assert!(Args::try_parse_from(["mhtml2deck"]).is_err());
    }
}
