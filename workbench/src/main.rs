use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use workbench::client::CodecClient;
use workbench::common::{Family, Operation, SourceFile};
use workbench::config::Settings;
use workbench::controller::FamilyWorkbench;
use workbench::export;
use workbench::gate::GateState;
use workbench::params::{OnFullPolicy, RawOptions};
use workbench::render::HistogramSource;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogOutputFormat {
    Json,
    Pretty,
}

/// Command line arguments for the codec workbench.
#[derive(Debug, Parser)]
#[clap(name = "Codec Workbench")]
struct WorkbenchArgs {
    /// Optional path to the configuration file. If not provided, the embedded
    /// defaults and environment variables are used.
    #[clap(short = 'c', long, required = false)]
    config: Option<PathBuf>,

    #[clap(short = 'o', long = "output-format", default_value = "pretty")]
    output_format: Option<LogOutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress a file with the codec service
    Encode(RunArgs),
    /// Reverse a previously produced artifact
    Decode(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// The codec family to use
    #[clap(value_enum)]
    family: Family,

    /// The file to send
    file: PathBuf,

    #[command(flatten)]
    codec: CodecArgs,

    /// Ask for and print the codec's internal artifacts
    #[clap(long)]
    show_details: bool,

    /// Gain of the prediction error overlay
    #[clap(long)]
    error_scale: Option<f64>,

    /// Save a chart of one of the predictive histograms
    #[clap(long, value_enum, conflicts_with = "no_export")]
    histogram: Option<HistogramSource>,

    /// Directory to save into, overriding the configuration
    #[clap(long)]
    output_dir: Option<PathBuf>,

    /// Only print the result, save nothing
    #[clap(long)]
    no_export: bool,
}

#[derive(Debug, Args)]
struct CodecArgs {
    /// LZ77 offset field width in bits
    #[clap(long)]
    offset_bits: Option<i64>,

    /// LZ77 match length field width in bits
    #[clap(long)]
    length_bits: Option<i64>,

    /// Fixed LZW index width in bits; the width grows automatically if unset
    #[clap(long)]
    index_bits: Option<i64>,

    /// What a full fixed-width LZW dictionary does
    #[clap(long, value_enum, default_value = "freeze")]
    on_full: OnFullPolicy,

    /// Use 16-bit Huffman symbols
    #[clap(long)]
    two_bytes: bool,

    /// Predictor id for predictive coding
    #[clap(long)]
    predictor: Option<i64>,
}

impl CodecArgs {
    fn raw_options(&self, show_details: bool) -> RawOptions {
        RawOptions {
            offset_bits: self.offset_bits,
            length_bits: self.length_bits,
            auto_grow_index: self.index_bits.is_none(),
            manual_index_bits: self.index_bits,
            on_full: self.on_full,
            two_bytes: self.two_bytes,
            predictor: self.predictor,
            show_details,
        }
    }
}

#[tokio::main]
#[tracing::instrument(name = "workbench")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse the command line arguments.
    let args = WorkbenchArgs::parse();

    // Configure the binary's stderr output based on the provided output format.
    let pretty = matches!(args.output_format, Some(LogOutputFormat::Pretty));
    workbench::logging::setup_logging("warn,workbench=info", pretty);

    // Load the configuration file and/or environment variables.
    let settings = Settings::new(args.config)?;
    let client = CodecClient::new(&settings.codec_service)?;

    let (operation, run) = match args.command {
        Command::Encode(run) => (Operation::Encode, run),
        Command::Decode(run) => (Operation::Decode, run),
    };
    let output_dir = run
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.export.output_dir.clone());

    let mut workbench = FamilyWorkbench::new(run.family, &settings);
    let panel = workbench.panel_mut(operation);
    panel.set_options(run.codec.raw_options(run.show_details));
    if let Some(scale) = run.error_scale {
        panel.set_error_scale(scale)?;
    }

    let source = SourceFile::load(&run.file).await?;
    let mut outcome = panel.select_file(source, &client).await;
    if outcome.is_ok() && panel.state() == GateState::FileSelected {
        outcome = panel.submit(&client).await;
    }

    let view = panel.render(Instant::now());
    println!("{view}");
    outcome?;

    if run.no_export {
        return Ok(());
    }

    let blob = panel.export()?;
    let saved = export::save(&blob, &output_dir).await?;
    println!("Saved {}", saved.display());

    for (kind, raster) in view.result.iter().flat_map(|result| &result.rasters) {
        let name = format!("{}.{}.png", blob.filename, kind.as_str());
        let saved = export::save_png(raster, &output_dir, &name).await?;
        println!("Saved {}", saved.display());
    }

    if let Some(source) = run.histogram {
        let chart = workbench.histogram(source)?;
        let name = format!("{}.histogram-{source}.png", blob.filename);
        let saved = export::save_png(&chart.to_image(), &output_dir, &name).await?;
        println!("Saved {}", saved.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        WorkbenchArgs::command().debug_assert();
    }

    #[test]
    fn index_bits_switch_off_auto_grow() {
        let args = WorkbenchArgs::parse_from([
            "workbench",
            "encode",
            "dictionary",
            "notes.txt",
            "--index-bits",
            "12",
            "--on-full",
            "reset",
        ]);
        let Command::Encode(run) = args.command else {
            panic!("expected encode");
        };

        let raw = run.codec.raw_options(false);
        assert!(!raw.auto_grow_index);
        assert_eq!(raw.manual_index_bits, Some(12));
        assert_eq!(raw.on_full, OnFullPolicy::Reset);
        assert_eq!(run.family, Family::Dictionary);
    }

    #[test]
    fn auto_grow_is_the_default() {
        let args = WorkbenchArgs::parse_from(["workbench", "-c", "wb.toml", "decode", "dictionary", "a.lzw"]);
        let Command::Decode(run) = args.command else {
            panic!("expected decode");
        };

        assert!(run.codec.raw_options(true).auto_grow_index);
        assert_eq!(args.config, Some(PathBuf::from("wb.toml")));
    }

    #[test]
    fn histogram_charts_need_export() {
        let err = WorkbenchArgs::try_parse_from([
            "workbench",
            "encode",
            "predictive",
            "lena.bmp",
            "--histogram",
            "error",
            "--no-export",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let args = WorkbenchArgs::try_parse_from([
            "workbench",
            "encode",
            "predictive",
            "lena.bmp",
            "--histogram",
            "error",
        ])
        .unwrap();
        let Command::Encode(run) = args.command else {
            panic!("expected encode");
        };
        assert!(matches!(run.histogram, Some(HistogramSource::Error)));
    }
}
