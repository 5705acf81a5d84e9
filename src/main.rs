use clap::{Parser, Subcommand};
use std::path::PathBuf;

use optbench::Result;
use optbench::compare::{self, FieldSpec};
use optbench::config::PartialSettings;
use optbench::filter::Filter;
use optbench::model::{self, EvalContext, Mode};
use optbench::reference;
use optbench::render;
use optbench::trace::OutputDir;

#[derive(Parser)]
#[command(name = "optbench")]
#[command(about = "Benchmark profiler for optimization algorithms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate run traces into curves and a summary table.
    Report {
        /// TOML file with defaults for every flag below.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(short = 'b', long, value_enum)]
        mode: Option<Mode>,

        #[arg(short = 'l', long, num_args = 1..)]
        labels: Vec<String>,

        /// Instance filter, e.g. `Dataset == "pisinger2005" and Items < 100`.
        #[arg(short = 'f', long)]
        filter: Option<String>,

        #[arg(short = 't', long)]
        time_limit: Option<f64>,

        #[arg(long)]
        resolution: Option<usize>,

        /// Reference table (CSV).
        #[arg(long)]
        data: Option<PathBuf>,

        /// Root of the trace tree.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,

        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },

    /// Compare the outputs of two labels file by file.
    Compare {
        #[arg(long)]
        label_ref: PathBuf,

        #[arg(long)]
        label_new: PathBuf,

        #[arg(long, num_args = 1..)]
        equal_fields: Vec<String>,

        #[arg(long, num_args = 1..)]
        near_equal_fields: Vec<String>,

        #[arg(short = 'o', long, default_value = render::RESULTS_CSV)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Report {
            config,
            mode,
            labels,
            filter,
            time_limit,
            resolution,
            data,
            output,
            out,
            jobs,
        } => {
            // 1) Settings: file, then flags on top.
            let file = match &config {
                Some(path) => PartialSettings::load(path)?,
                None => PartialSettings::default(),
            };
            let flags = PartialSettings {
                mode,
                labels,
                time_limit,
                resolution,
                filter,
                data,
                output,
                out,
                jobs,
            };
            let settings = file.merge(flags).resolve()?;

            // 2) Reference rows, filtered in table order.
            let table = reference::load_reference_csv(&settings.data)?;
            let predicate = Filter::compile(&settings.filter)?;
            let rows: Vec<_> = predicate.select(&table.rows).into_iter().cloned().collect();
            log::info!(
                "{} of {} instances selected by {:?}",
                rows.len(),
                table.rows.len(),
                settings.filter
            );

            // 3) Evaluate and fold.
            let ctx = EvalContext::new(settings.mode, settings.time_limit, settings.resolution)?;
            let source = OutputDir::new(&settings.output);
            let report = model::run_batch(&ctx, &settings.labels, &rows, &source, settings.jobs)?;

            let missing = report.missing().count();
            if missing > 0 {
                log::warn!("{} missing runs", missing);
            }

            // 4) Emit.
            for path in render::write_report(&report, &settings.out)? {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Compare {
            label_ref,
            label_new,
            equal_fields,
            near_equal_fields,
            out,
        } => {
            println!("Ref: {}", label_ref.display());
            println!("New: {}", label_new.display());

            let reference = compare::load_output_set(&label_ref)?;
            let candidate = compare::load_output_set(&label_new)?;
            let fields = FieldSpec {
                equal: equal_fields,
                near_equal: near_equal_fields,
            };
            let comparison = compare::compare_outputs(&reference, &candidate, &fields)?;
            for d in &comparison.diagnostics {
                d.log();
            }

            print!("{}", render::comparison_text(&comparison));
            if !comparison.ok {
                render::write_comparison(&comparison, &out)?;
                println!("Wrote {}", out.display());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
