use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use photoprep::{
    format_file_size, ActionReport, BackupOutcome, Cli, FolderProcessor, RunReport, SweepConfig,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let action = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut output = std::io::stdout();
        cli.resolve_action(&mut input, &mut output)
            .context("No value entered")?
    };

    let config = SweepConfig::new(cli.folder.clone(), action).with_date_style(cli.date_style);
    let report = FolderProcessor::new(config)
        .run()
        .with_context(|| format!("Failed to process {}", cli.folder.display()))?;

    print_report(&report);

    if report.has_failures() {
        bail!("{} file(s) could not be processed", report.failure_count());
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    if report.raw_conversion.processed_count > 0 {
        println!("Converted {} raw file(s)", report.raw_conversion.processed_count);
    }

    match &report.backup {
        BackupOutcome::AlreadyBackedUp => println!("Originals already backed up, backup skipped"),
        BackupOutcome::Completed(stats) => println!(
            "Backed up and stripped location from {} image(s)",
            stats.processed_count
        ),
    }

    match &report.action {
        ActionReport::Compressed(stats) => println!(
            "Compressed {} image(s): {} -> {} ({:.1}% smaller)",
            stats.processed_count,
            format_file_size(stats.total_size_before),
            format_file_size(stats.total_size_after),
            stats.savings_percent()
        ),
        ActionReport::Resized(stats) => println!("Resized {} image(s)", stats.processed_count),
        ActionReport::Cataloged(outcome) => {
            println!("info.json created with {} entries.", outcome.manifest.len())
        }
    }

    for (step, stats) in report.all_stats() {
        for failure in &stats.errors {
            eprintln!("[{}] {}: {}", step, failure.path.display(), failure.message);
        }
    }
}
