mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{App, CleanupArg, Commands, DescriptorArg, ExtractArg};
use depcache::{
    CacheCleanup, CacheConfig, ContentDescriptor, DependencyCache, EXTRACT_CODE_VERSION,
    ExtractOptions,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let app = App::parse();

    // 0 = warn, 1 = info, 2+ = debug, unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match app.verbose {
        0 => EnvFilter::new("depcache=warn"),
        1 => EnvFilter::new("depcache=info"),
        _ => EnvFilter::new("depcache=debug"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let config = match &app.config {
        Some(path) => CacheConfig::load(path)?,
        None => CacheConfig::default(),
    };

    match app.cmd {
        Commands::Extract(arg) => extract(arg, config),
        Commands::Cleanup(arg) => cleanup(arg, config),
        Commands::Descriptor(arg) => descriptor(arg),
    }
}

fn extract(arg: ExtractArg, config: CacheConfig) -> anyhow::Result<()> {
    let cache = DependencyCache::new(config);
    let options = ExtractOptions::new().strip_root(arg.strip_root);

    let target = match arg.target {
        Some(target) => {
            cache
                .extract_to(&arg.archive, &target, &arg.cache_root, &options)
                .with_context(|| format!("extracting '{}'", arg.archive.display()))?;
            target
        }
        None => cache
            .extract_to_cache(&arg.cache_root, &arg.archive, &options)
            .with_context(|| format!("extracting '{}'", arg.archive.display()))?,
    };
    println!("{}", target.display());
    Ok(())
}

fn cleanup(arg: CleanupArg, config: CacheConfig) -> anyhow::Result<()> {
    let cleanup = CacheCleanup::from_config(&config);
    if arg.force {
        let summary = cleanup
            .run_now(&arg.cache_root)
            .with_context(|| format!("cleaning '{}'", arg.cache_root.display()))?;
        println!(
            "marked {}, unmarked {}, evicted {}, orphan markers {}, failed {}",
            summary.marked,
            summary.unmarked,
            summary.evicted,
            summary.orphan_markers,
            summary.failed
        );
    } else if cleanup.run_if_due(&arg.cache_root) {
        println!("cleanup ran");
    } else {
        println!("cleanup not due");
    }
    Ok(())
}

fn descriptor(arg: DescriptorArg) -> anyhow::Result<()> {
    let options = ExtractOptions::new().strip_root(arg.strip_root);
    let descriptor =
        ContentDescriptor::compute(EXTRACT_CODE_VERSION, &arg.archive, &arg.target, &options)
        .with_context(|| format!("describing '{}'", arg.target.display()))?;
    print!("{}", String::from_utf8_lossy(&descriptor.render()));
    Ok(())
}
