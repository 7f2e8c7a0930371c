use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::{bail, Context};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use srst::{ScanOptions, Srst, SrstError};

use extract::{kns_path, write_payload};

mod extract;

#[derive(Parser)]
#[command(
    version,
    after_help = "Example: srst-extract romfs/asset/data/0x272c6efb.file music/0x272c6efb"
)]
/// Lists the entries of a SRST file or extracts their KTSS streams
pub struct Args {
    /// Path to the SRST file
    input: PathBuf,
    /// Prefix for the extracted streams, written to <prefix>.<index>.kns.
    /// Only lists the entries if not given
    out_prefix: Option<PathBuf>,
    #[arg(short, long)]
    /// Skip entries without a KTSS stream instead of stopping at the first one
    keep_going: bool,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("error reading {}", args.input.display()))?;
    let srst = Srst::parse(&data)?;
    println!("platform: {} [{}]", srst.ktsr.platform, srst.platform());
    println!("SRST size: {} bytes", srst.header.file_size);

    let options = ScanOptions {
        abort_on_error: !args.keep_going,
    };
    let summary = match &args.out_prefix {
        Some(prefix) => srst.scan(&options, |_, payload| -> anyhow::Result<()> {
            let path = kns_path(prefix, payload.index);
            println!(
                "writing [{:03}] to \"{}\" ({} bytes)...",
                payload.index,
                path.display(),
                payload.len()
            );
            write_payload(&path, payload)
                .with_context(|| format!("error writing {}", path.display()))
        })?,
        None => srst.scan(&options, |entry, _| -> anyhow::Result<()> {
            println!(
                "entry {} type: {:08X}, size: {} [{:#x}]",
                entry.index,
                entry.entry_type,
                entry.size,
                entry.next_offset()
            );
            Ok(())
        })?,
    };
    if !summary.is_complete() {
        bail!(
            "{} of {} entries have no usable KTSS stream",
            summary.failures.len(),
            summary.entries
        );
    }
    info!("{} entries processed", summary.extracted);
    Ok(())
}

fn main() -> ExitCode {
    let env = Env::new().default_filter_or("info");
    env_logger::init_from_env(env);
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        // not being a SRST file at all isn't an error
        Err(e)
            if e
                .downcast_ref::<SrstError>()
                .is_some_and(SrstError::is_unrecognized_format) =>
        {
            warn!("{}: {e}", args.input.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}: {e:#}", args.input.display());
            ExitCode::FAILURE
        }
    }
}
